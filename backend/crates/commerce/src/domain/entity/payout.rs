//! Vendor earnings from a paid order

use kernel::id::VendorId;

use crate::domain::entity::OrderItem;

/// One vendor's share of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorPayout {
    pub vendor_id: VendorId,
    pub gross: i64,
    /// Platform fee, rounded down in the vendor's favour
    pub fee: i64,
    pub net: i64,
}

/// Group lines by vendor, in first-seen order, and take the platform fee
/// from each vendor's gross.
pub fn split_earnings(items: &[OrderItem], fee_percent: u8) -> Vec<VendorPayout> {
    let mut payouts: Vec<VendorPayout> = Vec::new();
    for item in items {
        match payouts.iter_mut().find(|p| p.vendor_id == item.vendor_id) {
            Some(payout) => payout.gross += item.price,
            None => payouts.push(VendorPayout {
                vendor_id: item.vendor_id,
                gross: item.price,
                fee: 0,
                net: 0,
            }),
        }
    }
    let percent = i64::from(fee_percent.min(100));
    for payout in &mut payouts {
        payout.fee = payout.gross * percent / 100;
        payout.net = payout.gross - payout.fee;
    }
    payouts
}
