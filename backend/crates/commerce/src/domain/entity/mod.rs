mod download;
mod order;
mod payment;
mod payout;
mod wallet;

pub use download::DownloadToken;
pub use order::{Order, OrderItem, OrderStatus, PurchasableProduct, VendorSale};
pub use payment::{CompletedPayment, Payment, PaymentStatus, Settlement};
pub use payout::{VendorPayout, split_earnings};
pub use wallet::{
    PayoutAccount, VendorAccount, Wallet, Withdrawal, WithdrawalDecision, WithdrawalStatus,
};
