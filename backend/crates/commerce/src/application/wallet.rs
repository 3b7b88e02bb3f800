//! Wallet Use Cases

use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;
use kernel::pagination::{Page, PageQuery};
use platform::mailer::templates::format_amount;

use crate::domain::entity::{PayoutAccount, Wallet, Withdrawal, WithdrawalStatus};
use crate::domain::repository::{OrderRepository, WalletRepository, WithdrawalFilter};
use crate::error::{CommerceError, CommerceResult};

pub struct GetWalletUseCase<S>
where
    S: OrderRepository + WalletRepository,
{
    store: Arc<S>,
}

impl<S> GetWalletUseCase<S>
where
    S: OrderRepository + WalletRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, user_id: &UserId) -> CommerceResult<Wallet> {
        let vendor = self
            .store
            .find_vendor_account(user_id)
            .await?
            .ok_or(CommerceError::NotAVendor)?;
        self.store
            .find_wallet(&vendor.vendor_id)
            .await?
            .ok_or(CommerceError::WalletNotFound)
    }
}

#[derive(Debug, Clone)]
pub struct WithdrawalInput {
    pub amount: i64,
    /// Falls back to the bank details on the vendor profile.
    pub account: Option<PayoutAccount>,
}

pub struct RequestWithdrawalUseCase<S>
where
    S: OrderRepository + WalletRepository,
{
    store: Arc<S>,
    min_amount: i64,
    currency: String,
}

impl<S> RequestWithdrawalUseCase<S>
where
    S: OrderRepository + WalletRepository,
{
    pub fn new(store: Arc<S>, min_amount: i64, currency: String) -> Self {
        Self {
            store,
            min_amount,
            currency,
        }
    }

    /// Moves the amount from available to pending. Funds leave the wallet
    /// only when an admin approves.
    pub async fn execute(&self, user_id: &UserId, input: WithdrawalInput) -> CommerceResult<Withdrawal> {
        if input.amount < self.min_amount {
            return Err(CommerceError::BelowMinimum(format_amount(
                self.min_amount,
                &self.currency,
            )));
        }
        let vendor = self
            .store
            .find_vendor_account(user_id)
            .await?
            .ok_or(CommerceError::NotAVendor)?;
        let account = input
            .account
            .or(vendor.bank)
            .ok_or(CommerceError::MissingBankDetails)?;

        let withdrawal = Withdrawal::new(vendor.vendor_id, input.amount, account, Utc::now());
        if !self.store.request_withdrawal(&withdrawal).await? {
            return Err(CommerceError::InsufficientBalance);
        }

        tracing::info!(
            vendor_id = %vendor.vendor_id,
            withdrawal_id = %withdrawal.id,
            amount = withdrawal.amount,
            "Withdrawal requested"
        );
        Ok(withdrawal)
    }
}

pub struct ListWithdrawalsUseCase<S>
where
    S: OrderRepository + WalletRepository,
{
    store: Arc<S>,
}

impl<S> ListWithdrawalsUseCase<S>
where
    S: OrderRepository + WalletRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        user_id: &UserId,
        status: Option<WithdrawalStatus>,
        page: PageQuery,
    ) -> CommerceResult<Page<Withdrawal>> {
        let vendor = self
            .store
            .find_vendor_account(user_id)
            .await?
            .ok_or(CommerceError::NotAVendor)?;
        let filter = WithdrawalFilter {
            vendor_id: Some(vendor.vendor_id),
            status,
        };
        let (items, total) = self.store.list_withdrawals(&filter, &page).await?;
        Ok(Page::new(items, &page, total))
    }
}
