//! Admin Use Cases
//!
//! Dashboard counters and withdrawal processing.

use std::sync::Arc;

use auth::CurrentUser;
use chrono::Utc;
use kernel::id::WithdrawalId;
use kernel::pagination::{Page, PageQuery};
use platform::mailer::{Mailer, templates};

use crate::domain::entity::{Withdrawal, WithdrawalDecision, WithdrawalStatus};
use crate::domain::repository::{
    PlatformStats, StatsRepository, WalletRepository, WithdrawalFilter,
};
use crate::error::CommerceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub counters: PlatformStats,
    /// Platform share of paid revenue at the current fee.
    pub platform_fees: i64,
}

pub struct PlatformStatsUseCase<S>
where
    S: StatsRepository,
{
    store: Arc<S>,
    fee_percent: u8,
}

impl<S> PlatformStatsUseCase<S>
where
    S: StatsRepository,
{
    pub fn new(store: Arc<S>, fee_percent: u8) -> Self {
        Self { store, fee_percent }
    }

    pub async fn execute(&self) -> CommerceResult<DashboardStats> {
        let counters = self.store.platform_stats().await?;
        Ok(DashboardStats {
            platform_fees: counters.revenue * i64::from(self.fee_percent.min(100)) / 100,
            counters,
        })
    }
}

pub struct AdminWithdrawalsUseCase<S>
where
    S: WalletRepository,
{
    store: Arc<S>,
}

impl<S> AdminWithdrawalsUseCase<S>
where
    S: WalletRepository,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        status: Option<WithdrawalStatus>,
        page: PageQuery,
    ) -> CommerceResult<Page<Withdrawal>> {
        let filter = WithdrawalFilter {
            vendor_id: None,
            status,
        };
        let (items, total) = self.store.list_withdrawals(&filter, &page).await?;
        Ok(Page::new(items, &page, total))
    }
}

pub struct ProcessWithdrawalUseCase<S>
where
    S: WalletRepository,
{
    store: Arc<S>,
    mailer: Mailer,
}

impl<S> ProcessWithdrawalUseCase<S>
where
    S: WalletRepository,
{
    pub fn new(store: Arc<S>, mailer: Mailer) -> Self {
        Self { store, mailer }
    }

    pub async fn execute(
        &self,
        admin: &CurrentUser,
        id: &WithdrawalId,
        decision: WithdrawalDecision,
        note: Option<String>,
    ) -> CommerceResult<Withdrawal> {
        let settled = self
            .store
            .settle_withdrawal(id, decision, &admin.id, note.as_deref(), Utc::now())
            .await?;
        let withdrawal = settled.withdrawal;

        tracing::info!(
            withdrawal_id = %withdrawal.id,
            vendor_id = %withdrawal.vendor_id,
            admin_id = %admin.id,
            status = withdrawal.status.code(),
            "Withdrawal processed"
        );
        self.mailer
            .send_best_effort(templates::withdrawal_update(
                &settled.vendor_email,
                &settled.vendor_name,
                withdrawal.amount,
                &settled.currency,
                withdrawal.status.code(),
            ))
            .await;
        Ok(withdrawal)
    }
}
