//! Application Layer
//!
//! Use cases for checkout, payment settlement, vendor payouts and paid
//! downloads.

pub mod admin;
pub mod config;
pub mod download;
pub mod order;
pub mod payment;
pub mod wallet;

pub use admin::{
    AdminWithdrawalsUseCase, DashboardStats, PlatformStatsUseCase, ProcessWithdrawalUseCase,
};
pub use config::{CommerceConfig, DownloadConfig};
pub use download::{DownloadService, IssueDownloadUseCase, IssuedDownload, RedeemDownloadUseCase};
pub use order::{GetOrderUseCase, ListOrdersUseCase, PlaceOrderUseCase, VendorSalesUseCase};
pub use payment::{
    HandleWebhookUseCase, InitializePaymentUseCase, InitializedPayment, SettlePaymentUseCase,
    VerifiedPayment, VerifyPaymentUseCase, authenticate_webhook,
};
pub use wallet::{GetWalletUseCase, ListWithdrawalsUseCase, RequestWithdrawalUseCase, WithdrawalInput};
