//! HTTP Handlers

use std::sync::Arc;

use auth::CurrentUser;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use kernel::extract::{AppPath, AppQuery, ValidJson};
use kernel::id::{OrderId, ProductId, WithdrawalId};
use kernel::pagination::{Page, PageQuery};
use kernel::response::ApiResponse;
use platform::mailer::Mailer;
use platform::paystack::{PaystackClient, SIGNATURE_HEADER};

use crate::application::{
    AdminWithdrawalsUseCase, CommerceConfig, DownloadService, GetOrderUseCase, GetWalletUseCase,
    HandleWebhookUseCase, InitializePaymentUseCase, IssueDownloadUseCase, ListOrdersUseCase,
    ListWithdrawalsUseCase, PlaceOrderUseCase, PlatformStatsUseCase, ProcessWithdrawalUseCase,
    RedeemDownloadUseCase, RequestWithdrawalUseCase, VendorSalesUseCase, VerifyPaymentUseCase,
    WithdrawalInput, authenticate_webhook,
};
use crate::domain::repository::{CommerceStore, DownloadRepository, DownloadTokenStore};
use crate::error::CommerceResult;
use crate::presentation::dto::{
    CreateOrderRequest, DownloadResponse, InitializePaymentRequest, InitializePaymentResponse,
    OrderResponse, ProcessWithdrawalRequest, SaleResponse, StatsResponse, VerifyPaymentResponse,
    WalletResponse, WithdrawalListQuery, WithdrawalRequest, WithdrawalResponse,
};

/// Where the redeem route is mounted; issued links point here.
pub const DOWNLOAD_LINK_PREFIX: &str = "/api/products/download";

/// Shared state for order, payment, wallet and admin handlers
#[derive(Clone)]
pub struct CommerceAppState<S>
where
    S: CommerceStore,
{
    pub store: Arc<S>,
    pub gateway: PaystackClient,
    pub mailer: Mailer,
    pub config: Arc<CommerceConfig>,
}

impl<S> CommerceAppState<S>
where
    S: CommerceStore,
{
    pub fn new(store: S, gateway: PaystackClient, mailer: Mailer, config: CommerceConfig) -> Self {
        Self {
            store: Arc::new(store),
            gateway,
            mailer,
            config: Arc::new(config),
        }
    }
}

/// Shared state for issuing and redeeming download links
pub struct DownloadAppState<D, T> {
    pub repo: Arc<D>,
    pub service: DownloadService<T>,
}

impl<D, T> Clone for DownloadAppState<D, T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            service: self.service.clone(),
        }
    }
}

impl<D, T> DownloadAppState<D, T> {
    pub fn new(repo: Arc<D>, service: DownloadService<T>) -> Self {
        Self { repo, service }
    }
}

// ============================================================================
// Orders
// ============================================================================

/// POST /api/orders
pub async fn create_order<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<CreateOrderRequest>,
) -> CommerceResult<ApiResponse<OrderResponse>>
where
    S: CommerceStore,
{
    let order = PlaceOrderUseCase::new(state.store.clone())
        .execute(&user, req.items)
        .await?;
    Ok(ApiResponse::created(OrderResponse::from(order)).with_message("Order created"))
}

/// GET /api/orders
pub async fn list_orders<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    AppQuery(page): AppQuery<PageQuery>,
) -> CommerceResult<ApiResponse<Page<OrderResponse>>>
where
    S: CommerceStore,
{
    let orders = ListOrdersUseCase::new(state.store.clone())
        .execute(&user.id, page)
        .await?;
    Ok(ApiResponse::ok(orders.map(OrderResponse::from)))
}

/// GET /api/orders/{id}
pub async fn get_order<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    AppPath(id): AppPath<OrderId>,
) -> CommerceResult<ApiResponse<OrderResponse>>
where
    S: CommerceStore,
{
    let order = GetOrderUseCase::new(state.store.clone())
        .execute(&id, &user)
        .await?;
    Ok(ApiResponse::ok(OrderResponse::from(order)))
}

/// GET /api/orders/vendor
pub async fn vendor_sales<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    AppQuery(page): AppQuery<PageQuery>,
) -> CommerceResult<ApiResponse<Page<SaleResponse>>>
where
    S: CommerceStore,
{
    let sales = VendorSalesUseCase::new(state.store.clone())
        .execute(&user.id, page)
        .await?;
    Ok(ApiResponse::ok(sales.map(SaleResponse::from)))
}

// ============================================================================
// Payments
// ============================================================================

/// POST /api/payments/initialize
pub async fn initialize_payment<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<InitializePaymentRequest>,
) -> CommerceResult<ApiResponse<InitializePaymentResponse>>
where
    S: CommerceStore,
{
    let initialized = InitializePaymentUseCase::new(state.store.clone(), state.gateway.clone())
        .execute(&user, &req.order_id, req.callback_url)
        .await?;
    Ok(ApiResponse::ok(InitializePaymentResponse::from(initialized)))
}

/// GET /api/payments/verify/{reference}
pub async fn verify_payment<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    AppPath(reference): AppPath<String>,
) -> CommerceResult<ApiResponse<VerifyPaymentResponse>>
where
    S: CommerceStore,
{
    let verified = VerifyPaymentUseCase::new(
        state.store.clone(),
        state.gateway.clone(),
        state.mailer.clone(),
        state.config.platform_fee_percent,
    )
    .execute(&user, &reference)
    .await?;
    Ok(ApiResponse::ok(VerifyPaymentResponse::from(verified)))
}

/// POST /api/webhooks/paystack
///
/// Takes the raw body: the signature covers the exact bytes sent.
pub async fn paystack_webhook<S>(
    State(state): State<CommerceAppState<S>>,
    headers: HeaderMap,
    body: Bytes,
) -> CommerceResult<ApiResponse<()>>
where
    S: CommerceStore,
{
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let event = authenticate_webhook(&state.gateway, signature, &body)?;

    HandleWebhookUseCase::new(
        state.store.clone(),
        state.mailer.clone(),
        state.config.platform_fee_percent,
    )
    .execute(event)
    .await?;
    Ok(ApiResponse::message("Webhook received"))
}

// ============================================================================
// Wallet
// ============================================================================

/// GET /api/wallet
pub async fn get_wallet<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
) -> CommerceResult<ApiResponse<WalletResponse>>
where
    S: CommerceStore,
{
    let wallet = GetWalletUseCase::new(state.store.clone())
        .execute(&user.id)
        .await?;
    Ok(ApiResponse::ok(WalletResponse::from(wallet)))
}

/// POST /api/wallet/withdrawals
pub async fn request_withdrawal<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    ValidJson(req): ValidJson<WithdrawalRequest>,
) -> CommerceResult<ApiResponse<WithdrawalResponse>>
where
    S: CommerceStore,
{
    let input = WithdrawalInput {
        amount: req.amount,
        account: req.account(),
    };
    let withdrawal = RequestWithdrawalUseCase::new(
        state.store.clone(),
        state.config.min_withdrawal,
        state.config.currency.clone(),
    )
    .execute(&user.id, input)
    .await?;
    Ok(ApiResponse::created(WithdrawalResponse::from(withdrawal))
        .with_message("Withdrawal request submitted"))
}

/// GET /api/wallet/withdrawals
pub async fn list_my_withdrawals<S>(
    State(state): State<CommerceAppState<S>>,
    user: CurrentUser,
    AppQuery(query): AppQuery<WithdrawalListQuery>,
) -> CommerceResult<ApiResponse<Page<WithdrawalResponse>>>
where
    S: CommerceStore,
{
    let page = ListWithdrawalsUseCase::new(state.store.clone())
        .execute(&user.id, query.status, query.page())
        .await?;
    Ok(ApiResponse::ok(page.map(WithdrawalResponse::from)))
}

// ============================================================================
// Admin
// ============================================================================

/// GET /api/admin/stats
pub async fn platform_stats<S>(
    State(state): State<CommerceAppState<S>>,
) -> CommerceResult<ApiResponse<StatsResponse>>
where
    S: CommerceStore,
{
    let stats = PlatformStatsUseCase::new(state.store.clone(), state.config.platform_fee_percent)
        .execute()
        .await?;
    Ok(ApiResponse::ok(StatsResponse::from(stats)))
}

/// GET /api/admin/withdrawals
pub async fn list_withdrawals<S>(
    State(state): State<CommerceAppState<S>>,
    AppQuery(query): AppQuery<WithdrawalListQuery>,
) -> CommerceResult<ApiResponse<Page<WithdrawalResponse>>>
where
    S: CommerceStore,
{
    let page = AdminWithdrawalsUseCase::new(state.store.clone())
        .execute(query.status, query.page())
        .await?;
    Ok(ApiResponse::ok(page.map(WithdrawalResponse::from)))
}

/// PATCH /api/admin/withdrawals/{id}
pub async fn process_withdrawal<S>(
    State(state): State<CommerceAppState<S>>,
    admin: CurrentUser,
    AppPath(id): AppPath<WithdrawalId>,
    ValidJson(req): ValidJson<ProcessWithdrawalRequest>,
) -> CommerceResult<ApiResponse<WithdrawalResponse>>
where
    S: CommerceStore,
{
    let withdrawal = ProcessWithdrawalUseCase::new(state.store.clone(), state.mailer.clone())
        .execute(&admin, &id, req.action, req.note)
        .await?;
    let message = format!("Withdrawal {}", withdrawal.status.code());
    Ok(ApiResponse::ok(WithdrawalResponse::from(withdrawal)).with_message(message))
}

// ============================================================================
// Downloads
// ============================================================================

/// POST /api/products/{id}/download
pub async fn issue_download<D, T>(
    State(state): State<DownloadAppState<D, T>>,
    user: CurrentUser,
    AppPath(product_id): AppPath<ProductId>,
) -> CommerceResult<ApiResponse<DownloadResponse>>
where
    D: DownloadRepository + Send + Sync + 'static,
    T: DownloadTokenStore + Send + Sync + 'static,
{
    let issued = IssueDownloadUseCase::new(state.repo.clone(), state.service.clone())
        .execute(&user.id, &product_id, Utc::now())
        .await?;
    Ok(ApiResponse::ok(DownloadResponse::new(DOWNLOAD_LINK_PREFIX, issued)))
}

/// GET /api/products/download/{token}
///
/// Answers `302 Found` to the stored file.
pub async fn redeem_download<D, T>(
    State(state): State<DownloadAppState<D, T>>,
    AppPath(token): AppPath<String>,
) -> CommerceResult<Response>
where
    D: DownloadRepository + Send + Sync + 'static,
    T: DownloadTokenStore + Send + Sync + 'static,
{
    let location = RedeemDownloadUseCase::new(state.repo.clone(), state.service.clone())
        .execute(&token, Utc::now())
        .await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}
