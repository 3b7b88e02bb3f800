//! Payment Use Cases
//!
//! A payment is opened against a pending order, then settled either by the
//! buyer polling `verify` or by the gateway's webhook, whichever lands first.
//! Settlement is idempotent: only a pending payment transitions.

use std::sync::Arc;

use auth::CurrentUser;
use chrono::{DateTime, Utc};
use kernel::AppError;
use kernel::id::OrderId;
use platform::mailer::{Mailer, templates};
use platform::paystack::{InitializeRequest, PaystackClient, TransactionData, WebhookEvent};
use serde_json::json;

use crate::domain::entity::{Payment, PaymentStatus, Settlement};
use crate::domain::repository::{OrderRepository, PaymentRepository};
use crate::error::{CommerceError, CommerceResult};

/// Webhook event that completes a payment.
pub const CHARGE_SUCCESS: &str = "charge.success";

#[derive(Debug, Clone)]
pub struct InitializedPayment {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

pub struct InitializePaymentUseCase<S>
where
    S: OrderRepository + PaymentRepository,
{
    store: Arc<S>,
    gateway: PaystackClient,
}

impl<S> InitializePaymentUseCase<S>
where
    S: OrderRepository + PaymentRepository,
{
    pub fn new(store: Arc<S>, gateway: PaystackClient) -> Self {
        Self { store, gateway }
    }

    pub async fn execute(
        &self,
        user: &CurrentUser,
        order_id: &OrderId,
        callback_url: Option<String>,
    ) -> CommerceResult<InitializedPayment> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or(CommerceError::OrderNotFound)?;
        if order.user_id != user.id {
            return Err(CommerceError::NotOrderOwner);
        }
        if !order.is_pending() {
            return Err(CommerceError::OrderNotPending(order.status.code()));
        }

        let reference = Payment::new_reference();
        let initialized = self
            .gateway
            .initialize(InitializeRequest {
                email: user.email.as_str().to_string(),
                amount: order.total,
                reference: reference.clone(),
                currency: order.currency.clone(),
                callback_url,
                metadata: json!({
                    "orderId": order.id,
                    "userId": user.id,
                }),
            })
            .await?;

        let payment = Payment::new(&order, reference, Utc::now());
        self.store.create_payment(&payment).await?;

        tracing::info!(
            order_id = %order.id,
            reference = %payment.reference,
            amount = payment.amount,
            "Payment initialized"
        );
        Ok(InitializedPayment {
            authorization_url: initialized.authorization_url,
            access_code: initialized.access_code,
            reference: payment.reference,
        })
    }
}

/// Applies a gateway verdict to the stored payment.
pub struct SettlePaymentUseCase<P>
where
    P: PaymentRepository,
{
    payments: Arc<P>,
    mailer: Mailer,
    fee_percent: u8,
}

impl<P> SettlePaymentUseCase<P>
where
    P: PaymentRepository,
{
    pub fn new(payments: Arc<P>, mailer: Mailer, fee_percent: u8) -> Self {
        Self {
            payments,
            mailer,
            fee_percent,
        }
    }

    /// Returns the payment status after settlement.
    pub async fn settle(&self, transaction: &TransactionData) -> CommerceResult<PaymentStatus> {
        let payment = self
            .payments
            .find_payment_by_reference(&transaction.reference)
            .await?
            .ok_or(CommerceError::PaymentNotFound)?;
        if !payment.is_pending() {
            return Ok(payment.status);
        }

        let now = Utc::now();
        let short = transaction.is_successful() && transaction.amount < payment.amount;
        if !transaction.is_successful() && !transaction.is_failed() {
            tracing::debug!(
                reference = %payment.reference,
                gateway_status = %transaction.status,
                "Payment still in progress"
            );
            return Ok(PaymentStatus::Pending);
        }
        if transaction.is_failed() || short {
            if self.payments.fail_payment(&payment.reference, now).await? {
                tracing::warn!(
                    reference = %payment.reference,
                    gateway_status = %transaction.status,
                    paid = transaction.amount,
                    expected = payment.amount,
                    "Payment failed"
                );
                return Ok(PaymentStatus::Failed);
            }
            return self.current_status(&payment.reference).await;
        }

        let settlement = Settlement {
            channel: transaction.channel.clone(),
            paid_at: parse_paid_at(transaction.paid_at.as_deref()).unwrap_or(now),
            fee_percent: self.fee_percent,
        };
        let Some(completed) = self
            .payments
            .complete_payment(&payment.reference, &settlement)
            .await?
        else {
            // Settled concurrently by the other path.
            return self.current_status(&payment.reference).await;
        };

        tracing::info!(
            reference = %completed.reference,
            order_id = %completed.order_id,
            total = completed.total,
            "Payment completed"
        );
        self.mailer
            .send_best_effort(templates::order_receipt(
                &completed.buyer_email,
                &completed.buyer_name,
                &completed.reference,
                &completed.lines,
                completed.total,
                &completed.currency,
            ))
            .await;
        Ok(PaymentStatus::Success)
    }

    async fn current_status(&self, reference: &str) -> CommerceResult<PaymentStatus> {
        Ok(self
            .payments
            .find_payment_by_reference(reference)
            .await?
            .map(|p| p.status)
            .unwrap_or_default())
    }
}

fn parse_paid_at(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[derive(Debug, Clone)]
pub struct VerifiedPayment {
    pub reference: String,
    pub order_id: OrderId,
    pub status: PaymentStatus,
}

pub struct VerifyPaymentUseCase<P>
where
    P: PaymentRepository,
{
    payments: Arc<P>,
    gateway: PaystackClient,
    settle: SettlePaymentUseCase<P>,
}

impl<P> VerifyPaymentUseCase<P>
where
    P: PaymentRepository,
{
    pub fn new(payments: Arc<P>, gateway: PaystackClient, mailer: Mailer, fee_percent: u8) -> Self {
        Self {
            settle: SettlePaymentUseCase::new(payments.clone(), mailer, fee_percent),
            payments,
            gateway,
        }
    }

    /// Asks the gateway only while the payment is still pending.
    pub async fn execute(&self, user: &CurrentUser, reference: &str) -> CommerceResult<VerifiedPayment> {
        let payment = self
            .payments
            .find_payment_by_reference(reference)
            .await?
            .ok_or(CommerceError::PaymentNotFound)?;
        if !user.owns_or_admin(&payment.user_id) {
            return Err(CommerceError::NotOrderOwner);
        }

        let status = if payment.is_pending() {
            let transaction = self.gateway.verify(&payment.reference).await?;
            self.settle.settle(&transaction).await?
        } else {
            payment.status
        };

        Ok(VerifiedPayment {
            reference: payment.reference,
            order_id: payment.order_id,
            status,
        })
    }
}

/// Check the signature over the raw body, then parse it.
pub fn authenticate_webhook(
    gateway: &PaystackClient,
    signature: Option<&str>,
    body: &[u8],
) -> CommerceResult<WebhookEvent> {
    let signature = signature.ok_or(CommerceError::InvalidSignature)?;
    if !gateway.verify_signature(body, signature) {
        return Err(CommerceError::InvalidSignature);
    }
    serde_json::from_slice(body).map_err(|e| {
        AppError::bad_request("Malformed webhook payload")
            .with_detail(e.to_string())
            .into()
    })
}

pub struct HandleWebhookUseCase<P>
where
    P: PaymentRepository,
{
    settle: SettlePaymentUseCase<P>,
}

impl<P> HandleWebhookUseCase<P>
where
    P: PaymentRepository,
{
    pub fn new(payments: Arc<P>, mailer: Mailer, fee_percent: u8) -> Self {
        Self {
            settle: SettlePaymentUseCase::new(payments, mailer, fee_percent),
        }
    }

    /// Unknown references are acknowledged so the gateway stops retrying.
    pub async fn execute(&self, event: WebhookEvent) -> CommerceResult<()> {
        if event.event != CHARGE_SUCCESS {
            tracing::debug!(event = %event.event, "Webhook event ignored");
            return Ok(());
        }
        match self.settle.settle(&event.data).await {
            Ok(status) => {
                tracing::info!(
                    reference = %event.data.reference,
                    status = status.code(),
                    "Webhook processed"
                );
                Ok(())
            }
            Err(CommerceError::PaymentNotFound) => {
                tracing::warn!(reference = %event.data.reference, "Webhook for unknown payment");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::crypto::hmac_sha512_hex;
    use platform::paystack::PaystackConfig;

    fn gateway(secret: Option<&str>) -> PaystackClient {
        PaystackClient::new(PaystackConfig {
            secret_key: secret.map(str::to_string),
            ..PaystackConfig::default()
        })
    }

    #[test]
    fn test_webhook_signature_required() {
        let body = br#"{"event":"charge.success","data":{"reference":"MKT-1","status":"success","amount":100}}"#;
        let gw = gateway(Some("sk_test_abc"));

        assert!(matches!(
            authenticate_webhook(&gw, None, body),
            Err(CommerceError::InvalidSignature)
        ));
        assert!(matches!(
            authenticate_webhook(&gw, Some("deadbeef"), body),
            Err(CommerceError::InvalidSignature)
        ));

        let signature = hmac_sha512_hex(b"sk_test_abc", body);
        let event = authenticate_webhook(&gw, Some(&signature), body).unwrap();
        assert_eq!(event.event, CHARGE_SUCCESS);
        assert_eq!(event.data.reference, "MKT-1");
    }

    #[test]
    fn test_webhook_without_secret_is_rejected() {
        let body = b"{}";
        let signature = hmac_sha512_hex(b"", body);
        assert!(matches!(
            authenticate_webhook(&gateway(None), Some(&signature), body),
            Err(CommerceError::InvalidSignature)
        ));
    }

    #[test]
    fn test_signed_garbage_is_bad_request() {
        let body = b"not json";
        let signature = hmac_sha512_hex(b"sk", body);
        let err = authenticate_webhook(&gateway(Some("sk")), Some(&signature), body).unwrap_err();
        assert_eq!(err.kind(), kernel::ErrorKind::BadRequest);
    }

    mod settlement {
        use super::*;
        use crate::tests::FakePayments;
        use std::sync::atomic::Ordering;

        const REFERENCE: &str = "MKT-0123456789ABCDEF0123";
        const AMOUNT: i64 = 250_000;

        fn tx(status: &str, amount: i64) -> TransactionData {
            TransactionData {
                reference: REFERENCE.into(),
                status: status.into(),
                amount,
                currency: Some("NGN".into()),
                paid_at: Some("2026-03-01T10:15:00.000Z".into()),
                channel: Some("card".into()),
            }
        }

        fn setup() -> (Arc<FakePayments>, SettlePaymentUseCase<FakePayments>) {
            let payments = Arc::new(FakePayments::default());
            payments.open(REFERENCE, AMOUNT);
            let settle = SettlePaymentUseCase::new(payments.clone(), Mailer::disabled(), 10);
            (payments, settle)
        }

        #[tokio::test]
        async fn test_success_completes_once() {
            let (payments, settle) = setup();
            assert_eq!(settle.settle(&tx("success", AMOUNT)).await.unwrap(), PaymentStatus::Success);
            assert_eq!(settle.settle(&tx("success", AMOUNT)).await.unwrap(), PaymentStatus::Success);
            assert_eq!(payments.completed.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_in_flight_status_keeps_payment_open() {
            let (payments, settle) = setup();
            for status in ["ongoing", "pending", "processing", "abandoned"] {
                assert_eq!(
                    settle.settle(&tx(status, AMOUNT)).await.unwrap(),
                    PaymentStatus::Pending,
                    "{status}"
                );
            }
            assert_eq!(payments.status(REFERENCE), Some(PaymentStatus::Pending));

            // The charge.success webhook that follows still settles it.
            assert_eq!(settle.settle(&tx("success", AMOUNT)).await.unwrap(), PaymentStatus::Success);
            assert_eq!(payments.completed.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_short_amount_fails() {
            let (payments, settle) = setup();
            assert_eq!(
                settle.settle(&tx("success", AMOUNT - 1)).await.unwrap(),
                PaymentStatus::Failed
            );
            assert_eq!(settle.settle(&tx("success", AMOUNT)).await.unwrap(), PaymentStatus::Failed);
            assert_eq!(payments.completed.load(Ordering::SeqCst), 0);
        }

        #[tokio::test]
        async fn test_gateway_failure_is_final() {
            let (payments, settle) = setup();
            assert_eq!(settle.settle(&tx("reversed", AMOUNT)).await.unwrap(), PaymentStatus::Failed);
            assert_eq!(payments.status(REFERENCE), Some(PaymentStatus::Failed));
        }

        #[tokio::test]
        async fn test_lost_race_reports_stored_status() {
            let (payments, settle) = setup();
            payments.lose_next_race.store(true, Ordering::SeqCst);
            assert_eq!(settle.settle(&tx("success", AMOUNT)).await.unwrap(), PaymentStatus::Success);
            assert_eq!(payments.completed.load(Ordering::SeqCst), 0);
        }

        #[tokio::test]
        async fn test_unknown_reference() {
            let (_, settle) = setup();
            let mut unknown = tx("success", AMOUNT);
            unknown.reference = "MKT-NOPE".into();
            assert!(matches!(
                settle.settle(&unknown).await,
                Err(CommerceError::PaymentNotFound)
            ));
        }

        #[tokio::test]
        async fn test_webhook_events() {
            let (payments, _) = setup();
            let webhook = HandleWebhookUseCase::new(payments.clone(), Mailer::disabled(), 10);

            let other = WebhookEvent {
                event: "transfer.success".into(),
                data: tx("success", AMOUNT),
            };
            webhook.execute(other).await.unwrap();
            assert_eq!(payments.status(REFERENCE), Some(PaymentStatus::Pending));

            let mut stray = tx("success", AMOUNT);
            stray.reference = "MKT-NOPE".into();
            webhook
                .execute(WebhookEvent { event: CHARGE_SUCCESS.into(), data: stray })
                .await
                .unwrap();

            for _ in 0..2 {
                webhook
                    .execute(WebhookEvent { event: CHARGE_SUCCESS.into(), data: tx("success", AMOUNT) })
                    .await
                    .unwrap();
            }
            assert_eq!(payments.status(REFERENCE), Some(PaymentStatus::Success));
            assert_eq!(payments.completed.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_paid_at_parsing() {
        let parsed = parse_paid_at(Some("2026-03-01T10:15:00.000Z")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T10:15:00+00:00");
        assert!(parse_paid_at(Some("yesterday")).is_none());
        assert!(parse_paid_at(None).is_none());
    }
}
