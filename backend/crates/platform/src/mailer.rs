//! Transactional email
//!
//! Sends HTML mail through an HTTP email API (Resend-compatible JSON
//! endpoint). Without an API key the mailer runs disabled: messages are
//! logged and dropped so local development needs no mail account.

use std::time::Duration;

use kernel::AppError;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub from: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_EMAIL_API_URL.to_string(),
            from: "Marketplace <no-reply@localhost>".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Email API rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::bad_gateway("Email could not be sent").with_source(err)
    }
}

/// One outgoing message.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct Mailer {
    client: reqwest::Client,
    config: MailerConfig,
}

impl Mailer {
    pub fn new(config: MailerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }

    /// Mailer that never leaves the process.
    pub fn disabled() -> Self {
        Self::new(MailerConfig::default())
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                "Email delivery disabled, message dropped"
            );
            return Ok(());
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&SendRequest {
                from: &self.config.from,
                to: [&message.to],
                subject: &message.subject,
                html: &message.html,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }

    /// Send without failing the caller. Delivery problems are logged.
    pub async fn send_best_effort(&self, message: EmailMessage) {
        if let Err(e) = self.send(&message).await {
            tracing::warn!(error = %e, to = %message.to, "Email delivery failed");
        }
    }
}

/// Inline HTML bodies for the mails the marketplace sends.
pub mod templates {
    use super::EmailMessage;

    fn layout(title: &str, body: &str) -> String {
        format!(
            "<!doctype html><html><body style=\"font-family:sans-serif;max-width:560px;margin:auto\">\
             <h2>{title}</h2>{body}\
             <p style=\"color:#888;font-size:12px\">You received this email because of activity on your account.</p>\
             </body></html>",
            title = escape(title),
        )
    }

    pub fn escape(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for ch in raw.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&#39;"),
                _ => out.push(ch),
            }
        }
        out
    }

    pub fn verification_code(to: &str, name: &str, code: &str, ttl_minutes: i64) -> EmailMessage {
        let body = format!(
            "<p>Hi {},</p><p>Your verification code is:</p>\
             <p style=\"font-size:28px;letter-spacing:6px\"><b>{}</b></p>\
             <p>The code expires in {} minutes.</p>",
            escape(name),
            escape(code),
            ttl_minutes
        );
        EmailMessage {
            to: to.to_string(),
            subject: "Verify your email".to_string(),
            html: layout("Verify your email", &body),
        }
    }

    pub fn password_reset(to: &str, name: &str, reset_url: &str, ttl_minutes: i64) -> EmailMessage {
        let body = format!(
            "<p>Hi {},</p><p>We received a request to reset your password.</p>\
             <p><a href=\"{}\">Reset password</a></p>\
             <p>The link expires in {} minutes. If you did not ask for this, ignore this email.</p>",
            escape(name),
            escape(reset_url),
            ttl_minutes
        );
        EmailMessage {
            to: to.to_string(),
            subject: "Reset your password".to_string(),
            html: layout("Password reset", &body),
        }
    }

    pub fn welcome(to: &str, name: &str) -> EmailMessage {
        let body = format!(
            "<p>Hi {},</p><p>Your account is verified. Happy shopping!</p>",
            escape(name)
        );
        EmailMessage {
            to: to.to_string(),
            subject: "Welcome aboard".to_string(),
            html: layout("Welcome", &body),
        }
    }

    pub fn order_receipt(
        to: &str,
        name: &str,
        reference: &str,
        lines: &[(String, i64)],
        total_minor: i64,
        currency: &str,
    ) -> EmailMessage {
        let rows: String = lines
            .iter()
            .map(|(title, amount)| {
                format!(
                    "<tr><td>{}</td><td style=\"text-align:right\">{}</td></tr>",
                    escape(title),
                    format_amount(*amount, currency)
                )
            })
            .collect();
        let body = format!(
            "<p>Hi {},</p><p>Thanks for your purchase. Payment reference <b>{}</b>.</p>\
             <table width=\"100%\">{}<tr><td><b>Total</b></td>\
             <td style=\"text-align:right\"><b>{}</b></td></tr></table>\
             <p>Your downloads are available from your orders page.</p>",
            escape(name),
            escape(reference),
            rows,
            format_amount(total_minor, currency)
        );
        EmailMessage {
            to: to.to_string(),
            subject: format!("Receipt for payment {reference}"),
            html: layout("Payment received", &body),
        }
    }

    pub fn withdrawal_update(to: &str, name: &str, amount_minor: i64, currency: &str, status: &str) -> EmailMessage {
        let body = format!(
            "<p>Hi {},</p><p>Your withdrawal of <b>{}</b> is now <b>{}</b>.</p>",
            escape(name),
            format_amount(amount_minor, currency),
            escape(status)
        );
        EmailMessage {
            to: to.to_string(),
            subject: format!("Withdrawal {status}"),
            html: layout("Withdrawal update", &body),
        }
    }

    /// `150050` minor units of NGN renders as `NGN 1,500.50`.
    pub fn format_amount(minor: i64, currency: &str) -> String {
        let sign = if minor < 0 { "-" } else { "" };
        let minor = minor.unsigned_abs();
        let major = (minor / 100).to_string();
        let mut grouped = String::with_capacity(major.len() + major.len() / 3);
        for (i, ch) in major.chars().enumerate() {
            if i > 0 && (major.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        format!("{currency} {sign}{grouped}.{:02}", minor % 100)
    }
}
