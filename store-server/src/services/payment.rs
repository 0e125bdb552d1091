//! Payment gateway adapter
//!
//! Opaque "create checkout session, get a redirect URL" call. Checkout
//! creation is the primary operation, so gateway failures surface as
//! `Upstream` errors and block it. Without an API key the gateway runs
//! in offline mode and synthesizes sessions locally (development and
//! tests).

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::Config;
use crate::utils::{AppError, AppResult};

/// Created gateway session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

#[derive(Debug)]
enum Mode {
    Live {
        http: reqwest::Client,
        base_url: String,
        secret_key: String,
        success_url: String,
        cancel_url: String,
    },
    Offline,
}

#[derive(Debug)]
pub struct PaymentGateway {
    mode: Mode,
}

impl PaymentGateway {
    pub fn from_config(config: &Config) -> Self {
        if config.payment_secret_key.is_empty() {
            tracing::warn!("PAYMENT_SECRET_KEY not set, payment gateway running offline");
            return Self::offline();
        }
        Self {
            mode: Mode::Live {
                http: reqwest::Client::new(),
                base_url: config.payment_api_url.clone(),
                secret_key: config.payment_secret_key.clone(),
                success_url: config.checkout_success_url.clone(),
                cancel_url: config.checkout_cancel_url.clone(),
            },
        }
    }

    pub fn offline() -> Self {
        Self {
            mode: Mode::Offline,
        }
    }

    /// Create a checkout session for the given order reference and total.
    pub async fn create_checkout_session(
        &self,
        reference: &str,
        total: Decimal,
    ) -> AppResult<CheckoutSession> {
        // Gateways take amounts in minor units
        let amount = (total * Decimal::from(100))
            .round_dp(0)
            .to_i64()
            .ok_or_else(|| AppError::validation("order total out of range"))?;

        match &self.mode {
            Mode::Offline => {
                let session_id = format!("cs_offline_{}", Uuid::new_v4().simple());
                Ok(CheckoutSession {
                    url: format!("https://checkout.localhost/session/{session_id}"),
                    session_id,
                })
            }
            Mode::Live {
                http,
                base_url,
                secret_key,
                success_url,
                cancel_url,
            } => {
                let response = http
                    .post(format!("{base_url}/v1/checkout/sessions"))
                    .bearer_auth(secret_key)
                    .form(&[
                        ("mode", "payment"),
                        ("client_reference_id", reference),
                        ("line_items[0][price_data][currency]", "usd"),
                        (
                            "line_items[0][price_data][unit_amount]",
                            &amount.to_string(),
                        ),
                        ("line_items[0][price_data][product_data][name]", reference),
                        ("line_items[0][quantity]", "1"),
                        ("success_url", success_url),
                        ("cancel_url", cancel_url),
                    ])
                    .send()
                    .await
                    .map_err(|e| AppError::upstream(format!("payment gateway unreachable: {e}")))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::upstream(format!(
                        "payment gateway rejected session ({status}): {body}"
                    )));
                }

                let session: SessionResponse = response.json().await.map_err(|e| {
                    AppError::upstream(format!("malformed gateway response: {e}"))
                })?;
                Ok(CheckoutSession {
                    session_id: session.id,
                    url: session.url,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_gateway_synthesizes_sessions() {
        let gateway = PaymentGateway::offline();
        let session = gateway
            .create_checkout_session("SO202608070001", Decimal::new(12999, 2))
            .await
            .unwrap();
        assert!(session.session_id.starts_with("cs_offline_"));
        assert!(session.url.contains(&session.session_id));
    }
}
