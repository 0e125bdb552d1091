//! Outbound mail adapter
//!
//! Opaque "send templated email" call. Sends are fired on a detached
//! task and never block order or chat flow; failures are logged only.

use std::sync::Arc;

use serde_json::json;

use crate::core::Config;

#[derive(Debug)]
struct MailerInner {
    http: reqwest::Client,
    endpoint: String,
    from: String,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    inner: Option<Arc<MailerInner>>,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        match &config.mail_api_url {
            Some(endpoint) => Self {
                inner: Some(Arc::new(MailerInner {
                    http: reqwest::Client::new(),
                    endpoint: endpoint.clone(),
                    from: config.mail_from.clone(),
                })),
            },
            None => {
                tracing::warn!("MAIL_API_URL not set, outbound mail disabled");
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Queue a templated email. Returns immediately.
    pub fn send(&self, recipient: impl Into<String>, template: &'static str, context: serde_json::Value) {
        let recipient = recipient.into();
        let Some(inner) = self.inner.clone() else {
            tracing::debug!(recipient, template, "Mail disabled, skipping send");
            return;
        };

        tokio::spawn(async move {
            let payload = json!({
                "from": inner.from,
                "to": recipient,
                "template": template,
                "context": context,
            });
            let result = inner
                .http
                .post(&inner.endpoint)
                .json(&payload)
                .send()
                .await
                .and_then(|r| r.error_for_status());
            if let Err(e) = result {
                tracing::warn!(recipient, template, error = %e, "Outbound mail failed");
            }
        });
    }
}
