//! Server configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | DATA_DIR | (unset = in-memory) | Database directory |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | Runtime environment |
//! | LOG_DIR | (unset = stdout) | Rolling log file directory |
//! | JWT_SECRET | dev secret | Token signing key |
//! | JWT_EXPIRATION_MINUTES | 1440 | Token lifetime |
//! | PAYMENT_API_URL | https://api.stripe.com | Payment gateway base URL |
//! | PAYMENT_SECRET_KEY | (unset = offline mode) | Gateway API key |
//! | CHECKOUT_SUCCESS_URL | http://localhost:5173/checkout/success | Redirect after payment |
//! | CHECKOUT_CANCEL_URL | http://localhost:5173/checkout/cancel | Redirect on abort |
//! | MAIL_API_URL | (unset = disabled) | Outbound mail endpoint |
//! | MAIL_FROM | store@localhost | Sender address |
//! | REALTIME_CHANNEL_CAPACITY | 256 | Per-channel event buffer |

const DEV_JWT_SECRET: &str = "development-only-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    /// Database directory. `None` runs the embedded store in memory.
    pub data_dir: Option<String>,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Rolling log file directory (stdout when unset)
    pub log_dir: Option<String>,
    /// JWT signing secret
    pub jwt_secret: String,
    /// JWT token lifetime in minutes
    pub jwt_expiration_minutes: i64,
    /// Payment gateway base URL
    pub payment_api_url: String,
    /// Payment gateway API key; empty switches the gateway to offline mode
    pub payment_secret_key: String,
    /// Redirect target after a successful checkout
    pub checkout_success_url: String,
    /// Redirect target after an aborted checkout
    pub checkout_cancel_url: String,
    /// Outbound mail endpoint (mailer disabled when unset)
    pub mail_api_url: Option<String>,
    /// Sender address for outbound mail
    pub mail_from: String,
    /// Buffered events per realtime channel
    pub realtime_channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, using development secret");
            DEV_JWT_SECRET.into()
        });

        Self {
            data_dir: std::env::var("DATA_DIR").ok(),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            jwt_secret,
            jwt_expiration_minutes: std::env::var("JWT_EXPIRATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1440),
            payment_api_url: std::env::var("PAYMENT_API_URL")
                .unwrap_or_else(|_| "https://api.stripe.com".into()),
            payment_secret_key: std::env::var("PAYMENT_SECRET_KEY").unwrap_or_default(),
            checkout_success_url: std::env::var("CHECKOUT_SUCCESS_URL")
                .unwrap_or_else(|_| "http://localhost:5173/checkout/success".into()),
            checkout_cancel_url: std::env::var("CHECKOUT_CANCEL_URL")
                .unwrap_or_else(|_| "http://localhost:5173/checkout/cancel".into()),
            mail_api_url: std::env::var("MAIL_API_URL").ok(),
            mail_from: std::env::var("MAIL_FROM").unwrap_or_else(|_| "store@localhost".into()),
            realtime_channel_capacity: std::env::var("REALTIME_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(256),
        }
    }

    /// In-memory configuration for tests and local experiments.
    pub fn ephemeral() -> Self {
        Self {
            data_dir: None,
            http_port: 0,
            environment: "test".into(),
            log_dir: None,
            jwt_secret: DEV_JWT_SECRET.into(),
            jwt_expiration_minutes: 60,
            payment_api_url: "https://api.stripe.com".into(),
            payment_secret_key: String::new(),
            checkout_success_url: "http://localhost/checkout/success".into(),
            checkout_cancel_url: "http://localhost/checkout/cancel".into(),
            mail_api_url: None,
            mail_from: "store@localhost".into(),
            realtime_channel_capacity: 64,
        }
    }
}
