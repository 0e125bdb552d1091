//! External service adapters
//!
//! Thin clients for collaborators the core treats as opaque: the
//! payment gateway (blocking for checkout) and the outbound mailer
//! (fire-and-forget, never blocking).

pub mod mailer;
pub mod payment;

pub use mailer::Mailer;
pub use payment::{CheckoutSession, PaymentGateway};
