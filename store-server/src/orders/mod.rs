//! Order domain
//!
//! - [`checkout`]: order creation (payment session, snapshot, fan-out)
//! - [`status`]: the status state machine and its stock side effects
//!
//! ```text
//! pending ──► shipped ──► delivered
//!    │           │
//!    └───────────┴──────► cancelled
//! ```
//!
//! Stock moves on exactly two edges: entering `shipped` decrements,
//! and `shipped → cancelled` restores.

pub mod checkout;
pub mod status;

pub use checkout::{CheckoutItemInput, CheckoutOutcome, CheckoutService};
pub use status::{OrderStatusService, TransitionOutcome};
