//! Authentication module
//!
//! Token handling and the request identity. The storefront's login and
//! registration surfaces live outside this service; what this module
//! guarantees is that every authenticated request resolves to a typed
//! [`Identity`] (a persisted account or the built-in operator), so no
//! downstream code ever compares magic sentinel ids.

pub mod extractor;
pub mod identity;
pub mod jwt;

pub use extractor::{AdminUser, CurrentUser};
pub use identity::{Identity, Role};
pub use jwt::{JwtError, JwtService};
