//! Request identity
//!
//! The built-in operator is a distinct variant rather than a reserved
//! account id: `account_ref()` is the only way to obtain a storable
//! reference, and it returns `None` for the built-in operator, so a
//! sentinel can never leak into a relational field.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use shared::chat::Sender;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Identity {
    /// Privileged built-in operator, not backed by a user row.
    BuiltinAdmin,
    /// Persisted account.
    Account {
        id: RecordId,
        name: String,
        role: Role,
    },
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        match self {
            Identity::BuiltinAdmin => true,
            Identity::Account { role, .. } => *role == Role::Admin,
        }
    }

    /// Storable account reference; `None` for the built-in operator.
    pub fn account_ref(&self) -> Option<&RecordId> {
        match self {
            Identity::BuiltinAdmin => None,
            Identity::Account { id, .. } => Some(id),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Identity::BuiltinAdmin => "Support",
            Identity::Account { name, .. } => name,
        }
    }

    /// Which chat side this identity speaks for.
    pub fn chat_sender(&self) -> Sender {
        if self.is_admin() {
            Sender::Admin
        } else {
            Sender::User
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_admin_has_no_storable_ref() {
        let identity = Identity::BuiltinAdmin;
        assert!(identity.is_admin());
        assert!(identity.account_ref().is_none());
        assert_eq!(identity.chat_sender(), Sender::Admin);
    }

    #[test]
    fn customer_speaks_as_user() {
        let identity = Identity::Account {
            id: RecordId::from_table_key("user", "u1"),
            name: "Ana".into(),
            role: Role::Customer,
        };
        assert!(!identity.is_admin());
        assert_eq!(identity.chat_sender(), Sender::User);
        assert!(identity.account_ref().is_some());
    }
}
