//! Cipher model - the vault record whose access the resolver decides.
//!
//! Cipher CRUD itself lives outside this core; only the ownership fields are
//! consulted here.

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherType {
    Login,
    SecureNote,
    Card,
    Identity,
}

impl CipherType {
    pub fn code(self) -> i32 {
        match self {
            CipherType::Login => 1,
            CipherType::SecureNote => 2,
            CipherType::Card => 3,
            CipherType::Identity => 4,
        }
    }
}

/// A vault record. Owned either personally (`user_id`) or by an organization
/// (`org_id`); the two are mutually exclusive in practice but both are kept
/// optional to match the storage shape.
#[derive(Debug, Clone)]
pub struct Cipher {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub org_id: Option<Uuid>,

    pub atype: CipherType,
    pub name: String,
    pub notes: Option<String>,
    /// Encrypted payload, opaque to the server.
    pub data: serde_json::Value,

    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cipher {
    pub fn personal(user_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            org_id: None,
            atype: CipherType::Login,
            name,
            notes: None,
            data: serde_json::Value::Null,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn organizational(org_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: None,
            org_id: Some(org_id),
            atype: CipherType::Login,
            name,
            notes: None,
            data: serde_json::Value::Null,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
