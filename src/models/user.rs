//! User model - vault account records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default client-side KDF parameters advertised to clients (PBKDF2).
pub const CLIENT_KDF_TYPE_DEFAULT: i32 = 0;
pub const CLIENT_KDF_ITER_DEFAULT: i32 = 100_000;

/// A vault account. The server never sees the master password itself; clients
/// send a derived hash which is stretched again with `salt` and
/// `password_iterations` before storage.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,

    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    pub password_iterations: u32,
    pub password_hint: Option<String>,

    /// Account symmetric key, encrypted with the user's master key.
    pub akey: Option<String>,
    /// Account RSA keypair, managed client-side.
    pub private_key: Option<String>,
    pub public_key: Option<String>,

    /// KDF parameters the client must use to derive the master key.
    pub kdf_type: i32,
    pub kdf_iterations: i32,

    /// Rotated to invalidate every outstanding session for this user.
    pub security_stamp: String,
    /// Serialized [`StampException`], if a grace window is active.
    pub stamp_exception: Option<String>,

    pub verified_at: Option<DateTime<Utc>>,
    pub enabled: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash: Vec::new(),
            salt: Vec::new(),
            password_iterations: 0,
            password_hint: None,
            akey: None,
            private_key: None,
            public_key: None,
            kdf_type: CLIENT_KDF_TYPE_DEFAULT,
            kdf_iterations: CLIENT_KDF_ITER_DEFAULT,
            security_stamp: Uuid::new_v4().to_string(),
            stamp_exception: None,
            verified_at: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Parse the stored stamp exception, if any. A present-but-unparsable
    /// value is reported as `None`; callers treat both the same way.
    pub fn stamp_exception(&self) -> Option<StampException> {
        self.stamp_exception
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// A time-boxed grace window letting sessions minted under a prior security
/// stamp keep hitting the listed routes, typically while a client finishes a
/// settings change that rotated the stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampException {
    pub routes: Vec<String>,
    pub security_stamp: String,
    pub expire: DateTime<Utc>,
}

/// Sparse patch for [`User`]; only `Some` fields are applied by the store.
/// `stamp_exception` is doubly optional so a patch can clear it.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub id: Uuid,

    pub name: Option<String>,
    pub password_hash: Option<Vec<u8>>,
    pub salt: Option<Vec<u8>>,
    pub password_iterations: Option<u32>,
    pub password_hint: Option<Option<String>>,
    pub akey: Option<String>,
    pub private_key: Option<String>,
    pub public_key: Option<String>,
    pub kdf_type: Option<i32>,
    pub kdf_iterations: Option<i32>,
    pub security_stamp: Option<String>,
    pub stamp_exception: Option<Option<String>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub enabled: Option<bool>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserUpdate {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Patch that removes an expired stamp exception.
    pub fn clear_stamp_exception(id: Uuid) -> Self {
        Self {
            id,
            stamp_exception: Some(None),
            ..Default::default()
        }
    }
}
