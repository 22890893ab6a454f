//! Collection grant model - per-user, per-collection access overrides.

use uuid::Uuid;

/// Per-user override for a single collection, consulted only when the user's
/// membership grants neither `access_all` nor an elevated role.
#[derive(Debug, Clone)]
pub struct CollectionGrant {
    pub collection_id: Uuid,
    pub user_id: Uuid,
    pub read_only: bool,
    pub hide_passwords: bool,
}

/// Collection flags as sent by clients when (re)assigning members.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct CollectionAssignment {
    #[serde(rename = "Id")]
    pub id: Uuid,
    #[serde(rename = "ReadOnly")]
    pub read_only: bool,
    #[serde(rename = "HidePasswords", default)]
    pub hide_passwords: bool,
}
