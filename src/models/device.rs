//! Device model - one row per client installation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A client installation. The id is supplied by the client and stays stable
/// across re-logins; the refresh token is server-generated and device-bound,
/// one active value per device.
#[derive(Debug, Clone)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,

    pub name: String,
    /// Client device-type code (mobile, browser, cli, ...), opaque here.
    pub atype: i32,
    pub push_token: Option<String>,

    /// `None` until the first access token is minted for this device.
    pub refresh_token: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Device {
    pub fn new(id: Uuid, user_id: Uuid, name: String, atype: i32) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            name,
            atype,
            push_token: None,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }
}
