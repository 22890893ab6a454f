//! Account endpoints behind the base gate.

use crate::middleware::AuthUser;

/// Epoch millis of the account's last change; clients poll this to decide
/// whether a sync is due.
pub async fn revision_date(AuthUser(user): AuthUser) -> String {
    user.updated_at.timestamp_millis().to_string()
}
