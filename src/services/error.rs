use thiserror::Error;

use crate::store::StoreError;

/// Failures surfaced by the auth core. Credential failures deliberately share
/// one caller-facing message so the response body never discloses whether the
/// email exists or the password was wrong.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Scope not supported")]
    ScopeNotSupported,

    #[error("{0}")]
    Validation(String),

    #[error("Username or password is incorrect. Try again")]
    InvalidCredentials,

    #[error("This user has been disabled")]
    UserDisabled,

    #[error("User is not verified")]
    UserNotVerified,

    #[error("Invalid refresh token")]
    InvalidGrant,

    #[error("Invalid token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("The specified user isn't member of the organization")]
    MembershipNotFound,

    #[error("{0}")]
    PermissionDenied(&'static str),

    #[error("Can't delete the last owner")]
    LastOwner,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
