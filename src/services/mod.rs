//! Services layer: the credential, token, session and permission core.

pub mod access;
pub mod error;
pub mod jwt;
pub mod keys;
pub mod membership;
pub mod session;

pub use access::{cipher_access, CipherAccess};
pub use error::ServiceError;
pub use jwt::{JwtService, LoginClaims, JWT_LOGIN_ISSUER, LOGIN_SCOPE};
pub use keys::RsaKeyPair;
pub use membership::{EditMembership, MembershipService};
pub use session::{ConnectData, GrantType, SessionResponse, SessionService};
