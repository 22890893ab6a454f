//! Session token codec: RS256 signing and validation of login claims.

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keys::RsaKeyPair;

/// Issuer tag stamped into login tokens.
pub const JWT_LOGIN_ISSUER: &str = "|login";

/// The only scope the identity endpoint accepts.
pub const LOGIN_SCOPE: &str = "api offline_access";

/// Claims carried by an access token.
///
/// The four org-id lists are advisory, bucketed at issuance for client
/// display; authorization always re-resolves membership from storage so that
/// revocations take effect without re-login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginClaims {
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub sub: Uuid,

    pub premium: bool,
    pub name: String,
    pub email: String,
    pub email_verified: bool,

    /// The user's security stamp at issuance time.
    pub sstamp: String,
    pub device: Uuid,
    pub scope: Vec<String>,
    pub amr: Vec<String>,

    pub orgowner: Vec<Uuid>,
    pub orgadmin: Vec<Uuid>,
    pub orguser: Vec<Uuid>,
    pub orgmanager: Vec<Uuid>,
}

/// Signs and parses session tokens with the process keypair.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl JwtService {
    pub fn new(keys: &RsaKeyPair, validity_seconds: i64) -> Self {
        Self {
            encoding_key: keys.encoding.clone(),
            decoding_key: keys.decoding.clone(),
            validity: Duration::seconds(validity_seconds),
        }
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn validity_seconds(&self) -> i64 {
        self.validity.num_seconds()
    }

    pub fn issue(&self, claims: &LoginClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key)
    }

    /// Verify signature and time window. Zero leeway: a token is invalid the
    /// second it expires, and before its `nbf`.
    pub fn decode(&self, token: &str) -> Result<LoginClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_nbf = true;

        decode::<LoginClaims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}
