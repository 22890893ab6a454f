//! Session issuance: password and refresh-token login flows.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Device, MembershipFilter, MembershipRole, MembershipStatus, User};
use crate::store::{DeviceStore, MembershipStore, UserStore};
use crate::utils::refresh_token_value;

use super::error::ServiceError;
use super::jwt::{JwtService, LoginClaims, JWT_LOGIN_ISSUER, LOGIN_SCOPE};

/// The form payload of `POST /identity/connect/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectData {
    pub grant_type: GrantType,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default, rename = "deviceIdentifier")]
    pub device_identifier: Option<String>,
    #[serde(default, rename = "deviceName")]
    pub device_name: Option<String>,
    #[serde(default, rename = "deviceType")]
    pub device_type: Option<String>,
    #[serde(default, rename = "devicePushToken")]
    pub device_push_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    RefreshToken,
    Password,
    ClientCredentials,
}

impl ConnectData {
    /// Field-presence validation per grant type, before any storage access.
    pub fn validate(&self) -> Result<(), ServiceError> {
        fn require(field: &Option<String>, name: &str) -> Result<(), ServiceError> {
            match field.as_deref() {
                Some(value) if !value.is_empty() => Ok(()),
                _ => Err(ServiceError::Validation(format!("{name} is required"))),
            }
        }

        match self.grant_type {
            GrantType::RefreshToken => require(&self.refresh_token, "refresh_token"),
            GrantType::Password => {
                require(&self.client_id, "client_id")?;
                require(&self.password, "password")?;
                require(&self.scope, "scope")?;
                require(&self.username, "username")?;
                require(&self.device_identifier, "device_identifier")?;
                require(&self.device_name, "device_name")?;
                require(&self.device_type, "device_type")?;
                Ok(())
            }
            GrantType::ClientCredentials => Ok(()),
        }
    }
}

/// Session response, in the wire casing clients expect.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
    pub refresh_token: String,

    #[serde(rename = "Key")]
    pub key: Option<String>,
    #[serde(rename = "PrivateKey")]
    pub private_key: Option<String>,

    #[serde(rename = "Kdf")]
    pub kdf: i32,
    #[serde(rename = "KdfIterations")]
    pub kdf_iterations: i32,
    #[serde(rename = "ResetMasterPassword")]
    pub reset_master_password: bool,
    pub scope: String,
    #[serde(rename = "unofficialServer")]
    pub unofficial_server: bool,
}

/// Orchestrates the two login flows: verifies credentials, resolves the
/// device, mints the signed access token and persists device state.
#[derive(Clone)]
pub struct SessionService {
    users: Arc<dyn UserStore>,
    devices: Arc<dyn DeviceStore>,
    memberships: Arc<dyn MembershipStore>,
    jwt: JwtService,
    mail_enabled: bool,
}

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        devices: Arc<dyn DeviceStore>,
        memberships: Arc<dyn MembershipStore>,
        jwt: JwtService,
        mail_enabled: bool,
    ) -> Self {
        Self {
            users,
            devices,
            memberships,
            jwt,
            mail_enabled,
        }
    }

    pub async fn password_login(&self, data: &ConnectData) -> Result<SessionResponse, ServiceError> {
        // Unconditional, before any store access.
        if data.scope.as_deref() != Some(LOGIN_SCOPE) {
            return Err(ServiceError::ScopeNotSupported);
        }

        let username = data.username.as_deref().unwrap_or_default();
        let user = self
            .users
            .find_by_email(username)
            .await?
            .ok_or_else(|| {
                tracing::info!(email = %username, "login for unknown user");
                ServiceError::InvalidCredentials
            })?;

        let password = data.password.as_deref().unwrap_or_default();
        if !crate::utils::verify_password(
            password,
            &user.salt,
            &user.password_hash,
            user.password_iterations,
        ) {
            tracing::info!(email = %username, "password mismatch");
            return Err(ServiceError::InvalidCredentials);
        }

        if !user.enabled {
            tracing::info!(email = %username, "login for disabled user");
            return Err(ServiceError::UserDisabled);
        }

        if self.mail_enabled && user.verified_at.is_none() {
            tracing::info!(email = %username, "login for unverified user");
            return Err(ServiceError::UserNotVerified);
        }

        let device_id = data
            .device_identifier
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| {
                ServiceError::Validation("device_identifier must be a UUID".to_string())
            })?;

        // Find-or-create with ownership verification: a device id known but
        // owned by a different user is treated as not-found and replaced.
        let mut device = match self.devices.find_by_id(device_id).await? {
            Some(existing) if existing.user_id == user.id => existing,
            _ => {
                let atype = data
                    .device_type
                    .as_deref()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(0);
                Device::new(
                    device_id,
                    user.id,
                    data.device_name.clone().unwrap_or_default(),
                    atype,
                )
            }
        };

        let access_token = self.mint_access_token(&user, &mut device).await?;
        self.devices.save(&device).await?;

        Ok(self.session_response(access_token, &user, &device))
    }

    pub async fn refresh_login(&self, refresh_token: &str) -> Result<SessionResponse, ServiceError> {
        let mut device = self
            .devices
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                tracing::debug!("refresh with unknown token");
                ServiceError::InvalidGrant
            })?;

        let user = self
            .users
            .find_by_id(device.user_id)
            .await?
            .ok_or(ServiceError::InvalidGrant)?;

        let access_token = self.mint_access_token(&user, &mut device).await?;
        self.devices.save(&device).await?;

        Ok(self.session_response(access_token, &user, &device))
    }

    /// Shared mint routine. Generates the device's refresh token if it has
    /// none yet (the value never rotates afterwards), buckets the user's
    /// Confirmed org ids by role for the advisory claim lists, signs, and
    /// bumps `updated_at` on the in-memory device; the caller persists.
    async fn mint_access_token(
        &self,
        user: &User,
        device: &mut Device,
    ) -> Result<String, ServiceError> {
        if device.refresh_token.is_none() {
            device.refresh_token = Some(refresh_token_value());
        }

        let memberships = self
            .memberships
            .find(&MembershipFilter {
                user_id: Some(user.id),
                status: Some(MembershipStatus::Confirmed),
                ..Default::default()
            })
            .await?;

        let mut orgowner = Vec::new();
        let mut orgadmin = Vec::new();
        let mut orguser = Vec::new();
        let mut orgmanager = Vec::new();
        for membership in memberships {
            match membership.role {
                MembershipRole::Owner => orgowner.push(membership.org_id),
                MembershipRole::Admin => orgadmin.push(membership.org_id),
                MembershipRole::User => orguser.push(membership.org_id),
                MembershipRole::Manager => orgmanager.push(membership.org_id),
            }
        }

        let now = Utc::now();
        let claims = LoginClaims {
            nbf: now.timestamp(),
            exp: (now + self.jwt.validity()).timestamp(),
            iss: JWT_LOGIN_ISSUER.to_string(),
            sub: user.id,
            premium: true,
            name: user.name.clone(),
            email: user.email.clone(),
            email_verified: !self.mail_enabled || user.verified_at.is_some(),
            sstamp: user.security_stamp.clone(),
            device: device.id,
            scope: vec!["api".to_string(), "offline_access".to_string()],
            amr: vec!["Application".to_string()],
            orgowner,
            orgadmin,
            orguser,
            orgmanager,
        };

        let access_token = self
            .jwt
            .issue(&claims)
            .map_err(|e| ServiceError::Internal(anyhow::Error::new(e)))?;

        device.updated_at = now;
        Ok(access_token)
    }

    fn session_response(
        &self,
        access_token: String,
        user: &User,
        device: &Device,
    ) -> SessionResponse {
        SessionResponse {
            access_token,
            expires_in: self.jwt.validity_seconds(),
            token_type: "Bearer".to_string(),
            refresh_token: device.refresh_token.clone().unwrap_or_default(),
            key: user.akey.clone(),
            private_key: user.private_key.clone(),
            kdf: user.kdf_type,
            kdf_iterations: user.kdf_iterations,
            reset_master_password: false,
            scope: LOGIN_SCOPE.to_string(),
            unofficial_server: true,
        }
    }
}
