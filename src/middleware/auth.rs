//! Request authentication gates.
//!
//! A chain of increasingly specific middlewares, all funneling through
//! `base_auth`: bearer token -> claims -> device -> user -> security stamp.
//! The org-scoped gates additionally resolve the caller's membership and
//! check it against the gate's role set. Resolved records are put into
//! request extensions; handlers pull them back out with the extractors at
//! the bottom.

use axum::extract::{FromRequestParts, RawPathParams, Request, State};
use axum::http::{header, request::Parts};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Device, Membership, MembershipRole, MembershipStatus, User, UserUpdate};
use crate::store::StoreError;
use crate::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user, device) = base_auth(&state, &req).await?;
    req.extensions_mut().insert(user);
    req.extensions_mut().insert(device);
    Ok(next.run(req).await)
}

pub async fn require_org_auth(
    State(state): State<AppState>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user, device) = base_auth(&state, &req).await?;
    let membership = org_auth(&state, &user, &params, &req).await?;

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(device);
    req.extensions_mut().insert(membership);
    Ok(next.run(req).await)
}

pub async fn require_admin_auth(
    State(state): State<AppState>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user, device) = base_auth(&state, &req).await?;
    let membership = org_auth(&state, &user, &params, &req).await?;

    if !membership.role.is_admin_or_owner() {
        return Err(ApiError::Unauthorized(
            "The current user isn't admin of the organization".to_string(),
        ));
    }

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(device);
    req.extensions_mut().insert(membership);
    Ok(next.run(req).await)
}

/// Manager gate with collection scoping: the route must carry a collection
/// id, and members without blanket access need an explicit grant on it.
pub async fn require_manager_auth(
    State(state): State<AppState>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user, device) = base_auth(&state, &req).await?;
    let membership = org_auth(&state, &user, &params, &req).await?;

    if !membership.role.is_manager_or_better() {
        return Err(ApiError::Unauthorized(
            "You need to be a Manager, Admin or Owner to call this endpoint".to_string(),
        ));
    }

    let collection_id = collection_id_from(&params, req.uri().query()).ok_or_else(|| {
        ApiError::Unauthorized("Error getting the collection id".to_string())
    })?;

    if !membership.access_all && membership.role != MembershipRole::Admin {
        state
            .grants
            .find_by_collection_and_user(collection_id, user.id)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "The current user isn't a manager for this collection".to_string(),
                )
            })?;
    }

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(device);
    req.extensions_mut().insert(membership);
    Ok(next.run(req).await)
}

/// Manager gate without collection scoping.
pub async fn require_manager_loose_auth(
    State(state): State<AppState>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user, device) = base_auth(&state, &req).await?;
    let membership = org_auth(&state, &user, &params, &req).await?;

    if !membership.role.is_manager_or_better() {
        return Err(ApiError::Unauthorized(
            "You need to be a Manager, Admin or Owner to call this endpoint".to_string(),
        ));
    }

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(device);
    req.extensions_mut().insert(membership);
    Ok(next.run(req).await)
}

pub async fn require_owner_auth(
    State(state): State<AppState>,
    params: RawPathParams,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (user, device) = base_auth(&state, &req).await?;
    let membership = org_auth(&state, &user, &params, &req).await?;

    if membership.role != MembershipRole::Owner {
        return Err(ApiError::Unauthorized(
            "You need to be Owner to call this endpoint".to_string(),
        ));
    }

    req.extensions_mut().insert(user);
    req.extensions_mut().insert(device);
    req.extensions_mut().insert(membership);
    Ok(next.run(req).await)
}

fn _assert_base_auth_send(state: &AppState, req: &Request) {
    fn is_send<T: Send>(_: T) {}
    is_send(base_auth(state, req));
}

async fn base_auth(state: &AppState, req: &Request) -> Result<(User, Device), ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

    // Read the path before any `.await`: holding `&Request` across a suspend
    // point is not `Send` (the body is `!Sync`), but a `&str` is.
    let path = req.uri().path();

    let claims = state.jwt.decode(token).map_err(|err| {
        tracing::debug!(error = %err, "token decode failed");
        ApiError::Unauthorized("Invalid token".to_string())
    })?;

    let device = state
        .devices
        .find_by_id(claims.device)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            tracing::debug!(device_id = %claims.device, "device not found");
            ApiError::Unauthorized("Invalid device id".to_string())
        })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            tracing::debug!(user_id = %claims.sub, "user not found");
            ApiError::Unauthorized("Invalid user id".to_string())
        })?;

    if user.security_stamp != claims.sstamp {
        // The stamp was rotated after this token was issued. Only a live
        // stamp exception covering this exact route and the token's stamp
        // lets the request through.
        let exception = user.stamp_exception().ok_or_else(|| {
            tracing::debug!(user_id = %user.id, "security stamp mismatch");
            ApiError::Unauthorized("Invalid security stamp".to_string())
        })?;

        if Utc::now() > exception.expire {
            state
                .users
                .update(&UserUpdate::clear_stamp_exception(user.id))
                .await
                .map_err(internal)?;
            return Err(ApiError::Unauthorized(
                "Stamp exception is expired".to_string(),
            ));
        }

        if exception.security_stamp != claims.sstamp
            || !exception.routes.iter().any(|route| route == path)
        {
            tracing::debug!(user_id = %user.id, path, "route not covered by stamp exception");
            return Err(ApiError::Unauthorized(
                "Invalid security stamp".to_string(),
            ));
        }
    }

    Ok((user, device))
}

async fn org_auth(
    state: &AppState,
    user: &User,
    params: &RawPathParams,
    req: &Request,
) -> Result<Membership, ApiError> {
    let org_id = org_id_from(params, req.uri().query()).ok_or_else(|| {
        ApiError::Unauthorized("The current user isn't member of the organization".to_string())
    })?;

    let membership = state
        .memberships
        .find_by_user_and_org(user.id, org_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| {
            ApiError::Unauthorized(
                "The current user isn't member of the organization".to_string(),
            )
        })?;

    if membership.status != MembershipStatus::Confirmed {
        return Err(ApiError::Unauthorized(
            "The current user isn't confirmed member of the organization".to_string(),
        ));
    }

    Ok(membership)
}

#[derive(Debug, Default, Deserialize)]
struct IdQuery {
    #[serde(rename = "organizationId")]
    organization_id: Option<Uuid>,
    #[serde(rename = "collectionId")]
    collection_id: Option<Uuid>,
}

fn id_query(query: Option<&str>) -> IdQuery {
    query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default()
}

/// Org id: the route's first path parameter if it is a UUID, else the
/// `organizationId` query parameter.
fn org_id_from(params: &RawPathParams, query: Option<&str>) -> Option<Uuid> {
    params
        .iter()
        .next()
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
        .or_else(|| id_query(query).organization_id)
}

/// Collection id: the route's second path parameter if it is a UUID, else
/// the `collectionId` query parameter.
fn collection_id_from(params: &RawPathParams, query: Option<&str>) -> Option<Uuid> {
    params
        .iter()
        .nth(1)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
        .or_else(|| id_query(query).collection_id)
}

fn internal(err: StoreError) -> ApiError {
    ApiError::Internal(anyhow::Error::new(err))
}

/// The authenticated user, resolved by any of the gates.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().cloned().ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("auth user missing from request extensions"))
        })?;
        Ok(AuthUser(user))
    }
}

/// The device the session was minted for.
pub struct AuthDevice(pub Device);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthDevice
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let device = parts.extensions.get::<Device>().cloned().ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "auth device missing from request extensions"
            ))
        })?;
        Ok(AuthDevice(device))
    }
}

/// The caller's membership in the route's organization, resolved by the
/// org-scoped gates.
pub struct OrgMembership(pub Membership);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OrgMembership
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let membership = parts.extensions.get::<Membership>().cloned().ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "org membership missing from request extensions"
            ))
        })?;
        Ok(OrgMembership(membership))
    }
}
