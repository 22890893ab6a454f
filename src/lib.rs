pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::config::AuthConfig;
use crate::services::{JwtService, MembershipService, RsaKeyPair, SessionService};
use crate::store::{CollectionGrantStore, DeviceStore, MembershipStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub users: Arc<dyn UserStore>,
    pub devices: Arc<dyn DeviceStore>,
    pub memberships: Arc<dyn MembershipStore>,
    pub grants: Arc<dyn CollectionGrantStore>,
    pub jwt: JwtService,
    pub sessions: SessionService,
    pub members: MembershipService,
}

impl AppState {
    pub fn new(
        config: AuthConfig,
        keys: &RsaKeyPair,
        users: Arc<dyn UserStore>,
        devices: Arc<dyn DeviceStore>,
        memberships: Arc<dyn MembershipStore>,
        grants: Arc<dyn CollectionGrantStore>,
    ) -> Self {
        let jwt = JwtService::new(keys, config.token_validity_seconds);
        let sessions = SessionService::new(
            users.clone(),
            devices.clone(),
            memberships.clone(),
            jwt.clone(),
            config.mail_enabled,
        );
        let members = MembershipService::new(users.clone(), memberships.clone(), grants.clone());

        Self {
            config,
            users,
            devices,
            memberships,
            grants,
            jwt,
            sessions,
            members,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let account_routes = Router::new()
        .route(
            "/api/accounts/revision-date",
            get(handlers::accounts::revision_date),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let org_admin_routes = Router::new()
        .route(
            "/api/organizations/:ouuid/users/:uouuid",
            put(handlers::org_members::edit_member)
                .post(handlers::org_members::edit_member)
                .delete(handlers::org_members::remove_member),
        )
        .route(
            "/api/organizations/:ouuid/users/:uouuid/delete",
            post(handlers::org_members::remove_member),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_admin_auth,
        ));

    Router::new()
        .route("/alive", get(alive))
        .route(
            "/identity/connect/token",
            post(handlers::identity::connect_token),
        )
        .merge(account_routes)
        .merge(org_admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn alive() -> Json<String> {
    Json(chrono::Utc::now().to_rfc3339())
}
