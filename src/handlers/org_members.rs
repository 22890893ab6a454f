//! Organization member management endpoints, behind the admin gate.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::OrgMembership;
use crate::models::{CollectionAssignment, MembershipRole};
use crate::services::EditMembership;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EditMemberData {
    #[serde(rename = "Type")]
    pub membership_type: i32,
    #[serde(rename = "AccessAll", default)]
    pub access_all: bool,
    #[serde(rename = "Collections", default)]
    pub collections: Vec<CollectionAssignment>,
}

pub async fn edit_member(
    State(state): State<AppState>,
    OrgMembership(actor): OrgMembership,
    Path((org_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(data): Json<EditMemberData>,
) -> Result<StatusCode, ApiError> {
    let role = MembershipRole::from_code(data.membership_type)
        .ok_or_else(|| ApiError::BadRequest("Invalid membership type".to_string()))?;

    state
        .members
        .edit(
            actor.role,
            org_id,
            membership_id,
            EditMembership {
                role,
                access_all: data.access_all,
                collections: data.collections,
            },
        )
        .await?;

    Ok(StatusCode::OK)
}

pub async fn remove_member(
    State(state): State<AppState>,
    OrgMembership(actor): OrgMembership,
    Path((org_id, membership_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .members
        .remove(actor.role, org_id, membership_id)
        .await?;

    Ok(StatusCode::OK)
}
