//! The identity endpoint: `POST /identity/connect/token`.

use axum::extract::State;
use axum::{Form, Json};

use crate::error::ApiError;
use crate::services::{ConnectData, GrantType, SessionResponse};
use crate::AppState;

pub async fn connect_token(
    State(state): State<AppState>,
    Form(data): Form<ConnectData>,
) -> Result<Json<SessionResponse>, ApiError> {
    data.validate()?;

    let response = match data.grant_type {
        GrantType::RefreshToken => {
            state
                .sessions
                .refresh_login(data.refresh_token.as_deref().unwrap_or_default())
                .await?
        }
        GrantType::Password => state.sessions.password_login(&data).await?,
        GrantType::ClientCredentials => {
            return Err(ApiError::BadRequest("Grant type not supported".to_string()));
        }
    };

    Ok(Json(response))
}
