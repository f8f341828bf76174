use axum::Json;
use axum::extract::{Path, State};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::model::{PioneerUser, User};

pub async fn get_guardian(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<User>, ApiError> {
    state
        .inner
        .store
        .find_by_guardian(&address)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Guardian {address} not found")))
}

pub async fn get_pioneer(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<PioneerUser>, ApiError> {
    state
        .inner
        .store
        .find_pioneer(&address)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Pioneer {address} not found")))
}
