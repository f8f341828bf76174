use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::projections::{self, AssetEarning, EarningsSummary, ReferralFee};
use crate::api::state::AppState;

const DEFAULT_DAYS: u32 = 7;

#[derive(Debug, Default, Deserialize)]
pub struct EarningsQuery {
    pub days: Option<u32>,
}

pub async fn total_referral_earnings(
    State(state): State<AppState>,
    Path(guardian_address): Path<String>,
    Query(query): Query<EarningsQuery>,
) -> Result<Json<EarningsSummary>, ApiError> {
    let guardian = state
        .inner
        .store
        .find_by_guardian(&guardian_address)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let days = query.days.filter(|d| *d > 0).unwrap_or(DEFAULT_DAYS);
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    Ok(Json(projections::total_referral_earnings(&guardian, now, days)))
}

/// Accepts a referral address (resolved to its guardian) or a guardian address.
pub async fn earning_by_asset(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<Vec<AssetEarning>>, ApiError> {
    let store = &state.inner.store;
    let guardian = match store.find_by_referral(&address).await? {
        Some(g) => g,
        None => store
            .find_by_guardian(&address)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?,
    };

    Ok(Json(projections::earnings_by_asset(&guardian)))
}

pub async fn earning_by_referrals(
    State(state): State<AppState>,
    Path(guardian_address): Path<String>,
) -> Result<Json<Vec<ReferralFee>>, ApiError> {
    let guardian = state
        .inner
        .store
        .find_by_guardian(&guardian_address)
        .await?
        .ok_or_else(|| ApiError::NotFound("Guardian not found".into()))?;

    Ok(Json(projections::referral_fees(
        &guardian,
        &state.inner.fee_factors,
    )))
}
