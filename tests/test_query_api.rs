use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};

use guardian_points::api::error::ApiError;
use guardian_points::api::handlers::{accounts, earnings};
use guardian_points::api::state::AppState;
use guardian_points::model::{PioneerUser, Referral, User};
use guardian_points::store::Store;

const TOKEN0: &str = "0x82af49447d8a07e3bd95bd0d56f35241523fbab1";
const TOKEN1: &str = "0xaf88d065e77c8cc2239327c5edb3a432268e5831";
const DAY: u64 = 86_400;

fn day_key(days_ago: u64) -> String {
    let now = chrono::Utc::now().timestamp() as u64;
    ((now / DAY - days_ago) * DAY).to_string()
}

/// Guardian with two referrals and two days of referral-driven earnings.
fn seeded_guardian() -> User {
    let mut g = User::guardian("0xg1", "alpha");
    g.is_referrer = true;
    g.points = 5.0;
    g.earned_asset_by_day.record(TOKEN0, &day_key(2), 1.0, 10.0);
    g.earned_asset_by_day.record(TOKEN0, &day_key(1), 1.0, 12.0);
    g.earned_asset_by_day.record(TOKEN1, &day_key(1), 3.0, 3.0);
    g.tvl_by_day.record(TOKEN0, &day_key(1), 3.0, 6.0);

    let mut r1 = Referral::new("0xr1", "alpha");
    r1.tvl_by_day.record(TOKEN0, &day_key(1), 1.0, 2.0);
    let mut r2 = Referral::new("0xr2", "alpha");
    r2.tvl_by_day.record(TOKEN1, &day_key(1), 5.0, 5.0);
    g.referrals = vec![r1, r2];
    g
}

async fn state() -> AppState {
    let store = Store::open_in_memory().unwrap();
    store.save_guardian(&seeded_guardian()).await.unwrap();
    let mut pioneer = PioneerUser::new("0xp1");
    pioneer.total_usd = 10.0;
    pioneer.finalize(true);
    store.save_pioneers(&[pioneer]).await.unwrap();

    let fee_factors = HashMap::from([(TOKEN0.to_string(), 100.0)]);
    AppState::new(store, fee_factors)
}

// ── Earnings ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_total_referral_earnings_window() {
    let Json(summary) = earnings::total_referral_earnings(
        State(state().await),
        Path("0xG1".into()),
        Query(earnings::EarningsQuery { days: Some(7) }),
    )
    .await
    .unwrap();

    let amounts: Vec<f64> = summary.data.iter().map(|d| d.amount).collect();
    assert_eq!(amounts, vec![10.0, 15.0]);
    assert_eq!(summary.data[0].timestamp, day_key(2));
    assert_eq!(summary.change, "50.00%");
}

#[tokio::test]
async fn test_total_referral_earnings_narrow_window() {
    let Json(summary) = earnings::total_referral_earnings(
        State(state().await),
        Path("0xg1".into()),
        Query(earnings::EarningsQuery { days: Some(2) }),
    )
    .await
    .unwrap();

    assert_eq!(summary.data.len(), 1);
    assert_eq!(summary.change, "0.00%");
}

#[tokio::test]
async fn test_earning_by_asset_resolves_referral() {
    let state = state().await;
    let Json(by_referral) =
        earnings::earning_by_asset(State(state.clone()), Path("0xr2".into()))
            .await
            .unwrap();
    let Json(by_guardian) = earnings::earning_by_asset(State(state), Path("0xg1".into()))
        .await
        .unwrap();
    assert_eq!(by_referral, by_guardian);

    let token0 = by_guardian.iter().find(|a| a.address == TOKEN0).unwrap();
    assert_eq!(token0.amount, 2.0);
    assert_eq!(token0.usd_amount, 22.0);
}

#[tokio::test]
async fn test_earning_by_referrals_fee_share() {
    let Json(fees) = earnings::earning_by_referrals(State(state().await), Path("0xg1".into()))
        .await
        .unwrap();

    assert_eq!(fees.len(), 2);
    // 1 / (1 + 3) of the token0 factor
    assert_eq!(fees[0].referral_address, "0xr1");
    assert_eq!(fees[0].fee_earned, 25.0);
    // no factor configured for token1
    assert_eq!(fees[1].fee_earned, 0.0);
}

#[tokio::test]
async fn test_unknown_guardian_is_not_found() {
    let err = earnings::earning_by_referrals(State(state().await), Path("0xnobody".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = earnings::earning_by_asset(State(state().await), Path("0xnobody".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ── Documents ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_stored_documents() {
    let state = state().await;
    let Json(guardian) = accounts::get_guardian(State(state.clone()), Path("0xg1".into()))
        .await
        .unwrap();
    assert_eq!(guardian, seeded_guardian());

    let Json(pioneer) = accounts::get_pioneer(State(state.clone()), Path("0xp1".into()))
        .await
        .unwrap();
    assert_eq!(pioneer.points, 150.0);

    let err = accounts::get_pioneer(State(state), Path("0xp2".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
