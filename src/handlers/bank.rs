use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, MutexGuard};
use tracing::{info, warn};

use crate::{AppState, SharedStore};
use bankroll::analytics::{analyze_by_odds_range, calculate_metrics, BankrollMetrics, DimensionAnalysis};
use bankroll::core::kelly::{BetSuggestion, StakeAdvisor, DEFAULT_CONFIDENCE};
use bankroll::core::ledger::{compute_net_cash_delta, reconcile, reconciled_curve, BankCurve, Reconciliation};
use bankroll::core::progression::{
    compute_current_cycle_day_statuses, compute_next_progression_day, DayStatus, NextDay,
};
use bankroll::data::{Clock, SaveOutcome, Store, SystemClock};
use bankroll::error::{AppError, ValidationError};
use bankroll::models::{
    bets_from_matches, BankSettings, BankUpdateRequest, Bet, CurveRequest, ProgressionRequest,
    ReconcileRequest, SuggestRequest,
};
use bankroll::validation::{
    validate_bank_settings, validate_bankroll, validate_bet, validate_confidence, validate_odds,
    validate_probability,
};

/// Currency of a bankroll saved without one
const DEFAULT_CURRENCY: &str = "BRL";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestResponse {
    #[serde(flatten)]
    pub suggestion: BetSuggestion,
    pub below_minimum: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveResponse {
    #[serde(flatten)]
    pub curve: BankCurve,
    pub net_cash_delta: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionResponse {
    #[serde(flatten)]
    pub next: NextDay,
    pub days: BTreeMap<u32, DayStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub metrics: BankrollMetrics,
    pub by_odds_range: Vec<DimensionAnalysis>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankResponse {
    pub settings: BankSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciliation: Option<Reconciliation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn lock_store(state: &AppState) -> Result<MutexGuard<'_, SharedStore>, AppError> {
    state
        .store
        .lock()
        .map_err(|_| AppError::Store("store lock poisoned".to_string()))
}

fn validate_bets(bets: &[Bet]) -> Result<(), ValidationError> {
    bets.iter().try_for_each(|bet| validate_bet(bet).map(|_| ()))
}

fn validate_total_bank(total_bank: f64) -> Result<(), ValidationError> {
    if !total_bank.is_finite() || total_bank < 0.0 {
        return Err(ValidationError::new(
            "totalBank",
            format!("must be a non-negative number, got {}", total_bank),
        ));
    }
    Ok(())
}

fn warning_of(outcome: &SaveOutcome) -> Option<String> {
    outcome.warning().map(|w| {
        warn!("{}", w);
        w.to_string()
    })
}

/// Save warning first, then one line per clamp applied
fn reconcile_warnings(reconciliation: &Reconciliation, outcome: &SaveOutcome) -> Vec<String> {
    let mut warnings: Vec<String> = warning_of(outcome).into_iter().collect();
    if reconciliation.base_clamped {
        warnings.push("reconciliation base was negative and set to 0".to_string());
    }
    if reconciliation.clamped {
        warnings.push("reconciled bankroll was negative and set to 0".to_string());
    }
    warnings
}

/// Suggest a stake for one bet
pub async fn suggest(
    state: web::Data<Arc<AppState>>,
    req: web::Json<SuggestRequest>,
) -> Result<HttpResponse, AppError> {
    validate_probability(req.probability)?;
    validate_odds(req.odds)?;
    validate_bankroll(req.bankroll)?;
    if let Some(confidence) = req.confidence {
        validate_confidence(confidence)?;
    }

    let advisor = StakeAdvisor::new(state.staking.clone());
    let suggestion = advisor.suggest(
        req.probability,
        req.odds,
        req.bankroll,
        req.confidence.unwrap_or(DEFAULT_CONFIDENCE),
    );
    let below_minimum = advisor.below_minimum(suggestion.recommended);

    Ok(HttpResponse::Ok().json(SuggestResponse {
        suggestion,
        below_minimum,
    }))
}

/// Bankroll history ending at the given bankroll
pub async fn curve(req: web::Json<CurveRequest>) -> Result<HttpResponse, AppError> {
    validate_total_bank(req.total_bank)?;
    validate_bets(&req.bets)?;

    Ok(HttpResponse::Ok().json(CurveResponse {
        curve: reconciled_curve(req.total_bank, &req.bets),
        net_cash_delta: compute_net_cash_delta(&req.bets),
    }))
}

/// Next progression day and the state of the running cycle
pub async fn progression(
    state: web::Data<Arc<AppState>>,
    req: web::Json<ProgressionRequest>,
) -> Result<HttpResponse, AppError> {
    validate_bets(&req.bets)?;

    let max_days = req.max_days.unwrap_or(state.staking.max_progression_days);
    Ok(HttpResponse::Ok().json(ProgressionResponse {
        next: compute_next_progression_day(&req.bets, max_days),
        days: compute_current_cycle_day_statuses(&req.bets, max_days),
    }))
}

/// Performance stats over the saved matches
pub async fn stats(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, AppError> {
    let store = lock_store(&state)?;
    let matches = store.load_matches()?;
    let total_bank = store
        .load_settings()?
        .map(|s| s.total_bank)
        .unwrap_or(0.0);

    let bets = bets_from_matches(&matches);
    Ok(HttpResponse::Ok().json(StatsResponse {
        metrics: calculate_metrics(&matches, total_bank),
        by_odds_range: analyze_by_odds_range(&bets),
    }))
}

pub async fn get_bank(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, AppError> {
    let settings = lock_store(&state)?
        .load_settings()?
        .ok_or_else(|| AppError::NotFound("no bank settings saved".to_string()))?;

    Ok(HttpResponse::Ok().json(settings))
}

/// Save bankroll, leverage and currency
pub async fn put_bank(
    state: web::Data<Arc<AppState>>,
    req: web::Json<BankUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let store = lock_store(&state)?;
    let now = SystemClock.now_millis();

    let mut settings = store
        .load_settings()?
        .unwrap_or_else(|| BankSettings::new(req.total_bank, DEFAULT_CURRENCY, now));
    settings.save(req.total_bank, req.leverage, now);
    if let Some(currency) = &req.currency {
        settings.currency = currency.clone();
    }

    let settings = validate_bank_settings(&settings)?;
    let warnings = warning_of(&store.save_settings(&settings)?).into_iter().collect();
    info!(total_bank = settings.total_bank, "bank settings saved");

    Ok(HttpResponse::Ok().json(BankResponse {
        settings,
        reconciliation: None,
        warnings,
    }))
}

/// Recompute the bankroll from its base and the settled bets
///
/// The base comes from the request, then the stored base, and is
/// otherwise inferred from the current bankroll.
pub async fn reconcile_bank(
    state: web::Data<Arc<AppState>>,
    req: web::Json<ReconcileRequest>,
) -> Result<HttpResponse, AppError> {
    let store = lock_store(&state)?;
    let mut settings = store
        .load_settings()?
        .ok_or_else(|| AppError::NotFound("no bank settings saved".to_string()))?;
    let bets = bets_from_matches(&store.load_matches()?);

    let manual_base = req.base_bank.or(settings.base_bank);
    let reconciliation = reconcile(settings.total_bank, &bets, manual_base);

    settings.apply_reconciliation(&reconciliation, SystemClock.now_millis());
    let settings = validate_bank_settings(&settings)?;
    let outcome = store.save_settings(&settings)?;
    let warnings = reconcile_warnings(&reconciliation, &outcome);

    Ok(HttpResponse::Ok().json(BankResponse {
        settings,
        reconciliation: Some(reconciliation),
        warnings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::routes;
    use actix_web::{http::StatusCode, test, App};
    use bankroll::config::StakingConfig;
    use bankroll::data::{CachedStore, JsonFileStore};
    use bankroll::models::{BetInfo, BetStatus, SavedMatch};
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;
    use tempfile::tempdir;

    fn state_for(dir: &std::path::Path) -> Arc<AppState> {
        let inner: Box<dyn Store + Send + Sync> = Box::new(JsonFileStore::new(dir));
        Arc::new(AppState {
            store: Mutex::new(CachedStore::new(inner, 0, SystemClock)),
            staking: StakingConfig::default(),
        })
    }

    fn won_match(id: &str, amount: f64, odd: f64) -> SavedMatch {
        let mut m = SavedMatch::new(id, 1_700_000_000_000);
        m.bet_info = Some(BetInfo {
            bet_amount: amount,
            odd: Some(odd),
            potential_return: Some(amount * odd),
            status: BetStatus::Won,
            placed_at: None,
            result_at: None,
            leverage: None,
            progression: None,
            extra: Map::new(),
        });
        m
    }

    #[actix_web::test]
    async fn test_suggest_endpoint() {
        let dir = tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_for(dir.path())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/suggest")
            .set_json(json!({ "probability": 60.0, "odds": 2.0, "bankroll": 1000.0 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["method"], "moderate");
        assert_eq!(body["recommended"], 25.0);
        assert_eq!(body["belowMinimum"], false);

        let req = test::TestRequest::post()
            .uri("/suggest")
            .set_json(json!({ "probability": 60.0, "odds": 1.0, "bankroll": 1000.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_bank_save_and_reconcile() {
        let dir = tempdir().unwrap();
        JsonFileStore::new(dir.path())
            .save_matches(&[won_match("a", 100.0, 2.0)])
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_for(dir.path())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/bank").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri("/bank")
            .set_json(json!({ "totalBank": 1000.0, "leverage": 1.0, "currency": "eur" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["settings"]["currency"], "EUR");
        assert!(body["settings"].get("leverage").is_none());

        let req = test::TestRequest::post()
            .uri("/bank/reconcile")
            .set_json(json!({ "baseBank": 500.0 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["reconciliation"]["netCashDelta"], 100.0);
        assert_eq!(body["settings"]["totalBank"], 600.0);
        assert_eq!(body["settings"]["baseBank"], 500.0);
        assert!(body.get("warnings").is_none());

        let req = test::TestRequest::get().uri("/stats").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["wonCount"], 1);
        assert_eq!(body["totalProfit"], 100.0);
        assert_eq!(body["profitFactor"], Value::Null);
    }

    #[actix_web::test]
    async fn test_reconcile_reports_negative_base() {
        let dir = tempdir().unwrap();
        JsonFileStore::new(dir.path())
            .save_matches(&[won_match("a", 100.0, 2.0)])
            .unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_for(dir.path())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/bank")
            .set_json(json!({ "totalBank": 1000.0 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let req = test::TestRequest::post()
            .uri("/bank/reconcile")
            .set_json(json!({ "baseBank": -50.0 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["reconciliation"]["baseClamped"], true);
        assert_eq!(body["reconciliation"]["clamped"], false);
        assert_eq!(body["settings"]["baseBank"], 0.0);
        assert_eq!(body["settings"]["totalBank"], 100.0);
        assert_eq!(
            body["warnings"],
            json!(["reconciliation base was negative and set to 0"])
        );
    }

    #[test]
    fn test_reconcile_warnings_keep_every_message() {
        let lost = Bet::new("x", 500.0, 2.0, BetStatus::Lost, 1);
        let reconciliation = reconcile(100.0, &[lost], Some(-10.0));
        assert!(reconciliation.base_clamped);
        assert!(reconciliation.clamped);

        let outcome = SaveOutcome::LocalOnly {
            warning: "remote copy failed".to_string(),
        };
        let warnings = reconcile_warnings(&reconciliation, &outcome);
        assert_eq!(
            warnings,
            vec![
                "remote copy failed".to_string(),
                "reconciliation base was negative and set to 0".to_string(),
                "reconciled bankroll was negative and set to 0".to_string(),
            ]
        );

        let clean = reconcile(100.0, &[], None);
        assert!(reconcile_warnings(&clean, &SaveOutcome::Saved).is_empty());
    }

    #[actix_web::test]
    async fn test_progression_endpoint() {
        let dir = tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_for(dir.path())))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/progression")
            .set_json(json!({
                "bets": [
                    { "matchId": "a", "amount": 10, "odds": 2.0, "status": "won", "placedAt": 1,
                      "progression": { "enabled": true, "day": 1 } },
                    { "matchId": "b", "amount": 10, "odds": 2.0, "status": "won", "placedAt": 2,
                      "progression": { "enabled": true, "day": 2 } }
                ]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["nextDay"], 3);
        assert_eq!(body["reason"], "won");
        assert_eq!(body["days"]["2"]["sourceBetId"], "b");
    }
}
