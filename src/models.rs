use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::ledger::Reconciliation;

/// Leverage multipliers are clamped to this range
pub const LEVERAGE_MIN: f64 = 0.1;
pub const LEVERAGE_MAX: f64 = 10.0;

/// Highest day index a progression tag may carry
pub const MAX_PROGRESSION_DAY: u32 = 30;

/// Upper bound for a stored bankroll
pub const MAX_TOTAL_BANK: f64 = 100_000_000.0;

/// Settlement state of a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Cancelled,
}

impl BetStatus {
    /// Won, lost and cancelled are final
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BetStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Cancelled => "cancelled",
        }
    }
}

/// Marks a bet as part of a leverage-progression cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub enabled: bool,
    pub day: u32,
}

/// A single wager, as consumed by the ledger and progression tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bet {
    /// Owning match, used as a stable tie-breaker when ordering
    #[serde(default)]
    pub match_id: String,
    pub amount: f64,
    pub odds: f64,
    pub status: BetStatus,
    /// Epoch milliseconds
    pub placed_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<Progression>,
}

impl Bet {
    pub fn new(
        match_id: impl Into<String>,
        amount: f64,
        odds: f64,
        status: BetStatus,
        placed_at: i64,
    ) -> Self {
        Self {
            match_id: match_id.into(),
            amount,
            odds,
            status,
            placed_at,
            result_at: None,
            leverage: None,
            progression: None,
        }
    }

    pub fn with_result_at(mut self, result_at: i64) -> Self {
        self.result_at = Some(result_at);
        self
    }

    pub fn with_leverage(mut self, leverage: f64) -> Self {
        self.leverage = Some(leverage);
        self
    }

    pub fn with_progression_day(mut self, day: u32) -> Self {
        self.progression = Some(Progression { enabled: true, day });
        self
    }

    /// Leverage clamped to the allowed range, 1.0 when unset or invalid
    pub fn effective_leverage(&self) -> f64 {
        match self.leverage {
            Some(l) if l.is_finite() => l.clamp(LEVERAGE_MIN, LEVERAGE_MAX),
            _ => 1.0,
        }
    }

    pub fn potential_return(&self) -> f64 {
        self.amount * self.odds
    }

    /// Profit if the bet wins, scaled by the bet's leverage
    pub fn potential_profit(&self) -> f64 {
        (self.potential_return() - self.amount) * self.effective_leverage()
    }

    /// Progression day when this bet takes part in a cycle
    pub fn progression_day(&self) -> Option<u32> {
        self.progression.filter(|p| p.enabled).map(|p| p.day)
    }
}

/// Bankroll settings, one per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankSettings {
    pub total_bank: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_bank: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<f64>,
    pub currency: String,
    pub updated_at: i64,
}

impl BankSettings {
    pub fn new(total_bank: f64, currency: impl Into<String>, now: i64) -> Self {
        Self {
            total_bank,
            base_bank: None,
            leverage: None,
            currency: currency.into(),
            updated_at: now,
        }
    }

    /// Drop a neutral leverage so it is not persisted redundantly
    pub fn normalize_leverage(leverage: Option<f64>) -> Option<f64> {
        leverage.filter(|l| (l - 1.0).abs() > f64::EPSILON)
    }

    pub fn effective_leverage(&self) -> f64 {
        self.leverage.unwrap_or(1.0)
    }

    /// User save of bankroll and global leverage
    pub fn save(&mut self, total_bank: f64, leverage: Option<f64>, now: i64) {
        self.total_bank = total_bank;
        self.leverage = Self::normalize_leverage(leverage);
        self.updated_at = now;
    }

    /// Manual update of the reconciliation baseline
    pub fn set_base_bank(&mut self, base: f64, now: i64) {
        self.base_bank = Some(base.max(0.0));
        self.updated_at = now;
    }

    pub fn apply_reconciliation(&mut self, reconciliation: &Reconciliation, now: i64) {
        self.total_bank = reconciliation.total_bank;
        self.base_bank = Some(reconciliation.base_bank);
        self.updated_at = now;
    }
}

/// Summary of the match analysis that produced a saved match
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(
        rename = "probabilityOver15",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bet details attached to a saved match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetInfo {
    pub bet_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_return: Option<f64>,
    pub status: BetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progression: Option<Progression>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A persisted match record
///
/// Fields the engine does not read are kept in `extra` so that loading and
/// saving a record never loses data written by newer app versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMatch {
    pub id: String,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_info: Option<BetInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SavedMatch {
    pub fn new(id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            timestamp,
            result: None,
            bet_info: None,
            extra: Map::new(),
        }
    }

    pub fn ev(&self) -> Option<f64> {
        self.result.as_ref().and_then(|r| r.ev)
    }

    /// Build the engine view of this match's bet
    ///
    /// Placement falls back to the match timestamp and odds fall back to
    /// `potentialReturn / betAmount`. Returns `None` without bet info or
    /// without usable odds.
    pub fn to_bet(&self) -> Option<Bet> {
        let info = self.bet_info.as_ref()?;

        let odds = info.odd.filter(|o| o.is_finite()).or_else(|| {
            let ret = info.potential_return?;
            (info.bet_amount > 0.0 && ret.is_finite()).then(|| ret / info.bet_amount)
        })?;

        Some(Bet {
            match_id: self.id.clone(),
            amount: info.bet_amount,
            odds,
            status: info.status,
            placed_at: info.placed_at.unwrap_or(self.timestamp),
            result_at: info.result_at,
            leverage: info.leverage,
            progression: info.progression,
        })
    }
}

/// Collect the bets of all saved matches
pub fn bets_from_matches(matches: &[SavedMatch]) -> Vec<Bet> {
    matches.iter().filter_map(SavedMatch::to_bet).collect()
}

/// Bet suggestion request
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestRequest {
    pub probability: f64,
    pub odds: f64,
    pub bankroll: f64,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Ledger and progression requests carry the bets inline
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveRequest {
    pub bets: Vec<Bet>,
    pub total_bank: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRequest {
    pub bets: Vec<Bet>,
    #[serde(default)]
    pub max_days: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileRequest {
    #[serde(default)]
    pub base_bank: Option<f64>,
}

/// User save of the bankroll
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankUpdateRequest {
    pub total_bank: f64,
    #[serde(default)]
    pub leverage: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
