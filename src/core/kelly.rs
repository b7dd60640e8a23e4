//! Kelly Criterion Bet Sizing
//!
//! Stake suggestions from a win probability, decimal odds and bankroll.
//!
//! The Kelly criterion formula:
//!     f* = (b*p - q) / b
//!
//! Where:
//!     f* = fraction of bankroll to bet
//!     b = odds - 1 (net odds)
//!     p = probability of winning
//!     q = 1 - p (probability of losing)
//!
//! Full Kelly is too aggressive once probability estimates carry error, so
//! stakes use a quarter of it and never exceed 10% of the bankroll.
//! Probabilities and confidence are expressed in percent (0-100) throughout.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::StakingConfig;
use crate::format::round2;

/// Confidence used when the caller does not provide one
pub const DEFAULT_CONFIDENCE: f64 = 100.0;

/// Which sizing tier produced the recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingMethod {
    /// No stake recommended (invalid input or no edge)
    None,
    Conservative,
    Moderate,
    Aggressive,
}

impl SizingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizingMethod::None => "none",
            SizingMethod::Conservative => "conservative",
            SizingMethod::Moderate => "moderate",
            SizingMethod::Aggressive => "aggressive",
        }
    }
}

/// Bet sizing recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetSuggestion {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
    pub kelly: f64,
    pub recommended: f64,
    pub method: SizingMethod,
    pub explanation: String,
    pub expected_value: f64, // percent of stake
    pub edge: f64,           // percentage points over break-even
}

impl BetSuggestion {
    fn zeroed(explanation: String, expected_value: f64, edge: f64) -> Self {
        Self {
            conservative: 0.0,
            moderate: 0.0,
            aggressive: 0.0,
            kelly: 0.0,
            recommended: 0.0,
            method: SizingMethod::None,
            explanation,
            expected_value,
            edge,
        }
    }
}

/// Inputs the tier predicates look at
#[derive(Debug, Clone, Copy)]
pub struct TierSignal {
    pub ev: f64,
    pub edge: f64,
    pub confidence: f64,
}

/// Candidate stakes a tier chooses from (unrounded)
#[derive(Debug, Clone, Copy)]
pub struct TierStakes {
    pub conservative: f64,
    pub moderate: f64,
    pub aggressive: f64,
    pub kelly: f64,
}

/// One row of the sizing policy
pub struct SizingTier {
    pub method: SizingMethod,
    pub applies: fn(&TierSignal) -> bool,
    pub stake: fn(&TierStakes) -> f64,
}

/// Kelly stake, or `fallback` when Kelly found nothing to stake
fn kelly_or(kelly: f64, fallback: f64) -> f64 {
    if kelly > 0.0 {
        kelly
    } else {
        fallback
    }
}

fn aggressive_applies(s: &TierSignal) -> bool {
    s.ev > 15.0 && s.edge > 10.0 && s.confidence > 70.0
}

fn aggressive_stake(t: &TierStakes) -> f64 {
    t.aggressive.min(kelly_or(t.kelly, t.aggressive))
}

fn moderate_applies(s: &TierSignal) -> bool {
    s.ev > 5.0 && s.edge > 2.0
}

fn moderate_stake(t: &TierStakes) -> f64 {
    t.moderate.min(kelly_or(t.kelly, t.moderate))
}

fn always(_: &TierSignal) -> bool {
    true
}

fn conservative_stake(t: &TierStakes) -> f64 {
    t.conservative
}

/// Sizing policy, evaluated top to bottom; the first matching tier wins.
/// The last row always matches.
pub static SIZING_TIERS: [SizingTier; 3] = [
    SizingTier {
        method: SizingMethod::Aggressive,
        applies: aggressive_applies,
        stake: aggressive_stake,
    },
    SizingTier {
        method: SizingMethod::Moderate,
        applies: moderate_applies,
        stake: moderate_stake,
    },
    SizingTier {
        method: SizingMethod::Conservative,
        applies: always,
        stake: conservative_stake,
    },
];

/// Pick the first tier whose predicate matches
pub fn select_tier(signal: &TierSignal) -> &'static SizingTier {
    SIZING_TIERS
        .iter()
        .find(|tier| (tier.applies)(signal))
        .unwrap_or(&SIZING_TIERS[SIZING_TIERS.len() - 1])
}

/// Expected value as a percentage of the stake
///
/// # Examples
/// ```
/// use bankroll::core::kelly::calculate_ev;
/// let ev = calculate_ev(60.0, 2.0);
/// assert!((ev - 20.0).abs() < 1e-9);
/// ```
pub fn calculate_ev(probability: f64, odds: f64) -> f64 {
    let p = probability / 100.0;
    (p * (odds - 1.0) - (1.0 - p)) * 100.0
}

/// Percentage points of probability above the break-even `100 / odds`
pub fn calculate_edge(probability: f64, odds: f64) -> f64 {
    probability - 100.0 / odds
}

/// Full Kelly fraction for a single bet (negative without an edge)
///
/// # Arguments
/// * `probability` - Estimated probability of winning (0-100)
/// * `odds` - Decimal odds
pub fn calculate_kelly_fraction(probability: f64, odds: f64) -> f64 {
    if odds <= 1.0 {
        return 0.0;
    }

    let b = odds - 1.0;
    let p = probability / 100.0;
    let q = 1.0 - p;
    (b * p - q) / b
}

/// Capped fractional-Kelly stake with the default configuration
pub fn calculate_kelly_stake(probability: f64, odds: f64, bankroll: f64, confidence: f64) -> f64 {
    StakeAdvisor::default().kelly_stake(probability, odds, bankroll, confidence)
}

/// Tiered stake suggestion with the default configuration
pub fn suggest_bet_amount(
    probability: f64,
    odds: f64,
    bankroll: f64,
    confidence: f64,
) -> BetSuggestion {
    StakeAdvisor::default().suggest(probability, odds, bankroll, confidence)
}

/// Bet-sizing engine
///
/// Pure: every method is a function of its arguments and the configuration.
#[derive(Debug, Clone, Default)]
pub struct StakeAdvisor {
    pub config: StakingConfig,
}

impl StakeAdvisor {
    pub fn new(config: StakingConfig) -> Self {
        Self { config }
    }

    /// Capped fractional-Kelly stake
    ///
    /// Returns 0 for non-finite input, a non-positive bankroll, odds <= 1,
    /// a non-positive probability, or when there is no edge.
    pub fn kelly_stake(&self, probability: f64, odds: f64, bankroll: f64, confidence: f64) -> f64 {
        if !(probability.is_finite() && odds.is_finite() && bankroll.is_finite()) {
            return 0.0;
        }
        if bankroll <= 0.0 || odds <= 1.0 || probability <= 0.0 {
            return 0.0;
        }
        // At or below break-even there is no edge; rounding in f* must not
        // turn that into a tiny stake.
        if probability <= 100.0 / odds {
            return 0.0;
        }

        let full = calculate_kelly_fraction(probability, odds);
        if full <= 0.0 {
            return 0.0;
        }

        let fraction = full * self.config.kelly_fraction * confidence_factor(confidence);
        fraction.min(self.config.max_exposure) * bankroll
    }

    /// Stake suggestion across the conservative/moderate/aggressive tiers
    ///
    /// Never fails: invalid input and non-positive EV both return a zeroed
    /// suggestion whose explanation says why.
    pub fn suggest(
        &self,
        probability: f64,
        odds: f64,
        bankroll: f64,
        confidence: f64,
    ) -> BetSuggestion {
        let inputs_valid = [probability, odds, bankroll].iter().all(|v| v.is_finite() && *v > 0.0)
            && odds > 1.0;
        if !inputs_valid {
            return BetSuggestion::zeroed(
                "Invalid input: probability, odds and bankroll must be positive numbers and odds must be greater than 1".to_string(),
                0.0,
                0.0,
            );
        }

        let ev = calculate_ev(probability, odds);
        let edge = calculate_edge(probability, odds);

        if ev <= 0.0 {
            return BetSuggestion::zeroed(
                format!(
                    "Negative EV ({:.2}%): this bet is mathematically disadvantageous, no stake recommended",
                    ev
                ),
                ev,
                edge,
            );
        }

        let confidence = clamp_confidence(confidence);
        let stakes = TierStakes {
            conservative: bankroll * self.config.conservative_pct,
            moderate: bankroll * self.config.moderate_pct,
            aggressive: bankroll * self.config.aggressive_pct,
            kelly: self.kelly_stake(probability, odds, bankroll, confidence),
        };

        let signal = TierSignal {
            ev,
            edge,
            confidence,
        };
        let tier = select_tier(&signal);
        let mut recommended = (tier.stake)(&stakes);
        let mut explanation = tier_explanation(tier.method, ev, edge);

        if confidence < 50.0 {
            recommended *= confidence / 100.0;
            explanation.push_str(&format!(
                " Low confidence ({:.0}%): stake reduced proportionally.",
                confidence
            ));
        }

        recommended = recommended.min(bankroll * self.config.max_exposure);

        debug!(
            ev,
            edge,
            confidence,
            method = tier.method.as_str(),
            recommended,
            "bet suggestion computed"
        );

        BetSuggestion {
            conservative: round2(stakes.conservative),
            moderate: round2(stakes.moderate),
            aggressive: round2(stakes.aggressive),
            kelly: round2(stakes.kelly),
            recommended: round2(recommended),
            method: tier.method,
            explanation,
            expected_value: ev,
            edge,
        }
    }

    /// True when a stake is below the smallest amount the app accepts
    pub fn below_minimum(&self, stake: f64) -> bool {
        stake > 0.0 && stake < self.config.min_bet_amount
    }
}

/// Confidence outside 0-100 is clamped; non-finite counts as full confidence
fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 100.0)
    } else {
        DEFAULT_CONFIDENCE
    }
}

fn confidence_factor(confidence: f64) -> f64 {
    clamp_confidence(confidence) / 100.0
}

fn tier_explanation(method: SizingMethod, ev: f64, edge: f64) -> String {
    match method {
        SizingMethod::Aggressive => format!(
            "Strong value: EV {:.2}% and edge {:.2}pp with high confidence, aggressive stake capped by Kelly.",
            ev, edge
        ),
        SizingMethod::Moderate => format!(
            "Good value: EV {:.2}% and edge {:.2}pp, moderate stake capped by Kelly.",
            ev, edge
        ),
        _ => format!(
            "Small value: EV {:.2}% and edge {:.2}pp, conservative stake.",
            ev, edge
        ),
    }
}
