//! Bankroll Ledger
//!
//! Rebuilds a cash/equity history from the bet list when only the present
//! bankroll is known.
//!
//! Convention: a pending stake is not debited from cash. Cash moves only
//! when a bet settles (won: +profit, lost: -stake, cancelled: nothing).
//! While a bet is open its stake is counted as exposure, and
//! `equity = cash + exposure`.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::format::round2;
use crate::models::{Bet, BetStatus};

/// One point of the bankroll history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankCurvePoint {
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Display label, `dd/mm/YYYY HH:MM` UTC
    pub date: String,
    pub cash: f64,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankCurve {
    pub series: Vec<BankCurvePoint>,
    pub final_cash: f64,
}

/// Outcome of reconciling the bankroll against settled bets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reconciliation {
    /// Baseline the bankroll was reconciled from
    pub base_bank: f64,
    /// New bankroll: `max(0, base + delta)`
    pub total_bank: f64,
    pub net_cash_delta: f64,
    /// The reconciled bankroll would have been negative and was floored at 0
    pub clamped: bool,
    /// The baseline would have been negative and was floored at 0
    pub base_clamped: bool,
}

/// Bets with a usable stake and odds; everything else is ignored
fn counts(bet: &Bet) -> bool {
    bet.amount.is_finite() && bet.amount > 0.0 && bet.odds.is_finite()
}

/// Cash impact of a bet once settled
fn settled_cash_change(bet: &Bet) -> f64 {
    match bet.status {
        BetStatus::Won => bet.potential_profit(),
        BetStatus::Lost => -bet.amount,
        BetStatus::Pending | BetStatus::Cancelled => 0.0,
    }
}

fn net_cash_delta_raw(bets: &[Bet]) -> f64 {
    bets.iter()
        .filter(|b| counts(b))
        .map(settled_cash_change)
        .sum()
}

/// Net cash moved by settled bets: `+profit` for won, `-stake` for lost
///
/// Pending and cancelled bets contribute nothing.
pub fn compute_net_cash_delta(bets: &[Bet]) -> f64 {
    round2(net_cash_delta_raw(bets))
}

/// Placement sorts before settlement at the same instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Placed,
    Settled,
}

struct LedgerEvent<'a> {
    timestamp: i64,
    kind: EventKind,
    bet: &'a Bet,
    index: usize,
}

fn ledger_events(bets: &[Bet]) -> Vec<LedgerEvent<'_>> {
    let mut events = Vec::with_capacity(bets.len() * 2);

    for (index, bet) in bets.iter().enumerate().filter(|(_, b)| counts(b)) {
        events.push(LedgerEvent {
            timestamp: bet.placed_at,
            kind: EventKind::Placed,
            bet,
            index,
        });

        if bet.status.is_terminal() {
            // A settlement can never precede its own placement
            let settled_at = bet.result_at.unwrap_or(bet.placed_at).max(bet.placed_at);
            events.push(LedgerEvent {
                timestamp: settled_at,
                kind: EventKind::Settled,
                bet,
                index,
            });
        }
    }

    events.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.bet.match_id.cmp(&b.bet.match_id))
            .then(a.index.cmp(&b.index))
    });

    events
}

/// Display label for a timestamp
pub fn date_label(timestamp: i64) -> String {
    DateTime::from_timestamp_millis(timestamp)
        .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default()
}

fn point(timestamp: i64, cash: f64, exposure: f64) -> BankCurvePoint {
    BankCurvePoint {
        timestamp,
        date: date_label(timestamp),
        cash: round2(cash),
        equity: round2(cash + exposure),
    }
}

/// Replay bets in time order on top of `base_cash`
///
/// Emits an initial point, then one point per placement and per settlement.
/// Running totals are kept unrounded and rounded at each emission, so the
/// last point equals `round2(base_cash + net delta)`.
pub fn build_bank_curve(bets: &[Bet], base_cash: f64) -> BankCurve {
    let events = ledger_events(bets);

    let start = events.first().map(|e| e.timestamp).unwrap_or(0);
    let mut series = Vec::with_capacity(events.len() + 1);
    series.push(point(start, base_cash, 0.0));

    let mut cash = base_cash;
    let mut exposure = 0.0_f64;

    for event in &events {
        match event.kind {
            EventKind::Placed => exposure += event.bet.amount,
            EventKind::Settled => {
                exposure = (exposure - event.bet.amount).max(0.0);
                cash += settled_cash_change(event.bet);
            }
        }
        series.push(point(event.timestamp, cash, exposure));
    }

    debug!(points = series.len(), base_cash, final_cash = cash, "bank curve built");

    BankCurve {
        final_cash: round2(cash),
        series,
    }
}

/// Curve ending at `total_bank`, with the base inferred as
/// `max(0, total_bank - delta)`
pub fn reconciled_curve(total_bank: f64, bets: &[Bet]) -> BankCurve {
    let base = (total_bank - net_cash_delta_raw(bets)).max(0.0);
    build_bank_curve(bets, base)
}

/// Recompute the bankroll from a base plus the settled delta
///
/// Without a manual base the base is inferred from the current bankroll.
/// Neither the base nor the result may go negative; when either is floored
/// the corresponding flag is set so callers can warn the user.
pub fn reconcile(total_bank: f64, bets: &[Bet], manual_base: Option<f64>) -> Reconciliation {
    let delta = net_cash_delta_raw(bets);

    let raw_base = manual_base
        .filter(|b| b.is_finite())
        .unwrap_or(total_bank - delta);
    let base_clamped = raw_base < 0.0;
    let base = raw_base.max(0.0);

    let reconciled = base + delta;
    let clamped = reconciled < 0.0;

    if clamped {
        warn!(base, delta, "reconciled bankroll is negative, flooring at zero");
    }
    if base_clamped {
        warn!(raw_base, "reconciliation base is negative, flooring at zero");
    }

    Reconciliation {
        base_bank: round2(base),
        total_bank: round2(reconciled.max(0.0)),
        net_cash_delta: round2(delta),
        clamped,
        base_clamped,
    }
}
