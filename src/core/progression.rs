//! Leverage-Progression Tracker
//!
//! A progression cycle stakes on day 1, 2, 3, ... while bets keep winning
//! and starts again from day 1 after a loss or after the last day.
//! Nothing is stored: the state is derived from the progression-tagged bets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Bet, BetStatus};

/// Why the tracker chose the next day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NextDayReason {
    /// No progression bets yet
    None,
    /// Last bet lost, cycle restarts
    Lost,
    /// Last bet still open, hold the day
    Pending,
    /// Last bet won, advance
    Won,
    /// Last bet won on the final day, cycle restarts
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDay {
    pub next_day: u32,
    pub reason: NextDayReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_day: Option<u32>,
}

/// Status of one day in the current cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayStatus {
    pub status: BetStatus,
    pub source_bet_id: String,
    pub timestamp: i64,
}

/// Progression bets that count: tagged, not cancelled, positive stake,
/// ordered by placement then match id
fn effective_sequence(bets: &[Bet]) -> Vec<(u32, &Bet)> {
    let mut sequence: Vec<(usize, u32, &Bet)> = bets
        .iter()
        .enumerate()
        .filter(|(_, b)| b.status != BetStatus::Cancelled)
        .filter(|(_, b)| b.amount.is_finite() && b.amount > 0.0)
        .filter_map(|(i, b)| b.progression_day().map(|day| (i, day, b)))
        .collect();

    sequence.sort_by(|a, b| {
        a.2.placed_at
            .cmp(&b.2.placed_at)
            .then_with(|| a.2.match_id.cmp(&b.2.match_id))
            .then(a.0.cmp(&b.0))
    });

    sequence.into_iter().map(|(_, day, bet)| (day, bet)).collect()
}

/// Next day to stake, decided by the most recent progression bet only
///
/// A `max_days` of 0 is treated as a one-day cycle.
pub fn compute_next_progression_day(bets: &[Bet], max_days: u32) -> NextDay {
    let max_days = max_days.max(1);
    let sequence = effective_sequence(bets);

    let Some(&(last_day, last)) = sequence.last() else {
        return NextDay {
            next_day: 1,
            reason: NextDayReason::None,
            last_day: None,
        };
    };

    let (next_day, reason) = match last.status {
        BetStatus::Lost => (1, NextDayReason::Lost),
        BetStatus::Pending => (last_day, NextDayReason::Pending),
        _ if last_day.saturating_add(1) > max_days => (1, NextDayReason::Wrap),
        _ => (last_day + 1, NextDayReason::Won),
    };

    NextDay {
        next_day,
        reason,
        last_day: Some(last_day),
    }
}

/// Per-day status for the cycle in progress
///
/// The current cycle is everything after the most recent loss. When two
/// bets claim the same day the later one wins; days outside `1..=max_days`
/// are ignored.
pub fn compute_current_cycle_day_statuses(bets: &[Bet], max_days: u32) -> BTreeMap<u32, DayStatus> {
    let max_days = max_days.max(1);
    let sequence = effective_sequence(bets);

    let cycle_start = sequence
        .iter()
        .rposition(|(_, bet)| bet.status == BetStatus::Lost)
        .map(|i| i + 1)
        .unwrap_or(0);

    let mut statuses = BTreeMap::new();
    for (day, bet) in &sequence[cycle_start..] {
        if !(1..=max_days).contains(day) {
            continue;
        }
        statuses.insert(
            *day,
            DayStatus {
                status: bet.status,
                source_bet_id: bet.match_id.clone(),
                timestamp: bet.placed_at,
            },
        );
    }

    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Progression;

    fn day_bet(id: &str, day: u32, status: BetStatus, at: i64) -> Bet {
        Bet::new(id, 10.0, 2.0, status, at).with_progression_day(day)
    }

    #[test]
    fn test_next_day_empty() {
        let next = compute_next_progression_day(&[], 5);
        assert_eq!(next.next_day, 1);
        assert_eq!(next.reason, NextDayReason::None);
        assert_eq!(next.last_day, None);
    }

    #[test]
    fn test_next_day_ignores_untagged_and_cancelled() {
        let mut disabled = Bet::new("off", 10.0, 2.0, BetStatus::Won, 3);
        disabled.progression = Some(Progression {
            enabled: false,
            day: 2,
        });
        let mut zero = day_bet("zero", 4, BetStatus::Won, 4);
        zero.amount = 0.0;

        let bets = vec![
            Bet::new("plain", 10.0, 2.0, BetStatus::Won, 1),
            day_bet("c", 3, BetStatus::Cancelled, 2),
            disabled,
            zero,
        ];

        assert_eq!(compute_next_progression_day(&bets, 5).reason, NextDayReason::None);
        assert!(compute_current_cycle_day_statuses(&bets, 5).is_empty());
    }

    #[test]
    fn test_next_day_scenario_reset_after_loss() {
        let bets = vec![
            day_bet("a", 1, BetStatus::Won, 1),
            day_bet("b", 2, BetStatus::Won, 2),
            day_bet("c", 3, BetStatus::Lost, 3),
        ];
        let next = compute_next_progression_day(&bets, 5);
        assert_eq!(
            next,
            NextDay {
                next_day: 1,
                reason: NextDayReason::Lost,
                last_day: Some(3)
            }
        );
        assert!(compute_current_cycle_day_statuses(&bets, 5).is_empty());
    }

    #[test]
    fn test_next_day_advances_on_win() {
        let bets = vec![day_bet("a", 1, BetStatus::Won, 1), day_bet("b", 2, BetStatus::Won, 2)];
        let next = compute_next_progression_day(&bets, 5);
        assert_eq!(next.next_day, 3);
        assert_eq!(next.reason, NextDayReason::Won);
        assert_eq!(next.last_day, Some(2));
    }

    #[test]
    fn test_next_day_holds_on_pending() {
        let bets = vec![
            day_bet("a", 1, BetStatus::Won, 1),
            day_bet("b", 2, BetStatus::Pending, 2),
        ];
        let next = compute_next_progression_day(&bets, 5);
        assert_eq!(next.next_day, 2);
        assert_eq!(next.reason, NextDayReason::Pending);
    }

    #[test]
    fn test_next_day_wraps_after_last_day() {
        for n in [1, 3, 30] {
            let bets = vec![day_bet("a", n, BetStatus::Won, 1)];
            assert_eq!(
                compute_next_progression_day(&bets, n),
                NextDay {
                    next_day: 1,
                    reason: NextDayReason::Wrap,
                    last_day: Some(n)
                }
            );
        }
    }

    #[test]
    fn test_next_day_uses_chronological_last() {
        // Input order differs from placement order
        let bets = vec![
            day_bet("late", 2, BetStatus::Lost, 20),
            day_bet("early", 1, BetStatus::Won, 10),
        ];
        assert_eq!(compute_next_progression_day(&bets, 5).reason, NextDayReason::Lost);
    }

    #[test]
    fn test_next_day_reset_law() {
        for history in [
            vec![],
            vec![BetStatus::Won],
            vec![BetStatus::Won, BetStatus::Pending],
            vec![BetStatus::Lost, BetStatus::Won, BetStatus::Won],
        ] {
            let mut bets: Vec<Bet> = history
                .iter()
                .enumerate()
                .map(|(i, s)| day_bet(&format!("m{}", i), i as u32 + 1, *s, i as i64))
                .collect();
            bets.push(day_bet("last", 4, BetStatus::Lost, 100));
            assert_eq!(compute_next_progression_day(&bets, 30).next_day, 1);
        }
    }

    #[test]
    fn test_cycle_statuses_after_loss() {
        let bets = vec![
            day_bet("a", 1, BetStatus::Won, 1),
            day_bet("b", 2, BetStatus::Lost, 2),
            day_bet("c", 1, BetStatus::Won, 3),
            day_bet("d", 2, BetStatus::Pending, 4),
        ];
        let statuses = compute_current_cycle_day_statuses(&bets, 5);

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[&1].status, BetStatus::Won);
        assert_eq!(statuses[&1].source_bet_id, "c");
        assert_eq!(statuses[&2].status, BetStatus::Pending);
        assert_eq!(statuses[&2].timestamp, 4);
    }

    #[test]
    fn test_cycle_statuses_duplicate_days_last_write_wins() {
        let bets = vec![
            day_bet("second", 1, BetStatus::Won, 20),
            day_bet("first", 1, BetStatus::Pending, 10),
        ];
        let statuses = compute_current_cycle_day_statuses(&bets, 5);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[&1].source_bet_id, "second");
    }

    #[test]
    fn test_cycle_statuses_ignore_out_of_range_days() {
        let bets = vec![
            day_bet("a", 0, BetStatus::Won, 1),
            day_bet("b", 7, BetStatus::Won, 2),
            day_bet("c", 3, BetStatus::Won, 3),
        ];
        let statuses = compute_current_cycle_day_statuses(&bets, 5);
        assert_eq!(statuses.keys().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_zero_max_days_is_one_day_cycle() {
        let bets = vec![day_bet("a", 1, BetStatus::Won, 1)];
        assert_eq!(compute_next_progression_day(&bets, 0).reason, NextDayReason::Wrap);
    }
}
