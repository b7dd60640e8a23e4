//! Recently settled bets

use serde::{Deserialize, Serialize};

use crate::format::round2;
use crate::models::{Bet, BetStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResult {
    pub match_id: String,
    pub status: BetStatus,
    pub amount: f64,
    pub odds: f64,
    /// Signed cash change of the settlement
    pub profit: f64,
    /// `result_at`, or the placement time when the result time is unknown
    pub settled_at: i64,
}

/// The `limit` most recent won or lost bets, newest first
pub fn recent_results(bets: &[Bet], limit: usize) -> Vec<RecentResult> {
    let mut results: Vec<RecentResult> = bets
        .iter()
        .filter_map(|bet| {
            let profit = match bet.status {
                BetStatus::Won => bet.potential_profit(),
                BetStatus::Lost => -bet.amount,
                BetStatus::Pending | BetStatus::Cancelled => return None,
            };
            Some(RecentResult {
                match_id: bet.match_id.clone(),
                status: bet.status,
                amount: bet.amount,
                odds: bet.odds,
                profit: round2(profit),
                settled_at: bet.result_at.unwrap_or(bet.placed_at),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.settled_at
            .cmp(&a.settled_at)
            .then_with(|| a.match_id.cmp(&b.match_id))
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_results_order_and_limit() {
        let bets = vec![
            Bet::new("old", 10.0, 2.0, BetStatus::Won, 1).with_result_at(5),
            Bet::new("open", 10.0, 2.0, BetStatus::Pending, 50),
            Bet::new("void", 10.0, 2.0, BetStatus::Cancelled, 60),
            Bet::new("newest", 10.0, 2.0, BetStatus::Lost, 2).with_result_at(40),
            Bet::new("no-result-time", 10.0, 1.5, BetStatus::Won, 30),
        ];

        let recent = recent_results(&bets, 10);
        let ids: Vec<&str> = recent.iter().map(|r| r.match_id.as_str()).collect();
        assert_eq!(ids, vec!["newest", "no-result-time", "old"]);
        assert!((recent[0].profit + 10.0).abs() < 1e-9);
        assert!((recent[1].profit - 5.0).abs() < 1e-9);
        assert_eq!(recent[1].settled_at, 30);

        assert_eq!(recent_results(&bets, 1).len(), 1);
        assert!(recent_results(&bets, 0).is_empty());
    }
}
