//! Bankroll Metrics
//!
//! Win rate, ROI, profit factor and drawdown over the saved matches.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::ledger::{reconciled_curve, BankCurvePoint};
use crate::format::round2;
use crate::models::{bets_from_matches, Bet, BetStatus, SavedMatch};

/// Performance summary of the saved matches
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankrollMetrics {
    // Counts
    pub total_matches: usize,
    pub positive_ev_count: usize,
    pub won_count: usize,
    pub lost_count: usize,
    pub pending_count: usize,

    /// Percent of settled bets that won
    pub win_rate: f64,
    pub avg_odds: f64,

    // Win/Loss
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub total_profit: f64,
    /// Settled stake
    pub turnover: f64,

    /// Profit as a percent of the current bankroll
    pub roi: f64,
    /// Profit as a percent of settled stake
    pub turnover_roi: f64,

    // Risk metrics
    /// Gross profit over gross loss; `None` when there are wins but no losses
    pub profit_factor: Option<f64>,
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
}

fn settled_profit(bet: &Bet) -> Option<f64> {
    match bet.status {
        BetStatus::Won => Some(bet.potential_profit()),
        BetStatus::Lost => Some(-bet.amount),
        BetStatus::Pending | BetStatus::Cancelled => None,
    }
}

fn is_settled(bet: &Bet) -> bool {
    matches!(bet.status, BetStatus::Won | BetStatus::Lost) && bet.amount > 0.0
}

/// Calculate metrics from saved matches and the current bankroll
pub fn calculate_metrics(matches: &[SavedMatch], total_bank: f64) -> BankrollMetrics {
    let bets = bets_from_matches(matches);
    let settled: Vec<&Bet> = bets.iter().filter(|b| is_settled(b)).collect();

    let won_count = settled.iter().filter(|b| b.status == BetStatus::Won).count();
    let lost_count = settled.len() - won_count;
    let pending_count = bets
        .iter()
        .filter(|b| b.status == BetStatus::Pending)
        .count();

    let profits: Vec<f64> = settled.iter().filter_map(|b| settled_profit(b)).collect();
    let gross_profit: f64 = profits.iter().filter(|&&p| p > 0.0).sum();
    let gross_loss: f64 = profits.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();
    let total_profit: f64 = profits.iter().sum();
    let turnover: f64 = settled.iter().map(|b| b.amount).sum();

    let win_rate = if settled.is_empty() {
        0.0
    } else {
        won_count as f64 * 100.0 / settled.len() as f64
    };

    let avg_odds = if settled.is_empty() {
        0.0
    } else {
        settled.iter().map(|b| b.odds).sum::<f64>() / settled.len() as f64
    };

    // Profit Factor
    let profit_factor = if gross_loss > 0.0 {
        Some(gross_profit / gross_loss)
    } else if gross_profit > 0.0 {
        None
    } else {
        Some(0.0)
    };

    let roi = if total_bank > 0.0 {
        total_profit * 100.0 / total_bank
    } else {
        0.0
    };
    let turnover_roi = if turnover > 0.0 {
        total_profit * 100.0 / turnover
    } else {
        0.0
    };

    let curve = reconciled_curve(total_bank.max(0.0), &bets);
    let (max_drawdown, max_drawdown_pct) = max_drawdown(&curve.series);

    BankrollMetrics {
        total_matches: matches.len(),
        positive_ev_count: matches
            .iter()
            .filter(|m| m.ev().is_some_and(|ev| ev > 0.0))
            .count(),
        won_count,
        lost_count,
        pending_count,
        win_rate,
        avg_odds,
        gross_profit: round2(gross_profit),
        gross_loss: round2(gross_loss),
        total_profit: round2(total_profit),
        turnover: round2(turnover),
        roi,
        turnover_roi,
        profit_factor,
        max_drawdown: round2(max_drawdown),
        max_drawdown_pct,
    }
}

/// Largest peak-to-trough fall of the cash series, absolute and as a
/// percent of the peak
pub fn max_drawdown(series: &[BankCurvePoint]) -> (f64, f64) {
    let mut peak = f64::MIN;
    let mut max_drawdown = 0.0_f64;
    let mut max_drawdown_pct = 0.0_f64;

    for point in series {
        if point.cash > peak {
            peak = point.cash;
        }
        let drawdown = peak - point.cash;
        if drawdown > max_drawdown {
            max_drawdown = drawdown;
            max_drawdown_pct = if peak > 0.0 { drawdown * 100.0 / peak } else { 0.0 };
        }
    }

    (max_drawdown, max_drawdown_pct)
}

/// Analysis results by dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionAnalysis {
    pub key: String,
    pub bets: usize,
    pub wins: usize,
    /// Percent
    pub hit_rate: f64,
    pub stake: f64,
    pub profit: f64,
    /// Percent of stake
    pub roi: f64,
}

fn odds_bucket(odds: f64) -> &'static str {
    if odds < 1.5 {
        "low (<1.5)"
    } else if odds <= 2.5 {
        "mid (1.5-2.5)"
    } else {
        "high (>2.5)"
    }
}

/// Analyze settled bets by odds range
pub fn analyze_by_odds_range(bets: &[Bet]) -> Vec<DimensionAnalysis> {
    let mut grouped: HashMap<&str, Vec<&Bet>> = HashMap::new();
    for bet in bets.iter().filter(|b| is_settled(b)) {
        grouped.entry(odds_bucket(bet.odds)).or_default().push(bet);
    }

    let mut results: Vec<DimensionAnalysis> = grouped
        .iter()
        .map(|(key, group)| {
            let total = group.len();
            let wins = group.iter().filter(|b| b.status == BetStatus::Won).count();
            let stake: f64 = group.iter().map(|b| b.amount).sum();
            let profit: f64 = group.iter().filter_map(|b| settled_profit(b)).sum();

            DimensionAnalysis {
                key: key.to_string(),
                bets: total,
                wins,
                hit_rate: if total > 0 {
                    wins as f64 * 100.0 / total as f64
                } else {
                    0.0
                },
                stake: round2(stake),
                profit: round2(profit),
                roi: if stake > 0.0 {
                    profit * 100.0 / stake
                } else {
                    0.0
                },
            }
        })
        .collect();

    results.sort_by(|a, b| a.key.cmp(&b.key));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisSummary, BetInfo};
    use serde_json::Map;

    fn saved(id: &str, at: i64, amount: f64, odd: f64, status: BetStatus, ev: f64) -> SavedMatch {
        let mut m = SavedMatch::new(id, at);
        m.result = Some(AnalysisSummary {
            probability: Some(70.0),
            ev: Some(ev),
            extra: Map::new(),
        });
        m.bet_info = Some(BetInfo {
            bet_amount: amount,
            odd: Some(odd),
            potential_return: Some(amount * odd),
            status,
            placed_at: None,
            result_at: None,
            leverage: None,
            progression: None,
            extra: Map::new(),
        });
        m
    }

    fn create_test_matches() -> Vec<SavedMatch> {
        vec![
            saved("a", 1, 100.0, 2.0, BetStatus::Won, 5.0),
            saved("b", 2, 50.0, 1.4, BetStatus::Lost, -2.0),
            saved("c", 3, 100.0, 3.0, BetStatus::Won, 8.0),
            saved("d", 4, 20.0, 1.8, BetStatus::Pending, 1.0),
            SavedMatch::new("e", 5),
        ]
    }

    #[test]
    fn test_calculate_metrics() {
        let metrics = calculate_metrics(&create_test_matches(), 1000.0);

        assert_eq!(metrics.total_matches, 5);
        assert_eq!(metrics.positive_ev_count, 3);
        assert_eq!(metrics.won_count, 2);
        assert_eq!(metrics.lost_count, 1);
        assert_eq!(metrics.pending_count, 1);
        assert!((metrics.win_rate - 66.6667).abs() < 0.01);
        assert!((metrics.gross_profit - 300.0).abs() < 1e-9); // 100 + 200
        assert!((metrics.gross_loss - 50.0).abs() < 1e-9);
        assert!((metrics.total_profit - 250.0).abs() < 1e-9);
        assert!((metrics.roi - 25.0).abs() < 1e-9);
        assert!((metrics.turnover_roi - 100.0).abs() < 1e-9); // 250 / 250
        assert!((metrics.profit_factor.unwrap() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_profit_factor_without_losses() {
        let matches = vec![
            saved("a", 1, 100.0, 2.0, BetStatus::Won, 5.0),
            saved("b", 2, 40.0, 1.5, BetStatus::Won, 3.0),
        ];
        let metrics = calculate_metrics(&matches, 500.0);
        assert_eq!(metrics.profit_factor, None);

        let json = serde_json::to_value(&metrics).unwrap();
        assert!(json["profitFactor"].is_null());
        let back: BankrollMetrics = serde_json::from_value(json).unwrap();
        assert_eq!(back.profit_factor, None);
        assert!((back.gross_profit - metrics.gross_profit).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_metrics_empty() {
        let metrics = calculate_metrics(&[], 0.0);

        assert_eq!(metrics.total_matches, 0);
        assert_eq!(metrics.won_count, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.roi, 0.0);
        assert_eq!(metrics.profit_factor, Some(0.0));
    }

    #[test]
    fn test_max_drawdown() {
        let matches = vec![
            saved("a", 1, 100.0, 10.0, BetStatus::Won, 1.0),
            saved("b", 2, 100.0, 10.0, BetStatus::Lost, 1.0),
            saved("c", 3, 100.0, 10.0, BetStatus::Lost, 1.0),
        ];

        // Base 1000 - 700 = 300, cash: 300, 1200, 1100, 1000
        let metrics = calculate_metrics(&matches, 1000.0);
        assert!((metrics.max_drawdown - 200.0).abs() < 1e-9);
        assert!((metrics.max_drawdown_pct - 200.0 * 100.0 / 1200.0).abs() < 1e-9);
    }

    #[test]
    fn test_analyze_by_odds_range() {
        let bets = bets_from_matches(&create_test_matches());
        let analysis = analyze_by_odds_range(&bets);

        // Pending "d" is left out: 2.0 (mid), 1.4 (low), 3.0 (high)
        assert_eq!(analysis.len(), 3);
        let low = analysis.iter().find(|a| a.key == "low (<1.5)").unwrap();
        assert_eq!(low.bets, 1);
        assert_eq!(low.wins, 0);
        assert!((low.roi + 100.0).abs() < 1e-9);

        let high = analysis.iter().find(|a| a.key == "high (>2.5)").unwrap();
        assert_eq!(high.wins, 1);
        assert!((high.hit_rate - 100.0).abs() < 1e-9);
        assert!((high.profit - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_odds_bucket_edges() {
        assert_eq!(odds_bucket(1.49), "low (<1.5)");
        assert_eq!(odds_bucket(1.5), "mid (1.5-2.5)");
        assert_eq!(odds_bucket(2.5), "mid (1.5-2.5)");
        assert_eq!(odds_bucket(2.51), "high (>2.5)");
    }
}
