//! Core calculation modules

pub mod kelly;
pub mod ledger;
pub mod progression;

// Re-export commonly used types
pub use kelly::{
    calculate_ev, calculate_kelly_stake, suggest_bet_amount, BetSuggestion, SizingMethod,
    StakeAdvisor,
};
pub use ledger::{
    build_bank_curve, compute_net_cash_delta, reconcile, reconciled_curve, BankCurve,
    BankCurvePoint, Reconciliation,
};
pub use progression::{
    compute_current_cycle_day_statuses, compute_next_progression_day, DayStatus, NextDay,
    NextDayReason,
};
