//! Bankroll - sports-betting bankroll tracker core
//!
//! This library provides:
//! - Fractional-Kelly bet sizing with conservative/moderate/aggressive tiers
//! - Bankroll curve reconstruction and reconciliation from the bet history
//! - The leverage-progression day cycle
//! - Validation and JSON persistence of saved matches and bank settings
//!
//! # Example
//!
//! ```no_run
//! use bankroll::core::kelly::suggest_bet_amount;
//! use bankroll::core::ledger::reconcile;
//! use bankroll::models::{Bet, BetStatus};
//!
//! // 60% chance at odds 2.0 with a bankroll of 1000
//! let suggestion = suggest_bet_amount(60.0, 2.0, 1000.0, 80.0);
//! println!("Recommended stake: {}", suggestion.recommended);
//!
//! let bets = vec![Bet::new("m1", 100.0, 2.0, BetStatus::Won, 0)];
//! let reconciliation = reconcile(1000.0, &bets, Some(900.0));
//! println!("Reconciled bankroll: {}", reconciliation.total_bank);
//! ```

pub mod analytics;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod format;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{ServerConfig, StakingConfig};
pub use error::{StoreError, ValidationError};
pub use models::{BankSettings, Bet, BetStatus, Progression, SavedMatch};
