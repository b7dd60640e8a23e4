//! Input and record validation
//!
//! The engine itself never fails; these gates run before records are
//! persisted and before user input reaches the engine.

use crate::error::ValidationError;
use crate::models::{
    BankSettings, Bet, BetStatus, LEVERAGE_MAX, LEVERAGE_MIN, MAX_PROGRESSION_DAY, MAX_TOTAL_BANK,
};

fn check_leverage(field: &'static str, leverage: Option<f64>) -> Result<(), ValidationError> {
    match leverage {
        Some(l) if !l.is_finite() || !(LEVERAGE_MIN..=LEVERAGE_MAX).contains(&l) => {
            Err(ValidationError::new(
                field,
                format!(
                    "must be between {} and {}, got {}",
                    LEVERAGE_MIN, LEVERAGE_MAX, l
                ),
            ))
        }
        _ => Ok(()),
    }
}

/// Check bank settings and return the normalized copy
///
/// The currency code is uppercased and a neutral leverage of 1 is dropped.
pub fn validate_bank_settings(settings: &BankSettings) -> Result<BankSettings, ValidationError> {
    let total = settings.total_bank;
    if !total.is_finite() || !(0.0..=MAX_TOTAL_BANK).contains(&total) {
        return Err(ValidationError::new(
            "totalBank",
            format!("must be between 0 and {}, got {}", MAX_TOTAL_BANK, total),
        ));
    }

    if let Some(base) = settings.base_bank {
        if !base.is_finite() || base < 0.0 {
            return Err(ValidationError::new(
                "baseBank",
                format!("must be a non-negative number, got {}", base),
            ));
        }
    }

    check_leverage("leverage", settings.leverage)?;

    let currency = settings.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::new(
            "currency",
            format!("must be a 3-letter code, got {:?}", settings.currency),
        ));
    }

    Ok(BankSettings {
        total_bank: total,
        base_bank: settings.base_bank,
        leverage: BankSettings::normalize_leverage(settings.leverage),
        currency: currency.to_ascii_uppercase(),
        updated_at: settings.updated_at,
    })
}

/// Check a bet record before it is stored
pub fn validate_bet(bet: &Bet) -> Result<Bet, ValidationError> {
    if !bet.amount.is_finite() || bet.amount < 0.0 {
        return Err(ValidationError::new(
            "betAmount",
            format!("must be a non-negative number, got {}", bet.amount),
        ));
    }
    if bet.amount == 0.0 && bet.status != BetStatus::Cancelled {
        return Err(ValidationError::new(
            "betAmount",
            "must be greater than 0 unless the bet is cancelled",
        ));
    }

    validate_odds(bet.odds)?;
    check_leverage("leverage", bet.leverage)?;

    if let Some(progression) = bet.progression {
        if !(1..=MAX_PROGRESSION_DAY).contains(&progression.day) {
            return Err(ValidationError::new(
                "progression.day",
                format!(
                    "must be between 1 and {}, got {}",
                    MAX_PROGRESSION_DAY, progression.day
                ),
            ));
        }
    }

    if let Some(result_at) = bet.result_at {
        if result_at < bet.placed_at {
            return Err(ValidationError::new(
                "resultAt",
                "must not be earlier than the placement time",
            ));
        }
    }

    Ok(bet.clone())
}

/// Probability in percent, 0 to 100
pub fn validate_probability(probability: f64) -> Result<(), ValidationError> {
    if !probability.is_finite() || !(0.0..=100.0).contains(&probability) {
        return Err(ValidationError::new(
            "probability",
            format!("must be between 0 and 100, got {}", probability),
        ));
    }
    Ok(())
}

/// Decimal odds, strictly above 1
pub fn validate_odds(odds: f64) -> Result<(), ValidationError> {
    if !odds.is_finite() || odds <= 1.0 {
        return Err(ValidationError::new(
            "odds",
            format!("must be greater than 1, got {}", odds),
        ));
    }
    Ok(())
}

pub fn validate_bankroll(bankroll: f64) -> Result<(), ValidationError> {
    if !bankroll.is_finite() || bankroll <= 0.0 || bankroll > MAX_TOTAL_BANK {
        return Err(ValidationError::new(
            "bankroll",
            format!("must be between 0 and {}, got {}", MAX_TOTAL_BANK, bankroll),
        ));
    }
    Ok(())
}

pub fn validate_confidence(confidence: f64) -> Result<(), ValidationError> {
    if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
        return Err(ValidationError::new(
            "confidence",
            format!("must be between 0 and 100, got {}", confidence),
        ));
    }
    Ok(())
}
