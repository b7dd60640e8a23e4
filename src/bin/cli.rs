//! Bankroll CLI - stake suggestions and bankroll bookkeeping from the terminal

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use bankroll::analytics::{
    analyze_by_odds_range, calculate_metrics, recent_results, upcoming_matches,
};
use bankroll::config::StakingConfig;
use bankroll::core::kelly::{StakeAdvisor, DEFAULT_CONFIDENCE};
use bankroll::core::ledger::{reconcile, reconciled_curve};
use bankroll::core::progression::{
    compute_current_cycle_day_statuses, compute_next_progression_day, NextDayReason,
};
use bankroll::data::{open_store, Clock, Store, SystemClock};
use bankroll::format::{format_money, format_multiplier, parse_money, parse_multiplier};
use bankroll::models::{bets_from_matches, BankSettings, BetStatus};
use bankroll::validation::{
    validate_bank_settings, validate_bankroll, validate_confidence, validate_odds,
    validate_probability,
};

/// Default data directory (relative to the working directory)
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_CURRENCY: &str = "BRL";

#[derive(Parser)]
#[command(name = "bankroll")]
#[command(author, version, about = "Bankroll and staking CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Directory holding matches.json and bank_settings.json
    #[arg(long, default_value = DEFAULT_DATA_DIR, global = true)]
    data_dir: PathBuf,

    /// Directory that receives a copy of every save
    #[arg(long, global = true)]
    mirror_dir: Option<PathBuf>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a stake for a bet
    Suggest {
        /// Estimated win probability in percent (0-100)
        #[arg(short, long)]
        probability: f64,

        /// Decimal odds
        #[arg(short, long)]
        odds: f64,

        /// Bankroll to size against (defaults to the saved bankroll)
        #[arg(short, long, value_parser = money_arg)]
        bankroll: Option<f64>,

        /// Confidence in the estimate, 0-100
        #[arg(short, long, default_value = "100")]
        confidence: f64,
    },

    /// Show the bankroll history rebuilt from the saved bets
    Curve {
        /// Number of most recent points to show
        #[arg(long, default_value = "20")]
        last: usize,
    },

    /// Show the leverage-progression state
    Progression {
        /// Days in a cycle
        #[arg(long, default_value = "30")]
        max_days: u32,
    },

    /// Recompute the bankroll from its base and the settled bets
    Reconcile {
        /// Base bankroll (defaults to the saved base, else inferred)
        #[arg(long, value_parser = money_arg)]
        base: Option<f64>,

        /// Save the reconciled bankroll
        #[arg(long)]
        apply: bool,
    },

    /// Performance stats
    Stats,

    /// Most recently settled bets
    Recent {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Saved matches that have not kicked off yet
    Upcoming {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show or change the saved bankroll
    Bank {
        #[command(subcommand)]
        action: Option<BankAction>,
    },
}

#[derive(Subcommand)]
enum BankAction {
    /// Show the saved bankroll
    Show,

    /// Save bankroll, leverage and currency
    Set {
        /// Current bankroll, e.g. 1500 or "R$ 1.500,00"
        #[arg(value_parser = money_arg)]
        total: f64,

        /// Global leverage multiplier (0.1-10), e.g. 1.5 or 1,5x
        #[arg(long, value_parser = multiplier_arg)]
        leverage: Option<f64>,

        /// 3-letter currency code
        #[arg(long)]
        currency: Option<String>,
    },

    /// Set the reconciliation base
    Base {
        #[arg(value_parser = money_arg)]
        amount: f64,
    },
}

fn money_arg(input: &str) -> std::result::Result<f64, String> {
    parse_money(input).ok_or_else(|| format!("not an amount: {:?}", input))
}

fn multiplier_arg(input: &str) -> std::result::Result<f64, String> {
    parse_multiplier(input).ok_or_else(|| format!("not a multiplier: {:?}", input))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    println!("{}", "Bankroll CLI v0.2.0".cyan().bold());
    println!();

    let store_box = open_store(&cli.data_dir, cli.mirror_dir.as_deref());
    let store: &dyn Store = &*store_box;
    let staking = StakingConfig::default();

    if cli.interactive {
        return run_interactive(store, &staking);
    }

    match cli.command {
        Some(Commands::Suggest {
            probability,
            odds,
            bankroll,
            confidence,
        }) => suggest(store, &staking, probability, odds, bankroll, confidence)?,
        Some(Commands::Curve { last }) => show_curve(store, last)?,
        Some(Commands::Progression { max_days }) => show_progression(store, max_days)?,
        Some(Commands::Reconcile { base, apply }) => run_reconcile(store, base, apply)?,
        Some(Commands::Stats) => show_stats(store)?,
        Some(Commands::Recent { limit }) => show_recent(store, limit)?,
        Some(Commands::Upcoming { limit }) => show_upcoming(store, limit)?,
        Some(Commands::Bank { action }) => match action.unwrap_or(BankAction::Show) {
            BankAction::Show => show_bank(store)?,
            BankAction::Set {
                total,
                leverage,
                currency,
            } => set_bank(store, total, leverage, currency)?,
            BankAction::Base { amount } => set_base(store, amount)?,
        },
        None => {
            println!("No command specified. Use --help for usage information.");
            println!("Or use --interactive for interactive mode.");
        }
    }

    Ok(())
}

fn load_settings(store: &dyn Store) -> Result<Option<BankSettings>> {
    store
        .load_settings()
        .context("Failed to load bank settings")
}

fn require_settings(store: &dyn Store) -> Result<BankSettings> {
    match load_settings(store)? {
        Some(settings) => Ok(settings),
        None => bail!("No bankroll saved yet. Run `bankroll bank set <TOTAL>` first."),
    }
}

fn currency_of(settings: Option<&BankSettings>) -> String {
    settings
        .map(|s| s.currency.clone())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
}

fn signed_money(amount: f64, currency: &str) -> String {
    let text = format_money(amount, currency);
    if amount > 0.0 {
        format!("+{}", text).as_str().green().to_string()
    } else if amount < 0.0 {
        text.as_str().red().to_string()
    } else {
        text
    }
}

fn save_settings(store: &dyn Store, settings: &BankSettings) -> Result<()> {
    let settings = validate_bank_settings(settings)?;
    let outcome = store
        .save_settings(&settings)
        .context("Failed to save bank settings")?;
    if let Some(warning) = outcome.warning() {
        println!("{} {}", "Warning:".yellow(), warning);
    }
    Ok(())
}

fn suggest(
    store: &dyn Store,
    staking: &StakingConfig,
    probability: f64,
    odds: f64,
    bankroll: Option<f64>,
    confidence: f64,
) -> Result<()> {
    let settings = load_settings(store)?;
    let currency = currency_of(settings.as_ref());
    let bankroll = match bankroll.or_else(|| settings.as_ref().map(|s| s.total_bank)) {
        Some(b) => b,
        None => bail!("No bankroll given and none saved. Pass --bankroll or run `bankroll bank set`."),
    };

    validate_probability(probability)?;
    validate_odds(odds)?;
    validate_bankroll(bankroll)?;
    validate_confidence(confidence)?;

    let advisor = StakeAdvisor::new(staking.clone());
    let suggestion = advisor.suggest(probability, odds, bankroll, confidence);

    println!(
        "{}: {:.1}% @ {} / bankroll {}",
        "Suggesting".green(),
        probability,
        format_multiplier(odds),
        format_money(bankroll, &currency)
    );
    println!();

    let ev_text = format!("{:+.2}%", suggestion.expected_value);
    println!(
        "EV: {}   Edge: {:+.2} pts",
        if suggestion.expected_value > 0.0 {
            ev_text.as_str().green()
        } else {
            ev_text.as_str().red()
        },
        suggestion.edge
    );
    println!();

    println!("{}", "Stake tiers:".yellow().bold());
    println!("{}", "-".repeat(36));
    println!("{:<14} {:>20}", "Conservative", format_money(suggestion.conservative, &currency));
    println!("{:<14} {:>20}", "Moderate", format_money(suggestion.moderate, &currency));
    println!("{:<14} {:>20}", "Aggressive", format_money(suggestion.aggressive, &currency));
    println!("{:<14} {:>20}", "Kelly", format_money(suggestion.kelly, &currency));
    println!("{}", "-".repeat(36));
    println!(
        "{:<14} {:>20}",
        "Recommended".bold(),
        format_money(suggestion.recommended, &currency).as_str().bold()
    );
    println!("Method: {}", suggestion.method.as_str());
    println!();
    println!("{}", suggestion.explanation.as_str().dimmed());

    if advisor.below_minimum(suggestion.recommended) {
        println!(
            "{}",
            format!(
                "Recommended stake is below the minimum bet of {}.",
                format_money(staking.min_bet_amount, &currency)
            )
            .as_str()
            .yellow()
        );
    }

    Ok(())
}

fn show_curve(store: &dyn Store, last: usize) -> Result<()> {
    let settings = require_settings(store)?;
    let matches = store.load_matches().context("Failed to load saved matches")?;
    let bets = bets_from_matches(&matches);
    let curve = reconciled_curve(settings.total_bank, &bets);

    println!("{}", "Bankroll history:".yellow().bold());
    println!("{:<18} {:>18} {:>18}", "Date", "Cash", "Equity");
    println!("{}", "-".repeat(56));

    let skip = curve.series.len().saturating_sub(last);
    for point in curve.series.iter().skip(skip) {
        println!(
            "{:<18} {:>18} {:>18}",
            point.date,
            format_money(point.cash, &settings.currency),
            format_money(point.equity, &settings.currency)
        );
    }
    println!();
    println!(
        "Final cash: {}",
        format_money(curve.final_cash, &settings.currency).as_str().bold()
    );

    Ok(())
}

fn show_progression(store: &dyn Store, max_days: u32) -> Result<()> {
    let matches = store.load_matches().context("Failed to load saved matches")?;
    let bets = bets_from_matches(&matches);

    let next = compute_next_progression_day(&bets, max_days);
    let reason = match next.reason {
        NextDayReason::None => "no progression bets yet",
        NextDayReason::Lost => "last bet lost, cycle restarts",
        NextDayReason::Pending => "last bet still open",
        NextDayReason::Won => "last bet won",
        NextDayReason::Wrap => "cycle completed, starting again",
    };
    println!(
        "{} {} of {} ({})",
        "Next day:".green().bold(),
        next.next_day,
        max_days.max(1),
        reason
    );
    println!();

    let days = compute_current_cycle_day_statuses(&bets, max_days);
    if days.is_empty() {
        println!("{}", "No days played in the current cycle.".dimmed());
        return Ok(());
    }

    println!("{}", "Current cycle:".yellow().bold());
    for (day, status) in &days {
        let text = status.status.as_str();
        let label = match status.status {
            BetStatus::Won => text.green(),
            BetStatus::Lost => text.red(),
            BetStatus::Pending => text.yellow(),
            BetStatus::Cancelled => text.dimmed(),
        };
        println!("  Day {:>2}: {:<10} {}", day, label, status.source_bet_id.as_str().dimmed());
    }

    Ok(())
}

fn run_reconcile(store: &dyn Store, base: Option<f64>, apply: bool) -> Result<()> {
    let mut settings = require_settings(store)?;
    let matches = store.load_matches().context("Failed to load saved matches")?;
    let bets = bets_from_matches(&matches);

    let reconciliation = reconcile(settings.total_bank, &bets, base.or(settings.base_bank));
    let currency = settings.currency.clone();

    println!("{}", "Reconciliation:".yellow().bold());
    println!("Base:           {}", format_money(reconciliation.base_bank, &currency));
    println!(
        "Settled delta:  {}",
        signed_money(reconciliation.net_cash_delta, &currency)
    );
    println!(
        "Bankroll:       {} -> {}",
        format_money(settings.total_bank, &currency),
        format_money(reconciliation.total_bank, &currency).as_str().bold()
    );
    if reconciliation.base_clamped {
        println!("{}", "Base was negative and has been set to 0.".yellow());
    }
    if reconciliation.clamped {
        println!("{}", "Reconciled bankroll was negative and has been set to 0.".yellow());
    }

    if apply {
        settings.apply_reconciliation(&reconciliation, SystemClock.now_millis());
        save_settings(store, &settings)?;
        println!("{}", "Saved.".green());
    } else {
        println!("{}", "Run with --apply to save.".dimmed());
    }

    Ok(())
}

fn show_stats(store: &dyn Store) -> Result<()> {
    let settings = load_settings(store)?;
    let currency = currency_of(settings.as_ref());
    let matches = store.load_matches().context("Failed to load saved matches")?;
    let metrics = calculate_metrics(&matches, settings.as_ref().map_or(0.0, |s| s.total_bank));

    println!("{}", "Stats:".yellow().bold());
    println!("Matches:        {}", metrics.total_matches);
    println!("Positive EV:    {}", metrics.positive_ev_count);
    println!(
        "Won/Lost/Open:  {}/{}/{}",
        metrics.won_count, metrics.lost_count, metrics.pending_count
    );
    println!("Win rate:       {:.1}%", metrics.win_rate);
    println!("Avg odds:       {}", format_multiplier(metrics.avg_odds));
    println!("Profit:         {}", signed_money(metrics.total_profit, &currency));
    println!("ROI (bank):     {:+.1}%", metrics.roi);
    println!("ROI (turnover): {:+.1}%", metrics.turnover_roi);
    match metrics.profit_factor {
        Some(factor) => println!("Profit factor:  {:.2}", factor),
        None => println!("Profit factor:  n/a (no losses)"),
    }
    println!(
        "Max drawdown:   {} ({:.1}%)",
        format_money(metrics.max_drawdown, &currency),
        metrics.max_drawdown_pct
    );

    let by_odds = analyze_by_odds_range(&bets_from_matches(&matches));
    if !by_odds.is_empty() {
        println!("\n{}", "Analysis by Odds Range:".yellow().bold());
        println!(
            "{:<16} {:>6} {:>6} {:>8} {:>16} {:>8}",
            "Range", "Bets", "Wins", "Hit", "Profit", "ROI"
        );
        println!("{}", "-".repeat(65));
        for row in &by_odds {
            println!(
                "{:<16} {:>6} {:>6} {:>7.1}% {:>16} {:>+7.1}%",
                row.key,
                row.bets,
                row.wins,
                row.hit_rate,
                format_money(row.profit, &currency),
                row.roi
            );
        }
    }

    Ok(())
}

fn show_recent(store: &dyn Store, limit: usize) -> Result<()> {
    let currency = currency_of(load_settings(store)?.as_ref());
    let matches = store.load_matches().context("Failed to load saved matches")?;
    let recent = recent_results(&bets_from_matches(&matches), limit);

    if recent.is_empty() {
        println!("{}", "No settled bets yet.".dimmed());
        return Ok(());
    }

    println!("{}", "Recent results:".yellow().bold());
    for result in &recent {
        let text = format!("{:<4}", result.status.as_str().to_uppercase());
        let status = match result.status {
            BetStatus::Won => text.as_str().green(),
            _ => text.as_str().red(),
        };
        println!(
            "{} {:<18} {} @ {} {}",
            status,
            bankroll::core::ledger::date_label(result.settled_at),
            format_money(result.amount, &currency),
            format_multiplier(result.odds),
            signed_money(result.profit, &currency)
        );
    }

    Ok(())
}

fn show_upcoming(store: &dyn Store, limit: usize) -> Result<()> {
    let matches = store.load_matches().context("Failed to load saved matches")?;
    let upcoming = upcoming_matches(&matches, SystemClock.now_millis());

    if upcoming.is_empty() {
        println!("{}", "No upcoming matches.".dimmed());
        return Ok(());
    }

    println!("{}", "Upcoming matches:".yellow().bold());
    println!("{:<18} {:<40} {:>8}", "Kickoff", "Match", "EV");
    println!("{}", "-".repeat(68));
    for m in upcoming.iter().take(limit) {
        let ev = m.ev.map_or_else(|| "-".to_string(), |ev| format!("{:+.1}%", ev));
        println!(
            "{:<18} {:<40} {:>8}",
            bankroll::core::ledger::date_label(m.kickoff),
            format!("{} vs {}", m.home_team, m.away_team),
            ev
        );
    }

    Ok(())
}

fn show_bank(store: &dyn Store) -> Result<()> {
    let Some(settings) = load_settings(store)? else {
        println!("{}", "No bankroll saved yet.".dimmed());
        return Ok(());
    };

    println!("{}", "Bankroll:".yellow().bold());
    println!("Total:    {}", format_money(settings.total_bank, &settings.currency).as_str().bold());
    if let Some(base) = settings.base_bank {
        println!("Base:     {}", format_money(base, &settings.currency));
    }
    println!("Leverage: {}", format_multiplier(settings.effective_leverage()));
    println!("Currency: {}", settings.currency);

    Ok(())
}

fn set_bank(
    store: &dyn Store,
    total: f64,
    leverage: Option<f64>,
    currency: Option<String>,
) -> Result<()> {
    let now = SystemClock.now_millis();
    let mut settings =
        load_settings(store)?.unwrap_or_else(|| BankSettings::new(total, DEFAULT_CURRENCY, now));
    settings.save(total, leverage, now);
    if let Some(currency) = currency {
        settings.currency = currency;
    }

    save_settings(store, &settings)?;
    println!("{}", "Bankroll saved.".green());
    show_bank(store)
}

fn set_base(store: &dyn Store, amount: f64) -> Result<()> {
    let mut settings = require_settings(store)?;
    settings.set_base_bank(amount, SystemClock.now_millis());
    save_settings(store, &settings)?;
    println!(
        "Base set to {}",
        format_money(settings.base_bank.unwrap_or(0.0), &settings.currency)
    );
    Ok(())
}

fn run_interactive(store: &dyn Store, staking: &StakingConfig) -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    println!();

    let theme = ColorfulTheme::default();

    loop {
        let options = vec![
            "Suggest a stake",
            "Show stats",
            "Progression",
            "Show bankroll",
            "Upcoming matches",
            "Quit",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        let result = match selection {
            0 => {
                let probability: f64 = Input::with_theme(&theme)
                    .with_prompt("Probability (%)")
                    .interact_text()?;

                let odds: f64 = Input::with_theme(&theme)
                    .with_prompt("Odds")
                    .interact_text()?;

                let confidence: f64 = Input::with_theme(&theme)
                    .with_prompt("Confidence (%)")
                    .default(DEFAULT_CONFIDENCE)
                    .interact_text()?;

                let bankroll = match load_settings(store)? {
                    Some(settings) => settings.total_bank,
                    None => {
                        let text: String = Input::with_theme(&theme)
                            .with_prompt("Bankroll")
                            .validate_with(|input: &String| money_arg(input).map(|_| ()))
                            .interact_text()?;
                        money_arg(&text).map_err(anyhow::Error::msg)?
                    }
                };

                println!();
                suggest(store, staking, probability, odds, Some(bankroll), confidence)
            }
            1 => {
                println!();
                show_stats(store)
            }
            2 => {
                println!();
                show_progression(store, staking.max_progression_days)
            }
            3 => {
                println!();
                show_bank(store)
            }
            4 => {
                println!();
                show_upcoming(store, 10)
            }
            5 => {
                println!("Goodbye!");
                break;
            }
            _ => Ok(()),
        };

        // Bad input should not end the session
        if let Err(e) = result {
            println!("{} {:#}", "Error:".red(), e);
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_set_accepts_formatted_amounts() {
        let cli = Cli::try_parse_from(["bankroll", "bank", "set", "R$ 1.500,00", "--leverage", "1,5x"])
            .unwrap();
        match cli.command {
            Some(Commands::Bank {
                action: Some(BankAction::Set { total, leverage, .. }),
            }) => {
                assert!((total - 1500.0).abs() < 1e-9);
                assert_eq!(leverage, Some(1.5));
            }
            _ => panic!("expected bank set"),
        }
    }

    #[test]
    fn test_amount_flags_reject_scientific_notation() {
        assert!(Cli::try_parse_from(["bankroll", "bank", "set", "1e5"]).is_err());
        assert!(Cli::try_parse_from(["bankroll", "reconcile", "--base", "2e3"]).is_err());
        assert!(Cli::try_parse_from([
            "bankroll", "suggest", "-p", "60", "-o", "2", "--bankroll", "1e5"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["bankroll", "bank", "set", "100", "--leverage", "abc"]).is_err());
    }

    #[test]
    fn test_reconcile_base_parses_currency() {
        let cli = Cli::try_parse_from(["bankroll", "reconcile", "--base", "USD 250.50"]).unwrap();
        match cli.command {
            Some(Commands::Reconcile { base, apply }) => {
                assert_eq!(base, Some(250.5));
                assert!(!apply);
            }
            _ => panic!("expected reconcile"),
        }
    }
}
