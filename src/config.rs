//! Engine constants and server settings

use std::path::PathBuf;

/// Staking constants used by the bet-sizing engine and progression tracker
#[derive(Debug, Clone)]
pub struct StakingConfig {
    /// Fraction of full Kelly actually staked (0.25 = quarter Kelly)
    pub kelly_fraction: f64,
    /// Hard ceiling on a single stake as a fraction of bankroll
    pub max_exposure: f64,
    pub conservative_pct: f64,
    pub moderate_pct: f64,
    pub aggressive_pct: f64,
    /// Smallest stake the UI accepts (not enforced by the engine)
    pub min_bet_amount: f64,
    /// Length of a leverage-progression cycle
    pub max_progression_days: u32,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            kelly_fraction: 0.25,
            max_exposure: 0.10,
            conservative_pct: 0.01,
            moderate_pct: 0.025,
            aggressive_pct: 0.05,
            min_bet_amount: 1.0,
            max_progression_days: 30,
        }
    }
}

/// HTTP server settings, read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Second directory kept as a best-effort copy of `data_dir`
    pub mirror_dir: Option<PathBuf>,
    pub cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            mirror_dir: None,
            cache_ttl_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Load from `HOST`, `PORT`, `DATA_DIR`, `MIRROR_DIR` and `CACHE_TTL_SECS`.
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            mirror_dir: lookup("MIRROR_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            cache_ttl_secs: lookup("CACHE_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_secs),
        }
    }

    pub fn cache_ttl_ms(&self) -> i64 {
        i64::try_from(self.cache_ttl_secs.saturating_mul(1000)).unwrap_or(i64::MAX)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
