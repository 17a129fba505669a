use log::warn;
use serde::Deserialize;

use std::env;
use std::str::FromStr;

use super::transaction::validate_amount;

/// Mining and reward parameters of a ledger
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerConfig {
    /// Number of leading '0' hex digits a block hash must carry
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,

    /// Amount credited to the coinbase address for each mined block
    #[serde(default = "default_mining_reward")]
    pub mining_reward: f64,

    /// Highest nonce tried before mining gives up
    #[serde(default = "default_max_nonce")]
    pub max_nonce: u64,

    /// Scan the nonce range on the rayon thread pool
    #[serde(default)]
    pub parallel_mining: bool,
}

fn default_difficulty() -> usize {
    3
}

fn default_mining_reward() -> f64 {
    1.0
}

fn default_max_nonce() -> u64 {
    u64::MAX
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
            max_nonce: default_max_nonce(),
            parallel_mining: false,
        }
    }
}

impl LedgerConfig {
    /// Reads overrides from `LEDGER_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            difficulty: env_or("LEDGER_DIFFICULTY", defaults.difficulty),
            mining_reward: reward_or_default(
                env_or("LEDGER_MINING_REWARD", defaults.mining_reward),
                defaults.mining_reward,
            ),
            max_nonce: env_or("LEDGER_MAX_NONCE", defaults.max_nonce),
            parallel_mining: env_or("LEDGER_PARALLEL_MINING", defaults.parallel_mining),
        }
    }

    pub fn with_difficulty(mut self, difficulty: usize) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_mining_reward(mut self, mining_reward: f64) -> Self {
        self.mining_reward = mining_reward;
        self
    }

    pub fn with_max_nonce(mut self, max_nonce: u64) -> Self {
        self.max_nonce = max_nonce;
        self
    }

    pub fn with_parallel_mining(mut self, parallel_mining: bool) -> Self {
        self.parallel_mining = parallel_mining;
        self
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

// Rewards follow the same rule as transfer amounts.
fn reward_or_default(reward: f64, default: f64) -> f64 {
    match validate_amount(reward) {
        Ok(()) => reward,
        Err(err) => {
            warn!("Ignoring LEDGER_MINING_REWARD: {}", err);
            default
        }
    }
}
