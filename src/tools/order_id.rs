//! Order identifier generation
//!
//! Identifiers come from an explicitly chosen strategy. Two calls always
//! produce two distinct identifiers; orders are never deduplicated.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// How order identifiers are produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderIdStrategy {
    /// Monotonic per-process counter: `PREFIX-000001`, `PREFIX-000002`, ...
    #[default]
    Counter,
    /// Random UUID v4 token: `PREFIX-<uuid>`
    Random,
}

impl FromStr for OrderIdStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "counter" => Ok(Self::Counter),
            "random" => Ok(Self::Random),
            other => Err(format!("unknown order id strategy '{other}' (expected counter|random)")),
        }
    }
}

impl fmt::Display for OrderIdStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::Random => f.write_str("random"),
        }
    }
}

/// Generator bound to one provider instance
#[derive(Debug)]
pub struct OrderIdGenerator {
    prefix: String,
    strategy: OrderIdStrategy,
    next: AtomicU64,
}

impl OrderIdGenerator {
    pub fn new(prefix: impl Into<String>, strategy: OrderIdStrategy) -> Self {
        Self {
            prefix: prefix.into(),
            strategy,
            next: AtomicU64::new(1),
        }
    }

    pub fn strategy(&self) -> OrderIdStrategy {
        self.strategy
    }

    /// Produce the next identifier
    pub fn next_id(&self) -> String {
        match self.strategy {
            OrderIdStrategy::Counter => {
                let n = self.next.fetch_add(1, Ordering::Relaxed);
                format!("{}-{:06}", self.prefix, n)
            }
            OrderIdStrategy::Random => format!("{}-{}", self.prefix, uuid::Uuid::new_v4()),
        }
    }
}
