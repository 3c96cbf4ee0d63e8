//! Environments and sync directions
//!
//! Every remote call and every ID lookup takes an explicit [`Environment`];
//! nothing is inferred from ambient configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

/// One of the two reconciled stores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
}

impl Environment {
    pub const ALL: [Self; 2] = [Self::Production, Self::Staging];

    /// The other side of a one-way sync
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Production => Self::Staging,
            Self::Staging => Self::Production,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "staging" | "stage" => Ok(Self::Staging),
            other => Err(format!("Unknown environment '{other}' (expected production or staging)")),
        }
    }
}

/// Direction of a one-way push, as offered by the direction selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    ProductionToStaging,
    StagingToProduction,
}

impl SyncDirection {
    #[must_use]
    pub const fn source(self) -> Environment {
        match self {
            Self::ProductionToStaging => Environment::Production,
            Self::StagingToProduction => Environment::Staging,
        }
    }

    #[must_use]
    pub const fn target(self) -> Environment {
        self.source().opposite()
    }

    #[must_use]
    pub const fn towards(target: Environment) -> Self {
        match target {
            Environment::Staging => Self::ProductionToStaging,
            Environment::Production => Self::StagingToProduction,
        }
    }
}
