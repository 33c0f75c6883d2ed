//! Performance test kinds and their fixed parameter templates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A benchmark profile the scheduler knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    /// OLTP workload, TPC-C derived.
    Dbt2,
    /// Decision support, TPC-H derived.
    Dbt3,
    /// Brokerage workload, TPC-E derived.
    Dbt5,
    /// Decision support, TPC-DS derived.
    Dbt7,
}

const DBT2_DEFAULTS: &[(&str, u32)] = &[
    ("warehouses", 1),
    ("duration", 120),
    ("connection_delay", 1),
    ("connections_per_processor", 1),
    ("terminal_limit", 1),
];

const DBT3_DEFAULTS: &[(&str, u32)] = &[
    ("scale", 1),
    ("duration", 120),
    ("connection_delay", 1),
    ("connections_per_processor", 1),
    ("terminal_limit", 1),
];

const DBT5_DEFAULTS: &[(&str, u32)] = &[
    ("customers", 1000),
    ("duration", 120),
    ("connection_delay", 1),
    ("users", 1),
];

const DBT7_DEFAULTS: &[(&str, u32)] = &[
    ("scale", 1),
    ("duration", 120),
    ("connection_delay", 1),
    ("connections_per_processor", 1),
    ("terminal_limit", 1),
];

impl TestKind {
    /// Every kind, in dispatch order.
    pub const ALL: [TestKind; 4] = [
        TestKind::Dbt2,
        TestKind::Dbt3,
        TestKind::Dbt5,
        TestKind::Dbt7,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TestKind::Dbt2 => "dbt2",
            TestKind::Dbt3 => "dbt3",
            TestKind::Dbt5 => "dbt5",
            TestKind::Dbt7 => "dbt7",
        }
    }

    /// Kind-specific build parameters sent with every force request.
    pub fn defaults(self) -> &'static [(&'static str, u32)] {
        match self {
            TestKind::Dbt2 => DBT2_DEFAULTS,
            TestKind::Dbt3 => DBT3_DEFAULTS,
            TestKind::Dbt5 => DBT5_DEFAULTS,
            TestKind::Dbt7 => DBT7_DEFAULTS,
        }
    }

    /// Name of the force scheduler for this kind on a worker.
    pub fn scheduler_name(self, worker: &str) -> String {
        format!("run-{}-{}", self.as_str(), worker)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dbt2" => Ok(TestKind::Dbt2),
            "dbt3" => Ok(TestKind::Dbt3),
            "dbt5" => Ok(TestKind::Dbt5),
            "dbt7" => Ok(TestKind::Dbt7),
            other => Err(Error::InvalidInput(format!(
                "unknown test '{}' (expected one of dbt2, dbt3, dbt5, dbt7)",
                other
            ))),
        }
    }
}
