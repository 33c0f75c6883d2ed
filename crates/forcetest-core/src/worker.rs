//! Worker selection.

use serde::{Deserialize, Serialize};

/// Which workers to queue builds on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerSelection {
    /// Every worker registered with the scheduler, fetched at startup.
    #[default]
    All,
    /// Only these workers. The scheduler is never asked for its list.
    Named(Vec<String>),
}

impl WorkerSelection {
    /// Build a selection from operator input; an empty list means all workers.
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            WorkerSelection::All
        } else {
            WorkerSelection::Named(names)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, WorkerSelection::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_names_select_all() {
        assert!(WorkerSelection::from_names(vec![]).is_all());
        assert_eq!(
            WorkerSelection::from_names(vec!["w1".to_string()]),
            WorkerSelection::Named(vec!["w1".to_string()])
        );
    }
}
