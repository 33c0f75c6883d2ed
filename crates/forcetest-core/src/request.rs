//! Force requests and the build scheduler trait.
//!
//! A force request asks the scheduler to run one test kind on one worker for
//! one commit, outside its normal trigger conditions.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{Commit, Result, Secret, TestKind};

/// Reason recorded on every forced build.
pub const FORCE_REASON: &str = "force jsonrpc";

/// JSON-RPC id sent with every force call.
pub const JSONRPC_ID: u32 = 5432;

/// Parameters of a forced build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForceParams {
    pub reason: String,
    pub revision: String,
    pub branch: String,
    pub owner: String,
    /// Kind-specific settings (duration, scale, ...).
    #[serde(flatten)]
    pub settings: BTreeMap<String, u32>,
}

impl ForceParams {
    /// Merge a kind's parameter template with the commit, branch and owner.
    pub fn new(kind: TestKind, commit: &Commit, branch: &str, owner: &str) -> Self {
        Self {
            reason: FORCE_REASON.to_string(),
            revision: commit.to_string(),
            branch: branch.to_string(),
            owner: owner.to_string(),
            settings: kind
                .defaults()
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }
}

/// One forced build for a (commit, test kind, worker) tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForceRequest {
    pub kind: TestKind,
    pub worker: String,
    pub params: ForceParams,
}

impl ForceRequest {
    pub fn new(kind: TestKind, worker: &str, commit: &Commit, branch: &str, owner: &str) -> Self {
        Self {
            kind,
            worker: worker.to_string(),
            params: ForceParams::new(kind, commit, branch, owner),
        }
    }

    /// Scheduler this request is posted to, e.g. `run-dbt2-worker1`.
    pub fn scheduler_name(&self) -> String {
        self.kind.scheduler_name(&self.worker)
    }

    /// The JSON-RPC envelope for this request.
    pub fn envelope(&self) -> JsonRpcRequest<'_> {
        JsonRpcRequest {
            jsonrpc: "2.0",
            method: "force",
            id: JSONRPC_ID,
            params: &self.params,
        }
    }
}

/// JSON-RPC 2.0 call body.
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub id: u32,
    pub params: &'a ForceParams,
}

/// Trait for the remote build scheduler.
#[async_trait]
pub trait BuildScheduler: Send + Sync {
    /// Authenticate and establish a session for later calls.
    async fn login(&self, user: &str, secret: &Secret) -> Result<()>;

    /// Names of all workers registered with the scheduler.
    async fn list_workers(&self) -> Result<Vec<String>>;

    /// Submit a forced build.
    async fn force(&self, request: &ForceRequest) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dbt2_payload() {
        let request = ForceRequest::new(
            TestKind::Dbt2,
            "workerA",
            &Commit::from("aaa111"),
            "release/16",
            "alice",
        );

        let body = serde_json::to_value(request.envelope()).unwrap();
        assert_eq!(
            body,
            json!({
                "jsonrpc": "2.0",
                "method": "force",
                "id": 5432,
                "params": {
                    "reason": "force jsonrpc",
                    "revision": "aaa111",
                    "branch": "release/16",
                    "owner": "alice",
                    "warehouses": 1,
                    "duration": 120,
                    "connection_delay": 1,
                    "connections_per_processor": 1,
                    "terminal_limit": 1
                }
            })
        );
        assert_eq!(request.scheduler_name(), "run-dbt2-workerA");
    }

    #[test]
    fn test_params_contain_exactly_template_fields() {
        let commit = Commit::from("bbb222");
        for kind in TestKind::ALL {
            let params = ForceParams::new(kind, &commit, "master", "bob");
            let value = serde_json::to_value(&params).unwrap();
            let object = value.as_object().unwrap();

            let mut expected: Vec<&str> = vec!["reason", "revision", "branch", "owner"];
            expected.extend(kind.defaults().iter().map(|(n, _)| *n));
            expected.sort();

            let mut actual: Vec<&str> = object.keys().map(|k| k.as_str()).collect();
            actual.sort();

            assert_eq!(actual, expected, "unexpected fields for {}", kind);
            assert_eq!(object["revision"], "bbb222");
            assert_eq!(object["branch"], "master");
            assert_eq!(object["owner"], "bob");
        }
    }

    #[test]
    fn test_dbt5_settings() {
        let params = ForceParams::new(TestKind::Dbt5, &Commit::from("c"), "b", "o");
        assert_eq!(params.settings.get("customers"), Some(&1000));
        assert_eq!(params.settings.get("users"), Some(&1));
        assert_eq!(params.settings.len(), 4);
    }
}
