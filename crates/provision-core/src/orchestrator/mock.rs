//! Scripted in-memory `RemoteApi` for orchestrator tests.

use crate::remote::{
    DatabaseRequest, Identity, RecordParent, RecordRequest, RemoteApi, RemoteError, RemoteId,
    SearchFilter,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
struct Calls {
    probes: usize,
    resources: usize,
    records: usize,
    seed_records: usize,
    database_requests: Vec<DatabaseRequest>,
}

/// Succeeds unless told otherwise. Failure positions are 1-based call
/// numbers.
#[derive(Default)]
pub struct ScriptedApi {
    probe_error: Option<RemoteError>,
    failing_resources: HashSet<usize>,
    rate_limited_resources: HashSet<usize>,
    failing_records: HashSet<usize>,
    failing_summary: bool,
    calls: Mutex<Calls>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_probe(mut self, error: RemoteError) -> Self {
        self.probe_error = Some(error);
        self
    }

    pub fn fail_resource(mut self, n: usize) -> Self {
        self.failing_resources.insert(n);
        self
    }

    pub fn rate_limit_resource(mut self, n: usize) -> Self {
        self.rate_limited_resources.insert(n);
        self
    }

    /// Fail the `n`th record created inside a database.
    pub fn fail_record(mut self, n: usize) -> Self {
        self.failing_records.insert(n);
        self
    }

    pub fn fail_summary(mut self) -> Self {
        self.failing_summary = true;
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.calls.lock().unwrap().probes
    }

    pub fn resource_calls(&self) -> usize {
        self.calls.lock().unwrap().resources
    }

    pub fn record_calls(&self) -> usize {
        self.calls.lock().unwrap().records
    }

    pub fn database_requests(&self) -> Vec<DatabaseRequest> {
        self.calls.lock().unwrap().database_requests.clone()
    }
}

#[async_trait]
impl RemoteApi for ScriptedApi {
    async fn identity_probe(&self) -> Result<Identity, RemoteError> {
        self.calls.lock().unwrap().probes += 1;
        match &self.probe_error {
            Some(e) => Err(e.clone()),
            None => Ok(Identity {
                id: "bot-1".to_string(),
                name: Some("Provisioner".to_string()),
                workspace: None,
            }),
        }
    }

    async fn create_resource(&self, request: &DatabaseRequest) -> Result<RemoteId, RemoteError> {
        let mut calls = self.calls.lock().unwrap();
        calls.resources += 1;
        let n = calls.resources;
        if self.rate_limited_resources.contains(&n) {
            return Err(RemoteError::RateLimited { retry_after: None });
        }
        if self.failing_resources.contains(&n) {
            return Err(RemoteError::Rejected(format!("cannot create {}", request.title)));
        }
        calls.database_requests.push(request.clone());
        Ok(RemoteId::new(format!("db-{}", calls.database_requests.len())))
    }

    async fn create_record(&self, request: &RecordRequest) -> Result<RemoteId, RemoteError> {
        let mut calls = self.calls.lock().unwrap();
        calls.records += 1;
        match request.parent {
            Some(RecordParent::Database(_)) => {
                calls.seed_records += 1;
                if self.failing_records.contains(&calls.seed_records) {
                    return Err(RemoteError::Internal("record write failed".to_string()));
                }
                Ok(RemoteId::new(format!("page-{}", calls.records)))
            }
            _ if self.failing_summary => Err(RemoteError::Timeout),
            _ => Ok(RemoteId::new(format!("summary-{}", calls.records))),
        }
    }

    async fn search(&self, _filter: &SearchFilter) -> Result<Vec<RemoteId>, RemoteError> {
        Ok(Vec::new())
    }
}
