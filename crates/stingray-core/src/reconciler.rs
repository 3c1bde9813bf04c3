//! Fetch, plan, apply.
//!
//! Each call performs at most one GET and one mutating request, strictly in
//! sequence. No state survives between calls: the snapshot is fetched fresh
//! every time and dropped when the [`Outcome`] is returned.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::change::{ChangeRecord, ResourceId};
use crate::endpoint::PoolEndpoint;
use crate::error::{Attempt, ReconcileError, Result};
use crate::model::{NodeAttributes, PoolProperties, PoolSnapshot};
use crate::plan::{
    Method, NodeMode, Plan, PoolOperation, PoolState, plan_node, plan_pool, plan_pool_operation,
};
use crate::transport::Transport;

/// What a reconciliation call reports back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub changed: bool,
    #[serde(rename = "msg")]
    pub record: ChangeRecord,
    /// Latest known pool document; `None` once the pool is gone or was never there.
    #[serde(rename = "data")]
    pub snapshot: Option<Value>,
}

/// Drives reconciliation of pools and nodes through a [`Transport`].
#[derive(Debug)]
pub struct Reconciler<T> {
    transport: T,
    endpoint: PoolEndpoint,
}

impl<T: Transport> Reconciler<T> {
    pub fn new(transport: T, endpoint: PoolEndpoint) -> Self {
        Self {
            transport,
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &PoolEndpoint {
        &self.endpoint
    }

    /// Ensure a pool is present with the desired properties, or absent.
    ///
    /// A 404 on fetch means the pool does not exist yet.
    pub async fn reconcile_pool(
        &self,
        pool: &str,
        desired: &PoolProperties,
        state: PoolState,
        dry_run: bool,
    ) -> Result<Outcome> {
        let resource = ResourceId::pool(pool);
        let url = self.endpoint.pool_url(pool);

        let existing = self.fetch(&resource, &url, true).await?;
        let plan = plan_pool(pool, existing.as_ref(), desired, state)?;
        self.apply(&resource, &url, plan, existing, dry_run).await
    }

    /// Ensure a node is present with the desired attributes, absent, or in a given state.
    ///
    /// The pool itself must already exist.
    pub async fn reconcile_node(
        &self,
        pool: &str,
        node: &str,
        desired: &NodeAttributes,
        mode: NodeMode,
        dry_run: bool,
    ) -> Result<Outcome> {
        let resource = ResourceId::node(pool, node);
        let url = self.endpoint.pool_url(pool);

        let existing = self.fetch_required(&resource, &url).await?;
        let plan = plan_node(pool, node, &existing, desired, mode)?;
        self.apply(&resource, &url, plan, Some(existing), dry_run).await
    }

    /// Run a pool-level operation (`show`, `enablenodes`, `disablenodes`, `drainnodes`).
    pub async fn run_pool_operation(
        &self,
        pool: &str,
        op: &PoolOperation,
        dry_run: bool,
    ) -> Result<Outcome> {
        let resource = ResourceId::pool(pool);
        let url = self.endpoint.pool_url(pool);

        let existing = self.fetch_required(&resource, &url).await?;
        let plan = plan_pool_operation(pool, &existing, op)?;
        tracing::debug!(pool, operation = %op, "planned pool operation");
        self.apply(&resource, &url, plan, Some(existing), dry_run).await
    }

    async fn fetch_required(&self, resource: &ResourceId, url: &Url) -> Result<PoolSnapshot> {
        self.fetch(resource, url, false)
            .await?
            .ok_or_else(|| ReconcileError::not_found(resource, Attempt::Fetch))
    }

    /// GET the pool document. Returns `None` on 404 when `allow_missing` is set.
    async fn fetch(
        &self,
        resource: &ResourceId,
        url: &Url,
        allow_missing: bool,
    ) -> Result<Option<PoolSnapshot>> {
        tracing::debug!(%url, %resource, "fetching pool");

        let response = self
            .transport
            .get(url)
            .await
            .map_err(|e| ReconcileError::transport(resource, Attempt::Fetch, url.as_str(), e.message))?;

        if response.status == 404 {
            if allow_missing {
                tracing::debug!(%resource, "pool does not exist");
                return Ok(None);
            }
            return Err(ReconcileError::not_found(resource, Attempt::Fetch));
        }

        let parsed = serde_json::from_str::<Value>(&response.body);

        if let Ok(document) = &parsed
            && let Some(error_id) = document.get("error_id")
        {
            let error_id = error_id
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| error_id.to_string());
            let error_text = document
                .get("error_text")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(ReconcileError::remote_error(
                resource,
                Attempt::Fetch,
                error_id,
                error_text,
            ));
        }

        if !response.is_success() {
            return Err(ReconcileError::rejected(
                resource,
                Attempt::Fetch,
                response.status,
                response.body,
            ));
        }

        let document = parsed
            .map_err(|e| ReconcileError::malformed(resource, Attempt::Fetch, e.to_string()))?;
        Ok(Some(PoolSnapshot::new(document)))
    }

    /// Send the planned mutation unless `dry_run` is set, and build the outcome.
    async fn apply(
        &self,
        resource: &ResourceId,
        url: &Url,
        plan: Plan,
        existing: Option<PoolSnapshot>,
        dry_run: bool,
    ) -> Result<Outcome> {
        let Plan { record, mutation } = plan;
        let current = existing.map(PoolSnapshot::into_document);

        let Some(mutation) = mutation else {
            tracing::debug!(%resource, "already in desired state");
            return Ok(outcome(record, current));
        };

        if dry_run {
            tracing::warn!(
                %resource,
                action = %record.action,
                method = %mutation.method,
                "check mode: skipping mutation"
            );
            return Ok(outcome(record, current));
        }

        let attempt = mutation.attempt;
        let result = match mutation.method {
            Method::Put => {
                let body = mutation.body.as_ref().unwrap_or(&Value::Null);
                self.transport.put_json(url, body).await
            }
            Method::Delete => self.transport.delete(url).await,
        };
        let response = result
            .map_err(|e| ReconcileError::transport(resource, attempt, url.as_str(), e.message))?;

        if response.status != mutation.expected_status {
            return Err(ReconcileError::rejected(
                resource,
                attempt,
                response.status,
                response.body,
            ));
        }

        tracing::info!(
            %resource,
            action = %record.action,
            status = response.status,
            changes = record.changes.len(),
            "applied change"
        );

        let snapshot = match mutation.method {
            Method::Delete => None,
            Method::Put if response.body.trim().is_empty() => current,
            Method::Put => Some(
                serde_json::from_str(&response.body)
                    .map_err(|e| ReconcileError::malformed(resource, attempt, e.to_string()))?,
            ),
        };

        Ok(outcome(record, snapshot))
    }
}

fn outcome(record: ChangeRecord, snapshot: Option<Value>) -> Outcome {
    Outcome {
        changed: record.is_changed(),
        record,
        snapshot,
    }
}
