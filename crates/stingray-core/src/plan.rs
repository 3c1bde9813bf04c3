//! Pure reconciliation planning.
//!
//! Given a fetched snapshot and the caller's desired state, decide what to do
//! and build the request that would do it. Nothing here talks to the network;
//! see [`crate::reconciler`] for the driver that fetches and applies plans.

use std::fmt;

use serde_json::{Map, Value, json};

use crate::change::{ChangeRecord, FieldChange, ResourceId};
use crate::diff::{diff_node, diff_pool};
use crate::error::{Attempt, ReconcileError, Result};
use crate::model::{NodeAttributes, NodeEntry, NodeState, PoolProperties, PoolSnapshot, nodes_table_body};

/// Desired presence of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolState {
    #[default]
    Present,
    Absent,
}

impl PoolState {
    pub fn parse(state: &str, resource: &ResourceId) -> Result<Self> {
        match state {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(ReconcileError::unsupported_state(resource, other)),
        }
    }
}

/// Desired presence or load-balancer state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeMode {
    #[default]
    Present,
    Absent,
    /// Present, with only the node state pinned.
    SetState(NodeState),
}

impl NodeMode {
    /// Parse a node state keyword: `present`, `absent`, `enabled`, `disabled` or `draining`.
    pub fn parse(state: &str, resource: &ResourceId) -> Result<Self> {
        match state {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            "enabled" => Ok(Self::SetState(NodeState::Active)),
            "disabled" => Ok(Self::SetState(NodeState::Disabled)),
            "draining" => Ok(Self::SetState(NodeState::Draining)),
            other => Err(ReconcileError::unsupported_state(resource, other)),
        }
    }
}

/// Pool-level operations acting on the node table as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolOperation {
    Show,
    EnableNodes(Vec<String>),
    DisableNodes(Vec<String>),
    DrainNodes(Vec<String>),
}

impl PoolOperation {
    /// Parse an operation name. Node operations require a non-empty `nodes` list.
    pub fn parse(name: &str, nodes: &[String], resource: &ResourceId) -> Result<Self> {
        let require_nodes = |op: fn(Vec<String>) -> Self| {
            if nodes.is_empty() {
                Err(ReconcileError::missing_parameter(resource, name, "nodes"))
            } else {
                Ok(op(nodes.to_vec()))
            }
        };

        match name {
            "show" => Ok(Self::Show),
            "enablenodes" => require_nodes(Self::EnableNodes),
            "disablenodes" => require_nodes(Self::DisableNodes),
            "drainnodes" => require_nodes(Self::DrainNodes),
            other => Err(ReconcileError::unsupported_state(resource, other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::EnableNodes(_) => "enablenodes",
            Self::DisableNodes(_) => "disablenodes",
            Self::DrainNodes(_) => "drainnodes",
        }
    }

    pub fn target_state(&self) -> Option<NodeState> {
        match self {
            Self::Show => None,
            Self::EnableNodes(_) => Some(NodeState::Active),
            Self::DisableNodes(_) => Some(NodeState::Disabled),
            Self::DrainNodes(_) => Some(NodeState::Draining),
        }
    }

    pub fn nodes(&self) -> &[String] {
        match self {
            Self::Show => &[],
            Self::EnableNodes(nodes) | Self::DisableNodes(nodes) | Self::DrainNodes(nodes) => nodes,
        }
    }
}

impl fmt::Display for PoolOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// A mutating request against the pool URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub method: Method,
    pub body: Option<Value>,
    /// The only status code that counts as success.
    pub expected_status: u16,
    pub attempt: Attempt,
}

impl Mutation {
    fn put(body: Value, expected_status: u16, attempt: Attempt) -> Self {
        Self {
            method: Method::Put,
            body: Some(body),
            expected_status,
            attempt,
        }
    }

    fn delete() -> Self {
        Self {
            method: Method::Delete,
            body: None,
            expected_status: 204,
            attempt: Attempt::Destroy,
        }
    }
}

/// The decision for one reconciliation: what changes, and how to apply it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub record: ChangeRecord,
    /// `None` exactly when the record's action is `none`.
    pub mutation: Option<Mutation>,
}

impl Plan {
    fn noop(resource: ResourceId) -> Self {
        Self {
            record: ChangeRecord::none(resource),
            mutation: None,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.record.is_changed()
    }
}

/// Plan the reconciliation of a pool's presence and properties.
///
/// `existing` is `None` when the pool does not exist on the server.
pub fn plan_pool(
    pool: &str,
    existing: Option<&PoolSnapshot>,
    desired: &PoolProperties,
    state: PoolState,
) -> Result<Plan> {
    let resource = ResourceId::pool(pool);

    match (state, existing) {
        (PoolState::Absent, None) => Ok(Plan::noop(resource)),
        (PoolState::Absent, Some(_)) => Ok(Plan {
            record: ChangeRecord::destroy(resource),
            mutation: Some(Mutation::delete()),
        }),
        (PoolState::Present, None) => {
            let properties = if desired.is_empty() {
                json!({"basic": {}})
            } else {
                desired.to_value()
            };
            let body = json!({ "properties": properties.clone() });
            Ok(Plan {
                record: ChangeRecord::create(resource, properties),
                mutation: Some(Mutation::put(body, 201, Attempt::Create)),
            })
        }
        (PoolState::Present, Some(snapshot)) => {
            let live = snapshot.properties().ok_or_else(|| {
                ReconcileError::malformed(&resource, Attempt::Plan, "unable to find properties in pool data")
            })?;

            let changes = diff_pool(live, desired);
            if changes.is_empty() {
                return Ok(Plan::noop(resource));
            }

            let body = json!({ "properties": merge_properties(live, desired) });
            Ok(Plan {
                record: ChangeRecord::update(resource, changes),
                mutation: Some(Mutation::put(body, 200, Attempt::Update)),
            })
        }
    }
}

/// Overlay desired groups onto their live counterparts. Groups the caller has
/// no opinion on are left out of the request entirely.
fn merge_properties(live: &Map<String, Value>, desired: &PoolProperties) -> Value {
    let merged: Map<String, Value> = desired
        .iter()
        .map(|(group, fields)| {
            let mut current = live
                .get(group.as_str())
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            merge_object(&mut current, fields);
            (group.as_str().to_string(), Value::Object(current))
        })
        .collect();
    Value::Object(merged)
}

/// Deep merge: nested objects are merged key by key, anything else replaces.
fn merge_object(target: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        if let (Some(Value::Object(existing)), Value::Object(nested)) = (target.get_mut(key), value) {
            merge_object(existing, nested);
            continue;
        }
        target.insert(key.clone(), value.clone());
    }
}

/// Plan the reconciliation of one node in a pool's node table.
pub fn plan_node(
    pool: &str,
    node: &str,
    existing: &PoolSnapshot,
    desired: &NodeAttributes,
    mode: NodeMode,
) -> Result<Plan> {
    let resource = ResourceId::node(pool, node);
    let mut nodes = existing
        .nodes_table()
        .map_err(|hint| ReconcileError::malformed(&resource, Attempt::Plan, hint))?;
    let position = nodes.iter().position(|entry| entry.name() == Some(node));

    match mode {
        NodeMode::Absent => {
            if position.is_none() {
                return Ok(Plan::noop(resource));
            }
            nodes.retain(|entry| entry.name() != Some(node));
            Ok(Plan {
                record: ChangeRecord::destroy(resource),
                mutation: Some(Mutation::put(nodes_table_body(nodes), 200, Attempt::Destroy)),
            })
        }
        NodeMode::Present => upsert_node(resource, nodes, position, desired),
        NodeMode::SetState(state) => {
            upsert_node(resource, nodes, position, &NodeAttributes::state_only(state))
        }
    }
}

fn upsert_node(
    resource: ResourceId,
    mut nodes: Vec<NodeEntry>,
    position: Option<usize>,
    desired: &NodeAttributes,
) -> Result<Plan> {
    let Some(idx) = position else {
        let name = resource.node.as_deref().unwrap_or_default();
        let mut entry = NodeEntry::new(name);
        for (field, value) in desired.fields() {
            entry.set(field, value);
        }
        let record = ChangeRecord::create(resource, entry.clone().into_value());
        nodes.push(entry);
        return Ok(Plan {
            record,
            mutation: Some(Mutation::put(nodes_table_body(nodes), 200, Attempt::Create)),
        });
    };

    let changes = diff_node(&nodes[idx], desired);
    if changes.is_empty() {
        return Ok(Plan::noop(resource));
    }

    // Rewrite the target row in place; every other row goes back untouched.
    for change in &changes {
        nodes[idx].set(&change.path, change.after.clone());
    }

    Ok(Plan {
        record: ChangeRecord::update(resource, changes),
        mutation: Some(Mutation::put(nodes_table_body(nodes), 200, Attempt::Update)),
    })
}

/// Plan a pool-level operation.
pub fn plan_pool_operation(pool: &str, existing: &PoolSnapshot, op: &PoolOperation) -> Result<Plan> {
    let resource = ResourceId::pool(pool);

    match op {
        PoolOperation::Show => Ok(Plan::noop(resource)),
        PoolOperation::EnableNodes(names) => {
            set_node_states(resource, existing, names, NodeState::Active)
        }
        PoolOperation::DisableNodes(names) => {
            set_node_states(resource, existing, names, NodeState::Disabled)
        }
        PoolOperation::DrainNodes(names) => {
            set_node_states(resource, existing, names, NodeState::Draining)
        }
    }
}

fn set_node_states(
    resource: ResourceId,
    existing: &PoolSnapshot,
    names: &[String],
    target: NodeState,
) -> Result<Plan> {
    let mut nodes = existing
        .nodes_table()
        .map_err(|hint| ReconcileError::malformed(&resource, Attempt::Plan, hint))?;
    let wanted = Value::from(target.as_str());
    let mut changes = Vec::new();

    for name in names {
        let path = format!("nodes_table[{name}].state");
        match nodes.iter_mut().find(|entry| entry.name() == Some(name.as_str())) {
            Some(entry) => {
                let have = entry.get("state").cloned().unwrap_or(Value::Null);
                if have != wanted {
                    changes.push(FieldChange::new(path, have, wanted.clone()));
                    entry.set("state", wanted.clone());
                }
            }
            None => {
                let mut entry = NodeEntry::new(name);
                entry.set("state", wanted.clone());
                changes.push(FieldChange::new(path, Value::Null, wanted.clone()));
                nodes.push(entry);
            }
        }
    }

    if changes.is_empty() {
        return Ok(Plan::noop(resource));
    }

    Ok(Plan {
        record: ChangeRecord::update(resource, changes),
        mutation: Some(Mutation::put(nodes_table_body(nodes), 200, Attempt::Update)),
    })
}
