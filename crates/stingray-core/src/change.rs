//! Change records describing what a reconciliation did (or would do).

use std::fmt;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

/// Identity of the resource being reconciled: a pool, or a node within a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub pool: String,
    pub node: Option<String>,
}

impl ResourceId {
    pub fn pool(pool: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            node: None,
        }
    }

    pub fn node(pool: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            node: Some(node.into()),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        if self.node.is_some() {
            ResourceKind::Node
        } else {
            ResourceKind::Pool
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "node {node} in pool {}", self.pool),
            None => write!(f, "pool {}", self.pool),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Pool,
    Node,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pool => "pool",
            Self::Node => "node",
        }
    }
}

/// What a reconciliation decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Create,
    Update,
    Destroy,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field that differs between the live and desired state.
///
/// Serializes as `{"<path>": {"before": .., "after": ..}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub path: String,
    pub before: Value,
    pub after: Value,
}

impl FieldChange {
    pub fn new(path: impl Into<String>, before: Value, after: Value) -> Self {
        Self {
            path: path.into(),
            before,
            after,
        }
    }
}

#[derive(Serialize)]
struct BeforeAfter<'a> {
    before: &'a Value,
    after: &'a Value,
}

impl Serialize for FieldChange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(
            &self.path,
            &BeforeAfter {
                before: &self.before,
                after: &self.after,
            },
        )?;
        map.end()
    }
}

/// Outcome description of one reconciliation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub resource: ResourceId,
    pub action: Action,
    /// Field-level differences, populated for updates.
    pub changes: Vec<FieldChange>,
    /// The full property set of a resource being created.
    pub properties: Option<Value>,
}

impl ChangeRecord {
    pub fn none(resource: ResourceId) -> Self {
        Self {
            resource,
            action: Action::None,
            changes: Vec::new(),
            properties: None,
        }
    }

    pub fn create(resource: ResourceId, properties: Value) -> Self {
        Self {
            resource,
            action: Action::Create,
            changes: Vec::new(),
            properties: Some(properties),
        }
    }

    pub fn update(resource: ResourceId, changes: Vec<FieldChange>) -> Self {
        Self {
            resource,
            action: Action::Update,
            changes,
            properties: None,
        }
    }

    pub fn destroy(resource: ResourceId) -> Self {
        Self {
            resource,
            action: Action::Destroy,
            changes: Vec::new(),
            properties: None,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.action != Action::None
    }

    /// Action tag as reported to callers, e.g. `create_node` or `destroy_pool`.
    pub fn action_tag(&self) -> Option<String> {
        match self.action {
            Action::None => None,
            action => Some(format!("{}_{}", action.as_str(), self.resource.kind().as_str())),
        }
    }
}

impl Serialize for ChangeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("pool", &self.resource.pool)?;
        if let Some(node) = &self.resource.node {
            map.serialize_entry("node", node)?;
        }
        if let Some(tag) = self.action_tag() {
            map.serialize_entry("action", &tag)?;
        }
        if !self.changes.is_empty() {
            map.serialize_entry("changes", &self.changes)?;
        }
        if let Some(properties) = &self.properties {
            map.serialize_entry("properties", properties)?;
        }
        map.end()
    }
}
