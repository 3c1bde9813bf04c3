//! Typed views over the traffic manager's pool configuration document.
//!
//! The remote document is kept as raw JSON so that anything this crate does
//! not model (unknown property groups, extra node keys) is passed back to the
//! server untouched. Desired state, on the other hand, is typed: pool
//! properties are keyed by a closed set of [`PropertyGroup`]s and node
//! attributes are a fixed struct.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// JSON path of the node table inside a pool document.
pub const NODES_TABLE_PATH: &str = "properties.basic.nodes_table";

/// Property groups of a pool's `properties` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyGroup {
    Basic,
    AutoScaling,
    Connection,
    DnsAutoscale,
    Ftp,
    Http,
    KerberosProtocolTransition,
    L4accel,
    LoadBalancing,
    Node,
    Smtp,
    Ssl,
    Tcp,
    Udp,
}

impl PropertyGroup {
    pub const ALL: [PropertyGroup; 14] = [
        Self::Basic,
        Self::AutoScaling,
        Self::Connection,
        Self::DnsAutoscale,
        Self::Ftp,
        Self::Http,
        Self::KerberosProtocolTransition,
        Self::L4accel,
        Self::LoadBalancing,
        Self::Node,
        Self::Smtp,
        Self::Ssl,
        Self::Tcp,
        Self::Udp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::AutoScaling => "auto_scaling",
            Self::Connection => "connection",
            Self::DnsAutoscale => "dns_autoscale",
            Self::Ftp => "ftp",
            Self::Http => "http",
            Self::KerberosProtocolTransition => "kerberos_protocol_transition",
            Self::L4accel => "l4accel",
            Self::LoadBalancing => "load_balancing",
            Self::Node => "node",
            Self::Smtp => "smtp",
            Self::Ssl => "ssl",
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        }
    }
}

impl fmt::Display for PropertyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyGroup {
    type Err = PropertiesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == s)
            .ok_or_else(|| PropertiesError::UnknownGroup(s.to_string()))
    }
}

/// Problems with a caller-supplied desired properties document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertiesError {
    #[error("pool properties must be a JSON object")]
    NotAnObject,

    #[error("unknown property group '{0}'")]
    UnknownGroup(String),

    #[error("property group '{0}' must be a JSON object")]
    GroupNotAnObject(String),
}

/// Desired pool properties, grouped by [`PropertyGroup`].
///
/// Null values are dropped on construction: an absent key means "no opinion"
/// and properties are only ever merged, never cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PoolProperties(BTreeMap<PropertyGroup, Map<String, Value>>);

impl PoolProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a single property. A null `value` is ignored.
    pub fn insert(&mut self, group: PropertyGroup, key: impl Into<String>, value: Value) {
        if value.is_null() {
            return;
        }
        self.0.entry(group).or_default().insert(key.into(), value);
    }

    pub fn with(mut self, group: PropertyGroup, key: impl Into<String>, value: Value) -> Self {
        self.insert(group, key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyGroup, &Map<String, Value>)> {
        self.0.iter()
    }

    pub fn group(&self, group: PropertyGroup) -> Option<&Map<String, Value>> {
        self.0.get(&group)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(group, fields)| (group.as_str().to_string(), Value::Object(fields.clone())))
                .collect(),
        )
    }
}

impl TryFrom<Value> for PoolProperties {
    type Error = PropertiesError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(groups) = value else {
            return Err(PropertiesError::NotAnObject);
        };

        let mut properties = Self::new();
        for (name, fields) in groups {
            let group: PropertyGroup = name.parse()?;
            match fields {
                Value::Null => {}
                Value::Object(fields) => {
                    // An explicitly empty group is kept so that it still shows up in create bodies.
                    let entry = properties.0.entry(group).or_default();
                    for (key, value) in fields {
                        if !value.is_null() {
                            entry.insert(key, value);
                        }
                    }
                }
                _ => return Err(PropertiesError::GroupNotAnObject(name)),
            }
        }
        Ok(properties)
    }
}

/// Operational state of a node inside a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Active,
    Disabled,
    Draining,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Disabled => "disabled",
            Self::Draining => "draining",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown node state '{0}', expected one of: active, disabled, draining")]
pub struct UnknownNodeState(pub String);

impl FromStr for NodeState {
    type Err = UnknownNodeState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "disabled" => Ok(Self::Disabled),
            "draining" => Ok(Self::Draining),
            other => Err(UnknownNodeState(other.to_string())),
        }
    }
}

/// Desired attributes of a single node. `None` means "leave as is".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeAttributes {
    pub state: Option<NodeState>,
    pub weight: Option<u64>,
    pub priority: Option<u64>,
}

impl NodeAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes that only pin the node state.
    pub fn state_only(state: NodeState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_weight(mut self, weight: u64) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_priority(mut self, priority: u64) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// The attributes that carry an opinion, as node table keys and JSON values.
    pub fn fields(&self) -> Vec<(&'static str, Value)> {
        let mut fields = Vec::with_capacity(3);
        if let Some(state) = self.state {
            fields.push(("state", Value::from(state.as_str())));
        }
        if let Some(weight) = self.weight {
            fields.push(("weight", Value::from(weight)));
        }
        if let Some(priority) = self.priority {
            fields.push(("priority", Value::from(priority)));
        }
        fields
    }
}

/// One row of `properties.basic.nodes_table`.
///
/// Keys this crate does not know about are preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeEntry(Map<String, Value>);

impl NodeEntry {
    /// A fresh entry carrying only the node identity.
    pub fn new(node: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("node".to_string(), Value::from(node));
        Self(fields)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("node").and_then(Value::as_str)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Immutable snapshot of a pool document as fetched from the traffic manager.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSnapshot {
    document: Value,
}

impl PoolSnapshot {
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn into_document(self) -> Value {
        self.document
    }

    /// The `properties` object, if the document has one.
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.document.get("properties").and_then(Value::as_object)
    }

    /// The pool's node table.
    ///
    /// Errors carry a path hint describing what is missing.
    pub fn nodes_table(&self) -> Result<Vec<NodeEntry>, String> {
        let table = self
            .properties()
            .and_then(|p| p.get("basic"))
            .and_then(|b| b.get("nodes_table"))
            .and_then(Value::as_array)
            .ok_or_else(|| format!("unable to find {NODES_TABLE_PATH} in pool data"))?;

        table
            .iter()
            .enumerate()
            .map(|(idx, row)| match row {
                Value::Object(fields) => Ok(NodeEntry(fields.clone())),
                _ => Err(format!("{NODES_TABLE_PATH}[{idx}] is not an object")),
            })
            .collect()
    }
}

/// Request body replacing a pool's node table.
pub fn nodes_table_body(nodes: Vec<NodeEntry>) -> Value {
    let table: Vec<Value> = nodes.into_iter().map(NodeEntry::into_value).collect();
    serde_json::json!({
        "properties": {
            "basic": {
                "nodes_table": table
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn property_group_names_round_trip() {
        for group in PropertyGroup::ALL {
            assert_eq!(group.as_str().parse::<PropertyGroup>().unwrap(), group);
            assert_eq!(
                serde_json::to_value(group).unwrap(),
                Value::from(group.as_str())
            );
        }
    }

    #[test]
    fn unknown_group_is_rejected() {
        let err = PoolProperties::try_from(json!({"bogus": {"a": 1}})).unwrap_err();
        assert_eq!(err, PropertiesError::UnknownGroup("bogus".into()));
    }

    #[test]
    fn non_object_inputs_are_rejected() {
        assert_eq!(
            PoolProperties::try_from(json!([1, 2])).unwrap_err(),
            PropertiesError::NotAnObject
        );
        assert_eq!(
            PoolProperties::try_from(json!({"basic": "x"})).unwrap_err(),
            PropertiesError::GroupNotAnObject("basic".into())
        );
    }

    #[test]
    fn null_values_are_dropped() {
        let props =
            PoolProperties::try_from(json!({"basic": {"note": null, "monitors": ["ping"]}, "ssl": null}))
                .unwrap();
        assert_eq!(props.to_value(), json!({"basic": {"monitors": ["ping"]}}));

        let mut props = PoolProperties::new();
        props.insert(PropertyGroup::Http, "keepalive", Value::Null);
        assert!(props.is_empty());
    }

    #[test]
    fn node_attributes_only_list_set_fields() {
        let attrs = NodeAttributes::new().with_weight(10);
        assert_eq!(attrs.fields(), vec![("weight", json!(10))]);
        assert!(NodeAttributes::new().is_empty());
        assert_eq!(
            NodeAttributes::state_only(NodeState::Draining).fields(),
            vec![("state", json!("draining"))]
        );
    }

    #[test]
    fn node_state_parsing() {
        assert_eq!("draining".parse::<NodeState>().unwrap(), NodeState::Draining);
        assert!("enabled".parse::<NodeState>().is_err());
    }

    #[test]
    fn nodes_table_missing_gives_path_hint() {
        let snapshot = PoolSnapshot::new(json!({"properties": {"basic": {}}}));
        let err = snapshot.nodes_table().unwrap_err();
        assert!(err.contains(NODES_TABLE_PATH));
    }

    #[test]
    fn nodes_table_preserves_unknown_keys() {
        let snapshot = PoolSnapshot::new(json!({
            "properties": {"basic": {"nodes_table": [
                {"node": "a:80", "state": "active", "source_ip": "10.0.0.1"}
            ]}}
        }));
        let nodes = snapshot.nodes_table().unwrap();
        assert_eq!(nodes[0].name(), Some("a:80"));
        assert_eq!(nodes[0].get("source_ip"), Some(&json!("10.0.0.1")));
    }
}
