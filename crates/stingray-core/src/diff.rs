//! One-directional diffing of desired state against a live snapshot.
//!
//! Desired values override live ones, never the reverse: fields that only
//! exist on the server are left alone and never reported.

use serde_json::{Map, Value};

use crate::change::FieldChange;
use crate::model::{NodeAttributes, NodeEntry, PoolProperties};

/// Compare desired pool properties with the live `properties` object.
///
/// A field is reported only when both sides carry it and the values differ.
/// Where both sides hold an object the comparison descends key by key, so a
/// desired sub-map that matches part of the live one reports nothing. Paths
/// join every level with dots: `<group>.<key>[.<subkey>...]`.
pub fn diff_pool(existing: &Map<String, Value>, desired: &PoolProperties) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    for (group, fields) in desired.iter() {
        let Some(current) = existing.get(group.as_str()).and_then(Value::as_object) else {
            continue;
        };
        diff_object(group.as_str(), current, fields, &mut changes);
    }

    changes
}

fn diff_object(
    parent: &str,
    current: &Map<String, Value>,
    wanted: &Map<String, Value>,
    changes: &mut Vec<FieldChange>,
) {
    for (key, want) in wanted {
        let path = format!("{parent}.{key}");
        match (current.get(key), want) {
            (None | Some(Value::Null), _) => {}
            (Some(Value::Object(have)), Value::Object(want)) => {
                diff_object(&path, have, want, changes);
            }
            (Some(have), want) if have != want => {
                changes.push(FieldChange::new(path, have.clone(), want.clone()));
            }
            (Some(_), _) => {}
        }
    }
}

/// Compare desired node attributes with a node table row.
///
/// A missing live value is reported with `before: null` so that a desired
/// weight or priority can always be applied.
pub fn diff_node(existing: &NodeEntry, desired: &NodeAttributes) -> Vec<FieldChange> {
    desired
        .fields()
        .into_iter()
        .filter_map(|(field, wanted)| {
            let have = existing.get(field).cloned().unwrap_or(Value::Null);
            (have != wanted).then(|| FieldChange::new(field, have, wanted))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeState, PropertyGroup};
    use serde_json::json;

    fn live() -> Map<String, Value> {
        json!({
            "basic": {"note": "old", "monitors": ["ping"], "max_idle_connections_pernode": 50},
            "load_balancing": {"algorithm": "round_robin"}
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn reports_only_differing_fields() {
        let desired = PoolProperties::new()
            .with(PropertyGroup::Basic, "note", json!("new"))
            .with(PropertyGroup::Basic, "monitors", json!(["ping"]))
            .with(PropertyGroup::LoadBalancing, "algorithm", json!("least_connections"));

        let changes = diff_pool(&live(), &desired);
        assert_eq!(
            changes,
            vec![
                FieldChange::new("basic.note", json!("old"), json!("new")),
                FieldChange::new(
                    "load_balancing.algorithm",
                    json!("round_robin"),
                    json!("least_connections")
                ),
            ]
        );
    }

    #[test]
    fn equal_values_produce_no_changes() {
        let desired = PoolProperties::new()
            .with(PropertyGroup::Basic, "note", json!("old"))
            .with(PropertyGroup::Basic, "max_idle_connections_pernode", json!(50));
        assert!(diff_pool(&live(), &desired).is_empty());
    }

    #[test]
    fn fields_missing_on_server_are_skipped() {
        let desired = PoolProperties::new()
            .with(PropertyGroup::Basic, "brand_new", json!(1))
            .with(PropertyGroup::Ssl, "enable", json!(true));
        assert!(diff_pool(&live(), &desired).is_empty());
    }

    #[test]
    fn nested_objects_compare_key_by_key() {
        let existing = json!({"http": {"headers": {"a": 1, "b": 3}}})
            .as_object()
            .cloned()
            .unwrap();

        let subset = PoolProperties::new().with(PropertyGroup::Http, "headers", json!({"a": 1}));
        assert!(diff_pool(&existing, &subset).is_empty());

        let changed = PoolProperties::new().with(
            PropertyGroup::Http,
            "headers",
            json!({"a": 2, "c": 9}),
        );
        assert_eq!(
            diff_pool(&existing, &changed),
            vec![FieldChange::new("http.headers.a", json!(1), json!(2))]
        );
    }

    #[test]
    fn object_replacing_scalar_compares_whole() {
        let existing = json!({"http": {"headers": "none"}}).as_object().cloned().unwrap();
        let desired = PoolProperties::new().with(PropertyGroup::Http, "headers", json!({"a": 1}));
        let changes = diff_pool(&existing, &desired);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "http.headers");
    }

    #[test]
    fn node_diff_is_flat() {
        let entry: NodeEntry = serde_json::from_value(json!({
            "node": "n1:80", "state": "active", "weight": 1, "priority": 1
        }))
        .unwrap();

        let desired = NodeAttributes::new()
            .with_state(NodeState::Active)
            .with_weight(5);
        assert_eq!(
            diff_node(&entry, &desired),
            vec![FieldChange::new("weight", json!(1), json!(5))]
        );
        assert!(diff_node(&entry, &NodeAttributes::new()).is_empty());
    }

    #[test]
    fn node_diff_reports_missing_live_value_as_null() {
        let entry = NodeEntry::new("n1:80");
        let changes = diff_node(&entry, &NodeAttributes::new().with_priority(2));
        assert_eq!(changes, vec![FieldChange::new("priority", Value::Null, json!(2))]);
    }
}
