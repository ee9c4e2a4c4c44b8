//! Dataset decoding and the per-diagram transform table.
//!
//! Each bioenergy dataset is a JSON array of categories. Child collections
//! live under dataset-specific keys (`groups`, `tasks`, `xduct_groups`, ...).
//! Decoding lifts the child collections out before the entity itself is
//! decoded, so an entity keeps only its identity, names and properties.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use taxoflow_core::{localization::LocalizableEntity, table::Property, tree::TreeNode};

use crate::{
    config::DiagramConfig,
    error::TransformError,
    transform::{
        DomainEntity, EntityRole, LevelConfig, RootConfig, TreeTransformConfig, ValueSource,
        transform,
    },
};

/// Signature shared by all dataset transforms.
pub type TransformFn = fn(&str, Value, &DiagramConfig) -> Result<TreeNode, TransformError>;

#[derive(Deserialize)]
struct RawEntity {
    #[serde(flatten)]
    entity: LocalizableEntity,
    #[serde(default, deserialize_with = "null_as_empty")]
    properties: Vec<Property>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Property>, D::Error> {
    Ok(Option::<Vec<Property>>::deserialize(d)?.unwrap_or_default())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decodes a dataset into domain entities.
///
/// `child_keys` names the child collection of each level from the top down.
/// Missing, `null` or non-array child collections decode as empty.
pub fn decode_entities(
    diagram: &str,
    value: Value,
    child_keys: &[&str],
) -> Result<Vec<DomainEntity>, TransformError> {
    match value {
        Value::Array(items) => decode_level(diagram, items, child_keys, ""),
        other => Err(TransformError::NotAnArray {
            diagram: diagram.to_string(),
            found: json_kind(&other),
        }),
    }
}

fn decode_level(
    diagram: &str,
    items: Vec<Value>,
    child_keys: &[&str],
    path: &str,
) -> Result<Vec<DomainEntity>, TransformError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, mut item)| {
            let path = format!("{path}[{index}]");
            let children = match (child_keys.split_first(), item.as_object_mut()) {
                (Some((key, rest)), Some(object)) => match object.remove(*key) {
                    Some(Value::Array(children)) => {
                        decode_level(diagram, children, rest, &format!("{path}.{key}"))?
                    }
                    Some(Value::Null) | None => Vec::new(),
                    Some(other) => {
                        debug!(
                            diagram = diagram,
                            path = path.as_str(),
                            found = json_kind(&other);
                            "Ignoring non-array child collection"
                        );
                        Vec::new()
                    }
                },
                _ => Vec::new(),
            };

            let raw: RawEntity =
                serde_json::from_value(item).map_err(|source| TransformError::Entity {
                    diagram: diagram.to_string(),
                    path,
                    source,
                })?;
            Ok(DomainEntity::new(raw.entity)
                .with_properties(raw.properties)
                .with_children(children))
        })
        .collect()
}

/// Drops placeholder categories named `undefined`.
pub fn filter_out_undefined(category: &DomainEntity) -> bool {
    category.entity.name.name_english != "undefined"
}

fn root(config: &DiagramConfig) -> RootConfig {
    RootConfig {
        class_name: config.class_names.root.clone(),
        icon: config.icon.clone(),
    }
}

fn leaf_class(config: &DiagramConfig) -> String {
    config
        .class_names
        .leaf
        .clone()
        .unwrap_or_else(|| config.class_names.group.clone())
}

/// Category, group with table. Shared by the three-level datasets.
fn three_level(
    diagram: &str,
    value: Value,
    config: &DiagramConfig,
    child_key: &str,
    table_kind: &str,
) -> Result<TreeNode, TransformError> {
    let categories = decode_entities(diagram, value, &[child_key])?;
    let tree_config = TreeTransformConfig {
        diagram_id: diagram.to_string(),
        root: root(config),
        category: LevelConfig::new(config.id_prefixes.category(), &config.class_names.category)
            .with_entities(&[EntityRole::Category])
            .with_value("count", ValueSource::ChildCount),
        group: LevelConfig::new(config.id_prefixes.group(), &config.class_names.group)
            .with_entities(&[EntityRole::Group, EntityRole::Category])
            .with_value("propertyCount", ValueSource::PropertyCount)
            .with_table(table_kind),
        leaf: None,
        category_filter: Some(filter_out_undefined),
    };
    Ok(transform(&categories, &tree_config))
}

pub fn supply_tasks(diagram: &str, value: Value, config: &DiagramConfig) -> Result<TreeNode, TransformError> {
    three_level(diagram, value, config, "tasks", "task")
}

pub fn supply_concepts(
    diagram: &str,
    value: Value,
    config: &DiagramConfig,
) -> Result<TreeNode, TransformError> {
    three_level(diagram, value, config, "concepts", "concept")
}

pub fn conversion_procedures(
    diagram: &str,
    value: Value,
    config: &DiagramConfig,
) -> Result<TreeNode, TransformError> {
    three_level(diagram, value, config, "components", "component")
}

/// Categories count their groups; chains carry the tables.
pub fn process_chains(
    diagram: &str,
    value: Value,
    config: &DiagramConfig,
) -> Result<TreeNode, TransformError> {
    let categories = decode_entities(diagram, value, &["groups", "chains"])?;
    let tree_config = TreeTransformConfig {
        diagram_id: diagram.to_string(),
        root: root(config),
        category: LevelConfig::new(config.id_prefixes.category(), &config.class_names.category)
            .with_value("count", ValueSource::ChildCount),
        group: LevelConfig::new(config.id_prefixes.group(), &config.class_names.group)
            .with_entities(&[EntityRole::Group])
            .with_value("count", ValueSource::ChildCount),
        leaf: Some(
            LevelConfig::new(config.id_prefixes.leaf(), leaf_class(config))
                .with_entities(&[EntityRole::Leaf, EntityRole::Group, EntityRole::Category])
                .with_value("propertyCount", ValueSource::PropertyCount)
                .with_table("chain"),
        ),
        category_filter: Some(filter_out_undefined),
    };
    Ok(transform(&categories, &tree_config))
}

pub fn xducts(diagram: &str, value: Value, config: &DiagramConfig) -> Result<TreeNode, TransformError> {
    let categories = decode_entities(diagram, value, &["xduct_groups", "xducts"])?;
    let tree_config = TreeTransformConfig {
        diagram_id: diagram.to_string(),
        root: root(config),
        category: LevelConfig::new(config.id_prefixes.category(), &config.class_names.category)
            .with_entities(&[EntityRole::Category])
            .with_value("count", ValueSource::ChildCount),
        group: LevelConfig::new(config.id_prefixes.group(), &config.class_names.group)
            .with_entities(&[EntityRole::Group, EntityRole::Category])
            .with_value("count", ValueSource::ChildCount),
        leaf: Some(
            LevelConfig::new(config.id_prefixes.leaf(), leaf_class(config))
                .with_entities(&[EntityRole::Leaf, EntityRole::Group, EntityRole::Category])
                .with_value("propertyCount", ValueSource::PropertyCount)
                .with_table("xduct"),
        ),
        category_filter: Some(filter_out_undefined),
    };
    Ok(transform(&categories, &tree_config))
}

/// Maps a diagram id to the transform for its dataset.
#[derive(Debug, Clone, Default)]
pub struct TransformTable {
    entries: HashMap<String, TransformFn>,
}

impl TransformTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the five bioenergy transforms.
    pub fn bioenergy() -> Self {
        let mut table = Self::new();
        table.insert("process_chains", process_chains);
        table.insert("supply_tasks", supply_tasks);
        table.insert("supply_concepts", supply_concepts);
        table.insert("xducts", xducts);
        table.insert("conversion_procedures", conversion_procedures);
        table
    }

    pub fn insert(&mut self, diagram_id: impl Into<String>, transform: TransformFn) {
        self.entries.insert(diagram_id.into(), transform);
    }

    pub fn get(&self, diagram_id: &str) -> Option<TransformFn> {
        self.entries.get(diagram_id).copied()
    }

    pub fn contains(&self, diagram_id: &str) -> bool {
        self.entries.contains_key(diagram_id)
    }

    /// Runs the transform registered for `diagram_id`.
    pub fn apply(
        &self,
        diagram_id: &str,
        value: Value,
        config: &DiagramConfig,
    ) -> Result<TreeNode, TransformError> {
        let transform = self
            .get(diagram_id)
            .ok_or_else(|| TransformError::MissingTransform(diagram_id.to_string()))?;
        transform(diagram_id, value, config)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use taxoflow_core::localization::{Description, Label, MessageValue};

    use super::*;
    use crate::config::AppConfig;

    fn property(id: i64) -> Value {
        json!({
            "id": id,
            "value": 5,
            "unit": {"id": 1, "name_german": "Kilogramm", "name_english": "kilogram"},
            "property": {"id": 2, "name_german": "Masse", "name_english": "mass"},
            "reference": {"id": null, "source": null}
        })
    }

    fn diagram_config(id: &str) -> DiagramConfig {
        AppConfig::default().diagram(id).cloned().unwrap()
    }

    #[test]
    fn test_decode_lifts_children() {
        let value = json!([
            {"id": 1, "name_german": "Fest", "name_english": "Solid", "acronym_german": "F", "xduct_groups": [
                {"id": 10, "name_german": "Holz", "name_english": "wood", "xducts": null},
                {"id": 11, "name_german": "Stroh", "name_english": "straw", "xducts": [
                    {"id": 100, "name_german": "Ballen", "name_english": "bales", "properties": [property(1)]}
                ]}
            ]}
        ]);
        let entities = decode_entities("xducts", value, &["xduct_groups", "xducts"]).unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity.acronym_german.as_deref(), Some("F"));
        assert_eq!(entities[0].children.len(), 2);
        assert!(entities[0].children[0].children.is_empty());
        let leaf = &entities[0].children[1].children[0];
        assert_eq!(leaf.entity.name.name_english, "bales");
        assert_eq!(leaf.properties.len(), 1);
    }

    #[test]
    fn test_decode_rejects_non_array() {
        let err = decode_entities("xducts", json!({"id": 1}), &[]).unwrap_err();
        assert!(matches!(err, TransformError::NotAnArray { found: "an object", .. }));
    }

    #[test]
    fn test_decode_reports_path_of_bad_entity() {
        let value = json!([
            {"id": 1, "name_german": "A", "name_english": "A", "tasks": [
                {"id": 2, "name_german": "B"}
            ]}
        ]);
        let err = decode_entities("supply_tasks", value, &["tasks"]).unwrap_err();
        match err {
            TransformError::Entity { path, .. } => assert_eq!(path, "[0].tasks[0]"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_null_properties_and_non_array_children_are_empty() {
        let value = json!([
            {"id": 1, "name_german": "A", "name_english": "A", "properties": null, "tasks": "none"}
        ]);
        let entities = decode_entities("supply_tasks", value, &["tasks"]).unwrap();
        assert!(entities[0].properties.is_empty());
        assert!(entities[0].children.is_empty());
    }

    #[test]
    fn test_supply_tasks_transform() {
        let value = json!([
            {"id": 1, "name_german": "Wärme", "name_english": "heat", "tasks": [
                {"id": 10, "name_german": "Raumwärme", "name_english": "space heating", "properties": [property(1)]}
            ]},
            {"id": 2, "name_german": "undefiniert", "name_english": "undefined", "tasks": []}
        ]);
        let root = supply_tasks("supply_tasks", value, &diagram_config("supply_tasks")).unwrap();

        assert_eq!(root.id(), Some("supply_tasks_label"));
        assert_eq!(root.class_name.as_deref(), Some("supplyTasks-root"));
        assert_eq!(root.data.icon.as_deref(), Some("list-todo"));
        assert_eq!(root.children.len(), 1);

        let task = &root.children[0].children[0];
        assert_eq!(task.id(), Some("task-10"));
        assert_eq!(task.class_name.as_deref(), Some("supplyTasks-group"));
        assert_eq!(task.data.table.as_ref().unwrap()[0].id, "task-properties-10");
    }

    #[test]
    fn test_process_chains_bindings() {
        let value = json!([
            {"id": 1, "name_german": "Strom", "name_english": "power", "groups": [
                {"id": 10, "name_german": "Biogas", "name_english": "biogas", "chains": [
                    {"id": 100, "name_german": "Kette", "name_english": "chain", "properties": [property(1), property(2)]}
                ]}
            ]}
        ]);
        let root = process_chains("process_chains", value, &diagram_config("process_chains")).unwrap();
        let category = &root.children[0];
        let Some(Description::Message(category_message)) = &category.data.description else {
            panic!("category description missing");
        };
        assert!(category_message.entities.is_empty());
        assert_eq!(category_message.values["count"], MessageValue::Integer(1));

        let chain = &category.children[0].children[0];
        assert_eq!(chain.id(), Some("chain-100"));
        assert_eq!(chain.class_name.as_deref(), Some("processChains-leaf"));
        assert_eq!(chain.data.property_count, Some(2));
        assert_eq!(chain.data.table.as_ref().unwrap()[0].id, "chain-properties-100");
        assert!(matches!(&chain.data.label, Label::Entity(e) if e.name.name_english == "chain"));
    }

    #[test]
    fn test_transform_table() {
        let table = TransformTable::bioenergy();
        for id in AppConfig::default().diagrams.keys() {
            assert!(table.contains(id), "missing transform for {id}");
        }

        let config = diagram_config("xducts");
        let root = table.apply("xducts", json!([]), &config).unwrap();
        assert!(root.children.is_empty());

        let err = table.apply("mix", json!([]), &config).unwrap_err();
        assert!(matches!(err, TransformError::MissingTransform(id) if id == "mix"));
    }
}
