//! Tree transform: hierarchical domain entities to a [`TreeNode`].
//!
//! Input is a list of category entities, each holding groups, each optionally
//! holding leaves. A [`TreeTransformConfig`] says, per level, how node ids are
//! prefixed, which class name to use, which named entities and which derived
//! numbers feed the description message, and whether a property table is
//! attached.
//!
//! The transform is pure and never fails. Missing child collections are
//! simply empty.

use taxoflow_core::{
    localization::{Description, Label, LocalizableEntity, MessageRef},
    table::{Property, TableData, TablePayload},
    tree::{NodeData, TreeNode},
};

/// A node of the domain hierarchy as decoded from a dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEntity {
    pub entity: LocalizableEntity,
    pub properties: Vec<Property>,
    pub children: Vec<DomainEntity>,
}

impl DomainEntity {
    pub fn new(entity: LocalizableEntity) -> Self {
        Self {
            entity,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: Vec<Property>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_children(mut self, children: Vec<DomainEntity>) -> Self {
        self.children = children;
        self
    }
}

/// A hierarchy level whose entity can be named in a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRole {
    Category,
    Group,
    Leaf,
}

impl EntityRole {
    pub fn key(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Group => "group",
            Self::Leaf => "leaf",
        }
    }
}

/// Where a description value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Number of child entities at the next configured level.
    ChildCount,
    /// Number of property rows of the entity itself.
    PropertyCount,
}

/// A named number passed to a description message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueBinding {
    pub name: String,
    pub source: ValueSource,
}

impl ValueBinding {
    pub fn new(name: impl Into<String>, source: ValueSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Per-level transform settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelConfig {
    pub id_prefix: String,
    pub class_name: String,
    /// Entities from this level and its ancestors named in the description.
    pub entities: Vec<EntityRole>,
    pub values: Vec<ValueBinding>,
    /// Kind used in table ids (`{kind}-properties-{id}`). Only group and leaf
    /// levels attach tables.
    pub table_kind: Option<String>,
}

impl LevelConfig {
    pub fn new(id_prefix: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
            class_name: class_name.into(),
            entities: Vec::new(),
            values: Vec::new(),
            table_kind: None,
        }
    }

    pub fn with_entities(mut self, entities: &[EntityRole]) -> Self {
        self.entities = entities.to_vec();
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, source: ValueSource) -> Self {
        self.values.push(ValueBinding::new(name, source));
        self
    }

    pub fn with_table(mut self, kind: impl Into<String>) -> Self {
        self.table_kind = Some(kind.into());
        self
    }
}

/// Settings of the synthetic root node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootConfig {
    pub class_name: String,
    pub icon: Option<String>,
}

/// Predicate deciding whether a category is kept.
pub type CategoryFilter = fn(&DomainEntity) -> bool;

#[derive(Debug, Clone)]
pub struct TreeTransformConfig {
    pub diagram_id: String,
    pub root: RootConfig,
    pub category: LevelConfig,
    pub group: LevelConfig,
    /// Absent for three-level hierarchies.
    pub leaf: Option<LevelConfig>,
    pub category_filter: Option<CategoryFilter>,
}

/// Message ids used by one diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageIds {
    pub label: String,
    pub root_description: String,
    pub category_description: String,
    pub group_description: String,
    pub leaf_description: String,
}

impl MessageIds {
    pub fn for_diagram(diagram_id: &str) -> Self {
        Self {
            label: format!("{diagram_id}_label"),
            root_description: format!("{diagram_id}_root_description"),
            category_description: format!("{diagram_id}_category_description"),
            group_description: format!("{diagram_id}_group_description"),
            leaf_description: format!("{diagram_id}_leaf_description"),
        }
    }
}

/// The chain of entities from the category down to the node being built.
#[derive(Clone, Copy)]
struct Lineage<'a> {
    category: &'a DomainEntity,
    group: Option<&'a DomainEntity>,
    leaf: Option<&'a DomainEntity>,
}

impl<'a> Lineage<'a> {
    fn get(&self, role: EntityRole) -> Option<&'a DomainEntity> {
        match role {
            EntityRole::Category => Some(self.category),
            EntityRole::Group => self.group,
            EntityRole::Leaf => self.leaf,
        }
    }
}

/// Builds the tree of one diagram.
///
/// The root id is `{diagram_id}_label`. Its description carries the number of
/// categories left after filtering as `categoryCount`.
pub fn transform(categories: &[DomainEntity], config: &TreeTransformConfig) -> TreeNode {
    let messages = MessageIds::for_diagram(&config.diagram_id);
    let kept: Vec<&DomainEntity> = categories
        .iter()
        .filter(|category| config.category_filter.is_none_or(|keep| keep(category)))
        .collect();

    let children = kept
        .iter()
        .map(|category| build_category(category, config, &messages))
        .collect::<Vec<_>>();

    let description = MessageRef::new(&messages.root_description).with_value("categoryCount", kept.len());
    let mut data = NodeData::new(Label::Message(MessageRef::new(&messages.label)))
        .with_description(Description::Message(description));
    data.icon = config.root.icon.clone();

    TreeNode::new(messages.label.clone(), data)
        .with_class_name(&config.root.class_name)
        .with_children(children)
}

fn build_category(category: &DomainEntity, config: &TreeTransformConfig, messages: &MessageIds) -> TreeNode {
    let lineage = Lineage {
        category,
        group: None,
        leaf: None,
    };
    let groups = category
        .children
        .iter()
        .map(|group| build_group(group, lineage, config, messages))
        .collect::<Vec<_>>();

    level_node(
        category,
        &config.category,
        lineage,
        &messages.category_description,
        category.children.len(),
        None,
    )
    .with_children(groups)
}

fn build_group(
    group: &DomainEntity,
    parent: Lineage<'_>,
    config: &TreeTransformConfig,
    messages: &MessageIds,
) -> TreeNode {
    let lineage = Lineage {
        group: Some(group),
        ..parent
    };

    let (leaves, child_count) = match &config.leaf {
        Some(leaf_config) => {
            let leaves = group
                .children
                .iter()
                .map(|leaf| {
                    let lineage = Lineage {
                        leaf: Some(leaf),
                        ..lineage
                    };
                    level_node(
                        leaf,
                        leaf_config,
                        lineage,
                        &messages.leaf_description,
                        0,
                        Some(table(leaf, lineage, leaf_config)),
                    )
                })
                .collect::<Vec<_>>();
            let count = leaves.len();
            (leaves, count)
        }
        None => (Vec::new(), 0),
    };

    level_node(
        group,
        &config.group,
        lineage,
        &messages.group_description,
        child_count,
        Some(table(group, lineage, &config.group)),
    )
    .with_children(leaves)
}

/// Table of an entity, if its level declares one and it has properties.
fn table(entity: &DomainEntity, lineage: Lineage<'_>, level: &LevelConfig) -> Option<TableData> {
    let kind = level.table_kind.as_deref()?;
    if entity.properties.is_empty() {
        return None;
    }
    let group = lineage.group?;
    Some(TableData::new(
        kind,
        &entity.entity.id,
        TablePayload {
            category: lineage.category.entity.name.clone(),
            group: group.entity.name.clone(),
            leaf: lineage.leaf.map(|leaf| leaf.entity.name.clone()),
            properties: entity.properties.clone(),
        },
    ))
}

/// Builds a category, group or leaf node without children.
///
/// `table` is `None` at category level and `Some(None)` for a level that
/// could carry a table but has none; both group and leaf nodes also record
/// their property count.
fn level_node(
    entity: &DomainEntity,
    level: &LevelConfig,
    lineage: Lineage<'_>,
    message_id: &str,
    child_count: usize,
    table: Option<Option<TableData>>,
) -> TreeNode {
    let mut description = MessageRef::new(message_id);
    for role in &level.entities {
        if let Some(named) = lineage.get(*role) {
            description = description.with_entity(role.key(), named.entity.clone());
        }
    }
    for binding in &level.values {
        let value = match binding.source {
            ValueSource::ChildCount => child_count,
            ValueSource::PropertyCount => entity.properties.len(),
        };
        description = description.with_value(&binding.name, value);
    }

    let mut data = NodeData::new(Label::Entity(entity.entity.clone()))
        .with_description(Description::Message(description));
    if let Some(table) = table {
        data.property_count = Some(entity.properties.len());
        if let Some(table) = table {
            data = data.with_table(vec![table]);
            data.show_table_icon = true;
        }
    }

    TreeNode::new(format!("{}-{}", level.id_prefix, entity.entity.id), data)
        .with_class_name(&level.class_name)
}
