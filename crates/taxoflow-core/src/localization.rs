//! Localized names, labels and descriptions.
//!
//! Labels and descriptions are stored unresolved on tree nodes and rendered
//! nodes. They are turned into display text only when a [`LabelResolver`] is
//! applied with the active [`Locale`], so a locale switch never requires the
//! diagram to be rebuilt.

use std::{collections::HashMap, fmt, str::FromStr};

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Display language. Two-letter codes `de` and `en`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    En,
}

impl Locale {
    pub fn code(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    /// Accepts a two-letter code or a longer tag such as `en-US`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let prefix = s.get(..2).unwrap_or(s).to_ascii_lowercase();
        match prefix.as_str() {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            _ => Err(format!("unsupported locale `{s}`")),
        }
    }
}

/// A German/English name pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub name_german: String,
    pub name_english: String,
}

impl LocalizedName {
    pub fn new(name_german: impl Into<String>, name_english: impl Into<String>) -> Self {
        Self {
            name_german: name_german.into(),
            name_english: name_english.into(),
        }
    }

    /// The raw name for `locale`, without any case adjustment.
    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::De => &self.name_german,
            Locale::En => &self.name_english,
        }
    }
}

/// Identifier of a domain entity. The datasets use integers, hand-written
/// configuration may use strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A named domain entity with optional acronyms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizableEntity {
    pub id: EntityId,
    #[serde(flatten)]
    pub name: LocalizedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acronym_german: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acronym_english: Option<String>,
}

impl LocalizableEntity {
    pub fn new(id: impl Into<EntityId>, name: LocalizedName) -> Self {
        Self {
            id: id.into(),
            name,
            acronym_german: None,
            acronym_english: None,
        }
    }

    pub fn with_acronyms(
        mut self,
        acronym_german: impl Into<String>,
        acronym_english: impl Into<String>,
    ) -> Self {
        self.acronym_german = Some(acronym_german.into());
        self.acronym_english = Some(acronym_english.into());
        self
    }

    /// Non-empty acronym for `locale`, if any.
    pub fn acronym(&self, locale: Locale) -> Option<&str> {
        let acronym = match locale {
            Locale::De => self.acronym_german.as_deref(),
            Locale::En => self.acronym_english.as_deref(),
        };
        acronym.filter(|a| !a.is_empty())
    }

    fn has_any_acronym(&self) -> bool {
        self.acronym(Locale::De).is_some() || self.acronym(Locale::En).is_some()
    }
}

/// A parameter value substituted into a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Name(LocalizedName),
}

impl From<usize> for MessageValue {
    fn from(value: usize) -> Self {
        Self::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for MessageValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Reference to a localized message plus its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRef {
    #[serde(rename = "messageId")]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub values: IndexMap<String, MessageValue>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub entities: IndexMap<String, LocalizableEntity>,
}

impl MessageRef {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            values: IndexMap::new(),
            entities: IndexMap::new(),
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<MessageValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_entity(mut self, key: impl Into<String>, entity: LocalizableEntity) -> Self {
        self.entities.insert(key.into(), entity);
        self
    }
}

/// A node label.
///
/// Variant order is the discrimination order used when decoding: a message
/// reference is recognised before a full entity, a full entity before a bare
/// name pair. Anything else that is not a string is kept opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Message(MessageRef),
    Entity(LocalizableEntity),
    Name(LocalizedName),
    Text(String),
    Opaque(Value),
}

impl Default for Label {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A node description: static text or a parameterized message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Description {
    Message(MessageRef),
    Text(String),
}

/// Formats a message id with parameters for a locale.
///
/// Returns `None` when the message is unknown.
pub trait Translator {
    fn translate(
        &self,
        locale: Locale,
        message_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<String>;
}

impl<F> Translator for F
where
    F: Fn(Locale, &str, &HashMap<String, String>) -> Option<String>,
{
    fn translate(
        &self,
        locale: Locale,
        message_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<String> {
        self(locale, message_id, params)
    }
}

/// Capitalizes the first character of every word that is entirely lowercase.
/// Words containing an uppercase character are left as they are.
pub fn to_title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            if word != word.to_lowercase() {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves labels and descriptions for one locale.
pub struct LabelResolver<'a, T: Translator + ?Sized> {
    translator: &'a T,
    locale: Locale,
}

impl<'a, T: Translator + ?Sized> LabelResolver<'a, T> {
    pub fn new(translator: &'a T, locale: Locale) -> Self {
        Self { translator, locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Title-cased name for the active locale.
    pub fn localized_name(&self, name: &LocalizedName) -> String {
        to_title_case(name.get(self.locale))
    }

    /// Acronym if the entity has one for the active locale, else its name.
    pub fn display_label(&self, entity: &LocalizableEntity) -> String {
        match entity.acronym(self.locale) {
            Some(acronym) => acronym.to_string(),
            None => self.localized_name(&entity.name),
        }
    }

    /// Display text for a label. Opaque labels have no text form and yield
    /// `None`; the caller renders them as they are.
    pub fn label(&self, label: &Label) -> Option<String> {
        let text = match label {
            Label::Text(text) => to_title_case(text),
            Label::Message(message) => to_title_case(&self.message(message)),
            Label::Entity(entity) if entity.has_any_acronym() => {
                // Falls back to the name when only the other locale has an acronym.
                let text = entity
                    .acronym(self.locale)
                    .unwrap_or_else(|| entity.name.get(self.locale));
                to_title_case(text)
            }
            Label::Entity(entity) => self.localized_name(&entity.name),
            Label::Name(name) => self.localized_name(name),
            Label::Opaque(_) => return None,
        };
        Some(text)
    }

    /// Display text for a description. Unknown messages resolve to an empty
    /// string.
    pub fn description(&self, description: &Description) -> String {
        match description {
            Description::Text(text) => text.clone(),
            Description::Message(message) => self.message(message),
        }
    }

    fn message(&self, message: &MessageRef) -> String {
        let params = self.params(message);
        match self.translator.translate(self.locale, &message.message_id, &params) {
            Some(text) => text,
            None => {
                debug!(message_id = message.message_id.as_str(), locale:% = self.locale; "Missing message");
                String::new()
            }
        }
    }

    /// Entities resolve to their plain localized name; values override
    /// entities on key collisions.
    fn params(&self, message: &MessageRef) -> HashMap<String, String> {
        let mut params = HashMap::with_capacity(message.entities.len() + message.values.len());
        for (key, entity) in &message.entities {
            params.insert(key.clone(), entity.name.get(self.locale).to_string());
        }
        for (key, value) in &message.values {
            let text = match value {
                MessageValue::Integer(n) => n.to_string(),
                MessageValue::Float(x) => x.to_string(),
                MessageValue::Text(text) => text.clone(),
                MessageValue::Name(name) => name.get(self.locale).to_string(),
            };
            params.insert(key.clone(), text);
        }
        params
    }
}

/// An in-memory German/English message table with `{param}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: HashMap<String, LocalizedName>,
}

impl MessageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, message_id: impl Into<String>, german: &str, english: &str) {
        self.messages
            .insert(message_id.into(), LocalizedName::new(german, english));
    }

    pub fn contains(&self, message_id: &str) -> bool {
        self.messages.contains_key(message_id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Catalog with the labels and descriptions of the bioenergy diagrams.
    pub fn bioenergy() -> Self {
        let mut catalog = Self::new();
        for (id, german, english) in BIOENERGY_MESSAGES {
            catalog.insert(*id, german, english);
        }
        catalog
    }
}

impl Translator for MessageCatalog {
    fn translate(
        &self,
        locale: Locale,
        message_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<String> {
        let template = self.messages.get(message_id)?.get(locale);
        Some(substitute(template, params))
    }
}

/// Replaces `{key}` placeholders. Unknown placeholders are kept verbatim.
fn substitute(template: &str, params: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match params.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

const BIOENERGY_MESSAGES: &[(&str, &str, &str)] = &[
    ("diagram_root_name", "Hauptdiagramm", "Main Diagram"),
    ("xducts_label", "Xdukte", "Xducts"),
    (
        "xducts_description",
        "Das ist der Ausgangspunkt für alle Produkte und Rohstoffe. -> Klick für mehr Details.",
        "This is the starting point for all products and raw materials. -> Click for more details.",
    ),
    ("conversion_procedures_label", "Konversionsverfahren", "Conversion Procedures"),
    (
        "conversion_procedures_description",
        "Verschiedene Verfahren zur Umwandlung von Rohstoffen. -> Klick für mehr Details.",
        "Various methods for converting raw materials. -> Click for more details.",
    ),
    ("mix_label", "Mix", "Mix"),
    (
        "mix_description",
        "Kombinationen verschiedener Verfahren und Produkte. -> Klick für mehr Details.",
        "Combinations of different processes and products. -> Click for more details.",
    ),
    ("process_chains_label", "Prozessketten", "Process Chains"),
    (
        "process_chains_description",
        "Beginn mit Biomasseressourcen, transportierte Zwischenprodukte, Umwandlung zu verschiedenen Energieträgern und schließlich Nutzung in allen Energiesektoren (einschließlich potenzieller Nebenprodukte). -> Klick für mehr Details.",
        "Start with biomass resources, transported intermediates, processing into different energy carriers and finally use in all energy sectors (including potential by-products). -> Click for more details.",
    ),
    ("supply_tasks_label", "Versorgungsaufgaben", "Supply Tasks"),
    (
        "supply_tasks_description",
        "Spezifische Aufgaben zur Versorgung und Bereitstellung. -> Klick für mehr Details.",
        "Specific tasks for supply and provision. -> Click for more details.",
    ),
    ("supply_concepts_label", "Versorgungskonzepte", "Supply Concepts"),
    (
        "supply_concepts_description",
        "Strategische Konzepte für die Versorgungsplanung. -> Klick für mehr Details.",
        "Strategic concepts for supply planning. -> Click for more details.",
    ),
    (
        "process_chains_leaf_description",
        "Prozesskette {leaf} aus {group} ({category}) mit {propertyCount} Eigenschaften. -> Klick um die Tabelle zu sehen.",
        "Process chain {leaf} from {group} ({category}) with {propertyCount} properties. -> Click to see the table.",
    ),
    (
        "process_chains_group_description",
        "Prozessgruppe {group} mit {count} Prozessketten. -> Klick um die Ketten zu sehen.",
        "Process group {group} with {count} process chains. -> Click to see the chains.",
    ),
    (
        "process_chains_category_description",
        "Diese Kategorie enthält {count} Gruppierungen. -> Klick für mehr Details.",
        "This category contains {count} groups. -> Click for more details.",
    ),
    (
        "process_chains_root_description",
        "Übersicht aller verfügbaren Prozessketten-Kategorien.",
        "Overview of all available process chain categories.",
    ),
    (
        "supply_concepts_group_description",
        "Versorgungskonzept {group} aus Kategorie {category} mit {propertyCount} Eigenschaften. -> Klick um die Tabelle zu sehen.",
        "Supply concept {group} from category {category}. -> Click to see the table.",
    ),
    (
        "supply_concepts_category_description",
        "Konzeptkategorie {category} mit {count} Versorgungskonzepten. -> Klick um die Konzepte zu sehen.",
        "Concept category {category} with {count} supply concepts. -> Click to see the concepts.",
    ),
    (
        "supply_concepts_root_description",
        "Übersicht aller verfügbaren Versorgungskonzept-Kategorien.",
        "Overview of all available supply concept categories.",
    ),
    (
        "supply_tasks_group_description",
        "Versorgungsaufgabe {group} aus Kategorie {category} mit {propertyCount} Eigenschaften. -> Klick um die Tabelle zu sehen.",
        "Supply task {group} from category {category}. -> Click to see the table.",
    ),
    (
        "supply_tasks_category_description",
        "Aufgabenkategorie {category} mit {count} Versorgungsaufgaben. -> Klick um die Aufgaben zu sehen.",
        "Task category {category} with {count} supply tasks. -> Click to see the tasks.",
    ),
    (
        "supply_tasks_root_description",
        "Übersicht aller verfügbaren Versorgungsaufgaben-Kategorien.",
        "Overview of all available supply task categories.",
    ),
    (
        "xducts_leaf_description",
        "Xdukt {leaf} aus Gruppe {group} mit {propertyCount} Eigenschaften. -> Klick um die Tabelle zu sehen.",
        "Xduct {leaf} from group {group}. -> Click to see the table.",
    ),
    (
        "xducts_group_description",
        "Xdukt-Gruppe {group} aus Kategorie {category} mit {count} Xdukten. -> Klick um die Xdukte zu sehen.",
        "Xduct group {group} from category {category} with {count} xducts. -> Click to see the xducts.",
    ),
    (
        "xducts_category_description",
        "Xdukt-Kategorie {category} mit {count} Gruppen. -> Klick um die Gruppen zu sehen.",
        "Xduct category {category} with {count} groups. -> Click to see the groups.",
    ),
    (
        "xducts_root_description",
        "Übersicht aller verfügbaren Xdukt-Kategorien.",
        "Overview of all available xduct categories.",
    ),
    (
        "conversion_procedures_group_description",
        "Verfahrenskomponente {group} aus Kategorie {category} mit {propertyCount} Eigenschaften. -> Klick um die Tabelle zu sehen.",
        "Procedure component {group} from category {category}. -> Click to see the table.",
    ),
    (
        "conversion_procedures_category_description",
        "Verfahrenskategorie {category} mit {count} Komponenten. -> Klick um die Komponenten zu sehen.",
        "Procedure category {category} with {count} components. -> Click to see the components.",
    ),
    (
        "conversion_procedures_root_description",
        "Übersicht aller verfügbaren Konversionsverfahren-Kategorien.",
        "Overview of all available conversion procedure categories.",
    ),
];
