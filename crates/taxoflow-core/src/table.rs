//! Property tables attached to qualifying tree nodes.

use serde::{Deserialize, Serialize};

use crate::localization::LocalizedName;

/// Measurement unit of a property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyUnit {
    pub id: i64,
    #[serde(flatten)]
    pub name: LocalizedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// The measured quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyKind {
    pub id: i64,
    #[serde(flatten)]
    pub name: LocalizedName,
}

/// Literature source of a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyReference {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
}

/// One row of a property table.
///
/// `year` distinguishes a missing field (`None`) from an explicit `null`
/// (`Some(None)`); only some datasets carry it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub value: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "year_field"
    )]
    pub year: Option<Option<i32>>,
    pub unit: PropertyUnit,
    pub property: PropertyKind,
    #[serde(default)]
    pub reference: PropertyReference,
}

mod year_field {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Option<i32>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<i32>>, D::Error> {
        Option::<i32>::deserialize(d).map(Some)
    }
}

/// Whether the table should show a year column: the first row decides.
pub fn has_year_field(properties: &[Property]) -> bool {
    properties.first().is_some_and(|p| p.year.is_some())
}

/// Names of the hierarchy levels a table belongs to, plus its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePayload {
    pub category: LocalizedName,
    pub group: LocalizedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf: Option<LocalizedName>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// A property table with a stable id of the form `{kind}-properties-{entityId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub id: String,
    pub data: TablePayload,
}

impl TableData {
    pub fn new(kind: &str, entity_id: impl std::fmt::Display, data: TablePayload) -> Self {
        Self {
            id: format!("{kind}-properties-{entity_id}"),
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.properties.is_empty()
    }

    pub fn has_year_field(&self) -> bool {
        has_year_field(&self.data.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = r#"{
        "id": 100,
        "value": 5,
        "unit": {"id": 1, "name_german": "Kilowattstunde", "name_english": "kilowatt hour", "symbol": "kWh"},
        "property": {"id": 2, "name_german": "Ertrag", "name_english": "yield"},
        "reference": {"id": null, "source": null}
    }"#;

    #[test]
    fn test_property_decodes_without_year() {
        let property: Property = serde_json::from_str(ROW).unwrap();
        assert_eq!(property.value, Some(5.0));
        assert_eq!(property.year, None);
        assert_eq!(property.unit.symbol.as_deref(), Some("kWh"));
        assert_eq!(property.reference, PropertyReference::default());
        assert!(!has_year_field(&[property]));
    }

    #[test]
    fn test_property_year_null_counts_as_present() {
        let mut json: serde_json::Value = serde_json::from_str(ROW).unwrap();
        json["year"] = serde_json::Value::Null;
        let property: Property = serde_json::from_value(json).unwrap();
        assert_eq!(property.year, Some(None));
        assert!(has_year_field(&[property]));
    }

    #[test]
    fn test_property_year_value() {
        let mut json: serde_json::Value = serde_json::from_str(ROW).unwrap();
        json["year"] = serde_json::json!(2020);
        let property: Property = serde_json::from_value(json).unwrap();
        assert_eq!(property.year, Some(Some(2020)));
    }

    #[test]
    fn test_table_data_id() {
        let table = TableData::new(
            "chain",
            42,
            TablePayload {
                category: LocalizedName::new("K", "C"),
                group: LocalizedName::new("G", "G"),
                leaf: None,
                properties: Vec::new(),
            },
        );
        assert_eq!(table.id, "chain-properties-42");
        assert!(table.is_empty());
        assert!(!table.has_year_field());
    }
}
