use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Field keys produced by the extraction service.
pub mod keys {
    pub const NUMBER: &str = "numero";
    pub const INFRACTION_CODE: &str = "codigo_infracao";
    pub const INFRACTION: &str = "infracao";
    pub const LOCATION: &str = "local";
    pub const DATE: &str = "data";
    pub const VALUE: &str = "valor";
    pub const VEHICLE_PLATE: &str = "placa";
    pub const DRIVER_NAME: &str = "nome_condutor";
    pub const DRIVER_DOCUMENT_ID: &str = "cpf_condutor";
    pub const ISSUING_AUTHORITY: &str = "orgao_autuador";
    pub const POINTS: &str = "pontos";
    pub const NOTES: &str = "observacoes";
}

/// Fields that must be filled before the review can proceed.
pub const REQUIRED_FIELDS: [&str; 5] = [
    keys::NUMBER,
    keys::INFRACTION,
    keys::LOCATION,
    keys::DATE,
    keys::VALUE,
];

/// Flat key/value view of an infraction document, editable by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key` when present and non-blank, trimmed.
    pub fn filled(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|value| !value.is_empty())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Builds a field map from an extraction payload, coercing scalars to text.
    /// `null` entries are treated as absent.
    pub fn from_json(value: Value) -> Result<Self, FieldMapError> {
        match value {
            Value::Object(entries) => Ok(entries
                .into_iter()
                .filter_map(|(key, value)| json_text(value).map(|text| (key, text)))
                .collect()),
            other => Err(FieldMapError::NotAnObject(json_kind(&other))),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for FieldMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        FieldMap::from_json(value).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldMapError {
    #[error("extracted fields must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

fn json_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        nested @ (Value::Array(_) | Value::Object(_)) => Some(nested.to_string()),
    }
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

/// True when every required field is present and non-empty after trimming.
pub fn is_complete(fields: &FieldMap) -> bool {
    REQUIRED_FIELDS
        .iter()
        .all(|key| fields.filled(key).is_some())
}

/// Required fields still missing, in display order.
pub fn missing_fields(fields: &FieldMap) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|key| fields.filled(key).is_none())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("required fields missing: {}", .missing.join(", "))]
pub struct IncompleteFields {
    pub missing: Vec<&'static str>,
}

/// Typed infraction notice built from a completed review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfractionRecord {
    pub number: String,
    pub infraction_code: String,
    pub description: String,
    pub location: String,
    pub date: String,
    pub value: String,
    pub vehicle_plate: String,
    pub driver_name: String,
    pub driver_document_id: String,
    pub issuing_authority: String,
    pub points: Option<u8>,
    pub notes: Option<String>,
}

impl InfractionRecord {
    pub fn from_fields(fields: &FieldMap) -> Result<Self, IncompleteFields> {
        let missing = missing_fields(fields);
        if !missing.is_empty() {
            return Err(IncompleteFields { missing });
        }

        let text = |key: &str| fields.filled(key).unwrap_or_default().to_string();

        Ok(Self {
            number: text(keys::NUMBER),
            infraction_code: text(keys::INFRACTION_CODE),
            description: text(keys::INFRACTION),
            location: text(keys::LOCATION),
            date: text(keys::DATE),
            value: text(keys::VALUE),
            vehicle_plate: text(keys::VEHICLE_PLATE),
            driver_name: text(keys::DRIVER_NAME),
            driver_document_id: text(keys::DRIVER_DOCUMENT_ID),
            issuing_authority: text(keys::ISSUING_AUTHORITY),
            points: fields
                .filled(keys::POINTS)
                .and_then(|raw| raw.parse::<u8>().ok()),
            notes: fields.filled(keys::NOTES).map(str::to_string),
        })
    }

    /// Flattens the record back into template fields.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields: FieldMap = [
            (keys::NUMBER, self.number.as_str()),
            (keys::INFRACTION_CODE, self.infraction_code.as_str()),
            (keys::INFRACTION, self.description.as_str()),
            (keys::LOCATION, self.location.as_str()),
            (keys::DATE, self.date.as_str()),
            (keys::VALUE, self.value.as_str()),
            (keys::VEHICLE_PLATE, self.vehicle_plate.as_str()),
            (keys::DRIVER_NAME, self.driver_name.as_str()),
            (keys::DRIVER_DOCUMENT_ID, self.driver_document_id.as_str()),
            (keys::ISSUING_AUTHORITY, self.issuing_authority.as_str()),
        ]
        .into_iter()
        .collect();

        if let Some(points) = self.points {
            fields.set(keys::POINTS, points.to_string());
        }
        if let Some(notes) = &self.notes {
            fields.set(keys::NOTES, notes.clone());
        }
        fields
    }
}
