use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Every metadata column a unit carries, in export order
pub const METADATA_COLUMNS: &[&str] = &[
    "code",
    "title",
    "description",
    "lithology",
    "rock_type",
    "formation",
    "grouping",
    "span",
    "min_age",
    "max_age",
    "est_age",
    "controlled_span",
];

/// Columns that define a unit type when regrouping geometry
pub const DEFAULT_METADATA_KEY: &[&str] = &[
    "code",
    "title",
    "lithology",
    "rock_type",
    "formation",
    "grouping",
    "span",
    "min_age",
    "max_age",
    "est_age",
    "controlled_span",
];

/// Broad rock classification derived from lithology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RockType {
    Igneous,
    Metamorphic,
    Sedimentary,
}

impl RockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RockType::Igneous => "igneous",
            RockType::Metamorphic => "metamorphic",
            RockType::Sedimentary => "sedimentary",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "igneous" => Some(RockType::Igneous),
            "metamorphic" => Some(RockType::Metamorphic),
            "sedimentary" => Some(RockType::Sedimentary),
            _ => None,
        }
    }
}

impl fmt::Display for RockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized attributes of one geologic map unit
///
/// The closed set of known columns is typed. Anything else a source carries
/// rides along untouched in `passthrough`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub lithology: Option<String>,
    pub rock_type: Option<RockType>,
    pub formation: Option<String>,
    pub grouping: Option<String>,
    pub span: Option<String>,
    pub controlled_span: Option<String>,
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
    pub est_age: Option<f64>,

    /// Source-specific attributes outside the known column set
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passthrough: BTreeMap<String, Value>,
}

impl UnitMetadata {
    /// Split a free-form attribute map into known columns and passthrough.
    ///
    /// Column names match case-insensitively. Blank strings count as missing.
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Self {
        let mut metadata = UnitMetadata::default();

        for (name, value) in attributes {
            let column = name.trim().to_lowercase();
            let text = value_text(value);
            match column.as_str() {
                "code" => metadata.code = text,
                "title" => metadata.title = text,
                "description" => metadata.description = text,
                "lithology" => metadata.lithology = text,
                "rock_type" => metadata.rock_type = text.as_deref().and_then(RockType::parse),
                "formation" => metadata.formation = text,
                "grouping" => metadata.grouping = text,
                "span" => metadata.span = text,
                "controlled_span" => metadata.controlled_span = text,
                "min_age" => metadata.min_age = value_number(value),
                "max_age" => metadata.max_age = value_number(value),
                "est_age" => metadata.est_age = value_number(value),
                _ => {
                    metadata.passthrough.insert(name.clone(), value.clone());
                }
            }
        }

        metadata
    }

    /// Text rendering of a known column, `None` when empty or unknown
    pub fn field(&self, column: &str) -> Option<String> {
        match column {
            "code" => self.code.clone(),
            "title" => self.title.clone(),
            "description" => self.description.clone(),
            "lithology" => self.lithology.clone(),
            "rock_type" => self.rock_type.map(|r| r.to_string()),
            "formation" => self.formation.clone(),
            "grouping" => self.grouping.clone(),
            "span" => self.span.clone(),
            "controlled_span" => self.controlled_span.clone(),
            "min_age" => self.min_age.map(|v| v.to_string()),
            "max_age" => self.max_age.map(|v| v.to_string()),
            "est_age" => self.est_age.map(|v| v.to_string()),
            _ => None,
        }
    }

    /// Key identifying the unit type over the given columns
    pub fn key(&self, columns: &[String]) -> Vec<Option<String>> {
        columns.iter().map(|c| self.field(c)).collect()
    }

    /// A unit without a code cannot be keyed to a legend entry
    pub fn is_empty_unit(&self) -> bool {
        self.code.as_deref().map_or(true, |c| c.trim().is_empty())
    }

    /// Fill blank columns from a secondary metadata record.
    ///
    /// Columns that already have a value are left alone.
    pub fn fill_missing_from(&mut self, other: &UnitMetadata) {
        fn fill<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(other);
            }
        }

        fill(&mut self.code, &other.code);
        fill(&mut self.title, &other.title);
        fill(&mut self.description, &other.description);
        fill(&mut self.lithology, &other.lithology);
        fill(&mut self.rock_type, &other.rock_type);
        fill(&mut self.formation, &other.formation);
        fill(&mut self.grouping, &other.grouping);
        fill(&mut self.span, &other.span);
        fill(&mut self.controlled_span, &other.controlled_span);
        fill(&mut self.min_age, &other.min_age);
        fill(&mut self.max_age, &other.max_age);
        fill(&mut self.est_age, &other.est_age);
        for (name, value) in &other.passthrough {
            self.passthrough.entry(name.clone()).or_insert_with(|| value.clone());
        }
    }

    /// Companion legend entry for units mapped with uncertain contacts
    pub fn uncertain_variant(&self) -> UnitMetadata {
        let mut uncertain = self.clone();
        uncertain.code = Some(format!("{}?", self.code.as_deref().unwrap_or_default()));
        uncertain.title = Some(format!("[?] {}", self.title.as_deref().unwrap_or_default()));
        uncertain.description = Some(format!(
            "[UNCERTAIN] {}",
            self.description.as_deref().unwrap_or_default()
        ));
        uncertain
    }

    /// Flatten into GeoJSON feature properties, known columns first
    pub fn to_properties(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        for (name, value) in &self.passthrough {
            properties.insert(name.clone(), value.clone());
        }
        for column in METADATA_COLUMNS {
            let value = match *column {
                "min_age" => number_value(self.min_age),
                "max_age" => number_value(self.max_age),
                "est_age" => number_value(self.est_age),
                other => self.field(other).map(Value::String).unwrap_or(Value::Null),
            };
            properties.insert(column.to_string(), value);
        }
        properties
    }
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn number_value(value: Option<f64>) -> Value {
    value
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
