//! Session settings with defaults and schema-drift tolerant merging.
//!
//! Settings travel as a JSON object map at the edges (settings files, the
//! `/set` command) and as a typed [`Settings`] record everywhere else. Every
//! conversion from a map goes through one default-fill pass, so a record
//! written by an older build with fewer keys still yields a complete record.

use chrono::NaiveDate;
use serde_json::{json, Map, Value};
use std::fmt;

pub const SOIL_TYPES: &[&str] = &["Red Soil", "Black Cotton Soil", "Alluvial Soil", "Sandy Loam", "Clayey"];

pub const WATER_CONDITIONS: &[&str] = &[
    "Excellent (Irrigated)",
    "Good (Seasonal)",
    "Average",
    "Poor (Rainfed)",
    "Very Bad (Drought Prone)",
];

pub const LANGUAGES: &[&str] = &["English", "Hindi", "Marathi", "Spanish", "French"];

/// Top-level keys of the canonical settings map.
pub const FIELDS: &[&str] = &[
    "name",
    "location",
    "soil_type",
    "water_condition",
    "crop",
    "language",
    "sowing_date",
    "credential",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub country: String,
    pub region: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub name: String,
    pub location: Location,
    pub soil_type: String,
    pub water_condition: String,
    pub crop: String,
    pub language: String,
    pub sowing_date: Option<NaiveDate>,
    pub credential: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: "Farmer John".into(),
            location: Location { country: "India".into(), region: "Maharashtra".into() },
            soil_type: "Red Soil".into(),
            water_condition: "Good (Seasonal)".into(),
            crop: "Wheat".into(),
            language: "English".into(),
            sowing_date: None,
            credential: None,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("soil_type", &self.soil_type)
            .field("water_condition", &self.water_condition)
            .field("crop", &self.crop)
            .field("language", &self.language)
            .field("sowing_date", &self.sowing_date)
            .field("credential", &self.credential.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Build the session settings from a previously stored record, if any.
///
/// Missing keys take their defaults and present keys are kept, so the call is
/// idempotent: `initialize(Some(&initialize(x).to_map())) == initialize(x)`.
/// Flat keys written by older builds (`country`, `state`, `region`,
/// `gemini_key`) are moved into their current place first.
pub fn initialize(existing: Option<&Map<String, Value>>) -> Settings {
    match existing {
        None => Settings::default(),
        Some(record) => Settings::from_map(&hoist_legacy(record)),
    }
}

impl Settings {
    /// Shallow merge of `fields` over this record. `location` merges key-wise;
    /// unknown keys are ignored.
    pub fn update(&self, fields: &Map<String, Value>) -> Settings {
        let mut map = self.to_map();
        for (key, value) in fields {
            if !FIELDS.contains(&key.as_str()) {
                continue;
            }
            match (key.as_str(), value) {
                ("location", Value::Object(loc)) => {
                    if let Some(Value::Object(current)) = map.get_mut("location") {
                        for (k, v) in loc {
                            current.insert(k.clone(), v.clone());
                        }
                    }
                }
                ("location", _) => {}
                _ => {
                    map.insert(key.clone(), value.clone());
                }
            }
        }
        Settings::from_map(&map)
    }

    /// Canonical map form: every key in [`FIELDS`] is present, optional
    /// values absent as `null`.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".into(), Value::from(self.name.as_str()));
        map.insert(
            "location".into(),
            json!({ "country": self.location.country, "region": self.location.region }),
        );
        map.insert("soil_type".into(), Value::from(self.soil_type.as_str()));
        map.insert("water_condition".into(), Value::from(self.water_condition.as_str()));
        map.insert("crop".into(), Value::from(self.crop.as_str()));
        map.insert("language".into(), Value::from(self.language.as_str()));
        map.insert(
            "sowing_date".into(),
            self.sowing_date
                .map(|d| Value::from(d.format(DATE_FORMAT).to_string()))
                .unwrap_or(Value::Null),
        );
        map.insert(
            "credential".into(),
            self.credential.as_deref().map(Value::from).unwrap_or(Value::Null),
        );
        map
    }

    fn from_map(map: &Map<String, Value>) -> Settings {
        let d = Settings::default();
        let loc = map.get("location").and_then(Value::as_object);
        let loc_text = |key: &str| loc.and_then(|l| text(l.get(key)));

        Settings {
            name: text(map.get("name")).unwrap_or(d.name),
            location: Location {
                country: loc_text("country").unwrap_or(d.location.country),
                region: loc_text("region").unwrap_or(d.location.region),
            },
            soil_type: text(map.get("soil_type")).unwrap_or(d.soil_type),
            water_condition: text(map.get("water_condition")).unwrap_or(d.water_condition),
            crop: text(map.get("crop")).unwrap_or(d.crop),
            language: text(map.get("language")).unwrap_or(d.language),
            sowing_date: text(map.get("sowing_date"))
                .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()),
            credential: text(map.get("credential")),
        }
    }
}

/// Turn a `key=value` pair typed by the user into an update map.
/// Location parts may be given by their own names. Returns `None` for keys
/// that name no setting.
pub fn field_update(key: &str, value: &str) -> Option<Map<String, Value>> {
    let key = key.trim().to_lowercase();
    let mut fields = Map::new();
    match key.as_str() {
        "country" => {
            fields.insert("location".into(), json!({ "country": value }));
        }
        "region" | "state" => {
            fields.insert("location".into(), json!({ "region": value }));
        }
        "soil" => {
            fields.insert("soil_type".into(), Value::from(value));
        }
        "water" => {
            fields.insert("water_condition".into(), Value::from(value));
        }
        "api_key" | "key" => {
            fields.insert("credential".into(), Value::from(value));
        }
        k if FIELDS.contains(&k) && k != "location" => {
            fields.insert(k.to_string(), Value::from(value));
        }
        _ => return None,
    }
    Some(fields)
}

/// Coerce a stored value to a non-blank string. Scalars are stringified;
/// null, blank strings, arrays and objects yield `None`.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn hoist_legacy(record: &Map<String, Value>) -> Map<String, Value> {
    let mut out = record.clone();

    let mut location = match out.remove("location") {
        Some(Value::Object(loc)) => loc,
        _ => Map::new(),
    };
    for (legacy, current) in [("country", "country"), ("state", "region"), ("region", "region")] {
        if let Some(v) = out.remove(legacy) {
            location.entry(current).or_insert(v);
        }
    }
    out.insert("location".into(), Value::Object(location));

    if let Some(v) = out.remove("gemini_key") {
        if text(out.get("credential")).is_none() {
            out.insert("credential".into(), v);
        }
    }
    out
}
