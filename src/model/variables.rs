//! Opaque per-tile provider payloads
//!
//! Providers return free-form JSON, so a tile's variables stay a JSON object
//! keyed by provider name. Accessors cover only the handful of fields the
//! aggregator and the tile report read.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Status value used by in-band error records
pub const ERROR_STATUS: &str = "error";

/// Provider name -> provider payload (or an error record)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(Map<String, Value>);

/// Build `{"status": "error", "message": ...}`
pub fn error_record(message: impl Into<String>) -> Value {
    json!({ "status": ERROR_STATUS, "message": message.into() })
}

/// Whether a payload is an in-band error record
pub fn is_error_record(value: &Value) -> bool {
    value.get("status").and_then(Value::as_str) == Some(ERROR_STATUS)
}

impl Variables {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Variables for a tile whose whole collection failed
    pub fn failed(message: impl Into<String>) -> Self {
        match error_record(message) {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn insert(&mut self, provider: impl Into<String>, payload: Value) {
        self.0.insert(provider.into(), payload);
    }

    pub fn get(&self, provider: &str) -> Option<&Value> {
        self.0.get(provider)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// The whole tile collection failed
    pub fn is_error(&self) -> bool {
        self.0.get("status").and_then(Value::as_str) == Some(ERROR_STATUS)
    }

    /// A single provider returned an error record
    pub fn provider_failed(&self, provider: &str) -> bool {
        self.get(provider).is_some_and(is_error_record)
    }

    fn number_at(&self, path: &[&str]) -> Option<f64> {
        let (first, rest) = path.split_first()?;
        let mut current = self.0.get(*first)?;
        for key in rest {
            current = current.get(*key)?;
        }
        current.as_f64().filter(|v| v.is_finite())
    }

    fn first_number(&self, paths: &[&[&str]]) -> Option<f64> {
        paths.iter().find_map(|path| self.number_at(path))
    }

    pub fn ndvi(&self) -> Option<f64> {
        self.number_at(&["landcover", "vegetation_indices", "ndvi"])
    }

    pub fn ndwi(&self) -> Option<f64> {
        self.number_at(&["landcover", "vegetation_indices", "ndwi"])
    }

    /// Long-term average monthly precipitation in millimeters
    pub fn long_term_precip_mm(&self) -> Option<f64> {
        self.first_number(&[
            &["seasonal", "data", "long_term_avg_precip_mm"],
            &["seasonal", "long_term_avg_precip_mm"],
        ])
    }

    pub fn temperature_c(&self) -> Option<f64> {
        let climate = self.get("climate")?;
        match climate.get("data").and_then(Value::as_array) {
            Some(rows) if !rows.is_empty() => rows[0]
                .get("temp_mean_c")
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite()),
            _ => self.number_at(&["climate", "temp_mean_c"]),
        }
    }

    pub fn soil_ph(&self) -> Option<f64> {
        self.first_number(&[&["soil", "properties_at_0_5cm", "ph"], &["soil", "ph"]])
    }

    pub fn sand_g_kg(&self) -> Option<f64> {
        self.first_number(&[
            &["soil", "properties_at_0_5cm", "sand_g_kg"],
            &["soil", "sand_g_kg"],
        ])
    }

    pub fn clay_g_kg(&self) -> Option<f64> {
        self.first_number(&[
            &["soil", "properties_at_0_5cm", "clay_g_kg"],
            &["soil", "clay_g_kg"],
        ])
    }

    pub fn elevation_m(&self) -> Option<f64> {
        self.first_number(&[
            &["topography", "data", "elevation_meters"],
            &["topography", "elevation_meters"],
        ])
    }
}
