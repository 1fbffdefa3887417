use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One ranked recommendation for a tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Category label, e.g. a crop name
    #[serde(alias = "plant")]
    pub category: String,
    /// Confidence in `[0, 1]`; non-numeric or out-of-range values read as
    /// `None`
    #[serde(default, deserialize_with = "lenient_confidence")]
    pub confidence: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub rationale: Option<String>,
}

impl Recommendation {
    pub fn new(category: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            category: category.into(),
            confidence,
            rationale: None,
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// Parse one entry of a service reply, `None` when it has no usable
    /// category
    pub fn deserialize_lenient(value: &Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let mut rec = Self::deserialize(value).ok()?;
        rec.category = rec.category.trim().to_string();
        (!rec.category.is_empty()).then_some(rec)
    }
}

fn lenient_confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| (0.0..=1.0).contains(v)))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
