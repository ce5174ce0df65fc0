// Shapes shared by several endpoints of the remote API

use serde::{Deserialize, Serialize};

/// Standard response envelope: `{ success, message, data }`, every field optional
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "none")]
    pub data: Option<T>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}

/// Body carrying only a message, used to read error answers
#[derive(Debug, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Identifiers arrive as numbers or as numeric strings depending on the endpoint.
pub mod lenient_id {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn from_value(value: Value) -> Option<i64> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(from_value))
    }

    pub fn required<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let shown = value.to_string();
        from_value(value).ok_or_else(|| D::Error::custom(format!("invalid identifier: {}", shown)))
    }
}

/// Free-form scalar columns (`statut`, `est_figee`, ...) kept as text whatever their JSON type.
pub mod lenient_text {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }

    /// Like `deserialize`, with an explicit `null` read as the empty string.
    pub fn or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(deserialize(deserializer)?.unwrap_or_default())
    }
}
