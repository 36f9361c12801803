use serde_json::{Map, Value};

use crate::error::ExtractionError;
use crate::services::completion::{FieldKind, OutputSchema, RawCompletion};

/// Arguments of the forced tool call, already checked against the schema.
#[derive(Debug, Clone)]
pub struct StructuredPayload {
    fields: Map<String, Value>,
}

impl StructuredPayload {
    pub fn number(&self, name: &str) -> Result<f64, ExtractionError> {
        self.fields
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| ExtractionError::MalformedPayload(format!("{} is not a number", name)))
    }

    pub fn text(&self, name: &str) -> Result<String, ExtractionError> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| ExtractionError::MalformedPayload(format!("{} is not a string", name)))
    }

    /// Whole, non-negative kilocalories; rounds to nearest.
    pub fn calories(&self, name: &str) -> Result<u32, ExtractionError> {
        let value = self.number(name)?;
        if value < 0.0 {
            return Err(ExtractionError::MalformedPayload(format!(
                "{} is negative ({})",
                name, value
            )));
        }
        let rounded = value.round();
        if rounded > u32::MAX as f64 {
            return Err(ExtractionError::MalformedPayload(format!(
                "{} is out of range ({})",
                name, value
            )));
        }
        Ok(rounded as u32)
    }
}

/// Locates the tool call named by `schema` and checks its arguments field by field.
/// All-or-nothing: any missing or mistyped field rejects the whole payload.
pub fn extract(
    completion: &RawCompletion,
    schema: &OutputSchema,
) -> Result<StructuredPayload, ExtractionError> {
    let message = completion.choices.first().map(|choice| &choice.message);
    let (call, function) = message
        .and_then(|m| m.tool_calls.as_ref())
        .and_then(|calls| {
            calls
                .iter()
                .filter_map(|c| c.function.as_ref().map(|f| (c, f)))
                .find(|(_, f)| f.name == schema.name)
        })
        .ok_or_else(|| {
            let prose = message.and_then(|m| m.content.as_deref()).unwrap_or("");
            log::error!(
                "❌ Completion carried no '{}' tool call (text: {})",
                schema.name,
                prose.chars().take(200).collect::<String>()
            );
            ExtractionError::NoStructuredPayload
        })?;

    let arguments = match &function.arguments {
        Value::String(raw) => serde_json::from_str::<Value>(raw).map_err(|e| {
            log::error!(
                "❌ '{}' arguments are not JSON: {} ({})",
                schema.name,
                e,
                raw.chars().take(200).collect::<String>()
            );
            ExtractionError::MalformedPayload(format!("arguments are not valid JSON: {}", e))
        })?,
        other => other.clone(),
    };

    let fields = match arguments {
        Value::Object(map) => map,
        other => {
            log::error!("❌ '{}' arguments are not an object: {}", schema.name, other);
            return Err(ExtractionError::MalformedPayload(
                "arguments are not an object".to_string(),
            ));
        }
    };

    for field in &schema.fields {
        let Some(value) = fields.get(field.name) else {
            log::error!("❌ '{}' payload is missing {}", schema.name, field.name);
            return Err(ExtractionError::MalformedPayload(format!(
                "missing required field {}",
                field.name
            )));
        };

        let ok = match field.kind {
            FieldKind::Number => value.as_f64().map(f64::is_finite).unwrap_or(false),
            FieldKind::Text => value
                .as_str()
                .map(|s| !field.non_empty || !s.trim().is_empty())
                .unwrap_or(false),
        };

        if !ok {
            log::error!(
                "❌ '{}' payload has invalid {}: {}",
                schema.name,
                field.name,
                value
            );
            return Err(ExtractionError::MalformedPayload(format!(
                "invalid value for {}",
                field.name
            )));
        }
    }

    log::debug!(
        "✅ '{}' payload validated (call {})",
        schema.name,
        call.id.as_deref().unwrap_or("-")
    );
    Ok(StructuredPayload { fields })
}
