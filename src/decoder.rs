//! Message decoding - raw JSON payload to validated Observation

use {
    serde::Serialize,
    serde_json::{Map, Value},
};

/// One parsed, validated weather observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub category: String,
    pub metric_a: f64,
    pub metric_b: f64,
}

/// JSON key names the decoder reads the three fields from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub category: String,
    pub metric_a: String,
    pub metric_b: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            category: "category".to_string(),
            metric_a: "metric_a".to_string(),
            metric_b: "metric_b".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    Null,
    WrongType { expected: &'static str },
}

#[derive(Debug)]
pub enum DecodeError {
    /// Payload is not JSON at all
    Malformed(serde_json::Error),
    /// Payload is JSON but not an object
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub problem: FieldProblem,
}

/// Either way a single message can fail to become an Observation
#[derive(Debug)]
pub enum MessageError {
    Decode(DecodeError),
    Validation(ValidationError),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Malformed(e) => write!(f, "JSON decoding error: {}", e),
            DecodeError::NotAnObject => write!(f, "JSON payload is not an object"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.problem {
            FieldProblem::Missing => write!(f, "Required field '{}' is missing", self.field),
            FieldProblem::Null => write!(f, "Required field '{}' is null", self.field),
            FieldProblem::WrongType { expected } => {
                write!(f, "Field '{}' must be a {}", self.field, expected)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageError::Decode(e) => write!(f, "{}", e),
            MessageError::Validation(e) => write!(f, "Invalid message format: {}", e),
        }
    }
}

impl std::error::Error for MessageError {}

impl From<DecodeError> for MessageError {
    fn from(err: DecodeError) -> Self {
        MessageError::Decode(err)
    }
}

impl From<ValidationError> for MessageError {
    fn from(err: ValidationError) -> Self {
        MessageError::Validation(err)
    }
}

/// Stateless decoder bound to a field mapping
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    fields: FieldMap,
}

impl Decoder {
    pub fn new(fields: FieldMap) -> Self {
        Self { fields }
    }

    /// Decode and validate a raw payload.
    ///
    /// Fields other than the three mapped ones are ignored.
    pub fn decode(&self, payload: &str) -> Result<Observation, MessageError> {
        let value: Value = serde_json::from_str(payload).map_err(DecodeError::Malformed)?;
        let record = value.as_object().ok_or(DecodeError::NotAnObject)?;

        let category = required(record, &self.fields.category)?
            .as_str()
            .ok_or_else(|| wrong_type(&self.fields.category, "string"))?
            .to_string();
        let metric_a = required_number(record, &self.fields.metric_a)?;
        let metric_b = required_number(record, &self.fields.metric_b)?;

        Ok(Observation {
            category,
            metric_a,
            metric_b,
        })
    }
}

fn required<'a>(record: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ValidationError> {
    match record.get(field) {
        None => Err(ValidationError {
            field: field.to_string(),
            problem: FieldProblem::Missing,
        }),
        Some(Value::Null) => Err(ValidationError {
            field: field.to_string(),
            problem: FieldProblem::Null,
        }),
        Some(value) => Ok(value),
    }
}

fn required_number(record: &Map<String, Value>, field: &str) -> Result<f64, ValidationError> {
    required(record, field)?
        .as_f64()
        .ok_or_else(|| wrong_type(field, "number"))
}

fn wrong_type(field: &str, expected: &'static str) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        problem: FieldProblem::WrongType { expected },
    }
}
