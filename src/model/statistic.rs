use serde_json::{Map, Value};

use super::*;

pub const MAX_ID_LENGTH: usize = 1024;

/// An observation that has not been stored yet. The store assigns the key and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct NewStatistic {
    pub user_id: String,
    pub post_id: String,
    pub likes_count: i64,
}

impl NewStatistic {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, value) in [("user_id", &self.user_id), ("post_id", &self.post_id)] {
            if let Err(message) = check_identifier(value) {
                errors.add(field, message);
            }
        }

        if self.likes_count < 0 {
            errors.add("likes_count", "Ensure this value is greater than or equal to 0.");
        }

        errors.into_result(())
    }

    /// Parses a request body.
    ///
    /// Identifiers may be strings or numbers, counts may be integers or integer
    /// strings. camelCase keys are accepted when the snake_case key is absent.
    pub fn from_json(body: &Value) -> Result<Self, ValidationErrors> {
        let Value::Object(fields) = body else {
            return Err(ValidationErrors::single(
                "non_field_errors",
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    json_type_name(body)
                ),
            ));
        };

        let mut errors = ValidationErrors::new();

        let user_id = field(fields, "user_id", "userId")
            .and_then(parse_identifier)
            .map_err(|message| errors.add("user_id", message))
            .ok();

        let post_id = field(fields, "post_id", "postId")
            .and_then(parse_identifier)
            .map_err(|message| errors.add("post_id", message))
            .ok();

        let likes_count = field(fields, "likes_count", "likesCount")
            .and_then(parse_count)
            .map_err(|message| errors.add("likes_count", message))
            .ok();

        match (user_id, post_id, likes_count) {
            (Some(user_id), Some(post_id), Some(likes_count)) if errors.is_empty() => {
                Ok(Self::new(user_id, post_id, likes_count))
            }
            _ => Err(errors),
        }
    }
}

/// A stored observation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatisticRecord {
    pub record_key: String,
    pub user_id: String,
    pub post_id: String,
    pub likes_count: i64,
    pub created_at: Timestamp,
}

impl StatisticRecord {
    pub fn view(&self) -> StatisticView {
        StatisticView::from(self)
    }

    /// Whether `self` is more recent than `other`, breaking ties on the record key.
    pub fn is_newer_than(&self, other: &StatisticRecord) -> bool {
        (self.created_at, &self.record_key) > (other.created_at, &other.record_key)
    }
}

/// The public projection of a record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, new)]
pub struct StatisticView {
    pub user_id: String,
    pub post_id: String,
    pub likes_count: i64,
}

impl From<&StatisticRecord> for StatisticView {
    fn from(record: &StatisticRecord) -> Self {
        Self::new(
            record.user_id.clone(),
            record.post_id.clone(),
            record.likes_count,
        )
    }
}

impl From<StatisticRecord> for StatisticView {
    fn from(record: StatisticRecord) -> Self {
        Self::new(record.user_id, record.post_id, record.likes_count)
    }
}

fn field<'a>(fields: &'a Map<String, Value>, key: &str, alias: &str) -> Result<&'a Value, String> {
    fields
        .get(key)
        .or_else(|| fields.get(alias))
        .ok_or_else(|| "This field is required.".to_string())
}

fn parse_identifier(value: &Value) -> Result<String, String> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        Value::Null => return Err("This field may not be null.".to_string()),
        _ => return Err("Not a valid string.".to_string()),
    };

    check_identifier(&text)?;
    Ok(text)
}

fn check_identifier(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("This field may not be blank.".to_string());
    }

    if text.chars().count() > MAX_ID_LENGTH {
        return Err(format!(
            "Ensure this field has no more than {MAX_ID_LENGTH} characters."
        ));
    }

    Ok(())
}

fn parse_count(value: &Value) -> Result<i64, String> {
    const INVALID: &str = "A valid integer is required.";

    let count = match value {
        Value::Number(number) => match (number.as_i64(), number.as_u64(), number.as_f64()) {
            (Some(count), _, _) => i128::from(count),
            (None, Some(count), _) => i128::from(count),
            // saturating cast, out-of-range values are rejected below
            (None, None, Some(count)) if count.is_finite() && count.fract() == 0.0 => {
                count as i128
            }
            _ => return Err(INVALID.to_string()),
        },
        Value::String(text) => text.trim().parse::<i128>().map_err(|_| INVALID.to_string())?,
        Value::Null => return Err("This field may not be null.".to_string()),
        _ => return Err(INVALID.to_string()),
    };

    if count < 0 {
        return Err("Ensure this value is greater than or equal to 0.".to_string());
    }

    i64::try_from(count)
        .map_err(|_| format!("Ensure this value is less than or equal to {}.", i64::MAX))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
