//! Loosely typed entity references.
//!
//! Clients may point at a student or a course by identifier, by email, by
//! course code or by name. [`Reference::classify`] decides which of those a
//! raw string is; callers then dispatch resolution per variant.

use uuid::Uuid;

/// Errors produced while reading a reference from client input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// The value is missing, empty, or only whitespace.
    #[error("{0} is required")]
    Missing(&'static str),
    /// The value is present but is not a string.
    #[error("invalid {0} format")]
    InvalidFormat(&'static str),
}

/// A classified reference.
///
/// Classification order is fixed: identifier, then email, then whole number,
/// then free text. The first variant that applies wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// A syntactically valid store identifier.
    Identifier(Uuid),
    /// Any string containing `@`.
    Email(String),
    /// A string that reads as a whole number: a signed integer, or a decimal
    /// or exponent form with no fractional part (`"7.0"`, `"1e1"`). `raw` keeps
    /// the trimmed input for name matching.
    Numeric { value: i64, raw: String },
    /// Anything else, trimmed.
    Text(String),
}

impl Reference {
    /// Classify a raw reference string.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceError::Missing` when the trimmed input is empty.
    /// `field` names the input in the error message.
    pub fn classify(raw: &str, field: &'static str) -> Result<Self, ReferenceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReferenceError::Missing(field));
        }

        if let Ok(id) = Uuid::parse_str(trimmed) {
            return Ok(Self::Identifier(id));
        }

        if trimmed.contains('@') {
            return Ok(Self::Email(trimmed.to_owned()));
        }

        if let Some(value) = whole_number(trimmed) {
            return Ok(Self::Numeric {
                value,
                raw: trimmed.to_owned(),
            });
        }

        Ok(Self::Text(trimmed.to_owned()))
    }

    /// Classify a reference taken from a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ReferenceError::Missing` for an absent, null or blank value and
    /// `ReferenceError::InvalidFormat` for any non-string value.
    pub fn from_json(
        value: Option<&serde_json::Value>,
        field: &'static str,
    ) -> Result<Self, ReferenceError> {
        match value {
            None | Some(serde_json::Value::Null) => Err(ReferenceError::Missing(field)),
            Some(serde_json::Value::String(s)) => Self::classify(s, field),
            Some(_) => Err(ReferenceError::InvalidFormat(field)),
        }
    }

    /// The text used for name matching.
    ///
    /// Numbers and emails fall back to their textual form so that a name
    /// lookup sees exactly what the client sent (trimmed).
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Identifier(id) => id.to_string(),
            Self::Email(s) | Self::Text(s) | Self::Numeric { raw: s, .. } => s.clone(),
        }
    }
}

/// Read `s` as a whole number.
///
/// Plain integers parse exactly. Otherwise a finite float with no fractional
/// part inside the `i64` range is accepted. Hex, octal and binary prefixes are
/// not.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_number(s: &str) -> Option<i64> {
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }

    let f = s.parse::<f64>().ok()?;
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    Some(f as i64)
}
