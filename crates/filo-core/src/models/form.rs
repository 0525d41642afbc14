//! Form field descriptions and value parsing shared by the record editors.
//!
//! Form values travel as strings (what the user typed or picked) and are
//! parsed into typed records by `Record::from_form`.

use chrono::NaiveDate;
use thiserror::Error;

/// Date format used on the wire and in forms
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FormError(pub String);

impl FormError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Free text forced to upper case (plates)
    UpperText,
    Integer,
    Decimal,
    Date,
    Flag,
    Choice(&'static [Choice]),
    /// Id of a vehicle picked from the loaded list
    VehicleRef,
    /// Id of a driver picked from the loaded list
    DriverRef,
    /// Multi-line notes
    LongText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind, required: true }
    }

    pub const fn optional(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { key, label, kind, required: false }
    }
}

/// Read-only view over submitted values, indexed like the record's fields.
pub struct FormValues<'a> {
    fields: &'static [FieldSpec],
    values: &'a [String],
}

impl<'a> FormValues<'a> {
    pub fn new(fields: &'static [FieldSpec], values: &'a [String]) -> Result<Self, FormError> {
        if fields.len() != values.len() {
            return Err(FormError::new(format!(
                "Expected {} form values, got {}",
                fields.len(),
                values.len()
            )));
        }
        Ok(Self { fields, values })
    }

    fn lookup(&self, key: &str) -> Result<(&'static FieldSpec, &str), FormError> {
        let idx = self
            .fields
            .iter()
            .position(|f| f.key == key)
            .ok_or_else(|| FormError::new(format!("Unknown form field: {}", key)))?;
        Ok((&self.fields[idx], self.values[idx].trim()))
    }

    /// Raw trimmed value; errors when a required field is blank.
    pub fn text(&self, key: &str) -> Result<String, FormError> {
        let (spec, value) = self.lookup(key)?;
        if spec.required && value.is_empty() {
            return Err(FormError::new(format!("{} is required", spec.label)));
        }
        Ok(match spec.kind {
            FieldKind::UpperText => value.to_uppercase(),
            _ => value.to_string(),
        })
    }

    pub fn optional_text(&self, key: &str) -> Result<Option<String>, FormError> {
        let value = self.text(key)?;
        Ok(if value.is_empty() { None } else { Some(value) })
    }

    pub fn integer(&self, key: &str) -> Result<Option<i64>, FormError> {
        let (spec, _) = self.lookup(key)?;
        match self.optional_text(key)? {
            None => Ok(None),
            Some(v) => v
                .parse::<i64>()
                .map(Some)
                .map_err(|_| FormError::new(format!("{} must be a whole number", spec.label))),
        }
    }

    pub fn decimal(&self, key: &str) -> Result<Option<f64>, FormError> {
        let (spec, _) = self.lookup(key)?;
        match self.optional_text(key)? {
            None => Ok(None),
            Some(v) => v
                .replace(',', ".")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| FormError::new(format!("{} must be a number", spec.label))),
        }
    }

    pub fn date(&self, key: &str) -> Result<Option<NaiveDate>, FormError> {
        let (spec, _) = self.lookup(key)?;
        match self.optional_text(key)? {
            None => Ok(None),
            Some(v) => NaiveDate::parse_from_str(&v, DATE_FORMAT)
                .map(Some)
                .map_err(|_| FormError::new(format!("{} must be a date (YYYY-MM-DD)", spec.label))),
        }
    }

    pub fn flag(&self, key: &str) -> Result<bool, FormError> {
        Ok(matches!(self.text(key)?.as_str(), "true" | "yes" | "1"))
    }

    /// Reference ids; a blank or zero value means "nothing selected".
    pub fn reference(&self, key: &str) -> Result<Option<i64>, FormError> {
        let (spec, value) = self.lookup(key)?;
        let id = if value.is_empty() {
            None
        } else {
            let id = value
                .parse::<i64>()
                .map_err(|_| FormError::new(format!("{} must be a whole number", spec.label)))?;
            Some(id).filter(|id| *id > 0)
        };
        if spec.required && id.is_none() {
            return Err(FormError::new(format!("Please select a {}", spec.label.to_lowercase())));
        }
        Ok(id)
    }

    /// Value of a choice field, checked against its options.
    pub fn choice(&self, key: &str) -> Result<String, FormError> {
        let (spec, _) = self.lookup(key)?;
        let value = self.text(key)?;
        match spec.kind {
            FieldKind::Choice(options) if !options.iter().any(|c| c.value == value) => Err(
                FormError::new(format!("{} has an unknown value: {}", spec.label, value)),
            ),
            _ => Ok(value),
        }
    }
}

/// Format a date for a form field
pub fn date_value(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string()).unwrap_or_default()
}

/// Today's date, the default for new dated records
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Format a number for a form field without a trailing `.0`
pub fn number_value(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &[Choice] = &[
        Choice { value: "a", label: "A" },
        Choice { value: "b", label: "B" },
    ];

    static FIELDS: &[FieldSpec] = &[
        FieldSpec::required("plate", "Plate", FieldKind::UpperText),
        FieldSpec::optional("year", "Year", FieldKind::Integer),
        FieldSpec::optional("amount", "Amount", FieldKind::Decimal),
        FieldSpec::optional("date", "Date", FieldKind::Date),
        FieldSpec::required("vehicle", "Vehicle", FieldKind::VehicleRef),
        FieldSpec::required("status", "Status", FieldKind::Choice(STATUS)),
    ];

    fn values(v: [&str; 6]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parses_typed_values() {
        let raw = values(["34 abc 123", "2020", "12,5", "2024-03-01", "7", "b"]);
        let form = FormValues::new(FIELDS, &raw).unwrap();
        assert_eq!(form.text("plate").unwrap(), "34 ABC 123");
        assert_eq!(form.integer("year").unwrap(), Some(2020));
        assert_eq!(form.decimal("amount").unwrap(), Some(12.5));
        assert_eq!(form.date("date").unwrap(), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(form.reference("vehicle").unwrap(), Some(7));
        assert_eq!(form.choice("status").unwrap(), "b");
    }

    #[test]
    fn test_reports_field_errors() {
        let raw = values(["", "abc", "x", "01/03/2024", "", "z"]);
        let form = FormValues::new(FIELDS, &raw).unwrap();
        assert_eq!(form.text("plate").unwrap_err().0, "Plate is required");
        assert!(form.integer("year").is_err());
        assert!(form.decimal("amount").is_err());
        assert!(form.date("date").is_err());
        assert_eq!(form.reference("vehicle").unwrap_err().0, "Please select a vehicle");
        assert!(form.choice("status").is_err());
    }

    #[test]
    fn test_rejects_mismatched_length() {
        let raw = vec!["only one".to_string()];
        assert!(FormValues::new(FIELDS, &raw).is_err());
    }

    #[test]
    fn test_number_value() {
        assert_eq!(number_value(150.0), "150");
        assert_eq!(number_value(12.75), "12.75");
    }
}
