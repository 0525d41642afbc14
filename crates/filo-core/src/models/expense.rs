use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::form::{self, Choice, FieldKind, FieldSpec, FormError, FormValues};
use super::record::{Record, Resource};
use super::{flexible_date, flexible_number};
use crate::utils::{any_contains, format_thousands};

/// Expense categories the backend accepts
pub const EXPENSE_KINDS: &[Choice] = &[
    Choice { value: "bakim", label: "Maintenance" },
    Choice { value: "kasko", label: "Insurance" },
    Choice { value: "yakıt", label: "Fuel" },
    Choice { value: "lastik", label: "Tires" },
    Choice { value: "tamir", label: "Repair" },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "arac")]
    pub vehicle: i64,
    #[serde(rename = "arac_plaka", default, skip_serializing)]
    pub vehicle_plate: Option<String>,
    #[serde(rename = "tarih", default, with = "flexible_date")]
    pub date: Option<NaiveDate>,
    /// Some server versions call this `kategori`
    #[serde(rename = "tip", alias = "kategori", default)]
    pub kind: String,
    #[serde(rename = "tutar", deserialize_with = "flexible_number::deserialize")]
    pub amount: f64,
    #[serde(rename = "aciklama", default)]
    pub notes: Option<String>,
}

impl Expense {
    /// Display label for the category; unknown values pass through
    pub fn kind_label(&self) -> &str {
        EXPENSE_KINDS
            .iter()
            .find(|c| c.value == self.kind)
            .map(|c| c.label)
            .unwrap_or(self.kind.as_str())
    }
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::required("arac", "Vehicle", FieldKind::VehicleRef),
    FieldSpec::required("tarih", "Date", FieldKind::Date),
    FieldSpec::required("tip", "Category", FieldKind::Choice(EXPENSE_KINDS)),
    FieldSpec::required("tutar", "Amount", FieldKind::Decimal),
    FieldSpec::optional("aciklama", "Notes", FieldKind::LongText),
];

impl Record for Expense {
    const RESOURCE: Resource = Resource::Expenses;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn columns() -> &'static [&'static str] {
        &["Vehicle", "Category", "Amount", "Date", "Notes"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.vehicle_plate
                .clone()
                .unwrap_or_else(|| format!("#{}", self.vehicle)),
            self.kind_label().to_string(),
            format!("₺{}", format_thousands(self.amount)),
            form::date_value(self.date),
            self.notes.clone().unwrap_or_default(),
        ]
    }

    fn matches_search(&self, query: &str) -> bool {
        any_contains(
            &[
                self.vehicle_plate.as_deref().unwrap_or_default(),
                &self.kind,
                self.kind_label(),
                self.notes.as_deref().unwrap_or_default(),
            ],
            query,
        )
    }

    fn form_fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn blank_form() -> Vec<String> {
        vec![
            String::new(),
            form::date_value(Some(form::today())),
            EXPENSE_KINDS[0].value.to_string(),
            String::new(),
            String::new(),
        ]
    }

    fn to_form(&self) -> Vec<String> {
        vec![
            self.vehicle.to_string(),
            form::date_value(self.date),
            self.kind.clone(),
            form::number_value(self.amount),
            self.notes.clone().unwrap_or_default(),
        ]
    }

    fn from_form(values: &[String], id: Option<i64>) -> Result<Self, FormError> {
        let form = FormValues::new(FIELDS, values)?;

        let vehicle = form
            .reference("arac")?
            .ok_or_else(|| FormError::new("Please select a vehicle"))?;
        let date = form.date("tarih")?;
        let amount = form
            .decimal("tutar")?
            .filter(|amount| *amount > 0.0)
            .ok_or_else(|| FormError::new("Amount must be greater than zero"))?;

        Ok(Self {
            id,
            vehicle,
            vehicle_plate: None,
            date,
            kind: form.choice("tip")?,
            amount,
            notes: form.optional_text("aciklama")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expense_with_category_alias() {
        let json = r#"{"id": 3, "arac": 4, "arac_plaka": "34 ABC 123", "tarih": "2024-02-10",
            "kategori": "yakıt", "tutar": "1250.50", "aciklama": "Tam depo"}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.kind, "yakıt");
        assert_eq!(expense.kind_label(), "Fuel");
        assert_eq!(expense.amount, 1250.5);
        assert_eq!(expense.row()[2], "₺1,250.5");
        assert!(expense.matches_search("fuel"));
        assert!(expense.matches_search("yakıt"));
    }

    #[test]
    fn test_unknown_category_label_passes_through() {
        let json = r#"{"arac": 1, "tip": "otopark", "tutar": 40}"#;
        let expense: Expense = serde_json::from_str(json).unwrap();
        assert_eq!(expense.kind_label(), "otopark");
        assert_eq!(expense.date, None);
    }

    #[test]
    fn test_form_validation() {
        let mut values = Expense::blank_form();
        values[3] = "150".into();
        assert_eq!(
            Expense::from_form(&values, None).unwrap_err().0,
            "Please select a vehicle"
        );

        values[0] = "4".into();
        values[3] = "-5".into();
        assert_eq!(
            Expense::from_form(&values, None).unwrap_err().0,
            "Amount must be greater than zero"
        );

        values[3] = "99,90".into();
        let expense = Expense::from_form(&values, Some(8)).unwrap();
        assert_eq!(expense.amount, 99.9);
        assert_eq!(expense.kind, "bakim");

        let value = serde_json::to_value(&expense).unwrap();
        assert_eq!(value["tip"], "bakim");
        assert_eq!(value["id"], 8);
    }

    #[test]
    fn test_form_requires_date() {
        let values = vec![
            "4".to_string(),
            String::new(),
            "kasko".into(),
            "3000".into(),
            String::new(),
        ];
        assert_eq!(
            Expense::from_form(&values, None).unwrap_err().0,
            "Date is required"
        );
    }
}
