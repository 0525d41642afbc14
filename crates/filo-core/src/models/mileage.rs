use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::form::{self, FieldKind, FieldSpec, FormError, FormValues};
use super::record::{Record, Resource};
use super::{flexible_date, flexible_number};
use crate::utils::{any_contains, format_thousands};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MileageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "arac")]
    pub vehicle: i64,
    /// Read-only plate the server joins in
    #[serde(rename = "arac_plaka", default, skip_serializing)]
    pub vehicle_plate: Option<String>,
    #[serde(rename = "surucu_adi", default, skip_serializing)]
    pub driver_name: Option<String>,
    #[serde(rename = "kilometre", deserialize_with = "flexible_number::deserialize")]
    pub kilometers: f64,
    #[serde(rename = "tarih", default, with = "flexible_date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "aciklama", default)]
    pub notes: Option<String>,
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::required("arac", "Vehicle", FieldKind::VehicleRef),
    FieldSpec::required("kilometre", "Kilometers", FieldKind::Decimal),
    FieldSpec::required("tarih", "Date", FieldKind::Date),
    FieldSpec::optional("aciklama", "Notes", FieldKind::LongText),
];

impl Record for MileageRecord {
    const RESOURCE: Resource = Resource::MileageRecords;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn columns() -> &'static [&'static str] {
        &["Vehicle", "Driver", "Kilometers", "Date", "Notes"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.vehicle_plate
                .clone()
                .unwrap_or_else(|| format!("#{}", self.vehicle)),
            self.driver_name.clone().unwrap_or_default(),
            format!("{} km", format_thousands(self.kilometers)),
            form::date_value(self.date),
            self.notes.clone().unwrap_or_default(),
        ]
    }

    fn matches_search(&self, query: &str) -> bool {
        any_contains(
            &[
                self.vehicle_plate.as_deref().unwrap_or_default(),
                self.driver_name.as_deref().unwrap_or_default(),
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
            String::new(),
            form::date_value(Some(form::today())),
            String::new(),
        ]
    }

    fn to_form(&self) -> Vec<String> {
        vec![
            self.vehicle.to_string(),
            form::number_value(self.kilometers),
            form::date_value(self.date),
            self.notes.clone().unwrap_or_default(),
        ]
    }

    fn from_form(values: &[String], id: Option<i64>) -> Result<Self, FormError> {
        let form = FormValues::new(FIELDS, values)?;

        let vehicle = form
            .reference("arac")?
            .ok_or_else(|| FormError::new("Please select a vehicle"))?;
        let kilometers = form
            .decimal("kilometre")?
            .filter(|km| *km > 0.0)
            .ok_or_else(|| FormError::new("Kilometers must be greater than zero"))?;

        Ok(Self {
            id,
            vehicle,
            vehicle_plate: None,
            driver_name: None,
            kilometers,
            date: form.date("tarih")?,
            notes: form.optional_text("aciklama")?,
        })
    }
}
