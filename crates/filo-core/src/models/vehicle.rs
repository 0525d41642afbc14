use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::form::{self, Choice, FieldKind, FieldSpec, FormError, FormValues};
use super::record::{Record, Resource};
use crate::utils::any_contains;

/// Earliest model year the vehicle form accepts
const MIN_MODEL_YEAR: i64 = 1900;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ownership {
    #[default]
    #[serde(rename = "ozmal")]
    Owned,
    #[serde(rename = "kiralik")]
    Leased,
}

impl Ownership {
    pub const CHOICES: &'static [Choice] = &[
        Choice { value: "ozmal", label: "Owned" },
        Choice { value: "kiralik", label: "Leased" },
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Ownership::Owned => "ozmal",
            Ownership::Leased => "kiralik",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Ownership::Owned => "Owned",
            Ownership::Leased => "Leased",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "ozmal" => Some(Ownership::Owned),
            "kiralik" => Some(Ownership::Leased),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// Parked in the pool, free to assign
    #[default]
    #[serde(rename = "havuzda")]
    InPool,
    #[serde(rename = "kullanımda", alias = "kullanimda")]
    InUse,
}

impl VehicleStatus {
    pub const CHOICES: &'static [Choice] = &[
        Choice { value: "havuzda", label: "In pool" },
        Choice { value: "kullanımda", label: "In use" },
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::InPool => "havuzda",
            VehicleStatus::InUse => "kullanımda",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::InPool => "In pool",
            VehicleStatus::InUse => "In use",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "havuzda" => Some(VehicleStatus::InPool),
            "kullanımda" | "kullanimda" => Some(VehicleStatus::InUse),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "plaka")]
    pub plate: String,
    #[serde(rename = "marka", default)]
    pub make: String,
    #[serde(default)]
    pub model: String,
    #[serde(rename = "yil", default)]
    pub year: Option<i64>,
    #[serde(rename = "tip", default)]
    pub kind: String,
    #[serde(rename = "kaynak_tipi", default)]
    pub ownership: Ownership,
    #[serde(rename = "mevcut_durum", default)]
    pub status: VehicleStatus,
    #[serde(rename = "aciklama", default)]
    pub notes: Option<String>,
}

impl Vehicle {
    /// "Make Model", as shown in pickers
    pub fn make_model(&self) -> String {
        format!("{} {}", self.make, self.model).trim().to_string()
    }

    /// Short label for reference pickers: "34 ABC 123 - Ford Transit"
    pub fn display_name(&self) -> String {
        let make_model = self.make_model();
        if make_model.is_empty() {
            self.plate.clone()
        } else {
            format!("{} - {}", self.plate, make_model)
        }
    }
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::required("plaka", "Plate", FieldKind::UpperText),
    FieldSpec::required("marka", "Make", FieldKind::Text),
    FieldSpec::required("model", "Model", FieldKind::Text),
    FieldSpec::required("yil", "Year", FieldKind::Integer),
    FieldSpec::required("tip", "Type", FieldKind::Text),
    FieldSpec::required("kaynak_tipi", "Ownership", FieldKind::Choice(Ownership::CHOICES)),
    FieldSpec::required("mevcut_durum", "Status", FieldKind::Choice(VehicleStatus::CHOICES)),
    FieldSpec::optional("aciklama", "Notes", FieldKind::LongText),
];

impl Record for Vehicle {
    const RESOURCE: Resource = Resource::Vehicles;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn columns() -> &'static [&'static str] {
        &["Plate", "Make/Model", "Year", "Type", "Status"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.plate.clone(),
            self.make_model(),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            self.kind.clone(),
            self.status.label().to_string(),
        ]
    }

    fn matches_search(&self, query: &str) -> bool {
        any_contains(&[&self.plate, &self.make, &self.model, &self.kind], query)
    }

    fn form_fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn blank_form() -> Vec<String> {
        vec![
            String::new(),
            String::new(),
            String::new(),
            form::today().year().to_string(),
            String::new(),
            Ownership::Owned.as_str().to_string(),
            VehicleStatus::InPool.as_str().to_string(),
            String::new(),
        ]
    }

    fn to_form(&self) -> Vec<String> {
        vec![
            self.plate.clone(),
            self.make.clone(),
            self.model.clone(),
            self.year.map(|y| y.to_string()).unwrap_or_default(),
            self.kind.clone(),
            self.ownership.as_str().to_string(),
            self.status.as_str().to_string(),
            self.notes.clone().unwrap_or_default(),
        ]
    }

    fn from_form(values: &[String], id: Option<i64>) -> Result<Self, FormError> {
        let form = FormValues::new(FIELDS, values)?;

        let year = form
            .integer("yil")?
            .ok_or_else(|| FormError::new("Year is required"))?;
        let current_year = i64::from(form::today().year());
        if !(MIN_MODEL_YEAR..=current_year).contains(&year) {
            return Err(FormError::new(format!(
                "Year must be between {} and {}",
                MIN_MODEL_YEAR, current_year
            )));
        }

        Ok(Self {
            id,
            plate: form.text("plaka")?,
            make: form.text("marka")?,
            model: form.text("model")?,
            year: Some(year),
            kind: form.text("tip")?,
            ownership: Ownership::from_value(&form.choice("kaynak_tipi")?).unwrap_or_default(),
            status: VehicleStatus::from_value(&form.choice("mevcut_durum")?).unwrap_or_default(),
            notes: form.optional_text("aciklama")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vehicle_json() {
        let json = r#"{"id": 4, "plaka": "34 ABC 123", "marka": "Ford", "model": "Transit",
            "yil": 2019, "tip": "Panelvan", "kaynak_tipi": "kiralik",
            "mevcut_durum": "kullanımda", "aciklama": ""}"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        assert_eq!(vehicle.id, Some(4));
        assert_eq!(vehicle.ownership, Ownership::Leased);
        assert_eq!(vehicle.status, VehicleStatus::InUse);
        assert_eq!(vehicle.display_name(), "34 ABC 123 - Ford Transit");
        assert_eq!(vehicle.row()[4], "In use");
    }

    #[test]
    fn test_serializes_wire_names() {
        let vehicle = Vehicle::from_form(
            &[
                "06 xyz 42".into(),
                "Renault".into(),
                "Clio".into(),
                "2018".into(),
                "Binek".into(),
                "ozmal".into(),
                "havuzda".into(),
                String::new(),
            ],
            None,
        )
        .unwrap();
        let value = serde_json::to_value(&vehicle).unwrap();
        assert_eq!(value["plaka"], "06 XYZ 42");
        assert_eq!(value["yil"], 2018);
        assert_eq!(value["kaynak_tipi"], "ozmal");
        assert_eq!(value["mevcut_durum"], "havuzda");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_form_rejects_out_of_range_year() {
        let mut values = Vehicle::blank_form();
        values[0] = "34 AA 1".into();
        values[1] = "Fiat".into();
        values[2] = "Doblo".into();
        values[4] = "Kamyonet".into();
        values[3] = "1850".into();
        assert!(Vehicle::from_form(&values, None).is_err());

        values[3] = "2015".into();
        assert!(Vehicle::from_form(&values, None).is_ok());
    }

    #[test]
    fn test_search_matches_plate_and_make() {
        let vehicle = Vehicle::from_form(
            &[
                "34 ABC 123".into(),
                "Ford".into(),
                "Transit".into(),
                "2019".into(),
                "Panelvan".into(),
                "ozmal".into(),
                "havuzda".into(),
                String::new(),
            ],
            Some(1),
        )
        .unwrap();
        assert!(vehicle.matches_search("abc"));
        assert!(vehicle.matches_search("FORD"));
        assert!(!vehicle.matches_search("renault"));
    }

    #[test]
    fn test_round_trips_through_form() {
        let json = r#"{"id": 9, "plaka": "35 K 9", "marka": "Iveco", "model": "Daily",
            "yil": 2020, "tip": "Kamyon", "kaynak_tipi": "ozmal", "mevcut_durum": "havuzda",
            "aciklama": "Soğutuculu"}"#;
        let vehicle: Vehicle = serde_json::from_str(json).unwrap();
        let edited = Vehicle::from_form(&vehicle.to_form(), vehicle.id).unwrap();
        assert_eq!(edited, vehicle);
    }
}
