use serde::{Deserialize, Serialize};

use super::form::{FieldKind, FieldSpec, FormError, FormValues};
use super::record::{Record, Resource};
use crate::utils::any_contains;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "ad")]
    pub first_name: String,
    #[serde(rename = "soyad", default)]
    pub last_name: String,
    /// Server-computed full name, read-only
    #[serde(rename = "ad_soyad", default, skip_serializing)]
    pub full_name: Option<String>,
    #[serde(rename = "telefon", default)]
    pub phone: String,
    #[serde(rename = "ehliyet_no", default)]
    pub license_number: String,
    #[serde(rename = "ehliyet_sinifi", default)]
    pub license_class: Option<String>,
    #[serde(rename = "aktif", default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Driver {
    /// Full name, preferring the server's value
    pub fn display_name(&self) -> String {
        match &self.full_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{} {}", self.first_name, self.last_name).trim().to_string(),
        }
    }
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::required("ad", "First name", FieldKind::Text),
    FieldSpec::required("soyad", "Last name", FieldKind::Text),
    FieldSpec::required("telefon", "Phone", FieldKind::Text),
    FieldSpec::required("ehliyet_no", "License no", FieldKind::Text),
    FieldSpec::optional("ehliyet_sinifi", "License class", FieldKind::Text),
    FieldSpec::optional("aktif", "Active", FieldKind::Flag),
];

impl Record for Driver {
    const RESOURCE: Resource = Resource::Drivers;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn columns() -> &'static [&'static str] {
        &["Name", "Phone", "License", "Class", "Active"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.display_name(),
            self.phone.clone(),
            self.license_number.clone(),
            self.license_class.clone().unwrap_or_default(),
            if self.active { "Yes" } else { "No" }.to_string(),
        ]
    }

    fn matches_search(&self, query: &str) -> bool {
        any_contains(
            &[
                &self.display_name(),
                &self.phone,
                &self.license_number,
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
            String::new(),
            String::new(),
            String::new(),
            "true".to_string(),
        ]
    }

    fn to_form(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.phone.clone(),
            self.license_number.clone(),
            self.license_class.clone().unwrap_or_default(),
            self.active.to_string(),
        ]
    }

    fn from_form(values: &[String], id: Option<i64>) -> Result<Self, FormError> {
        let form = FormValues::new(FIELDS, values)?;
        Ok(Self {
            id,
            first_name: form.text("ad")?,
            last_name: form.text("soyad")?,
            full_name: None,
            phone: form.text("telefon")?,
            license_number: form.text("ehliyet_no")?,
            license_class: form.optional_text("ehliyet_sinifi")?,
            active: form.flag("aktif")?,
        })
    }
}
