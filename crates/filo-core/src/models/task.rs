use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::flexible_date;
use super::form::{self, Choice, FieldKind, FieldSpec, FormError, FormValues};
use super::record::{Record, Resource};
use crate::utils::any_contains;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "beklemede")]
    Pending,
    #[serde(rename = "devam_ediyor")]
    InProgress,
    #[serde(rename = "tamamlandi")]
    Completed,
    #[serde(rename = "iptal_edildi")]
    Cancelled,
}

impl TaskStatus {
    pub const CHOICES: &'static [Choice] = &[
        Choice { value: "beklemede", label: "Pending" },
        Choice { value: "devam_ediyor", label: "In progress" },
        Choice { value: "tamamlandi", label: "Completed" },
        Choice { value: "iptal_edildi", label: "Cancelled" },
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "beklemede",
            TaskStatus::InProgress => "devam_ediyor",
            TaskStatus::Completed => "tamamlandi",
            TaskStatus::Cancelled => "iptal_edildi",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::Cancelled => "Cancelled",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::CHOICES
            .iter()
            .position(|c| c.value == value)
            .map(|idx| [Self::Pending, Self::InProgress, Self::Completed, Self::Cancelled][idx])
    }

    /// Still open (pending or in progress)
    pub fn is_open(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "baslik")]
    pub title: String,
    #[serde(rename = "aciklama", default)]
    pub description: Option<String>,
    #[serde(rename = "arac", default)]
    pub vehicle: Option<i64>,
    #[serde(rename = "surucu", default)]
    pub driver: Option<i64>,
    #[serde(rename = "durum", default)]
    pub status: TaskStatus,
    #[serde(rename = "baslangic_tarihi", default, with = "flexible_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "bitis_tarihi", default, with = "flexible_date")]
    pub end_date: Option<NaiveDate>,
}

static FIELDS: &[FieldSpec] = &[
    FieldSpec::required("baslik", "Title", FieldKind::Text),
    FieldSpec::optional("aciklama", "Description", FieldKind::LongText),
    FieldSpec::required("arac", "Vehicle", FieldKind::VehicleRef),
    FieldSpec::required("surucu", "Driver", FieldKind::DriverRef),
    FieldSpec::required("durum", "Status", FieldKind::Choice(TaskStatus::CHOICES)),
    FieldSpec::required("baslangic_tarihi", "Start date", FieldKind::Date),
    FieldSpec::optional("bitis_tarihi", "End date", FieldKind::Date),
];

impl Record for Task {
    const RESOURCE: Resource = Resource::Tasks;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn columns() -> &'static [&'static str] {
        &["Title", "Status", "Start", "End"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.status.label().to_string(),
            form::date_value(self.start_date),
            form::date_value(self.end_date),
        ]
    }

    fn matches_search(&self, query: &str) -> bool {
        any_contains(
            &[
                &self.title,
                self.description.as_deref().unwrap_or_default(),
                self.status.label(),
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
            TaskStatus::Pending.as_str().to_string(),
            form::date_value(Some(form::today())),
            String::new(),
        ]
    }

    fn to_form(&self) -> Vec<String> {
        vec![
            self.title.clone(),
            self.description.clone().unwrap_or_default(),
            self.vehicle.map(|id| id.to_string()).unwrap_or_default(),
            self.driver.map(|id| id.to_string()).unwrap_or_default(),
            self.status.as_str().to_string(),
            form::date_value(self.start_date),
            form::date_value(self.end_date),
        ]
    }

    fn from_form(values: &[String], id: Option<i64>) -> Result<Self, FormError> {
        let form = FormValues::new(FIELDS, values)?;

        let start_date = form.date("baslangic_tarihi")?;
        let end_date = form.date("bitis_tarihi")?;
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(FormError::new("End date cannot be before start date"));
            }
        }

        Ok(Self {
            id,
            title: form.text("baslik")?,
            description: form.optional_text("aciklama")?,
            vehicle: form.reference("arac")?,
            driver: form.reference("surucu")?,
            status: TaskStatus::from_value(&form.choice("durum")?).unwrap_or_default(),
            start_date,
            end_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> Vec<String> {
        vec![
            "Ankara teslimat".into(),
            String::new(),
            "4".into(),
            "2".into(),
            "devam_ediyor".into(),
            "2024-05-01".into(),
            "2024-05-03".into(),
        ]
    }

    #[test]
    fn test_parse_task_json() {
        let json = r#"{"id": 7, "baslik": "Depo transferi", "aciklama": null, "arac": 4,
            "surucu": 2, "durum": "tamamlandi", "baslangic_tarihi": "2024-05-01T08:00:00Z",
            "bitis_tarihi": null}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.start_date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(task.end_date, None);
        assert!(!task.status.is_open());
    }

    #[test]
    fn test_serializes_dates_as_plain_dates() {
        let task = Task::from_form(&filled_form(), None).unwrap();
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["baslangic_tarihi"], "2024-05-01");
        assert_eq!(value["durum"], "devam_ediyor");
        assert_eq!(value["arac"], 4);
    }

    #[test]
    fn test_form_rejects_end_before_start() {
        let mut values = filled_form();
        values[6] = "2024-04-30".into();
        let err = Task::from_form(&values, None).unwrap_err();
        assert_eq!(err.0, "End date cannot be before start date");
    }

    #[test]
    fn test_form_requires_vehicle_and_driver() {
        let mut values = filled_form();
        values[2] = String::new();
        assert_eq!(Task::from_form(&values, None).unwrap_err().0, "Please select a vehicle");

        let mut values = filled_form();
        values[3] = "0".into();
        assert_eq!(Task::from_form(&values, None).unwrap_err().0, "Please select a driver");
    }

    #[test]
    fn test_status_from_value() {
        for choice in TaskStatus::CHOICES {
            let status = TaskStatus::from_value(choice.value).unwrap();
            assert_eq!(status.as_str(), choice.value);
            assert_eq!(status.label(), choice.label);
        }
        assert_eq!(TaskStatus::from_value("bogus"), None);
    }
}
