use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::format_thousands;

/// Summary counters from `/api/dashboard/stats/`.
///
/// The backend decides which keys it reports, so the map is kept as-is and
/// rendered in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardStats(pub Map<String, Value>);

impl DashboardStats {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// (label, value) pairs ready for display
    pub fn entries(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| (humanize_key(key), display_value(value)))
            .collect()
    }
}

/// `toplam_arac` -> "Toplam arac"
fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(format_thousands).unwrap_or_else(|| n.to_string()),
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        other => other.to_string(),
    }
}

/// One line of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(alias = "aciklama", alias = "mesaj", alias = "message")]
    pub description: String,
    #[serde(default, alias = "tarih", alias = "zaman", alias = "created_at")]
    pub timestamp: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_entries() {
        let stats: DashboardStats = serde_json::from_str(
            r#"{"toplam_arac": 12, "aktif_surucu": 8, "aylik_harcama": 45250.5, "not": null}"#,
        )
        .unwrap();
        let entries = stats.entries();
        assert!(entries.contains(&("Toplam arac".to_string(), "12".to_string())));
        assert!(entries.contains(&("Aylik harcama".to_string(), "45,250.5".to_string())));
        assert!(entries.contains(&("Not".to_string(), "-".to_string())));
    }

    #[test]
    fn test_activity_aliases() {
        let activities: Vec<Activity> = serde_json::from_str(
            r#"[{"aciklama": "34 ABC 123 bakıma gönderildi", "tarih": "2024-03-01T10:00:00Z"},
                {"description": "Yakıt harcaması kaydedildi"}]"#,
        )
        .unwrap();
        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].timestamp.as_deref(), Some("2024-03-01T10:00:00Z"));
        assert_eq!(activities[1].timestamp, None);
    }
}
