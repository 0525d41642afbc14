use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use super::form::{FieldSpec, FormError};
use crate::auth::Route;

/// REST collections exposed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Vehicles,
    Drivers,
    Tasks,
    MileageRecords,
    Expenses,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Vehicles,
        Resource::Drivers,
        Resource::Tasks,
        Resource::MileageRecords,
        Resource::Expenses,
    ];

    /// Path segment under `/api/`
    pub fn segment(&self) -> &'static str {
        match self {
            Resource::Vehicles => "araclar",
            Resource::Drivers => "suruculer",
            Resource::Tasks => "gorevler",
            Resource::MileageRecords => "kilometreler",
            Resource::Expenses => "harcamalar",
        }
    }

    pub fn collection_path(&self) -> String {
        format!("/api/{}/", self.segment())
    }

    pub fn item_path(&self, id: i64) -> String {
        format!("/api/{}/{}/", self.segment(), id)
    }

    /// Singular name used in notifications ("Vehicle saved").
    pub fn noun(&self) -> &'static str {
        match self {
            Resource::Vehicles => "Vehicle",
            Resource::Drivers => "Driver",
            Resource::Tasks => "Task",
            Resource::MileageRecords => "Mileage record",
            Resource::Expenses => "Expense",
        }
    }

    /// Page that lists this resource.
    pub fn route(&self) -> Route {
        match self {
            Resource::Vehicles => Route::Vehicles,
            Resource::Drivers => Route::Drivers,
            Resource::Tasks => Route::Tasks,
            Resource::MileageRecords => Route::MileageRecords,
            Resource::Expenses => Route::Expenses,
        }
    }

    pub fn for_route(route: Route) -> Option<Self> {
        Resource::ALL.into_iter().find(|r| r.route() == route)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// A row of one of the REST collections, with its table and form glue.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const RESOURCE: Resource;

    /// Server id; `None` for a record that has not been created yet.
    fn id(&self) -> Option<i64>;

    /// Table column headers.
    fn columns() -> &'static [&'static str];

    /// Table cells, one per column.
    fn row(&self) -> Vec<String>;

    /// Case-insensitive substring match used by the page search box.
    fn matches_search(&self, query: &str) -> bool;

    fn form_fields() -> &'static [FieldSpec];

    /// Initial values for a new record.
    fn blank_form() -> Vec<String>;

    /// Current values for editing.
    fn to_form(&self) -> Vec<String>;

    /// Parse and validate submitted form values.
    fn from_form(values: &[String], id: Option<i64>) -> Result<Self, FormError>;
}

/// Records matching `query`; an empty query keeps everything.
pub fn filter_records<'a, R: Record>(records: &'a [R], query: &str) -> Vec<&'a R> {
    let query = query.trim();
    records
        .iter()
        .filter(|r| query.is_empty() || r.matches_search(query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_paths() {
        assert_eq!(Resource::Vehicles.collection_path(), "/api/araclar/");
        assert_eq!(Resource::MileageRecords.item_path(12), "/api/kilometreler/12/");
        assert_eq!(Resource::Expenses.item_path(3), "/api/harcamalar/3/");
    }

    #[test]
    fn test_resource_route_mapping() {
        for resource in Resource::ALL {
            assert_eq!(Resource::for_route(resource.route()), Some(resource));
        }
        assert_eq!(Resource::for_route(Route::Dashboard), None);
        assert_eq!(Resource::for_route(Route::Login), None);
    }
}
