//! Application state management for Filo.
//!
//! This module contains the core `App` struct that manages all application state:
//! the current route, the loaded records, the login and record forms, and the
//! background task channel that API calls report back through.
//!
//! Every page change goes through `App::navigate`, which asks the route guard
//! first. A `SessionExpired` error from any background call clears the loaded
//! data and navigates to the login page.

use std::future::Future;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use filo_core::api::{ApiClient, ApiError};
use filo_core::auth::{Route, RouteGuard, SharedTokenStore};
use filo_core::config::Config;
use filo_core::models::{
    filter_records, Activity, DashboardStats, Driver, Expense, FieldKind, FieldSpec, MileageRecord,
    Record, Resource, Task, Vehicle,
};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for username input (the backend's username column limit).
const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for a single form field.
const MAX_FIELD_LENGTH: usize = 500;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

/// How long a notification stays in the status bar.
const TOAST_DURATION: Duration = Duration::from_secs(4);

pub const USERNAME_ENV: &str = "FILO_USERNAME";
pub const PASSWORD_ENV: &str = "FILO_PASSWORD";

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    EditingRecord,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Username,
    Password,
    Button,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Transient notification shown in the status bar.
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    created: Instant,
}

impl Toast {
    fn new(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            created: Instant::now(),
        }
    }

    fn is_expired(&self) -> bool {
        self.created.elapsed() >= TOAST_DURATION
    }
}

/// One table row as rendered: the record id plus its cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub id: Option<i64>,
    pub cells: Vec<String>,
}

fn rows_of<R: Record>(records: &[R], query: &str) -> Vec<RowView> {
    filter_records(records, query)
        .into_iter()
        .map(|r| RowView {
            id: r.id(),
            cells: r.row(),
        })
        .collect()
}

fn find_by_id<R: Record>(records: &[R], id: i64) -> Option<&R> {
    records.iter().find(|r| r.id() == Some(id))
}

/// Create/edit modal state.
#[derive(Debug, Clone)]
pub struct RecordForm {
    pub resource: Resource,
    pub id: Option<i64>,
    pub fields: &'static [FieldSpec],
    pub values: Vec<String>,
    pub focus: usize,
    pub error: Option<String>,
    pub saving: bool,
}

impl RecordForm {
    fn new<R: Record>(id: Option<i64>, values: Vec<String>) -> Self {
        Self {
            resource: R::RESOURCE,
            id,
            fields: R::form_fields(),
            values,
            focus: 0,
            error: None,
            saving: false,
        }
    }

    pub fn title(&self) -> String {
        match self.id {
            Some(_) => format!("Edit {}", self.resource.noun()),
            None => format!("New {}", self.resource.noun()),
        }
    }

    pub fn focused_field(&self) -> &FieldSpec {
        &self.fields[self.focus]
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    /// Fields the user types into (as opposed to picks or toggles)
    fn is_typed(kind: FieldKind) -> bool {
        !matches!(
            kind,
            FieldKind::Choice(_) | FieldKind::VehicleRef | FieldKind::DriverRef | FieldKind::Flag
        )
    }

    pub fn push_char(&mut self, c: char) {
        let kind = self.focused_field().kind;
        if !Self::is_typed(kind) {
            return;
        }
        let value = &mut self.values[self.focus];
        if can_add_field_char(value.chars().count(), c) {
            value.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if Self::is_typed(self.focused_field().kind) {
            self.values[self.focus].pop();
        }
    }

    pub fn toggle_flag(&mut self) {
        if self.focused_field().kind != FieldKind::Flag {
            return;
        }
        let value = &mut self.values[self.focus];
        *value = if value == "true" { "false" } else { "true" }.to_string();
    }

    /// Step the focused value through `options`, wrapping at either end.
    fn cycle_value(&mut self, options: &[String], forward: bool) {
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| *o == self.values[self.focus]);
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => options.len() - 1,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
        };
        self.values[self.focus] = options[next].clone();
    }
}

/// Record waiting for delete confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    pub resource: Resource,
    pub id: i64,
    pub label: String,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned API tasks back to the main loop.
enum BackgroundResult {
    Vehicles(Vec<Vehicle>),
    Drivers(Vec<Driver>),
    Tasks(Vec<Task>),
    MileageRecords(Vec<MileageRecord>),
    Expenses(Vec<Expense>),
    DashboardStats(DashboardStats),
    Activities(Vec<Activity>),
    Saved(Resource),
    Deleted(Resource),
    LoadFailed(ApiError),
    SaveFailed(ApiError),
    DeleteFailed(ApiError),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub guard: RouteGuard,
    /// Write config changes (last username) back to disk
    persist_config: bool,

    // UI state
    pub route: Route,
    pub state: AppState,
    pub search_query: String,
    pub selection: usize,
    pub form: Option<RecordForm>,
    pub pending_delete: Option<PendingDelete>,
    pub toast: Option<Toast>,
    /// Spawned API tasks that have not reported back yet
    pub in_flight: usize,

    // Login form state
    pub login_username: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Loaded data
    pub vehicles: Vec<Vehicle>,
    pub drivers: Vec<Driver>,
    pub tasks: Vec<Task>,
    pub mileage_records: Vec<MileageRecord>,
    pub expenses: Vec<Expense>,
    pub stats: DashboardStats,
    pub activities: Vec<Activity>,

    // Background task channel
    result_rx: mpsc::Receiver<BackgroundResult>,
    result_tx: mpsc::Sender<BackgroundResult>,
}

impl App {
    /// Create the application around an already opened token store.
    ///
    /// Starts on the login route; call `navigate` to enter the dashboard.
    pub fn new(config: Config, store: SharedTokenStore) -> Result<Self> {
        let api = ApiClient::new(&config, store.clone())?;
        let guard = RouteGuard::new(store);
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_username = preset_username(std::env::var(USERNAME_ENV).ok())
            .or_else(|| config.last_username.clone())
            .unwrap_or_default();
        let login_password = std::env::var(PASSWORD_ENV).unwrap_or_default();

        debug!(api_url = %config.base_url(), "App created");

        Ok(Self {
            config,
            api,
            guard,
            persist_config: true,

            route: Route::Login,
            state: AppState::Normal,
            search_query: String::new(),
            selection: 0,
            form: None,
            pending_delete: None,
            toast: None,
            in_flight: 0,

            login_username,
            login_password,
            login_focus: LoginFocus::Username,
            login_error: None,

            vehicles: Vec::new(),
            drivers: Vec::new(),
            tasks: Vec::new(),
            mileage_records: Vec::new(),
            expenses: Vec::new(),
            stats: DashboardStats::default(),
            activities: Vec::new(),

            result_rx: rx,
            result_tx: tx,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.api.store().has_session()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Go to `requested`, or wherever the route guard redirects it, and
    /// start loading that page's data.
    pub fn navigate(&mut self, requested: Route) {
        let target = self.guard.resolve(requested);
        if target != requested {
            info!(requested = %requested, redirect = %target, "Route guard redirected");
        }

        if target != self.route {
            debug!(from = %self.route, to = %target, "Navigating");
            self.route = target;
            self.selection = 0;
            self.search_query.clear();
        }
        self.state = AppState::Normal;
        self.form = None;
        self.pending_delete = None;

        if target == Route::Login {
            self.prepare_login();
        } else {
            self.load_page();
        }
    }

    pub fn next_page(&mut self) {
        self.navigate(self.route.next());
    }

    pub fn prev_page(&mut self) {
        self.navigate(self.route.prev());
    }

    /// Resource listed on the current page, if any
    pub fn current_resource(&self) -> Option<Resource> {
        Resource::for_route(self.route)
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    fn prepare_login(&mut self) {
        self.clear_data();
        self.login_focus = if self.login_username.is_empty() {
            LoginFocus::Username
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let username = self.login_username.trim().to_string();
        if username.is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Username and password required".to_string());
            return Err(anyhow::anyhow!("Username and password required"));
        }

        self.login_error = None;

        match self.api.login(&username, &self.login_password).await {
            Ok(()) => {
                self.remember_username(username);
                self.login_password.clear();
                info!("Login successful");
                self.navigate(Route::Dashboard);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.login_error = Some(login_error_message(&e));
                Err(e.into())
            }
        }
    }

    /// Interactive login (used for `filo --login`)
    pub async fn login_interactive(&mut self) -> Result<()> {
        println!("\n=== Filo Login ===\n");
        println!("Server: {}\n", self.config.base_url());

        let preset = preset_username(std::env::var(USERNAME_ENV).ok());
        let username = match (preset, self.config.last_username.clone()) {
            (Some(user), _) => {
                println!("Username: {}", user);
                user
            }
            (None, Some(last_user)) => {
                print!("Username [{}]: ", last_user);
                io::stdout().flush()?;
                let input = read_line()?;
                if input.is_empty() {
                    last_user
                } else {
                    input
                }
            }
            (None, None) => prompt_username()?,
        };
        let password = prompt_password()?;

        println!("\nAuthenticating...");
        self.api
            .login(&username, &password)
            .await
            .map_err(|e| anyhow::anyhow!(login_error_message(&e)))?;
        self.remember_username(username);

        println!("Login successful!\n");
        Ok(())
    }

    fn remember_username(&mut self, username: String) {
        if self.config.last_username.as_deref() == Some(username.as_str()) {
            return;
        }
        self.config.last_username = Some(username);
        if self.persist_config {
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    /// Drop the session and return to the login page
    pub fn logout(&mut self) {
        self.api.logout();
        self.show_toast(ToastKind::Success, "Logged out");
        self.navigate(Route::Login);
    }

    fn handle_session_expired(&mut self) {
        warn!("Session expired, returning to login");
        self.show_toast(ToastKind::Error, SESSION_EXPIRED_MESSAGE);
        self.navigate(Route::Login);
    }

    // =========================================================================
    // Data Loading
    // =========================================================================

    fn clear_data(&mut self) {
        self.vehicles.clear();
        self.drivers.clear();
        self.tasks.clear();
        self.mileage_records.clear();
        self.expenses.clear();
        self.stats = DashboardStats::default();
        self.activities.clear();
    }

    /// Fetch everything the current page shows, including the vehicle and
    /// driver lists its forms pick from.
    pub fn load_page(&mut self) {
        match self.route {
            Route::Login => {}
            Route::Dashboard => {
                self.spawn_task(
                    |api| async move {
                        api.fetch_dashboard_stats()
                            .await
                            .map(BackgroundResult::DashboardStats)
                    },
                    BackgroundResult::LoadFailed,
                );
                self.spawn_task(
                    |api| async move {
                        api.fetch_recent_activities()
                            .await
                            .map(BackgroundResult::Activities)
                    },
                    BackgroundResult::LoadFailed,
                );
            }
            Route::Vehicles => self.spawn_load(Resource::Vehicles),
            Route::Drivers => self.spawn_load(Resource::Drivers),
            Route::Tasks => {
                self.spawn_load(Resource::Tasks);
                self.spawn_load(Resource::Vehicles);
                self.spawn_load(Resource::Drivers);
            }
            Route::Expenses => {
                self.spawn_load(Resource::Expenses);
                self.spawn_load(Resource::Vehicles);
            }
            Route::MileageRecords => {
                self.spawn_load(Resource::MileageRecords);
                self.spawn_load(Resource::Vehicles);
            }
        }
    }

    fn spawn_load(&mut self, resource: Resource) {
        debug!(resource = %resource, "Loading records");
        match resource {
            Resource::Vehicles => self.spawn_task(
                |api| async move { api.list().await.map(BackgroundResult::Vehicles) },
                BackgroundResult::LoadFailed,
            ),
            Resource::Drivers => self.spawn_task(
                |api| async move { api.list().await.map(BackgroundResult::Drivers) },
                BackgroundResult::LoadFailed,
            ),
            Resource::Tasks => self.spawn_task(
                |api| async move { api.list().await.map(BackgroundResult::Tasks) },
                BackgroundResult::LoadFailed,
            ),
            Resource::MileageRecords => self.spawn_task(
                |api| async move { api.list().await.map(BackgroundResult::MileageRecords) },
                BackgroundResult::LoadFailed,
            ),
            Resource::Expenses => self.spawn_task(
                |api| async move { api.list().await.map(BackgroundResult::Expenses) },
                BackgroundResult::LoadFailed,
            ),
        }
    }

    /// Run an API call on a background task and report its outcome
    /// through the result channel.
    fn spawn_task<F, Fut>(&mut self, call: F, on_error: fn(ApiError) -> BackgroundResult)
    where
        F: FnOnce(ApiClient) -> Fut,
        Fut: Future<Output = Result<BackgroundResult, ApiError>> + Send + 'static,
    {
        let tx = self.result_tx.clone();
        let fut = call(self.api.clone());
        self.in_flight += 1;

        tokio::spawn(async move {
            let result = fut.await.unwrap_or_else(on_error);
            Self::send_result(&tx, result).await;
        });
    }

    /// Helper to send background results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<BackgroundResult>, result: BackgroundResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send background result - channel closed");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            self.process_result(result);
        }

        if self.toast.as_ref().is_some_and(Toast::is_expired) {
            self.toast = None;
        }
    }

    fn process_result(&mut self, result: BackgroundResult) {
        self.in_flight = self.in_flight.saturating_sub(1);

        // A late result from before a logout must neither repopulate the
        // tables nor trigger a reload without a session
        let is_failure = matches!(
            result,
            BackgroundResult::LoadFailed(_)
                | BackgroundResult::SaveFailed(_)
                | BackgroundResult::DeleteFailed(_)
        );
        if !is_failure && self.route == Route::Login {
            debug!("Dropping result that arrived after logout");
            return;
        }

        match result {
            BackgroundResult::Vehicles(data) => self.vehicles = data,
            BackgroundResult::Drivers(data) => self.drivers = data,
            BackgroundResult::Tasks(data) => self.tasks = data,
            BackgroundResult::MileageRecords(data) => self.mileage_records = data,
            BackgroundResult::Expenses(data) => self.expenses = data,
            BackgroundResult::DashboardStats(stats) => self.stats = stats,
            BackgroundResult::Activities(data) => self.activities = data,
            BackgroundResult::Saved(resource) => {
                info!(resource = %resource, "Record saved");
                self.form = None;
                if self.state == AppState::EditingRecord {
                    self.state = AppState::Normal;
                }
                self.show_toast(ToastKind::Success, format!("{} saved", resource.noun()));
                self.spawn_load(resource);
            }
            BackgroundResult::Deleted(resource) => {
                info!(resource = %resource, "Record deleted");
                self.show_toast(ToastKind::Success, format!("{} deleted", resource.noun()));
                self.spawn_load(resource);
            }
            BackgroundResult::SaveFailed(e) if !e.is_session_expired() => {
                warn!(error = %e, "Save failed");
                match self.form.as_mut() {
                    Some(form) => {
                        form.error = Some(e.user_message());
                        form.saving = false;
                    }
                    None => self.show_toast(ToastKind::Error, e.user_message()),
                }
            }
            BackgroundResult::LoadFailed(e)
            | BackgroundResult::SaveFailed(e)
            | BackgroundResult::DeleteFailed(e) => {
                if e.is_session_expired() {
                    if self.route != Route::Login {
                        self.handle_session_expired();
                    }
                } else {
                    error!(error = %e, "Request failed");
                    self.show_toast(ToastKind::Error, e.user_message());
                }
            }
        }
        self.clamp_selection();
    }

    pub fn show_toast(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.toast = Some(Toast::new(kind, message));
    }

    // =========================================================================
    // Tables
    // =========================================================================

    pub fn page_columns(&self) -> &'static [&'static str] {
        match self.current_resource() {
            Some(Resource::Vehicles) => Vehicle::columns(),
            Some(Resource::Drivers) => Driver::columns(),
            Some(Resource::Tasks) => Task::columns(),
            Some(Resource::MileageRecords) => MileageRecord::columns(),
            Some(Resource::Expenses) => Expense::columns(),
            None => &[],
        }
    }

    /// Rows of the current page after applying the search query
    pub fn page_rows(&self) -> Vec<RowView> {
        let query = self.search_query.as_str();
        match self.current_resource() {
            Some(Resource::Vehicles) => rows_of(&self.vehicles, query),
            Some(Resource::Drivers) => rows_of(&self.drivers, query),
            Some(Resource::Tasks) => rows_of(&self.tasks, query),
            Some(Resource::MileageRecords) => rows_of(&self.mileage_records, query),
            Some(Resource::Expenses) => rows_of(&self.expenses, query),
            None => Vec::new(),
        }
    }

    /// Total records on the current page, before filtering
    pub fn page_total(&self) -> usize {
        match self.current_resource() {
            Some(Resource::Vehicles) => self.vehicles.len(),
            Some(Resource::Drivers) => self.drivers.len(),
            Some(Resource::Tasks) => self.tasks.len(),
            Some(Resource::MileageRecords) => self.mileage_records.len(),
            Some(Resource::Expenses) => self.expenses.len(),
            None => 0,
        }
    }

    pub fn selected_row(&self) -> Option<RowView> {
        self.page_rows().into_iter().nth(self.selection)
    }

    /// Form fields and values of the selected record, for the detail panel
    pub fn selected_record_fields(&self) -> Option<(&'static [FieldSpec], Vec<String>)> {
        let id = self.selected_row()?.id?;
        match self.current_resource()? {
            Resource::Vehicles => {
                find_by_id(&self.vehicles, id).map(|r| (Vehicle::form_fields(), r.to_form()))
            }
            Resource::Drivers => {
                find_by_id(&self.drivers, id).map(|r| (Driver::form_fields(), r.to_form()))
            }
            Resource::Tasks => find_by_id(&self.tasks, id).map(|r| (Task::form_fields(), r.to_form())),
            Resource::MileageRecords => find_by_id(&self.mileage_records, id)
                .map(|r| (MileageRecord::form_fields(), r.to_form())),
            Resource::Expenses => {
                find_by_id(&self.expenses, id).map(|r| (Expense::form_fields(), r.to_form()))
            }
        }
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.page_rows().len();
        if len == 0 {
            self.selection = 0;
            return;
        }
        let next = self.selection as isize + delta;
        self.selection = next.clamp(0, len as isize - 1) as usize;
    }

    pub fn select_last(&mut self) {
        self.selection = self.page_rows().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.page_rows().len();
        if self.selection >= len {
            self.selection = len.saturating_sub(1);
        }
    }

    // =========================================================================
    // Record Forms
    // =========================================================================

    pub fn open_new_form(&mut self) {
        let form = match self.current_resource() {
            Some(Resource::Vehicles) => RecordForm::new::<Vehicle>(None, Vehicle::blank_form()),
            Some(Resource::Drivers) => RecordForm::new::<Driver>(None, Driver::blank_form()),
            Some(Resource::Tasks) => RecordForm::new::<Task>(None, Task::blank_form()),
            Some(Resource::MileageRecords) => {
                RecordForm::new::<MileageRecord>(None, MileageRecord::blank_form())
            }
            Some(Resource::Expenses) => RecordForm::new::<Expense>(None, Expense::blank_form()),
            None => return,
        };
        self.form = Some(form);
        self.state = AppState::EditingRecord;
    }

    pub fn open_edit_form(&mut self) {
        let Some(id) = self.selected_row().and_then(|row| row.id) else {
            return;
        };
        let form = match self.current_resource() {
            Some(Resource::Vehicles) => {
                find_by_id(&self.vehicles, id).map(|r| RecordForm::new::<Vehicle>(Some(id), r.to_form()))
            }
            Some(Resource::Drivers) => {
                find_by_id(&self.drivers, id).map(|r| RecordForm::new::<Driver>(Some(id), r.to_form()))
            }
            Some(Resource::Tasks) => {
                find_by_id(&self.tasks, id).map(|r| RecordForm::new::<Task>(Some(id), r.to_form()))
            }
            Some(Resource::MileageRecords) => find_by_id(&self.mileage_records, id)
                .map(|r| RecordForm::new::<MileageRecord>(Some(id), r.to_form())),
            Some(Resource::Expenses) => {
                find_by_id(&self.expenses, id).map(|r| RecordForm::new::<Expense>(Some(id), r.to_form()))
            }
            None => None,
        };
        if let Some(form) = form {
            self.form = Some(form);
            self.state = AppState::EditingRecord;
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    /// Options ←/→ cycle through for the focused field
    fn field_options(&self, kind: FieldKind) -> Vec<String> {
        match kind {
            FieldKind::Choice(choices) => choices.iter().map(|c| c.value.to_string()).collect(),
            FieldKind::VehicleRef => self
                .vehicles
                .iter()
                .filter_map(|v| v.id.map(|id| id.to_string()))
                .collect(),
            FieldKind::DriverRef => self
                .drivers
                .iter()
                .filter(|d| d.active)
                .filter_map(|d| d.id.map(|id| id.to_string()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn cycle_form_option(&mut self, forward: bool) {
        let Some(kind) = self.form.as_ref().map(|f| f.focused_field().kind) else {
            return;
        };
        let options = self.field_options(kind);
        if let Some(form) = self.form.as_mut() {
            form.cycle_value(&options, forward);
        }
    }

    /// Text shown for a form value: labels for choices, names for references
    pub fn form_display_value(&self, field: &FieldSpec, value: &str) -> String {
        let id = value.parse::<i64>().ok();
        match field.kind {
            FieldKind::Choice(choices) => choices
                .iter()
                .find(|c| c.value == value)
                .map(|c| c.label.to_string())
                .unwrap_or_else(|| value.to_string()),
            FieldKind::VehicleRef => id
                .and_then(|id| find_by_id(&self.vehicles, id))
                .map(Vehicle::display_name)
                .unwrap_or_else(|| "(select a vehicle)".to_string()),
            FieldKind::DriverRef => id
                .and_then(|id| find_by_id(&self.drivers, id))
                .map(Driver::display_name)
                .unwrap_or_else(|| "(select a driver)".to_string()),
            FieldKind::Flag => if value == "true" { "[x]" } else { "[ ]" }.to_string(),
            _ => value.to_string(),
        }
    }

    /// Validate the open form and send it to the server. Validation errors
    /// stay in the form.
    pub fn submit_form(&mut self) {
        let Some((resource, id, values)) = self
            .form
            .as_ref()
            .filter(|f| !f.saving)
            .map(|f| (f.resource, f.id, f.values.clone()))
        else {
            return;
        };

        let outcome = match resource {
            Resource::Vehicles => Vehicle::from_form(&values, id).map(|r| self.spawn_save(r, id)),
            Resource::Drivers => Driver::from_form(&values, id).map(|r| self.spawn_save(r, id)),
            Resource::Tasks => Task::from_form(&values, id).map(|r| self.spawn_save(r, id)),
            Resource::MileageRecords => {
                MileageRecord::from_form(&values, id).map(|r| self.spawn_save(r, id))
            }
            Resource::Expenses => Expense::from_form(&values, id).map(|r| self.spawn_save(r, id)),
        };

        if let Some(form) = self.form.as_mut() {
            match outcome {
                Ok(()) => {
                    form.saving = true;
                    form.error = None;
                }
                Err(e) => form.error = Some(e.to_string()),
            }
        }
    }

    fn spawn_save<R: Record>(&mut self, record: R, id: Option<i64>) {
        debug!(resource = %R::RESOURCE, ?id, "Saving record");
        self.spawn_task(
            move |api| async move {
                let saved = match id {
                    Some(id) => api.update(id, &record).await,
                    None => api.create(&record).await,
                };
                saved.map(|_| BackgroundResult::Saved(R::RESOURCE))
            },
            BackgroundResult::SaveFailed,
        );
    }

    // =========================================================================
    // Delete
    // =========================================================================

    pub fn request_delete(&mut self) {
        let Some(resource) = self.current_resource() else {
            return;
        };
        let Some(row) = self.selected_row() else {
            return;
        };
        let Some(id) = row.id else {
            return;
        };
        self.pending_delete = Some(PendingDelete {
            resource,
            id,
            label: row.cells.first().cloned().unwrap_or_default(),
        });
        self.state = AppState::ConfirmingDelete;
    }

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };
        let PendingDelete { resource, id, .. } = pending;
        self.spawn_task(
            move |api| async move {
                api.delete(resource, id)
                    .await
                    .map(|_| BackgroundResult::Deleted(resource))
            },
            BackgroundResult::DeleteFailed,
        );
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    /// Wait for the next background result and process it.
    #[cfg(test)]
    async fn process_next_result(&mut self) {
        let result = tokio::time::timeout(Duration::from_secs(5), self.result_rx.recv())
            .await
            .expect("timed out waiting for background result")
            .expect("result channel closed");
        self.process_result(result);
    }
}

/// Login failures in the words the login page shows
fn login_error_message(e: &ApiError) -> String {
    match e {
        ApiError::Unauthorized => "Invalid username or password".to_string(),
        ApiError::Validation { status, .. } if status.as_u16() == 400 => {
            "Invalid username or password".to_string()
        }
        other => other.user_message(),
    }
}

/// Username from the environment; a blank value counts as unset
fn preset_username(env_value: Option<String>) -> Option<String> {
    env_value
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
}

fn read_line() -> Result<String> {
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;
    read_line()
}

fn prompt_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a username character should be accepted
pub fn can_add_username_char(current_len: usize, c: char) -> bool {
    current_len < MAX_USERNAME_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
