//! Route guard: decides whether a page may render given session presence.

use std::fmt;

use tracing::debug;

use super::store::SharedTokenStore;

/// Pages of the dashboard, keyed by their route path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Dashboard,
    Login,
    Vehicles,
    Drivers,
    Tasks,
    Expenses,
    MileageRecords,
}

impl Route {
    pub const LOGIN_PATH: &'static str = "/login";
    pub const LANDING_PATH: &'static str = "/";

    /// Protected pages in navigation order.
    pub const PAGES: [Route; 6] = [
        Route::Dashboard,
        Route::Vehicles,
        Route::Drivers,
        Route::Tasks,
        Route::Expenses,
        Route::MileageRecords,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Login => "/login",
            Route::Vehicles => "/araclar",
            Route::Drivers => "/suruculer",
            Route::Tasks => "/gorevler",
            Route::Expenses => "/harcamalar",
            Route::MileageRecords => "/kilometre-kayitlari",
        }
    }

    /// Resolve a path to a known page. Query strings and a trailing slash
    /// are ignored.
    pub fn from_path(path: &str) -> Option<Self> {
        let normalized = normalize_path(path);
        [Route::Login]
            .iter()
            .chain(Route::PAGES.iter())
            .copied()
            .find(|r| r.path() == normalized)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Login => "Login",
            Route::Vehicles => "Vehicles",
            Route::Drivers => "Drivers",
            Route::Tasks => "Tasks",
            Route::Expenses => "Expenses",
            Route::MileageRecords => "Mileage",
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }

    /// Next protected page, wrapping around.
    pub fn next(&self) -> Self {
        let idx = self.page_index();
        Route::PAGES[(idx + 1) % Route::PAGES.len()]
    }

    /// Previous protected page, wrapping around.
    pub fn prev(&self) -> Self {
        let idx = self.page_index();
        Route::PAGES[(idx + Route::PAGES.len() - 1) % Route::PAGES.len()]
    }

    fn page_index(&self) -> usize {
        Route::PAGES.iter().position(|r| r == self).unwrap_or(0)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

fn normalize_path(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(&'static str),
}

impl GuardDecision {
    /// Route the caller should end up on after requesting `requested`.
    pub fn resolve(&self, requested: Route) -> Route {
        match self {
            GuardDecision::Allow => requested,
            GuardDecision::Redirect(path) => Route::from_path(path).unwrap_or(Route::Login),
        }
    }
}

/// Decide whether `path` may render. Every path except the login page is
/// protected, including paths no page is registered for.
pub fn evaluate(path: &str, has_session: bool) -> GuardDecision {
    let is_login = normalize_path(path) == Route::LOGIN_PATH;
    match (has_session, is_login) {
        (false, false) => GuardDecision::Redirect(Route::LOGIN_PATH),
        (true, true) => GuardDecision::Redirect(Route::LANDING_PATH),
        _ => GuardDecision::Allow,
    }
}

/// Guard bound to a token store.
#[derive(Clone)]
pub struct RouteGuard {
    store: SharedTokenStore,
}

impl RouteGuard {
    pub fn new(store: SharedTokenStore) -> Self {
        Self { store }
    }

    pub fn check_path(&self, path: &str) -> GuardDecision {
        let decision = evaluate(path, self.store.has_session());
        debug!(path, ?decision, "Route guard evaluated");
        decision
    }

    pub fn check(&self, route: Route) -> GuardDecision {
        self.check_path(route.path())
    }

    /// The route to actually show when `requested` is asked for.
    pub fn resolve(&self, requested: Route) -> Route {
        self.check(requested).resolve(requested)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::{MemoryTokenStore, Session, TokenStore};

    #[test]
    fn test_evaluate_without_session() {
        assert_eq!(evaluate("/araclar", false), GuardDecision::Redirect("/login"));
        assert_eq!(evaluate("/", false), GuardDecision::Redirect("/login"));
        assert_eq!(evaluate("/login", false), GuardDecision::Allow);
        // Unknown pages are still protected
        assert_eq!(evaluate("/nowhere", false), GuardDecision::Redirect("/login"));
    }

    #[test]
    fn test_evaluate_with_session() {
        assert_eq!(evaluate("/login", true), GuardDecision::Redirect("/"));
        assert_eq!(evaluate("/login/", true), GuardDecision::Redirect("/"));
        assert_eq!(evaluate("/gorevler", true), GuardDecision::Allow);
        assert_eq!(evaluate("/", true), GuardDecision::Allow);
    }

    #[test]
    fn test_route_from_path() {
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/araclar/"), Some(Route::Vehicles));
        assert_eq!(Route::from_path("/harcamalar?q=yakit"), Some(Route::Expenses));
        assert_eq!(Route::from_path("/kilometre-kayitlari"), Some(Route::MileageRecords));
        assert_eq!(Route::from_path("/login"), Some(Route::Login));
        assert_eq!(Route::from_path("/unknown"), None);
    }

    #[test]
    fn test_route_paths_round_trip() {
        for route in Route::PAGES.iter().chain([Route::Login].iter()) {
            assert_eq!(Route::from_path(route.path()), Some(*route));
        }
    }

    #[test]
    fn test_route_next_prev_wrap() {
        assert_eq!(Route::Dashboard.next(), Route::Vehicles);
        assert_eq!(Route::MileageRecords.next(), Route::Dashboard);
        assert_eq!(Route::Dashboard.prev(), Route::MileageRecords);
        assert_eq!(Route::Drivers.prev(), Route::Vehicles);
    }

    #[test]
    fn test_guard_follows_store() {
        let store = Arc::new(MemoryTokenStore::new());
        let guard = RouteGuard::new(store.clone());

        assert_eq!(guard.resolve(Route::Vehicles), Route::Login);
        assert_eq!(guard.resolve(Route::Login), Route::Login);

        store.set(Session::new("T1", "R1"));
        assert_eq!(guard.resolve(Route::Vehicles), Route::Vehicles);
        assert_eq!(guard.resolve(Route::Login), Route::Dashboard);

        store.clear();
        assert_eq!(guard.check(Route::Tasks), GuardDecision::Redirect("/login"));
    }
}
