//! Static route table.
//!
//! Every path maps to exactly one view and carries its access rule. The
//! table is built once at startup and never mutated.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result, RouteErrorCode};
use crate::session::Role;

/// The single public entry path (login).
pub const LOGIN_PATH: &str = "/";

/// Views the dashboard can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Login,
    Overview,
    UserOverview,
    Siem,
    Soar,
    Xdr,
    Edr,
    Ueba,
    Ndr,
    ThreatIntel,
    FileScan,
    Notifications,
    PcPerformance,
    UsbLog,
    UserDirectory,
    Account,
}

/// Who may render a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected(BTreeSet<Role>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pattern: String,
    segments: Vec<Segment>,
    view: ViewKind,
    access: Access,
}

impl RouteDescriptor {
    pub fn public(pattern: &str, view: ViewKind) -> Self {
        Self::build(pattern, view, Access::Public)
    }

    pub fn protected(pattern: &str, view: ViewKind, roles: &[Role]) -> Self {
        Self::build(
            pattern,
            view,
            Access::Protected(roles.iter().copied().collect()),
        )
    }

    fn build(pattern: &str, view: ViewKind, access: Access) -> Self {
        let pattern = normalize(pattern);
        let segments = split(&pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self {
            pattern,
            segments,
            view,
            access,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn access(&self) -> &Access {
        &self.access
    }

    pub fn is_public(&self) -> bool {
        matches!(self.access, Access::Public)
    }

    /// Whether `role` may render this route. Public routes admit everyone.
    pub fn allows(&self, role: Role) -> bool {
        match &self.access {
            Access::Public => true,
            Access::Protected(roles) => roles.contains(&role),
        }
    }

    fn matches(&self, path_segments: &[&str]) -> Option<HashMap<String, String>> {
        if path_segments.len() != self.segments.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, actual) in self.segments.iter().zip(path_segments) {
            match segment {
                Segment::Literal(lit) if lit == actual => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    params.insert(name.clone(), actual.to_string());
                }
            }
        }
        Some(params)
    }
}

/// A resolved route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    /// Path parameters, e.g. `userId` for `/dashboard/user/:userId`.
    pub params: HashMap<String, String>,
    /// True when the match came from an ancestor of the requested path.
    pub via_ancestor: bool,
}

/// Immutable route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Builds a table. Protected routes must allow at least one role and
    /// patterns must be unique.
    pub fn new(routes: Vec<RouteDescriptor>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for route in &routes {
            if let Access::Protected(roles) = &route.access {
                if roles.is_empty() {
                    return Err(Error::route(
                        RouteErrorCode::EmptyAllowList,
                        format!("protected route {} allows no roles", route.pattern),
                    ));
                }
            }
            if !seen.insert(route.pattern.clone()) {
                return Err(Error::validation(format!(
                    "duplicate route pattern {}",
                    route.pattern
                )));
            }
        }
        Ok(Self { routes })
    }

    /// The dashboard's route surface: analyst views admit both roles, the
    /// admin console admits admins only.
    pub fn standard() -> Self {
        use Role::{Admin, User};
        use ViewKind::*;

        let analyst: &[Role] = &[User, Admin];
        let admin: &[Role] = &[Admin];

        let routes = vec![
            RouteDescriptor::public(LOGIN_PATH, Login),
            // Analyst views
            RouteDescriptor::protected("/dashboard", Overview, analyst),
            RouteDescriptor::protected("/siem", Siem, analyst),
            RouteDescriptor::protected("/analytics", Soar, analyst),
            RouteDescriptor::protected("/reports", Xdr, analyst),
            RouteDescriptor::protected("/customers", Edr, analyst),
            RouteDescriptor::protected("/verified-customers", Ueba, analyst),
            RouteDescriptor::protected("/new-customer", Ndr, analyst),
            RouteDescriptor::protected("/new-product", ThreatIntel, analyst),
            RouteDescriptor::protected("/inventory", FileScan, analyst),
            RouteDescriptor::protected("/notification", Notifications, analyst),
            RouteDescriptor::protected("/pcperformance", PcPerformance, analyst),
            RouteDescriptor::protected("/usb1", UsbLog, analyst),
            RouteDescriptor::protected("/account", Account, analyst),
            // Admin console
            RouteDescriptor::protected("/admindashboard", UserDirectory, admin),
            RouteDescriptor::protected("/dashboard/user/:userId", UserOverview, admin),
            RouteDescriptor::protected("/adminsiem", Siem, admin),
            RouteDescriptor::protected("/adminanalytics", Soar, admin),
            RouteDescriptor::protected("/adminreports", Xdr, admin),
            RouteDescriptor::protected("/admincustomers", Edr, admin),
            RouteDescriptor::protected("/adminverified-customers", Ueba, admin),
            RouteDescriptor::protected("/adminnew-customer", Ndr, admin),
            RouteDescriptor::protected("/adminnew-product", ThreatIntel, admin),
            RouteDescriptor::protected("/admininventory", FileScan, admin),
            RouteDescriptor::protected("/adminnotification", Notifications, admin),
            RouteDescriptor::protected("/adminpcperformance", PcPerformance, admin),
            RouteDescriptor::protected("/usb", UsbLog, admin),
            RouteDescriptor::protected("/adminaccount", Account, admin),
        ];

        Self { routes }
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// Resolves a request path.
    ///
    /// An exact (pattern) match wins. Otherwise the nearest ancestor path
    /// with a protected route is used; the public root is never an ancestor.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize(path);
        let segments: Vec<&str> = split(&path).collect();

        if let Some(found) = self.match_segments(&segments, false) {
            return Some(found);
        }

        for len in (1..segments.len()).rev() {
            if let Some(found) = self.match_segments(&segments[..len], true) {
                if !found.route.is_public() {
                    return Some(found);
                }
            }
        }
        None
    }

    fn match_segments(&self, segments: &[&str], via_ancestor: bool) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route.matches(segments).map(|params| RouteMatch {
                route,
                params,
                via_ancestor,
            })
        })
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Leading slash, no trailing slash (except the root), no query string.
fn normalize(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_matches('/');
    format!("/{}", trimmed)
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
