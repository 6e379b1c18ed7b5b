//! Per-view data requirements and view-model builders.
//!
//! Each view names the API resources it needs and folds the fetched
//! records into a [`ViewModel`]. Builders are pure: the same records and
//! params always bind to the same model, so a page change rebinds without
//! re-fetching.

mod admin;
mod detection;
mod hosts;
mod network;
mod operations;

pub use admin::unread_count;

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::binding::ViewModel;
use crate::pagination::{Paginator, DEFAULT_PAGE_SIZE};
use crate::record::Record;
use crate::routes::ViewKind;
use crate::session::Session;

/// Remote API collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Alerts,
    Incidents,
    IpAnalysis,
    EdrAlerts,
    EdrEndpoints,
    EdrAnalystLogs,
    FileLog,
    NetworkLogs,
    NetworkAlerts,
    AnalystLogs,
    CaseTimeline,
    CollaborationLog,
    ResponseActions,
    Threats,
    TiFeed,
    UserActivity,
    CloudAlerts,
    XdrEndpoints,
    UsbLog,
    ProcessLog,
    Users,
    Notifications,
    /// The signed-in user's own record.
    Account,
}

impl Resource {
    /// Path relative to the API base address.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Alerts => "alerts",
            Self::Incidents => "incident",
            Self::IpAnalysis => "ip_analysis",
            Self::EdrAlerts => "edr_alerts",
            Self::EdrEndpoints => "edr_endpoints",
            Self::EdrAnalystLogs => "edr_analyst_logs",
            Self::FileLog => "filelog",
            Self::NetworkLogs => "network_logs",
            Self::NetworkAlerts => "network_alerts_xdr",
            Self::AnalystLogs => "analyst_logs",
            Self::CaseTimeline => "case_timeline_soar",
            Self::CollaborationLog => "collaboration_log_soar",
            Self::ResponseActions => "response_action_log_soar",
            Self::Threats => "threats_xdr",
            Self::TiFeed => "ti_feed_soar",
            Self::UserActivity => "user_activity",
            Self::CloudAlerts => "cloud_alerts_xdr",
            Self::XdrEndpoints => "endpoints_xdr",
            Self::UsbLog => "USBLog",
            Self::ProcessLog => "ProcessLog1",
            Self::Users => "users/all-users",
            Self::Notifications => "notifications",
            Self::Account => "users/:id",
        }
    }

    /// Concrete request path for `session`. `Account` names the session
    /// user's record and has no path without a session.
    pub fn path_for(&self, session: Option<&Session>) -> Option<String> {
        match self {
            Self::Account => session.map(|s| format!("users/{}", s.user().id)),
            other => Some(other.path().to_string()),
        }
    }

    /// Whether the API answers with one object instead of an array.
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Account)
    }
}

/// Records fetched for one view, keyed by resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSet {
    records: HashMap<Resource, Vec<Record>>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource: Resource, records: Vec<Record>) {
        self.records.insert(resource, records);
    }

    pub fn with(mut self, resource: Resource, records: Vec<Record>) -> Self {
        self.insert(resource, records);
        self
    }

    /// Records of a resource; empty if it was not fetched.
    pub fn get(&self, resource: Resource) -> &[Record] {
        self.records.get(&resource).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, resource: Resource) -> bool {
        self.records.contains_key(&resource)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sort direction for sortable tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Per-render parameters: pagination, table search/sort, path params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(skip)]
    pub path_params: HashMap<String, String>,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            search: None,
            sort: None,
            order: SortOrder::default(),
            path_params: HashMap::new(),
        }
    }
}

impl ViewParams {
    pub fn paginator(&self) -> Paginator {
        Paginator::with_size(self.page_size).at_page(self.page)
    }

    pub fn at_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Lowercased, trimmed search needle; `None` when blank.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Resources a view fetches on mount.
pub fn resources_for(view: ViewKind) -> &'static [Resource] {
    use Resource::*;
    match view {
        ViewKind::Login => &[],
        ViewKind::Overview | ViewKind::UserOverview => &[
            Alerts,
            IpAnalysis,
            EdrAlerts,
            EdrEndpoints,
            EdrAnalystLogs,
            FileLog,
            NetworkLogs,
            NetworkAlerts,
            Incidents,
            AnalystLogs,
            CaseTimeline,
            CollaborationLog,
            ResponseActions,
            Threats,
            TiFeed,
            UserActivity,
            CloudAlerts,
            XdrEndpoints,
        ],
        ViewKind::Siem => &[Alerts, Incidents, IpAnalysis],
        ViewKind::Soar => &[Alerts, AnalystLogs, ResponseActions, CaseTimeline, CollaborationLog],
        ViewKind::Xdr => &[CloudAlerts, NetworkAlerts, Threats, XdrEndpoints, TiFeed],
        ViewKind::Edr => &[EdrAlerts, EdrEndpoints, EdrAnalystLogs],
        ViewKind::Ueba => &[UserActivity],
        ViewKind::Ndr => &[NetworkLogs, NetworkAlerts, IpAnalysis],
        ViewKind::ThreatIntel => &[Threats, NetworkLogs, TiFeed],
        ViewKind::FileScan => &[FileLog],
        ViewKind::Notifications => &[Notifications],
        ViewKind::PcPerformance => &[ProcessLog],
        ViewKind::UsbLog => &[UsbLog],
        ViewKind::UserDirectory => &[Users],
        ViewKind::Account => &[Account],
    }
}

/// Binds fetched records to the model of `view`.
pub fn build(view: ViewKind, data: &ResourceSet, params: &ViewParams) -> ViewModel {
    match view {
        ViewKind::Login => ViewModel::new("Login"),
        ViewKind::Overview => operations::overview(data, None),
        ViewKind::UserOverview => {
            let user_id = params.path_params.get("userId").map(String::as_str);
            operations::overview(data, user_id)
        }
        ViewKind::Siem => operations::siem(data),
        ViewKind::Soar => operations::soar(data),
        ViewKind::Xdr => detection::xdr(data),
        ViewKind::Edr => detection::edr(data),
        ViewKind::Ueba => network::ueba(data, params),
        ViewKind::Ndr => network::ndr(data),
        ViewKind::ThreatIntel => network::threat_intel(data),
        ViewKind::FileScan => hosts::file_scan(data, params),
        ViewKind::Notifications => admin::notifications(data),
        ViewKind::PcPerformance => hosts::pc_performance(data, params),
        ViewKind::UsbLog => hosts::usb_log(data, params),
        ViewKind::UserDirectory => admin::user_directory(data, params),
        ViewKind::Account => admin::account(data),
    }
}

/// Sort key of one field value. Every number orders before every text
/// value, so mixed columns still sort under a total order.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(record: &Record, field: &str) -> Option<Self> {
        match record.number(field) {
            Some(n) => Some(Self::Number(n)),
            None => record.text(field).map(Self::Text),
        }
    }

    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

/// Sorts records by a field in `order`. Records without the field always
/// go last.
pub(crate) fn sort_records(records: &mut [Record], field: &str, order: SortOrder) {
    records.sort_by_cached_key(|r| SortSlot(SortKey::of(r, field), order));
}

/// `sort_by_cached_key` wrapper applying the direction to present keys only.
struct SortSlot(Option<SortKey>, SortOrder);

impl PartialEq for SortSlot {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortSlot {}

impl PartialOrd for SortSlot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortSlot {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Some(x), Some(y)) => match self.1 {
                SortOrder::Asc => x.cmp(y),
                SortOrder::Desc => x.cmp(y).reverse(),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// First `n` records, for "latest" tables.
pub(crate) fn head(records: &[Record], n: usize) -> &[Record] {
    &records[..records.len().min(n)]
}
