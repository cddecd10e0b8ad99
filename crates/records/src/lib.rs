//! Report listing: filter state, the query over an in-memory report set, and
//! the sources that supply that set.

use shared::domain::Report;
use tracing::debug;

pub mod source;
pub mod summary;

pub use source::{ChainedRecordSource, JsonFileRecordSource, RecordSource, StaticRecordSource};
pub use summary::ReportSummary;

/// Sentinel meaning "no constraint" for the status and category dimensions.
pub const ALL: &str = "all";

pub const STATUS_OPTIONS: [(&str, &str); 4] = [
    (ALL, "All Status"),
    ("completed", "Completed"),
    ("underreview", "Under Review"),
    ("draft", "Draft"),
];

pub const CATEGORY_OPTIONS: [(&str, &str); 4] = [
    (ALL, "All Types"),
    ("ct", "CT Scan"),
    ("mri", "MRI"),
    ("xray", "X-Ray"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub status: String,
    pub category: String,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: ALL.to_string(),
            category: ALL.to_string(),
        }
    }
}

impl FilterState {
    /// Resets every dimension to its sentinel.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_unconstrained(&self) -> bool {
        self.search.is_empty() && is_all(&self.status) && is_all(&self.category)
    }

    pub fn matches(&self, report: &Report) -> bool {
        matches_search(report, &self.search)
            && matches_status(report, &self.status)
            && matches_category(report, &self.category)
    }
}

/// Whether `value` selects one of [`STATUS_OPTIONS`]; labels such as
/// "Under Review" are accepted alongside their keys.
pub fn is_status_option(value: &str) -> bool {
    let wanted = normalize_status(value);
    is_all(value) || STATUS_OPTIONS.iter().any(|(key, _)| *key == wanted)
}

pub fn is_category_option(value: &str) -> bool {
    let wanted = value.trim().to_lowercase();
    is_all(value) || CATEGORY_OPTIONS.iter().any(|(key, _)| *key == wanted)
}

/// Comma-separated option keys, for error messages.
pub fn option_keys(options: &[(&str, &str)]) -> String {
    options
        .iter()
        .map(|(key, _)| *key)
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_all(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case(ALL)
}

fn matches_search(report: &Report, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    report.patient_name.to_lowercase().contains(&needle)
        || report.patient_id.as_str().to_lowercase().contains(&needle)
        || report.scan_type.to_lowercase().contains(&needle)
}

fn matches_status(report: &Report, status: &str) -> bool {
    is_all(status) || normalize_status(report.status.label()) == normalize_status(status)
}

fn matches_category(report: &Report, category: &str) -> bool {
    is_all(category)
        || report
            .scan_type
            .to_lowercase()
            .contains(&category.to_lowercase())
}

/// Lowercases and drops all whitespace, so "Under Review" equals "underreview".
fn normalize_status(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Reports passing every predicate, in their original order.
pub fn filter_reports<'a>(reports: &'a [Report], filters: &FilterState) -> Vec<&'a Report> {
    reports.iter().filter(|r| filters.matches(r)).collect()
}

#[derive(Debug, PartialEq, Eq)]
pub enum QueryOutcome<'a> {
    Matches(Vec<&'a Report>),
    /// Nothing matched; the listing should offer to clear filters.
    Empty,
}

impl<'a> QueryOutcome<'a> {
    pub fn reports(&self) -> &[&'a Report] {
        match self {
            Self::Matches(reports) => reports,
            Self::Empty => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

pub fn query<'a>(reports: &'a [Report], filters: &FilterState) -> QueryOutcome<'a> {
    let visible = filter_reports(reports, filters);
    if visible.is_empty() {
        QueryOutcome::Empty
    } else {
        QueryOutcome::Matches(visible)
    }
}

/// Reports page session: the loaded collection plus the current filters.
///
/// Nothing derived is cached; every read recomputes from the two inputs.
#[derive(Debug, Clone, Default)]
pub struct ReportBoard {
    reports: Vec<Report>,
    filters: FilterState,
}

impl ReportBoard {
    pub fn new(reports: Vec<Report>) -> Self {
        Self {
            reports,
            filters: FilterState::default(),
        }
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filters.search = search.into();
        debug!(search = %self.filters.search, "report search changed");
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.filters.status = status.into();
        debug!(status = %self.filters.status, "report status filter changed");
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.filters.category = category.into();
        debug!(category = %self.filters.category, "report category filter changed");
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        debug!("report filters cleared");
    }

    pub fn replace_records(&mut self, reports: Vec<Report>) {
        debug!(count = reports.len(), "report collection replaced");
        self.reports = reports;
    }

    pub fn extend_records(&mut self, reports: impl IntoIterator<Item = Report>) {
        let before = self.reports.len();
        self.reports.extend(reports);
        debug!(added = self.reports.len() - before, "report collection extended");
    }

    pub fn visible(&self) -> Vec<&Report> {
        filter_reports(&self.reports, &self.filters)
    }

    pub fn outcome(&self) -> QueryOutcome<'_> {
        query(&self.reports, &self.filters)
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary::from_reports(&self.reports)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
