use crate::errors::{AppError, AppResult};
use crate::models::{AnalyticsReport, PageResponse, RequestStats, RequestStatus, RequestView, ServiceRequest};
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

static CREATED_AT_RE: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"^\s*(\d{1,2})\.(\d{1,2})\.(\d{4})\s*$").expect("valid created-at regex")
});

static MONTH_KEY_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"^(\d{1,2})\.(\d{4})$").expect("valid month key regex"));

/// Calendar month in `MM.YYYY` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::Invalid(format!("month {} out of range", month)));
        }
        Ok(Self { year, month })
    }

    pub fn current() -> Self {
        Self::of(Local::now().date_naive())
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        let captures = MONTH_KEY_RE
            .captures(raw.trim())
            .ok_or_else(|| AppError::Invalid(format!("expected MM.YYYY, got '{}'", raw)))?;
        let month = captures[1].parse::<u32>().map_err(|error| AppError::Invalid(error.to_string()))?;
        let year = captures[2].parse::<i32>().map_err(|error| AppError::Invalid(error.to_string()))?;
        Self::new(year, month)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}.{}", self.month, self.year)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum AnalyticsQuery {
    Month { month: MonthKey },
    Period { from: NaiveDate, to: NaiveDate },
}

/// Parses a `createdAt` value (`D.M.YYYY` or `DD.MM.YYYY`).
pub fn parse_created_at(raw: &str) -> Option<NaiveDate> {
    let captures = CREATED_AT_RE.captures(raw)?;
    let day = captures[1].parse().ok()?;
    let month = captures[2].parse().ok()?;
    let year = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn created_month(request: &ServiceRequest) -> Option<MonthKey> {
    parse_created_at(&request.created_at).map(MonthKey::of)
}

pub fn view(records: &[ServiceRequest], view: RequestView) -> Vec<ServiceRequest> {
    records
        .iter()
        .filter(|request| match view {
            RequestView::All => !request.is_archived(),
            RequestView::Archived => request.is_archived(),
            RequestView::New => !request.is_archived() && request.status == RequestStatus::New,
            RequestView::InProgress => !request.is_archived() && request.status == RequestStatus::InProgress,
            RequestView::Completed => !request.is_archived() && request.status == RequestStatus::Completed,
        })
        .cloned()
        .collect()
}

pub fn stats(records: &[ServiceRequest]) -> RequestStats {
    records.iter().fold(RequestStats::default(), |mut acc, request| {
        acc.total += 1;
        match &request.status {
            RequestStatus::New => acc.new += 1,
            RequestStatus::InProgress => acc.in_progress += 1,
            RequestStatus::Completed => acc.completed += 1,
            RequestStatus::Other(_) => {}
        }
        if request.is_archived() {
            acc.archived += 1;
        }
        acc
    })
}

pub fn filter_by_month(records: &[ServiceRequest], month: MonthKey) -> Vec<ServiceRequest> {
    records
        .iter()
        .filter(|request| created_month(request) == Some(month))
        .cloned()
        .collect()
}

/// Inclusive on both ends. Undated requests never match.
pub fn filter_by_period(records: &[ServiceRequest], from: NaiveDate, to: NaiveDate) -> Vec<ServiceRequest> {
    records
        .iter()
        .filter(|request| {
            parse_created_at(&request.created_at)
                .map(|date| date >= from && date <= to)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> PageResponse<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let page_count = total.div_ceil(page_size);
    let page = page.clamp(1, page_count.max(1));
    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    PageResponse {
        items,
        page,
        page_count,
        total,
    }
}

pub fn report(records: &[ServiceRequest], query: AnalyticsQuery, page: usize, page_size: usize) -> AnalyticsReport {
    let selected = match query {
        AnalyticsQuery::Month { month } => filter_by_month(records, month),
        AnalyticsQuery::Period { from, to } => filter_by_period(records, from, to),
    };
    let archived = view(&selected, RequestView::Archived);

    AnalyticsReport {
        stats: stats(&selected),
        archived: paginate(archived, page, page_size),
    }
}
