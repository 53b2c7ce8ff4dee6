// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Query parameters driving the lead list: date range, search, status, sort.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::model::CallOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} value: {value:?}")]
pub struct ParseQueryError {
    pub field: &'static str,
    pub value: String,
}

impl ParseQueryError {
    pub fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Relative window scoping both the list and the metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DateRange {
    SevenDays,
    ThirtyDays,
    #[default]
    All,
}

impl DateRange {
    pub const ALL: [DateRange; 3] = [DateRange::SevenDays, DateRange::ThirtyDays, DateRange::All];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::SevenDays => "7days",
            DateRange::ThirtyDays => "30days",
            DateRange::All => "all",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateRange::SevenDays => "Last 7 Days",
            DateRange::ThirtyDays => "Last 30 Days",
            DateRange::All => "All Time",
        }
    }

    pub fn days(&self) -> Option<i64> {
        match self {
            DateRange::SevenDays => Some(7),
            DateRange::ThirtyDays => Some(30),
            DateRange::All => None,
        }
    }

    /// Earliest instant inside the window, `None` when unbounded.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }
}

impl FromStr for DateRange {
    type Err = ParseQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        DateRange::ALL
            .into_iter()
            .find(|range| range.as_str() == raw)
            .ok_or_else(|| ParseQueryError::new("date_range", raw))
    }
}

/// Status selector: every outcome, or exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Outcome(CallOutcome),
}

impl StatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Outcome(outcome) => outcome.as_str(),
        }
    }

    pub fn matches(&self, outcome: CallOutcome) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Outcome(selected) => *selected == outcome,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, StatusFilter::All)
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All Status",
            StatusFilter::Outcome(outcome) => crate::view::outcome_label(*outcome),
        }
    }

    /// `All` first, then every outcome in declaration order.
    pub fn options() -> impl Iterator<Item = StatusFilter> {
        std::iter::once(StatusFilter::All).chain(CallOutcome::ALL.into_iter().map(StatusFilter::Outcome))
    }
}

impl FromStr for StatusFilter {
    type Err = ParseQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "all" {
            return Ok(StatusFilter::All);
        }
        raw.parse().map(StatusFilter::Outcome)
    }
}

impl From<CallOutcome> for StatusFilter {
    fn from(outcome: CallOutcome) -> Self {
        StatusFilter::Outcome(outcome)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    Name,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Newest, SortOrder::Oldest, SortOrder::Name];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::Name => "name",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest First",
            SortOrder::Oldest => "Oldest First",
            SortOrder::Name => "Lead Name A-Z",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_str() == raw)
            .ok_or_else(|| ParseQueryError::new("sort", raw))
    }
}

macro_rules! string_serde {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str(self.as_str())
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse().map_err(serde::de::Error::custom)
                }
            }
        )+
    };
}

string_serde!(DateRange, StatusFilter, SortOrder);

/// Everything the presentation layer can tweak about the lead list.
///
/// Fields are independent; each can be reset on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub sort: SortOrder,
}

impl QueryParameters {
    pub fn for_range(date_range: DateRange) -> Self {
        Self {
            date_range,
            ..Self::default()
        }
    }

    /// Reset search, status and sort. The date range is a separate control
    /// and is left as is.
    pub fn clear_filters(&mut self) {
        self.search.clear();
        self.status = StatusFilter::All;
        self.sort = SortOrder::Newest;
    }

    pub fn has_active_filters(&self) -> bool {
        self.narrows() || self.sort != SortOrder::Newest
    }

    /// Whether search or status can drop leads from the scoped collection.
    pub fn narrows(&self) -> bool {
        !self.search.is_empty() || !self.status.is_all()
    }

    /// The part of the query that determines which collection is fetched.
    pub fn scope(&self) -> QueryParameters {
        QueryParameters {
            date_range: self.date_range,
            sort: self.sort,
            ..QueryParameters::default()
        }
    }

    /// Query-string pairs for the backend, leaving out no-op filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("date_range", self.date_range.as_str().to_string()),
            ("sort", self.sort.as_str().to_string()),
        ];
        if !self.status.is_all() {
            pairs.push(("status", self.status.as_str().to_string()));
        }
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs
    }
}

/// Raw query string as received over HTTP; every field optional.
#[derive(Debug, Default, Deserialize)]
pub struct RawQuery {
    #[serde(default)]
    pub date_range: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sort: Option<String>,
}

impl TryFrom<RawQuery> for QueryParameters {
    type Error = ParseQueryError;

    fn try_from(raw: RawQuery) -> Result<Self, Self::Error> {
        let mut query = QueryParameters::default();

        if let Some(range) = raw.date_range.as_deref().filter(|v| !v.is_empty()) {
            query.date_range = range.parse()?;
        }
        if let Some(status) = raw.status.as_deref().filter(|v| !v.is_empty()) {
            query.status = status.parse()?;
        }
        if let Some(sort) = raw.sort.as_deref().filter(|v| !v.is_empty()) {
            query.sort = sort.parse()?;
        }
        if let Some(search) = raw.search {
            query.search = search.trim().to_string();
        }

        Ok(query)
    }
}
