// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! The lead query engine: date scope, filter, sort, aggregate.
//!
//! A pure function of `(leads, query, now)`. Metrics are computed over the
//! date-scoped collection, before search and status narrow the list.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::aggregate::aggregate_at;
use crate::filter::filter_leads;
use crate::model::{DashboardMetrics, Lead};
use crate::query::{DateRange, QueryParameters};
use crate::sort::sort_leads;

#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub leads: Vec<Lead>,
    pub metrics: DashboardMetrics,
}

/// Keep the leads called inside `range`, counted back from `now`.
///
/// A lead whose timestamp cannot be parsed only survives the unbounded range.
pub fn scope_by_date(leads: &[Lead], range: DateRange, now: DateTime<Utc>) -> Vec<Lead> {
    let Some(cutoff) = range.cutoff(now) else {
        return leads.to_vec();
    };

    leads
        .iter()
        .filter(|lead| lead.called_at().is_some_and(|called| called >= cutoff))
        .cloned()
        .collect()
}

/// Filter and sort an already date-scoped collection.
pub fn select(scoped: &[Lead], query: &QueryParameters) -> Vec<Lead> {
    sort_leads(&filter_leads(scoped, query), query.sort)
}

/// Run the full pipeline over an unscoped collection.
pub fn evaluate<Tz: TimeZone>(leads: &[Lead], query: &QueryParameters, now: DateTime<Tz>) -> QueryResult {
    let scoped = scope_by_date(leads, query.date_range, now.with_timezone(&Utc));
    let metrics = aggregate_at(&scoped, now);

    QueryResult {
        leads: select(&scoped, query),
        metrics,
    }
}
