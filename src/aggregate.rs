// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Dashboard metrics over a date-scoped lead collection.
//!
//! Search and status filters never reach this module: callers pass the
//! collection as scoped by the date range alone.

use chrono::{DateTime, Local, TimeZone};

use crate::model::{DashboardMetrics, Lead};

/// Aggregate against the viewer's local clock.
pub fn aggregate(leads: &[Lead]) -> DashboardMetrics {
    aggregate_at(leads, Local::now())
}

/// Aggregate with an explicit notion of "now"; its time zone decides which
/// calls count as today's.
pub fn aggregate_at<Tz: TimeZone>(leads: &[Lead], now: DateTime<Tz>) -> DashboardMetrics {
    let total_calls = leads.len();
    let qualified = leads.iter().filter(|lead| lead.outcome().is_success()).count();
    let today = now.date_naive();
    let zone = now.timezone();

    let todays_calls = leads
        .iter()
        .filter_map(Lead::called_at)
        .filter(|called| called.with_timezone(&zone).date_naive() == today)
        .count();

    DashboardMetrics {
        total_calls,
        success_rate: success_rate(qualified, total_calls),
        todays_calls,
    }
}

/// Percentage of successes, rounded half up. Zero for an empty collection.
pub fn success_rate(qualified: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let qualified = qualified.min(total) as u64;
    let total = total as u64;
    ((qualified * 200 + total) / (total * 2)) as u8
}
