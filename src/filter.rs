// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Search and status predicates over a lead collection.

use crate::model::Lead;
use crate::query::{QueryParameters, StatusFilter};

/// Keep the leads matching both the search text and the status selector.
///
/// Survivors keep their relative order and the input is left untouched.
pub fn filter_leads(leads: &[Lead], query: &QueryParameters) -> Vec<Lead> {
    let needle = query.search.to_lowercase();

    leads
        .iter()
        .filter(|lead| matches_search(lead, &needle) && matches_status(lead, query.status))
        .cloned()
        .collect()
}

/// Case-insensitive substring match on lead or company name. `needle` must
/// already be lowercased.
fn matches_search(lead: &Lead, needle: &str) -> bool {
    needle.is_empty()
        || lead.lead_name.to_lowercase().contains(needle)
        || lead.company_name.to_lowercase().contains(needle)
}

fn matches_status(lead: &Lead, status: StatusFilter) -> bool {
    status.matches(lead.outcome())
}
