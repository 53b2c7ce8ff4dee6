// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Ordering of the filtered lead list.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use icu_collator::{Collator, CollatorOptions};
use icu_locid::locale;

use crate::model::Lead;
use crate::query::SortOrder;

/// Return a sorted copy of `leads`.
///
/// Every order is stable. Timestamps that fail to parse rank below every
/// valid one, so they trail `newest` and lead `oldest`.
pub fn sort_leads(leads: &[Lead], order: SortOrder) -> Vec<Lead> {
    match order {
        SortOrder::Name => sort_by_name(leads),
        SortOrder::Newest => sort_by_time(leads, |a, b| b.cmp(a)),
        SortOrder::Oldest => sort_by_time(leads, |a, b| a.cmp(b)),
    }
}

fn sort_by_time<F>(leads: &[Lead], cmp: F) -> Vec<Lead>
where
    F: Fn(&Option<DateTime<Utc>>, &Option<DateTime<Utc>>) -> Ordering,
{
    let mut keyed: Vec<(Option<DateTime<Utc>>, &Lead)> =
        leads.iter().map(|lead| (lead.called_at(), lead)).collect();
    keyed.sort_by(|(a, _), (b, _)| cmp(a, b));
    keyed.into_iter().map(|(_, lead)| lead.clone()).collect()
}

fn sort_by_name(leads: &[Lead]) -> Vec<Lead> {
    let mut sorted = leads.to_vec();
    let compare = NameCollation::new();
    sorted.sort_by(|a, b| compare.compare(&a.lead_name, &b.lead_name));
    sorted
}

/// Human alphabetical ordering; accented letters sort with their base letter.
struct NameCollation {
    collator: Option<Collator>,
}

impl NameCollation {
    fn new() -> Self {
        let collator = match Collator::try_new(&locale!("en").into(), CollatorOptions::new()) {
            Ok(collator) => Some(collator),
            Err(error) => {
                tracing::warn!(%error, "collation data unavailable; sorting names by code point");
                None
            }
        };
        Self { collator }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        }
    }
}
