// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Dashboard query orchestration.
//!
//! A [`DashboardSession`] owns the current query parameters and the lead
//! collection last received for them. Every parameter change hands out a
//! [`FetchTicket`]; only the ticket carrying the latest generation may replace
//! the collection, so a slow response for an old query can never overwrite a
//! newer one.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::aggregate::aggregate_at;
use crate::engine::select;
use crate::error::AppError;
use crate::model::{DashboardMetrics, Lead};
use crate::query::{DateRange, QueryParameters, SortOrder, StatusFilter};
use crate::view::{FilterOptions, LeadCard};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Permission to complete one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    query: QueryParameters,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Parameters to send to the backend. Search and status are applied
    /// locally, so only the date scope and ordering are requested.
    pub fn request(&self) -> QueryParameters {
        self.query.scope()
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    FetchFailed,
    NoMatches,
    NoCalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmptyMessage {
    pub title: &'static str,
    pub description: &'static str,
}

impl EmptyState {
    pub fn message(&self) -> EmptyMessage {
        let (title, description) = match self {
            EmptyState::FetchFailed => (
                "Unable to load leads",
                "The lead service could not be reached. Try refreshing in a moment.",
            ),
            EmptyState::NoMatches => (
                "No leads match your filters",
                "Try adjusting your search or filter criteria.",
            ),
            EmptyState::NoCalls => (
                "No calls recorded yet",
                "When calls are made, they will appear here.",
            ),
        };
        EmptyMessage { title, description }
    }
}

/// Snapshot of everything the dashboard renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub query: QueryParameters,
    pub options: FilterOptions,
    pub phase: LoadPhase,
    pub metrics: DashboardMetrics,
    pub cards: Vec<LeadCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<EmptyState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_message: Option<EmptyMessage>,
}

#[derive(Debug, Default)]
pub struct DashboardSession {
    query: QueryParameters,
    leads: Vec<Lead>,
    phase: LoadPhase,
    generation: u64,
}

impl DashboardSession {
    pub fn new(query: QueryParameters) -> Self {
        Self {
            query,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &QueryParameters {
        &self.query
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_date_range(&mut self, date_range: DateRange) -> Option<FetchTicket> {
        if self.query.date_range == date_range {
            return None;
        }
        self.query.date_range = date_range;
        Some(self.issue())
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> Option<FetchTicket> {
        let search = search.into();
        if self.query.search == search {
            return None;
        }
        self.query.search = search;
        Some(self.issue())
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) -> Option<FetchTicket> {
        if self.query.status == status {
            return None;
        }
        self.query.status = status;
        Some(self.issue())
    }

    pub fn set_sort_order(&mut self, sort: SortOrder) -> Option<FetchTicket> {
        if self.query.sort == sort {
            return None;
        }
        self.query.sort = sort;
        Some(self.issue())
    }

    /// Reset search, status and sort; the date range stays.
    pub fn clear_filters(&mut self) -> Option<FetchTicket> {
        if !self.query.has_active_filters() {
            return None;
        }
        self.query.clear_filters();
        Some(self.issue())
    }

    /// Refetch with unchanged parameters.
    pub fn refresh(&mut self) -> FetchTicket {
        self.issue()
    }

    fn issue(&mut self) -> FetchTicket {
        self.generation += 1;
        self.phase = LoadPhase::Loading;
        FetchTicket {
            generation: self.generation,
            query: self.query.clone(),
        }
    }

    pub fn complete(&mut self, ticket: FetchTicket, result: Result<Vec<Lead>, AppError>) -> Completion {
        if ticket.generation != self.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale fetch"
            );
            return Completion::Stale;
        }

        match result {
            Ok(leads) => {
                tracing::debug!(count = leads.len(), generation = self.generation, "leads loaded");
                self.leads = leads;
                self.phase = LoadPhase::Ready;
                Completion::Applied
            }
            Err(error) => {
                tracing::error!(error = %error, date_range = %ticket.query.date_range, "failed to load leads");
                self.leads.clear();
                self.phase = LoadPhase::Failed;
                Completion::Failed
            }
        }
    }

    /// Render against the local clock.
    pub fn view(&self) -> DashboardView {
        self.view_at(Local::now())
    }

    pub fn view_at<Tz>(&self, now: DateTime<Tz>) -> DashboardView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let zone = now.timezone();
        let metrics = aggregate_at(&self.leads, now);
        let cards: Vec<LeadCard> = select(&self.leads, &self.query)
            .iter()
            .map(|lead| LeadCard::new(lead, &zone))
            .collect();

        let empty_state = match self.phase {
            LoadPhase::Failed => Some(EmptyState::FetchFailed),
            LoadPhase::Ready if cards.is_empty() && self.query.narrows() => Some(EmptyState::NoMatches),
            LoadPhase::Ready if cards.is_empty() => Some(EmptyState::NoCalls),
            _ => None,
        };

        DashboardView {
            query: self.query.clone(),
            options: FilterOptions::for_query(&self.query),
            phase: self.phase,
            metrics,
            cards,
            empty_message: empty_state.map(|state| state.message()),
            empty_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::sample_leads;
    use crate::model::CallOutcome;
    use chrono::Utc;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-21T18:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn loaded() -> DashboardSession {
        let mut session = DashboardSession::default();
        let ticket = session.refresh();
        assert_eq!(session.complete(ticket, Ok(sample_leads())), Completion::Applied);
        session
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut session = DashboardSession::default();
        let first = session.set_date_range(DateRange::SevenDays).unwrap();
        let second = session.set_date_range(DateRange::ThirtyDays).unwrap();
        assert!(second.generation() > first.generation());

        assert_eq!(session.complete(second, Ok(sample_leads())), Completion::Applied);
        assert_eq!(session.complete(first, Ok(Vec::new())), Completion::Stale);

        assert_eq!(session.leads().len(), 8);
        assert_eq!(session.phase(), LoadPhase::Ready);
        assert_eq!(session.query().date_range, DateRange::ThirtyDays);
    }

    #[test]
    fn test_stale_failure_does_not_clobber() {
        let mut session = loaded();
        let old = session.set_sort_order(SortOrder::Name).unwrap();
        let _current = session.set_sort_order(SortOrder::Oldest).unwrap();

        assert_eq!(
            session.complete(old, Err(AppError::upstream("timeout"))),
            Completion::Stale
        );
        assert_eq!(session.phase(), LoadPhase::Loading);
        assert_eq!(session.leads().len(), 8);
    }

    #[test]
    fn test_failure_empties_collection() {
        let mut session = loaded();
        let ticket = session.refresh();

        assert_eq!(
            session.complete(ticket, Err(AppError::upstream("connection refused"))),
            Completion::Failed
        );
        assert!(session.leads().is_empty());

        let view = session.view_at(now());
        assert_eq!(view.phase, LoadPhase::Failed);
        assert_eq!(view.empty_state, Some(EmptyState::FetchFailed));
        assert_eq!(view.metrics, DashboardMetrics::default());
    }

    #[test]
    fn test_unchanged_parameter_issues_no_ticket() {
        let mut session = loaded();
        let generation = session.generation();

        assert!(session.set_date_range(DateRange::All).is_none());
        assert!(session.set_search("").is_none());
        assert!(session.set_status_filter(StatusFilter::All).is_none());
        assert!(session.set_sort_order(SortOrder::Newest).is_none());
        assert!(session.clear_filters().is_none());
        assert_eq!(session.generation(), generation);
        assert_eq!(session.phase(), LoadPhase::Ready);
    }

    #[test]
    fn test_ticket_requests_scope_only() {
        let mut session = DashboardSession::new(QueryParameters::for_range(DateRange::SevenDays));
        let ticket = session.set_search("kumar").unwrap();

        let request = ticket.request();
        assert_eq!(request.date_range, DateRange::SevenDays);
        assert!(request.search.is_empty());
    }

    #[test]
    fn test_clear_filters_keeps_date_range() {
        let mut session = DashboardSession::new(QueryParameters::for_range(DateRange::ThirtyDays));
        session.set_search("steel");
        session.set_status_filter(CallOutcome::Qualified.into());

        assert!(session.clear_filters().is_some());
        assert_eq!(session.query().date_range, DateRange::ThirtyDays);
        assert!(session.query().search.is_empty());
        assert!(session.query().status.is_all());
    }

    #[test]
    fn test_view_filters_locally_but_metrics_do_not() {
        let mut session = loaded();
        let ticket = session.set_search("kumar").unwrap();
        session.complete(ticket, Ok(sample_leads()));

        let view = session.view_at(now());
        assert_eq!(view.cards.len(), 1);
        assert_eq!(view.cards[0].lead_name, "Rajesh Kumar");
        assert_eq!(view.metrics.total_calls, 8);
        assert_eq!(view.metrics.success_rate, 63);
        assert!(view.empty_state.is_none());
    }

    #[test]
    fn test_empty_states() {
        let mut session = loaded();
        let ticket = session.set_search("nobody by this name").unwrap();
        session.complete(ticket, Ok(sample_leads()));

        let view = session.view_at(now());
        assert_eq!(view.empty_state, Some(EmptyState::NoMatches));
        assert_eq!(view.empty_message.unwrap().title, "No leads match your filters");

        let mut session = DashboardSession::default();
        let ticket = session.refresh();
        session.complete(ticket, Ok(Vec::new()));
        let view = session.view_at(now());
        assert_eq!(view.empty_state, Some(EmptyState::NoCalls));
        assert_eq!(
            view.empty_message.unwrap().description,
            "When calls are made, they will appear here."
        );
    }

    #[test]
    fn test_view_carries_selector_options() {
        let mut session = loaded();
        let ticket = session.set_status_filter(CallOutcome::WrongContact.into()).unwrap();
        session.complete(ticket, Ok(sample_leads()));

        let view = session.view_at(now());
        let status = view.options.statuses.iter().find(|choice| choice.selected).unwrap();
        assert_eq!(status.value, "wrong_contact");
        assert_eq!(status.label, "Wrong Contact");
        assert_eq!(view.cards.len(), 1);
        assert_eq!(view.cards[0].badge.label, status.label);
    }

    #[test]
    fn test_loading_has_no_empty_state() {
        let mut session = DashboardSession::default();
        let _ticket = session.refresh();
        let view = session.view_at(now());
        assert_eq!(view.phase, LoadPhase::Loading);
        assert!(view.empty_state.is_none());
    }
}
