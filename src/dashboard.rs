// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Async driver for a [`DashboardSession`].
//!
//! The session lock is held only to issue a ticket and to complete it; the
//! fetch itself runs unlocked, so a newer change can overtake an older fetch
//! and the older result is then dropped as stale.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::query::{DateRange, QueryParameters, SortOrder, StatusFilter};
use crate::session::{Completion, DashboardSession, DashboardView, FetchTicket};
use crate::source::LeadStore;

#[derive(Clone)]
pub struct Dashboard {
    session: Arc<Mutex<DashboardSession>>,
    store: LeadStore,
}

impl Dashboard {
    pub fn new(store: LeadStore, query: QueryParameters) -> Self {
        Self {
            session: Arc::new(Mutex::new(DashboardSession::new(query))),
            store,
        }
    }

    /// Initial load, or a manual refresh.
    pub async fn load(&self) -> Completion {
        let ticket = self.session.lock().await.refresh();
        self.fetch(ticket).await
    }

    pub async fn set_date_range(&self, date_range: DateRange) -> Option<Completion> {
        self.change(|session| session.set_date_range(date_range)).await
    }

    pub async fn set_search(&self, search: impl Into<String>) -> Option<Completion> {
        let search = search.into();
        self.change(|session| session.set_search(search)).await
    }

    pub async fn set_status_filter(&self, status: StatusFilter) -> Option<Completion> {
        self.change(|session| session.set_status_filter(status)).await
    }

    pub async fn set_sort_order(&self, sort: SortOrder) -> Option<Completion> {
        self.change(|session| session.set_sort_order(sort)).await
    }

    pub async fn clear_filters(&self) -> Option<Completion> {
        self.change(DashboardSession::clear_filters).await
    }

    pub async fn view(&self) -> DashboardView {
        self.session.lock().await.view()
    }

    async fn change<F>(&self, f: F) -> Option<Completion>
    where
        F: FnOnce(&mut DashboardSession) -> Option<FetchTicket>,
    {
        let ticket = {
            let mut session = self.session.lock().await;
            f(&mut session)
        }?;
        Some(self.fetch(ticket).await)
    }

    async fn fetch(&self, ticket: FetchTicket) -> Completion {
        let request = ticket.request();
        let result = self.store.fetch_leads(&request).await;
        self.session.lock().await.complete(ticket, result)
    }

    #[cfg(test)]
    async fn with_session<R>(&self, f: impl FnOnce(&DashboardSession) -> R) -> R {
        f(&*self.session.lock().await)
    }
}
