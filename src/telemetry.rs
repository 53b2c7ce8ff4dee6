// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics collection for the lead service.
//!
//! Tracks request volume, leads served, and upstream health.

use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::sync::Arc;

use crate::error::AppError;

fn metric_error(e: prometheus::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("Failed to create metric: {}", e))
}

/// Metrics collector for the service
#[derive(Clone)]
pub struct Telemetry {
    pub registry: Arc<Registry>,

    // Request metrics
    pub requests_total: IntCounter,
    pub leads_served: IntCounter,
    pub transcripts_exported: IntCounter,
    pub dashboard_fetch_failures: IntCounter,

    // Upstream metrics
    pub upstream_requests: IntCounter,
    pub upstream_failures: IntCounter,
    pub upstream_latency: Histogram,
}

impl Telemetry {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let requests_total = IntCounter::with_opts(Opts::new(
            "leadboard_requests_total",
            "Total number of API requests",
        ))
        .map_err(metric_error)?;

        let leads_served = IntCounter::with_opts(Opts::new(
            "leadboard_leads_served_total",
            "Total number of lead records returned by list endpoints",
        ))
        .map_err(metric_error)?;

        let transcripts_exported = IntCounter::with_opts(Opts::new(
            "leadboard_transcripts_exported_total",
            "Total number of transcript downloads",
        ))
        .map_err(metric_error)?;

        let dashboard_fetch_failures = IntCounter::with_opts(Opts::new(
            "leadboard_dashboard_fetch_failures_total",
            "Dashboard loads that degraded to the empty state after a fetch failure",
        ))
        .map_err(metric_error)?;

        let upstream_requests = IntCounter::with_opts(Opts::new(
            "leadboard_upstream_requests_total",
            "Total number of requests attempted against the lead backend",
        ))
        .map_err(metric_error)?;

        let upstream_failures = IntCounter::with_opts(Opts::new(
            "leadboard_upstream_failures_total",
            "Total number of backend requests that resulted in an error",
        ))
        .map_err(metric_error)?;

        let upstream_latency = Histogram::with_opts(
            HistogramOpts::new(
                "leadboard_upstream_latency_seconds",
                "Duration of backend requests in seconds",
            )
            .buckets(vec![
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.0, 5.0,
            ]),
        )
        .map_err(metric_error)?;

        registry
            .register(Box::new(requests_total.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(leads_served.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(transcripts_exported.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(dashboard_fetch_failures.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(upstream_requests.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(upstream_failures.clone()))
            .map_err(metric_error)?;
        registry
            .register(Box::new(upstream_latency.clone()))
            .map_err(metric_error)?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            leads_served,
            transcripts_exported,
            dashboard_fetch_failures,
            upstream_requests,
            upstream_failures,
            upstream_latency,
        })
    }

    pub fn record_request(&self) {
        self.requests_total.inc();
    }

    pub fn record_leads_served(&self, count: usize) {
        self.leads_served.inc_by(count as u64);
    }

    pub fn record_transcript_export(&self) {
        self.transcripts_exported.inc();
    }

    pub fn record_dashboard_fetch_failure(&self) {
        self.dashboard_fetch_failures.inc();
    }

    /// Record a backend request attempt
    pub fn record_upstream_request(&self) {
        self.upstream_requests.inc();
    }

    /// Record a backend request failure
    pub fn record_upstream_failure(&self) {
        self.upstream_failures.inc();
    }

    /// Observe latency for a backend request in seconds
    pub fn record_upstream_latency(&self, seconds: f64) {
        self.upstream_latency.observe(seconds);
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> Result<String, AppError> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to convert metrics to string: {}",
                e
            ))
        })
    }
}
