// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Leadboard: review service for qualification-call leads.

pub mod aggregate;
pub mod api;
pub mod audio;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fixture;
pub mod model;
pub mod query;
pub mod session;
pub mod sort;
pub mod source;
pub mod telemetry;
pub mod upstream;
pub mod view;
