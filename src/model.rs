// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Data models for qualification-call leads.
//!
//! Defines the lead record as delivered by the backend, the closed set of call
//! outcomes, and the aggregate metrics shape shared with the dashboard.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::query::ParseQueryError;

/// Sentinel used by the ingestion pipeline for "not applicable / not captured".
pub const NOT_APPLICABLE: &str = "N/A";

fn not_applicable() -> String {
    NOT_APPLICABLE.to_string()
}

fn unknown_requirement() -> String {
    "unknown".to_string()
}

fn default_contact_mode() -> String {
    "phone".to_string()
}

/// Categorical result of a qualification call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Qualified,
    QualifiedScheduled,
    Reschedule,
    #[default]
    NotInterested,
    WrongContact,
    DoNotCall,
}

impl CallOutcome {
    pub const ALL: [CallOutcome; 6] = [
        CallOutcome::Qualified,
        CallOutcome::QualifiedScheduled,
        CallOutcome::Reschedule,
        CallOutcome::NotInterested,
        CallOutcome::WrongContact,
        CallOutcome::DoNotCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallOutcome::Qualified => "qualified",
            CallOutcome::QualifiedScheduled => "qualified_scheduled",
            CallOutcome::Reschedule => "reschedule",
            CallOutcome::NotInterested => "not_interested",
            CallOutcome::WrongContact => "wrong_contact",
            CallOutcome::DoNotCall => "do_not_call",
        }
    }

    /// Only a plain `qualified` outcome counts towards the success rate.
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Qualified)
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallOutcome {
    type Err = ParseQueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        CallOutcome::ALL
            .into_iter()
            .find(|outcome| outcome.as_str() == raw)
            .ok_or_else(|| ParseQueryError::new("status", raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default = "not_applicable")]
    pub phone: String,
    #[serde(default = "not_applicable")]
    pub email: String,
    #[serde(default = "not_applicable")]
    pub whatsapp: String,
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: not_applicable(),
            email: not_applicable(),
            whatsapp: not_applicable(),
        }
    }
}

/// What the prospect asked for during the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(rename = "type", default = "unknown_requirement")]
    pub kind: String,
    #[serde(default = "not_applicable")]
    pub capacity: String,
    #[serde(default = "not_applicable")]
    pub platform_length: String,
    #[serde(default = "not_applicable")]
    pub installation_type: String,
    #[serde(default = "not_applicable")]
    pub location: String,
    #[serde(default = "not_applicable")]
    pub timeline: String,
    #[serde(default = "not_applicable")]
    pub decision_maker: String,
}

impl Default for Requirement {
    fn default() -> Self {
        Self {
            kind: unknown_requirement(),
            capacity: not_applicable(),
            platform_length: not_applicable(),
            installation_type: not_applicable(),
            location: not_applicable(),
            timeline: not_applicable(),
            decision_maker: not_applicable(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallMetadata {
    /// ISO-8601 call start, kept verbatim; see [`parse_call_time`].
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub call_outcome: CallOutcome,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(default)]
    pub audio_recording_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_recording_id: Option<String>,
}

impl CallMetadata {
    pub fn called_at(&self) -> Option<DateTime<Utc>> {
        parse_call_time(&self.timestamp)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCall {
    #[serde(default = "not_applicable")]
    pub preferred_day: String,
    #[serde(default = "not_applicable")]
    pub preferred_time: String,
    #[serde(default = "not_applicable")]
    pub alternate_time: String,
    #[serde(default = "default_contact_mode")]
    pub contact_mode: String,
}

impl ScheduledCall {
    /// A follow-up exists unless the preferred day carries the `N/A` sentinel.
    pub fn is_scheduled(&self) -> bool {
        self.preferred_day != NOT_APPLICABLE
    }
}

impl Default for ScheduledCall {
    fn default() -> Self {
        Self {
            preferred_day: not_applicable(),
            preferred_time: not_applicable(),
            alternate_time: not_applicable(),
            contact_mode: default_contact_mode(),
        }
    }
}

/// A prospective customer record produced from a single qualification call.
///
/// Leads are never mutated once received; every view is derived. A free-form
/// `status` string sent by older backends is ignored on input, the call
/// outcome is the only status this crate carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default = "not_applicable")]
    pub lead_name: String,
    #[serde(default = "not_applicable")]
    pub company_name: String,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(default)]
    pub call_metadata: CallMetadata,
    #[serde(default)]
    pub conversation_transcript: String,
    #[serde(default)]
    pub scheduled_call: ScheduledCall,
}

impl Lead {
    pub fn outcome(&self) -> CallOutcome {
        self.call_metadata.call_outcome
    }

    pub fn called_at(&self) -> Option<DateTime<Utc>> {
        self.call_metadata.called_at()
    }

    /// Resolve the playable recording location against the public API base.
    pub fn recording_url(&self, api_base: &str) -> Option<String> {
        let base = api_base.trim_end_matches('/');
        let url = self.call_metadata.audio_recording_url.trim();

        if !url.is_empty() {
            if url.starts_with("http://") || url.starts_with("https://") {
                return Some(url.to_string());
            }
            if let Some(path) = url.strip_prefix("/api") {
                return Some(format!("{base}{path}"));
            }
            return Some(format!("{base}/{}", url.trim_start_matches('/')));
        }

        match self.call_metadata.audio_recording_id.as_deref() {
            Some(id) if !id.is_empty() && id != "null" => Some(format!("{base}/audio/{id}")),
            _ => None,
        }
    }
}

/// Aggregate counts shown above the lead list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_calls: usize,
    pub success_rate: u8,
    pub todays_calls: usize,
}

/// Transcript payload returned by the backend export endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptExport {
    #[serde(default)]
    pub lead_name: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
}

/// Parse a call timestamp into an instant.
///
/// Offsets are honoured; a date-time without offset is read in the local zone
/// and a bare date as midnight UTC. Anything else yields `None`.
pub fn parse_call_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_defaults_fill_missing_fields() {
        let lead: Lead = serde_json::from_value(serde_json::json!({
            "id": "lead-x",
            "call_metadata": { "timestamp": "2026-01-21T10:30:00Z" },
            "status": "qualified"
        }))
        .unwrap();

        assert_eq!(lead.lead_name, NOT_APPLICABLE);
        assert_eq!(lead.requirement.kind, "unknown");
        assert_eq!(lead.requirement.decision_maker, NOT_APPLICABLE);
        assert_eq!(lead.scheduled_call.contact_mode, "phone");
        assert_eq!(lead.outcome(), CallOutcome::NotInterested);
        assert!(!lead.scheduled_call.is_scheduled());
    }

    #[test]
    fn test_mongo_id_alias() {
        let lead: Lead = serde_json::from_str(r#"{"_id": "65a1f0"}"#).unwrap();
        assert_eq!(lead.id, "65a1f0");
    }

    #[test]
    fn test_outcome_wire_names() {
        for outcome in CallOutcome::ALL {
            let json = serde_json::to_string(&outcome).unwrap();
            assert_eq!(json, format!("\"{}\"", outcome.as_str()));
            assert_eq!(outcome.as_str().parse::<CallOutcome>().unwrap(), outcome);
        }
        assert!("maybe".parse::<CallOutcome>().is_err());
    }

    #[test]
    fn test_only_plain_qualified_is_success() {
        let successes: Vec<_> = CallOutcome::ALL.into_iter().filter(|o| o.is_success()).collect();
        assert_eq!(successes, vec![CallOutcome::Qualified]);
    }

    #[test]
    fn test_parse_call_time_formats() {
        let with_offset = parse_call_time("2026-01-21T10:30:00+05:30").unwrap();
        assert_eq!(with_offset.to_rfc3339(), "2026-01-21T05:00:00+00:00");

        let date_only = parse_call_time("2026-01-21").unwrap();
        assert_eq!(date_only.to_rfc3339(), "2026-01-21T00:00:00+00:00");

        assert!(parse_call_time("2026-01-21T10:30:00.123456").is_some());
        assert!(parse_call_time("yesterday").is_none());
        assert!(parse_call_time("").is_none());
    }

    #[test]
    fn test_recording_url_resolution() {
        let mut lead: Lead = serde_json::from_str(r#"{"id": "a"}"#).unwrap();
        assert_eq!(lead.recording_url("/api"), None);

        lead.call_metadata.audio_recording_id = Some("null".into());
        assert_eq!(lead.recording_url("/api"), None);

        lead.call_metadata.audio_recording_id = Some("rec42".into());
        assert_eq!(lead.recording_url("/api/").as_deref(), Some("/api/audio/rec42"));

        lead.call_metadata.audio_recording_url = "/api/audio/rec42".into();
        assert_eq!(
            lead.recording_url("http://host:5000/api").as_deref(),
            Some("http://host:5000/api/audio/rec42")
        );

        lead.call_metadata.audio_recording_url = "https://cdn.example.com/a.mp3".into();
        assert_eq!(
            lead.recording_url("/api").as_deref(),
            Some("https://cdn.example.com/a.mp3")
        );
    }

    #[test]
    fn test_metrics_wire_shape() {
        let metrics = DashboardMetrics {
            total_calls: 8,
            success_rate: 63,
            todays_calls: 2,
        };
        let json = serde_json::to_value(metrics).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"totalCalls": 8, "successRate": 63, "todaysCalls": 2})
        );
    }
}
