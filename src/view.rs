// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! View models handed to the presentation layer.
//!
//! Everything here is derived from a [`Lead`] and the viewer's time zone;
//! nothing is stored. Outcome labels and tones live here rather than on the
//! data model so that the record keeps a single status field.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::model::{CallOutcome, Lead};
use crate::query::{DateRange, QueryParameters, SortOrder, StatusFilter};

/// Speaker prefix identifying the calling agent in transcripts.
pub const AGENT_SPEAKER: &str = "Priya";

/// RFC 5987 `attr-char` minus the alphanumerics.
const FILENAME_ATTR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeTone {
    Success,
    Warning,
    Destructive,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeBadge {
    pub outcome: CallOutcome,
    pub label: &'static str,
    pub tone: BadgeTone,
}

impl OutcomeBadge {
    pub fn new(outcome: CallOutcome) -> Self {
        Self {
            outcome,
            label: outcome_label(outcome),
            tone: outcome_tone(outcome),
        }
    }
}

pub fn outcome_label(outcome: CallOutcome) -> &'static str {
    match outcome {
        CallOutcome::Qualified => "Qualified",
        CallOutcome::QualifiedScheduled => "Qualified & Scheduled",
        CallOutcome::Reschedule => "Reschedule",
        CallOutcome::NotInterested => "Not Interested",
        CallOutcome::WrongContact => "Wrong Contact",
        CallOutcome::DoNotCall => "Do Not Call",
    }
}

pub fn outcome_tone(outcome: CallOutcome) -> BadgeTone {
    match outcome {
        CallOutcome::Qualified | CallOutcome::QualifiedScheduled => BadgeTone::Success,
        CallOutcome::Reschedule => BadgeTone::Warning,
        CallOutcome::NotInterested | CallOutcome::DoNotCall => BadgeTone::Destructive,
        CallOutcome::WrongContact => BadgeTone::Muted,
    }
}

/// One entry in a selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl Choice {
    fn new(value: &'static str, label: &'static str, selected: bool) -> Self {
        Self { value, label, selected }
    }
}

/// Selector contents for the date range, status and sort controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub date_ranges: Vec<Choice>,
    pub statuses: Vec<Choice>,
    pub sorts: Vec<Choice>,
}

impl FilterOptions {
    pub fn for_query(query: &QueryParameters) -> Self {
        Self {
            date_ranges: DateRange::ALL
                .into_iter()
                .map(|range| Choice::new(range.as_str(), range.label(), range == query.date_range))
                .collect(),
            statuses: StatusFilter::options()
                .map(|status| Choice::new(status.as_str(), status.label(), status == query.status))
                .collect(),
            sorts: SortOrder::ALL
                .into_iter()
                .map(|sort| Choice::new(sort.as_str(), sort.label(), sort == query.sort))
                .collect(),
        }
    }
}

/// One row in the lead list.
#[derive(Debug, Clone, Serialize)]
pub struct LeadCard {
    pub id: String,
    pub lead_name: String,
    pub company_name: String,
    pub called_on: String,
    pub badge: OutcomeBadge,
}

impl LeadCard {
    pub fn new<Tz>(lead: &Lead, zone: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let called_on = match lead.called_at() {
            Some(called) => format!("{} at {}", format_date(called, zone), format_time(called, zone)),
            None => lead.call_metadata.timestamp.clone(),
        };

        Self {
            id: lead.id.clone(),
            lead_name: lead.lead_name.clone(),
            company_name: lead.company_name.clone(),
            called_on,
            badge: OutcomeBadge::new(lead.outcome()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CallInfo {
    pub date: String,
    pub time: String,
    pub duration: String,
    pub badge: OutcomeBadge,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactDetails {
    pub phone: String,
    pub email: String,
    pub whatsapp: String,
    pub location: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequirementDetails {
    pub requirement_type: String,
    pub capacity: String,
    pub platform_length: String,
    pub installation_type: String,
    pub timeline: String,
    pub decision_maker: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowUp {
    pub preferred: String,
    pub alternate: String,
    pub contact_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptParagraph {
    pub text: String,
    pub agent: bool,
}

/// Everything the detail panel shows for one lead.
#[derive(Debug, Clone, Serialize)]
pub struct LeadDetail {
    pub id: String,
    pub lead_name: String,
    pub company_name: String,
    pub call: CallInfo,
    pub contact: ContactDetails,
    pub requirement: RequirementDetails,
    /// Absent when no follow-up was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_follow_up: Option<FollowUp>,
    pub recording_url: Option<String>,
    pub transcript: Vec<TranscriptParagraph>,
    pub transcript_filename: String,
}

impl LeadDetail {
    pub fn new<Tz>(lead: &Lead, zone: &Tz, api_base: &str) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let called = lead.called_at();
        let meta = &lead.call_metadata;
        let requirement = &lead.requirement;
        let scheduled = &lead.scheduled_call;

        let call = CallInfo {
            date: called
                .map(|at| format_date(at, zone))
                .unwrap_or_else(|| meta.timestamp.clone()),
            time: called.map(|at| format_time(at, zone)).unwrap_or_default(),
            duration: format_duration(meta.duration_seconds),
            badge: OutcomeBadge::new(meta.call_outcome),
        };

        let scheduled_follow_up = scheduled.is_scheduled().then(|| FollowUp {
            preferred: format!("{}, {}", scheduled.preferred_day, scheduled.preferred_time),
            alternate: scheduled.alternate_time.clone(),
            contact_mode: scheduled.contact_mode.clone(),
        });

        Self {
            id: lead.id.clone(),
            lead_name: lead.lead_name.clone(),
            company_name: lead.company_name.clone(),
            call,
            contact: ContactDetails {
                phone: lead.contact_info.phone.clone(),
                email: lead.contact_info.email.clone(),
                whatsapp: lead.contact_info.whatsapp.clone(),
                location: requirement.location.clone(),
            },
            requirement: RequirementDetails {
                requirement_type: requirement.kind.clone(),
                capacity: requirement.capacity.clone(),
                platform_length: requirement.platform_length.clone(),
                installation_type: requirement.installation_type.clone(),
                timeline: requirement.timeline.clone(),
                decision_maker: requirement.decision_maker.clone(),
            },
            scheduled_follow_up,
            recording_url: lead.recording_url(api_base),
            transcript: transcript_paragraphs(&lead.conversation_transcript),
            transcript_filename: transcript_filename(&lead.lead_name),
        }
    }
}

/// `Jan 21, 2026`
pub fn format_date<Tz>(at: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(zone).format("%b %-d, %Y").to_string()
}

/// `4:05 PM`
pub fn format_time<Tz>(at: DateTime<Utc>, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.with_timezone(zone).format("%-I:%M %p").to_string()
}

pub fn format_duration(seconds: u64) -> String {
    format!("{} min {} sec", seconds / 60, seconds % 60)
}

/// Paragraphs are separated by a blank line.
pub fn transcript_paragraphs(transcript: &str) -> Vec<TranscriptParagraph> {
    if transcript.is_empty() {
        return Vec::new();
    }

    transcript
        .split("\n\n")
        .map(|paragraph| TranscriptParagraph {
            agent: paragraph.starts_with(AGENT_SPEAKER),
            text: paragraph.to_string(),
        })
        .collect()
}

/// `transcript-<slug>.txt`, where the slug joins whitespace runs with a
/// single hyphen and lowercases the name.
pub fn transcript_filename(lead_name: &str) -> String {
    let mut slug = String::with_capacity(lead_name.len());
    let mut in_gap = false;
    for ch in lead_name.chars() {
        if ch.is_whitespace() {
            if !in_gap {
                slug.push('-');
            }
            in_gap = true;
        } else {
            slug.extend(ch.to_lowercase());
            in_gap = false;
        }
    }
    format!("transcript-{slug}.txt")
}

/// `Content-Disposition` for a download. The quoted `filename` is an ASCII
/// fallback; `filename*` carries the exact name.
pub fn attachment_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            ch if ch == ' ' || ch.is_ascii_graphic() => ch,
            _ => '_',
        })
        .collect();
    let encoded = utf8_percent_encode(filename, FILENAME_ATTR);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
