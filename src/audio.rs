//! Playback state for a call recording.
//!
//! Mirrors what the audio widget reports. Recordings served through a proxy
//! often arrive without a usable duration; in that case the player shows a
//! placeholder length so the scrubber still works.

use serde::Serialize;

/// Shown when the real duration is unknown.
pub const PLACEHOLDER_DURATION_SECS: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    MetadataLoaded(Option<f64>),
    TimeUpdate(f64),
    Play,
    Pause,
    Ended,
    Error,
    LoadTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlaybackState {
    pub loading: bool,
    pub playing: bool,
    pub position: f64,
    pub duration: f64,
    /// Set when `duration` is the placeholder rather than the real length.
    pub estimated: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            loading: true,
            playing: false,
            position: 0.0,
            duration: 0.0,
            estimated: false,
        }
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::MetadataLoaded(Some(duration)) if duration.is_finite() && duration > 0.0 => {
                self.duration = duration;
                self.estimated = false;
                self.loading = false;
            }
            PlayerEvent::MetadataLoaded(_) | PlayerEvent::Error => self.fall_back(),
            PlayerEvent::LoadTimeout => {
                if self.loading {
                    tracing::debug!("recording metadata timed out");
                    self.fall_back();
                }
            }
            PlayerEvent::TimeUpdate(position) => {
                if position.is_finite() && position >= 0.0 {
                    self.position = position;
                }
            }
            PlayerEvent::Play => self.playing = true,
            PlayerEvent::Pause => self.playing = false,
            PlayerEvent::Ended => {
                self.playing = false;
                self.position = 0.0;
            }
        }
    }

    fn fall_back(&mut self) {
        if self.duration <= 0.0 || self.estimated {
            self.duration = PLACEHOLDER_DURATION_SECS;
            self.estimated = true;
        }
        self.loading = false;
    }

    /// Fraction of the recording played, clamped to `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.position / self.duration).clamp(0.0, 1.0)
    }
}

/// `m:ss`, truncating fractional seconds.
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let whole = seconds as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}
