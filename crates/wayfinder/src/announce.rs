//! Speech output.
//!
//! The session decides *what* to say and *when*; an [`Announcer`] only
//! delivers it. Delivery is fire-and-forget.

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use crate::geo::format_distance;
use crate::route::NavigationStep;

/// Why an announcement was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementKind {
    /// First instruction when navigation starts.
    Start,
    /// The traveler moved on to a new step. Never throttled.
    StepChange,
    /// "In N meters ..." reminder. Throttled.
    Reminder,
    /// The destination was reached.
    Arrival,
    /// The location feed failed or timed out.
    SignalLost,
}

impl std::fmt::Display for AnnouncementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::StepChange => write!(f, "step_change"),
            Self::Reminder => write!(f, "reminder"),
            Self::Arrival => write!(f, "arrival"),
            Self::SignalLost => write!(f, "signal_lost"),
        }
    }
}

/// Something that speaks text aloud.
pub trait Announcer: Send {
    /// Speak `text`. Best-effort, no delivery confirmation.
    fn announce(&mut self, kind: AnnouncementKind, text: &str);
}

/// Writes announcements to the log instead of a speech engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnnouncer;

impl Announcer for TracingAnnouncer {
    fn announce(&mut self, kind: AnnouncementKind, text: &str) {
        info!(%kind, "Announce: {text}");
    }
}

/// Prints announcements to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleAnnouncer;

impl Announcer for ConsoleAnnouncer {
    fn announce(&mut self, _kind: AnnouncementKind, text: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, ">> {text}") {
            warn!(error = %e, "Failed to write announcement");
        }
    }
}

/// The full spoken text for entering `step`.
#[must_use]
pub fn step_text(step: &NavigationStep) -> String {
    let mut text = step.instruction.clone();
    if let Some(note) = &step.accessibility_note {
        text.push_str(". ");
        text.push_str(note);
    }
    if let Some(warning) = &step.warning {
        text.push_str(". Caution: ");
        text.push_str(warning);
    }
    text
}

/// A distance reminder for the active step.
#[must_use]
pub fn reminder_text(step: &NavigationStep, distance_m: f64) -> String {
    format!("In {}, {}", format_distance(distance_m), lowercase_first(&step.instruction))
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Maneuver;

    #[test]
    fn test_kind_display() {
        assert_eq!(AnnouncementKind::StepChange.to_string(), "step_change");
        assert_eq!(AnnouncementKind::SignalLost.to_string(), "signal_lost");
    }

    #[test]
    fn test_step_text_plain() {
        let step = NavigationStep::new("Turn left onto Oak Street", 50.0, 40, Maneuver::TurnLeft);
        assert_eq!(step_text(&step), "Turn left onto Oak Street");
    }

    #[test]
    fn test_step_text_with_notes() {
        let step = NavigationStep::new("Turn right", 50.0, 40, Maneuver::TurnRight)
            .with_accessibility_note("Ramp on the left")
            .with_warning("Uneven pavement");
        assert_eq!(
            step_text(&step),
            "Turn right. Ramp on the left. Caution: Uneven pavement"
        );
    }

    #[test]
    fn test_reminder_text() {
        let step = NavigationStep::new("Turn left onto Oak Street", 50.0, 40, Maneuver::TurnLeft);
        assert_eq!(reminder_text(&step, 148.0), "In 150 m, turn left onto Oak Street");
    }

    #[test]
    fn test_lowercase_first_empty() {
        assert_eq!(lowercase_first(""), "");
    }

    #[test]
    fn test_tracing_announcer_does_not_panic() {
        TracingAnnouncer.announce(AnnouncementKind::Start, "Head north");
    }
}
