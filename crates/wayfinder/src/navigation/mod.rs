//! Turn-by-turn guidance.
//!
//! The pure pieces ([`StepProgressTracker`], [`AnnouncementThrottle`],
//! [`ArrivalEstimator`]) are composed by [`NavigationSession`], which
//! [`drive`] runs against a live location feed.

mod driver;
mod eta;
mod session;
mod throttle;
mod tracker;
mod traffic;

pub use driver::{apply, drive, Control, Watchdog};
pub use eta::ArrivalEstimator;
pub use session::{
    EndReason, NavigationSession, SampleOutcome, SessionEnd, SessionSettings, SessionSnapshot,
    SessionState,
};
pub use throttle::{AnnouncementThrottle, DEFAULT_ANNOUNCE_INTERVAL_SECS};
pub use tracker::{ActiveStep, StepProgress, StepProgressTracker, ADVANCE_THRESHOLD_M};
pub use traffic::{RandomTraffic, TrafficModel};
