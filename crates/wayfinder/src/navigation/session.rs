//! The navigation session state machine.
//!
//! A [`NavigationSession`] owns the lifecycle of one guided trip:
//!
//! ```text
//! Idle --start()--> Navigating
//! Navigating --pause()--> Paused
//! Paused --resume()--> Navigating
//! Navigating | Paused --stop()--> Stopped
//! Navigating --[final step reached]--> Stopped
//! ```
//!
//! Each location sample delivered while navigating runs one full cycle:
//! progress tracking, at most one step advance, an announcement decision, and
//! an ETA refresh when the step changed. All mutation happens synchronously
//! inside a single handler call.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::announce::{reminder_text, step_text, AnnouncementKind, Announcer, TracingAnnouncer};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use crate::location::{LiveLocation, LocationError, LocationEvent, LocationSource, SubscriptionHandle};
use crate::map::{MapDisplay, Marker, MarkerKind, TracingMap};
use crate::route::{NavigationStep, Route};

use super::eta::ArrivalEstimator;
use super::throttle::{AnnouncementThrottle, DEFAULT_ANNOUNCE_INTERVAL_SECS};
use super::tracker::{ActiveStep, StepProgressTracker, ADVANCE_THRESHOLD_M};
use super::traffic::{RandomTraffic, TrafficModel};

const ARRIVAL_TEXT: &str = "You have arrived at your destination";
const SIGNAL_LOST_TEXT: &str = "GPS signal lost. Continuing with last known position";

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created, not yet started.
    Idle,
    /// Following the route and reacting to samples.
    Navigating,
    /// Subscription kept alive, samples ignored.
    Paused,
    /// Finished. Terminal.
    Stopped,
}

impl SessionState {
    /// Whether the sensor subscription should be live in this state.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Navigating | Self::Paused)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Navigating => write!(f, "navigating"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The traveler reached the destination.
    Arrived,
    /// The owner called `stop()`.
    Stopped,
}

/// Delivered once to the session's owner when it reaches `Stopped`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEnd {
    /// Why the session ended.
    pub reason: EndReason,
    /// Step index reached before the session ended.
    pub step_index: usize,
    /// Traffic delay accumulated over the session, in seconds.
    pub accumulated_delay_s: u64,
    /// Number of samples processed while navigating.
    pub samples_processed: u64,
    /// When the session ended.
    pub ended_at: DateTime<Utc>,
}

/// What happened to a single location sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// Dropped: not navigating, or the sample was unusable.
    Ignored,
    /// Processed without a step change.
    Progressed,
    /// The session moved to the given step.
    Advanced(usize),
    /// The destination was reached and the session stopped.
    Arrived,
}

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Proximity to a maneuver that completes a step, in meters.
    pub advance_threshold_m: f64,
    /// Minimum gap between distance reminders.
    pub announce_interval: Duration,
    /// Whether announcements are spoken initially.
    pub voice_enabled: bool,
    /// Capacity of the location event channel.
    pub channel_capacity: usize,
    /// Lower bound of the simulated recalculation delay, in seconds.
    pub min_traffic_delay_s: u64,
    /// Upper bound of the simulated recalculation delay, in seconds.
    pub max_traffic_delay_s: u64,
    /// Seed for the simulated delay (0 = entropy).
    pub traffic_seed: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            advance_threshold_m: ADVANCE_THRESHOLD_M,
            announce_interval: Duration::seconds(DEFAULT_ANNOUNCE_INTERVAL_SECS),
            voice_enabled: true,
            channel_capacity: 64,
            min_traffic_delay_s: 30,
            max_traffic_delay_s: 300,
            traffic_seed: 0,
        }
    }
}

/// A point-in-time view of a session, for display and status output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Lifecycle state.
    pub state: SessionState,
    /// Current step index.
    pub step_index: usize,
    /// Number of steps on the route.
    pub step_count: usize,
    /// Instruction for the current step, if any.
    pub instruction: Option<String>,
    /// Meters to the next maneuver.
    pub distance_to_next_turn_m: f64,
    /// Meters left on the whole route.
    pub remaining_distance_m: f64,
    /// Accumulated traffic delay in seconds.
    pub accumulated_delay_s: u64,
    /// Projected arrival.
    pub eta: Option<DateTime<Utc>>,
    /// Whether announcements are spoken.
    pub voice_enabled: bool,
    /// Most recent sample.
    pub last_location: Option<LiveLocation>,
    /// Whether the location feed is currently reported lost.
    pub signal_lost: bool,
    /// Number of samples processed while navigating.
    pub samples_processed: u64,
}

type EndCallback = Box<dyn FnOnce(SessionEnd) + Send>;

/// One guided trip along a route.
pub struct NavigationSession {
    route: Arc<Route>,
    state: SessionState,
    step_index: usize,
    step_started_at: GeoPoint,
    distance_to_next_turn: f64,
    accumulated_delay_s: u64,
    eta: Option<DateTime<Utc>>,
    voice_enabled: bool,
    last_location: Option<LiveLocation>,
    signal_lost: bool,
    last_error: Option<LocationError>,
    samples_processed: u64,
    channel_capacity: usize,

    tracker: StepProgressTracker,
    throttle: AnnouncementThrottle,
    source: Box<dyn LocationSource>,
    subscription: Option<SubscriptionHandle>,
    announcer: Box<dyn Announcer>,
    map: Box<dyn MapDisplay>,
    traffic: Box<dyn TrafficModel>,
    clock: Box<dyn Clock>,
    on_end: Option<EndCallback>,
}

impl std::fmt::Debug for NavigationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationSession")
            .field("state", &self.state)
            .field("step_index", &self.step_index)
            .field("step_count", &self.route.steps.len())
            .field("distance_to_next_turn", &self.distance_to_next_turn)
            .field("accumulated_delay_s", &self.accumulated_delay_s)
            .field("voice_enabled", &self.voice_enabled)
            .field("source", &self.source.name())
            .field("subscribed", &self.subscription.is_some())
            .finish_non_exhaustive()
    }
}

impl NavigationSession {
    /// Create an idle session for `route`, reading positions from `source`.
    ///
    /// Announcements go to the log, map updates are traced, and recalculation
    /// uses [`RandomTraffic`] until replaced with the `with_*` methods.
    ///
    /// # Errors
    ///
    /// Returns an error if the route fails validation.
    pub fn new(
        route: impl Into<Arc<Route>>,
        source: Box<dyn LocationSource>,
        settings: &SessionSettings,
    ) -> Result<Self> {
        let route = route.into();
        route.validate()?;

        Ok(Self {
            step_started_at: route.start,
            distance_to_next_turn: route.steps[0].distance_m,
            route,
            state: SessionState::Idle,
            step_index: 0,
            accumulated_delay_s: 0,
            eta: None,
            voice_enabled: settings.voice_enabled,
            last_location: None,
            signal_lost: false,
            last_error: None,
            samples_processed: 0,
            channel_capacity: settings.channel_capacity.max(1),
            tracker: StepProgressTracker::new(settings.advance_threshold_m),
            throttle: AnnouncementThrottle::new(settings.announce_interval),
            source,
            subscription: None,
            announcer: Box::new(TracingAnnouncer),
            map: Box::new(TracingMap),
            traffic: Box::new(RandomTraffic::new(
                settings.min_traffic_delay_s,
                settings.max_traffic_delay_s,
                settings.traffic_seed,
            )),
            clock: Box::new(SystemClock),
            on_end: None,
        })
    }

    /// Replace the speech output.
    #[must_use]
    pub fn with_announcer(mut self, announcer: Box<dyn Announcer>) -> Self {
        self.announcer = announcer;
        self
    }

    /// Replace the map display.
    #[must_use]
    pub fn with_map(mut self, map: Box<dyn MapDisplay>) -> Self {
        self.map = map;
        self
    }

    /// Replace the traffic delay model.
    #[must_use]
    pub fn with_traffic(mut self, traffic: Box<dyn TrafficModel>) -> Self {
        self.traffic = traffic;
        self
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register the callback invoked once when the session stops.
    #[must_use]
    pub fn on_end(mut self, callback: impl FnOnce(SessionEnd) + Send + 'static) -> Self {
        self.on_end = Some(Box::new(callback));
        self
    }

    // === Control surface ===

    /// Begin navigating.
    ///
    /// Opens the sensor subscription, computes the initial ETA and announces
    /// the first instruction. Returns the receiving end of the location feed;
    /// pass its events to [`handle_event`](Self::handle_event).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] unless the session is idle, and
    /// [`Error::Location`] if the sensor cannot be started. In both cases the
    /// session is left untouched.
    pub fn start(&mut self) -> Result<mpsc::Receiver<LocationEvent>> {
        if self.state != SessionState::Idle {
            warn!(state = %self.state, "start() called on a session that is not idle");
            return Err(Error::invalid_state("start", self.state));
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let handle = self.source.start(tx).map_err(|e| {
            warn!(source = self.source.name(), error = %e, "Location source failed to start");
            Error::from(e)
        })?;
        debug!(source = self.source.name(), id = handle.id(), "Location subscription opened");
        self.subscription = Some(handle);

        let now = self.clock.now();
        self.state = SessionState::Navigating;
        self.step_index = 0;
        self.step_started_at = self.route.start;
        self.distance_to_next_turn = self.route.steps[0].distance_m;
        self.refresh_eta(now);

        info!(
            steps = self.route.steps.len(),
            mode = %self.route.mode,
            eta = ?self.eta,
            "Navigation started"
        );
        let text = step_text(&self.route.steps[0]);
        self.announce_instruction(AnnouncementKind::Start, &text, now);

        Ok(rx)
    }

    /// Suspend sample processing. The subscription stays open.
    ///
    /// Returns `false` (and logs a warning) unless the session is navigating.
    pub fn pause(&mut self) -> bool {
        if self.state != SessionState::Navigating {
            warn!(state = %self.state, "pause() ignored");
            return false;
        }
        self.state = SessionState::Paused;
        info!(step = self.step_index, "Navigation paused");
        true
    }

    /// Resume sample processing.
    ///
    /// Returns `false` (and logs a warning) unless the session is paused.
    pub fn resume(&mut self) -> bool {
        if self.state != SessionState::Paused {
            warn!(state = %self.state, "resume() ignored");
            return false;
        }
        self.state = SessionState::Navigating;
        info!(step = self.step_index, "Navigation resumed");
        true
    }

    /// End the session, releasing the sensor subscription.
    ///
    /// Safe to call repeatedly; only the first call from an active state has
    /// any effect. Returns whether this call stopped the session.
    pub fn stop(&mut self) -> bool {
        match self.state {
            SessionState::Navigating | SessionState::Paused => {
                self.finish(EndReason::Stopped);
                true
            }
            SessionState::Stopped => {
                debug!("stop() on an already stopped session");
                false
            }
            SessionState::Idle => {
                warn!("stop() ignored: session never started");
                false
            }
        }
    }

    /// Look for live traffic and fold any extra delay into the ETA.
    ///
    /// The accumulated delay only ever grows. Step index and distance are
    /// unchanged. Returns `false` (and logs a warning) unless navigating.
    pub fn recalculate(&mut self) -> bool {
        if self.state != SessionState::Navigating {
            warn!(state = %self.state, "recalculate() ignored");
            return false;
        }
        let added = self.traffic.sample_delay();
        self.accumulated_delay_s = self.accumulated_delay_s.saturating_add(added);
        let now = self.clock.now();
        self.refresh_eta(now);
        info!(
            added_s = added,
            total_delay_s = self.accumulated_delay_s,
            eta = ?self.eta,
            "Route recalculated with current traffic"
        );
        true
    }

    /// Turn spoken announcements on or off. Allowed in any state.
    pub fn set_voice_enabled(&mut self, enabled: bool) {
        if self.voice_enabled != enabled {
            info!(enabled, "Voice guidance toggled");
        }
        self.voice_enabled = enabled;
    }

    /// Flip the voice flag and return the new value.
    pub fn toggle_voice(&mut self) -> bool {
        self.set_voice_enabled(!self.voice_enabled);
        self.voice_enabled
    }

    // === Event handling ===

    /// Feed one event from the location channel.
    pub fn handle_event(&mut self, event: LocationEvent) -> SampleOutcome {
        match event {
            LocationEvent::Sample(location) => self.on_location(location),
            LocationEvent::Error(err) => {
                self.on_sensor_error(err);
                SampleOutcome::Ignored
            }
        }
    }

    /// Process one location sample.
    pub fn on_location(&mut self, location: LiveLocation) -> SampleOutcome {
        if self.state != SessionState::Navigating {
            trace!(state = %self.state, "Sample dropped");
            return SampleOutcome::Ignored;
        }
        if !location.point().is_valid() {
            warn!(lat = location.lat, lng = location.lng, "Discarding invalid sample");
            return SampleOutcome::Ignored;
        }

        let now = self.clock.now();
        if self.signal_lost {
            info!("GPS signal restored");
            self.signal_lost = false;
        }
        self.last_location = Some(location);
        self.samples_processed += 1;

        let last_index = self.route.steps.len() - 1;
        let progress = self.tracker.update(
            &location,
            &ActiveStep {
                step: &self.route.steps[self.step_index],
                started_at: self.step_started_at,
                is_last: self.step_index == last_index,
            },
        );
        self.distance_to_next_turn = progress.distance_remaining;
        self.push_map(location.point());

        if progress.arrived {
            self.arrive(now);
            return SampleOutcome::Arrived;
        }

        if progress.should_advance {
            return self.advance(location, now);
        }

        if self.throttle.should_announce(now) {
            let text = reminder_text(self.current_step_ref(), self.distance_to_next_turn);
            self.announce_instruction(AnnouncementKind::Reminder, &text, now);
        }
        SampleOutcome::Progressed
    }

    /// Record a sensor failure. Never changes the lifecycle state.
    pub fn on_sensor_error(&mut self, err: LocationError) {
        if !self.state.is_active() {
            debug!(state = %self.state, error = %err, "Sensor error outside an active session");
            return;
        }

        if err.is_transient() {
            warn!(error = %err, "Location feed degraded");
        } else {
            warn!(error = %err, "Location sensor error");
        }

        let first_report = !self.signal_lost;
        self.signal_lost = true;
        self.last_error = Some(err);

        if first_report && self.state == SessionState::Navigating {
            self.speak(AnnouncementKind::SignalLost, SIGNAL_LOST_TEXT);
        }
    }

    // === Accessors ===

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current step index. Equals the step count only after arrival.
    #[must_use]
    pub fn step_index(&self) -> usize {
        self.step_index
    }

    /// The step being traveled, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<&NavigationStep> {
        self.route.steps.get(self.step_index)
    }

    /// Meters to the next maneuver.
    #[must_use]
    pub fn distance_to_next_turn(&self) -> f64 {
        self.distance_to_next_turn
    }

    /// Accumulated traffic delay in seconds.
    #[must_use]
    pub fn accumulated_delay_s(&self) -> u64 {
        self.accumulated_delay_s
    }

    /// Projected arrival, once started.
    #[must_use]
    pub fn eta(&self) -> Option<DateTime<Utc>> {
        self.eta
    }

    /// Whether announcements are spoken.
    #[must_use]
    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    /// When the last instruction was announced.
    #[must_use]
    pub fn last_announcement(&self) -> Option<DateTime<Utc>> {
        self.throttle.last_announcement()
    }

    /// Whether a sensor subscription is currently held.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// The most recent sensor error.
    #[must_use]
    pub fn last_error(&self) -> Option<&LocationError> {
        self.last_error.as_ref()
    }

    /// The route being followed.
    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    /// Point-in-time view for display.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let remaining_distance_m = if self.step_index < self.route.steps.len() {
            self.distance_to_next_turn + self.route.distance_from(self.step_index + 1)
        } else {
            0.0
        };
        SessionSnapshot {
            state: self.state,
            step_index: self.step_index,
            step_count: self.route.steps.len(),
            instruction: self.current_step().map(|s| s.instruction.clone()),
            distance_to_next_turn_m: self.distance_to_next_turn,
            remaining_distance_m,
            accumulated_delay_s: self.accumulated_delay_s,
            eta: self.eta,
            voice_enabled: self.voice_enabled,
            last_location: self.last_location,
            signal_lost: self.signal_lost,
            samples_processed: self.samples_processed,
        }
    }

    // === Internals ===

    fn current_step_ref(&self) -> &NavigationStep {
        &self.route.steps[self.step_index]
    }

    fn advance(&mut self, location: LiveLocation, now: DateTime<Utc>) -> SampleOutcome {
        self.step_index += 1;
        self.step_started_at = location.point();

        // Distance on the new step; its advance decision waits for the next sample.
        let last_index = self.route.steps.len() - 1;
        let progress = self.tracker.update(
            &location,
            &ActiveStep {
                step: &self.route.steps[self.step_index],
                started_at: self.step_started_at,
                is_last: self.step_index == last_index,
            },
        );
        self.distance_to_next_turn = progress.distance_remaining;
        self.refresh_eta(now);

        info!(
            step = self.step_index,
            of = self.route.steps.len(),
            distance_m = self.distance_to_next_turn,
            "Advanced to next step"
        );
        let text = step_text(self.current_step_ref());
        self.announce_instruction(AnnouncementKind::StepChange, &text, now);
        SampleOutcome::Advanced(self.step_index)
    }

    fn arrive(&mut self, now: DateTime<Utc>) {
        info!("Destination reached");
        self.step_index = self.route.steps.len();
        self.distance_to_next_turn = 0.0;
        self.eta = Some(now);
        self.announce_instruction(AnnouncementKind::Arrival, ARRIVAL_TEXT, now);
        self.finish(EndReason::Arrived);
    }

    fn finish(&mut self, reason: EndReason) {
        if let Some(handle) = self.subscription.take() {
            self.source.stop(&handle);
            debug!(id = handle.id(), "Location subscription released");
        }

        let end = SessionEnd {
            reason,
            step_index: self.step_index,
            accumulated_delay_s: self.accumulated_delay_s,
            samples_processed: self.samples_processed,
            ended_at: self.clock.now(),
        };

        self.state = SessionState::Stopped;
        if reason == EndReason::Stopped {
            self.step_index = 0;
        }
        info!(?reason, "Navigation ended");

        if let Some(callback) = self.on_end.take() {
            callback(end);
        }
    }

    fn refresh_eta(&mut self, now: DateTime<Utc>) {
        self.eta = Some(ArrivalEstimator::estimate(
            now,
            self.route.durations_from(self.step_index),
            self.accumulated_delay_s,
        ));
    }

    fn push_map(&mut self, current: GeoPoint) {
        let markers = [
            Marker::new(MarkerKind::Start, self.route.start),
            Marker::new(MarkerKind::End, self.route.end),
            Marker::new(MarkerKind::Current, current),
        ];
        self.map.render(current, &markers);
    }

    /// Speak an instruction and restart the reminder window.
    fn announce_instruction(&mut self, kind: AnnouncementKind, text: &str, now: DateTime<Utc>) {
        self.throttle.record_announcement(now);
        self.speak(kind, text);
    }

    fn speak(&mut self, kind: AnnouncementKind, text: &str) {
        if self.voice_enabled {
            self.announcer.announce(kind, text);
        } else {
            debug!(%kind, "Voice off, not speaking: {text}");
        }
    }
}
