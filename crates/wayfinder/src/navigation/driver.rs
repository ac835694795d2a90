//! Async event loop that runs a started session.
//!
//! [`drive`] multiplexes the location feed, owner controls and a watchdog
//! timer. All session mutation happens on the driving task, one event at a
//! time, so handlers never interleave.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::location::{LocationError, LocationEvent};

use super::session::{NavigationSession, SessionSnapshot, SessionState};

/// A command from the session owner.
#[derive(Debug)]
pub enum Control {
    /// Suspend sample processing.
    Pause,
    /// Resume sample processing.
    Resume,
    /// End the session.
    Stop,
    /// Re-check traffic and update the ETA.
    Recalculate,
    /// Turn voice guidance on or off.
    SetVoice(bool),
    /// Flip voice guidance.
    ToggleVoice,
    /// Reply with a snapshot of the session.
    Status(oneshot::Sender<SessionSnapshot>),
}

/// How long the driver waits for samples before reporting a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watchdog {
    /// Silence allowed before the first fix.
    pub first_fix_timeout: Duration,
    /// Silence allowed between samples once a fix was seen.
    pub signal_loss_timeout: Duration,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self {
            first_fix_timeout: Duration::from_secs(10),
            signal_loss_timeout: Duration::from_secs(30),
        }
    }
}

/// Apply one control to the session. Returns whether it took effect.
pub fn apply(session: &mut NavigationSession, control: Control) -> bool {
    match control {
        Control::Pause => session.pause(),
        Control::Resume => session.resume(),
        Control::Stop => session.stop(),
        Control::Recalculate => session.recalculate(),
        Control::SetVoice(enabled) => {
            session.set_voice_enabled(enabled);
            true
        }
        Control::ToggleVoice => {
            session.toggle_voice();
            true
        }
        Control::Status(reply) => {
            if reply.send(session.snapshot()).is_err() {
                debug!("Status requester went away");
            }
            true
        }
    }
}

/// Run `session` until it stops.
///
/// `events` is the receiver returned by [`NavigationSession::start`]. If the
/// feed stays silent past the watchdog limits the session is told via
/// [`LocationError::Timeout`] (no first fix) or [`LocationError::SignalLost`].
/// When both channels have closed the session is stopped.
///
/// Returns immediately for a session that is not active.
pub async fn drive(
    session: &mut NavigationSession,
    mut events: mpsc::Receiver<LocationEvent>,
    mut controls: mpsc::Receiver<Control>,
    watchdog: Watchdog,
) -> SessionState {
    let mut events_open = true;
    let mut controls_open = true;
    let mut got_fix = false;
    let mut reported_silence = false;
    let mut deadline = Instant::now() + watchdog.first_fix_timeout;

    while session.state().is_active() {
        if !events_open && !controls_open {
            info!("Location feed and controls closed, stopping session");
            session.stop();
            break;
        }

        tokio::select! {
            event = events.recv(), if events_open => match event {
                Some(event) => {
                    if matches!(event, LocationEvent::Sample(_)) {
                        got_fix = true;
                        reported_silence = false;
                        deadline = Instant::now() + watchdog.signal_loss_timeout;
                    }
                    session.handle_event(event);
                }
                None => {
                    warn!("Location feed closed");
                    events_open = false;
                }
            },
            control = controls.recv(), if controls_open => match control {
                Some(control) => {
                    debug!(?control, "Control received");
                    apply(session, control);
                }
                None => {
                    debug!("Control channel closed");
                    controls_open = false;
                }
            },
            () = sleep_until(deadline), if events_open && !reported_silence => {
                reported_silence = true;
                let err = if got_fix {
                    LocationError::signal_lost(format!(
                        "no sample for {}s",
                        watchdog.signal_loss_timeout.as_secs()
                    ))
                } else {
                    LocationError::Timeout {
                        after: watchdog.first_fix_timeout,
                    }
                };
                session.on_sensor_error(err);
            }
        }
    }

    session.state()
}
