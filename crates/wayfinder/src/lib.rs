//! `wayfinder` - Real-time turn-by-turn navigation
//!
//! This library follows a precomputed route step by step from a stream of
//! location samples, decides when to speak instructions, and keeps an
//! arrival estimate current as traffic delays accumulate.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod announce;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod location;
pub mod logging;
pub mod map;
pub mod navigation;
pub mod route;

pub use config::Config;
pub use error::{Error, Result};
pub use geo::GeoPoint;
pub use location::{LiveLocation, LocationError, LocationEvent, LocationSource};
pub use logging::init_logging;
pub use navigation::{NavigationSession, SessionSettings, SessionState};
pub use route::{NavigationStep, Route, RouteSupplier};
