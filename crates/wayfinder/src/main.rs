//! `wayfind` - CLI for wayfinder
//!
//! Runs a guided session over a route file, either replaying a recorded
//! track or simulating a traveler walking the route.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use wayfinder::announce::{Announcer, ConsoleAnnouncer, TracingAnnouncer};
use wayfinder::cli::{
    Cli, Command, ConfigCommand, ConsoleCommand, NavigateCommand, OutputFormat, RouteCommand,
    CONSOLE_HELP,
};
use wayfinder::geo::format_distance;
use wayfinder::location::{synthesize_track, ReplaySource};
use wayfinder::navigation::{drive, Control, SessionEnd, SessionSnapshot};
use wayfinder::route::JsonFileSupplier;
use wayfinder::{init_logging, Config, LiveLocation, NavigationSession, Route, RouteSupplier};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Navigate(cmd) => handle_navigate(&config, cmd).await,
        Command::Route(cmd) => handle_route(&config, cmd).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

async fn load_route(path: &Path) -> anyhow::Result<Route> {
    JsonFileSupplier::new(path)
        .route()
        .await
        .with_context(|| format!("failed to load route from {}", path.display()))
}

fn load_track(path: &Path) -> anyhow::Result<Vec<LiveLocation>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read track {}", path.display()))?;
    let track: Vec<LiveLocation> = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse track {}", path.display()))?;
    Ok(track)
}

fn interval_or_default(config: &Config, interval_ms: Option<u64>) -> Duration {
    interval_ms.map_or_else(|| config.sample_interval(), Duration::from_millis)
}

async fn handle_navigate(config: &Config, cmd: NavigateCommand) -> anyhow::Result<()> {
    let route = load_route(&cmd.route).await?;
    let interval = interval_or_default(config, cmd.interval_ms);

    let track = match &cmd.track {
        Some(path) => load_track(path)?,
        None => {
            let speed = cmd.speed.unwrap_or(config.location.walking_speed_mps);
            synthesize_track(&route, speed, interval)?
        }
    };
    debug!(samples = track.len(), "Track ready");

    let mut settings = config.session_settings();
    if cmd.no_voice {
        settings.voice_enabled = false;
    }

    // Keep stdout for the JSON summary when asked for it.
    let announcer: Box<dyn Announcer> = if cmd.json {
        Box::new(TracingAnnouncer)
    } else {
        Box::new(ConsoleAnnouncer)
    };

    let (end_tx, end_rx) = oneshot::channel();
    let source = ReplaySource::new(track, interval);
    let mut session = NavigationSession::new(route, Box::new(source), &settings)?
        .with_announcer(announcer)
        .on_end(move |end| {
            let _ = end_tx.send(end);
        });

    let events = session.start()?;
    let (control_tx, controls) = mpsc::channel(8);
    if !cmd.json {
        eprintln!("{CONSOLE_HELP}");
    }
    spawn_console(control_tx);

    drive(&mut session, events, controls, config.watchdog()).await;

    let end = end_rx.await.ok();
    print_summary(end.as_ref(), &session.snapshot(), cmd.json)
}

/// Read console commands on a dedicated thread and forward them as controls.
///
/// The thread is detached; it ends at EOF or when the session drops the
/// control receiver.
fn spawn_console(tx: mpsc::Sender<Control>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<ConsoleCommand>() {
                Ok(command) => command,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            };

            let sent = match command {
                ConsoleCommand::Help => {
                    eprintln!("{CONSOLE_HELP}");
                    Ok(())
                }
                ConsoleCommand::Status => {
                    let (reply_tx, reply_rx) = oneshot::channel();
                    let sent = tx.blocking_send(Control::Status(reply_tx));
                    if let Ok(snapshot) = reply_rx.blocking_recv() {
                        print_status(&snapshot);
                    }
                    sent
                }
                ConsoleCommand::Pause => tx.blocking_send(Control::Pause),
                ConsoleCommand::Resume => tx.blocking_send(Control::Resume),
                ConsoleCommand::Stop => tx.blocking_send(Control::Stop),
                ConsoleCommand::Recalculate => tx.blocking_send(Control::Recalculate),
                ConsoleCommand::Voice(Some(on)) => tx.blocking_send(Control::SetVoice(on)),
                ConsoleCommand::Voice(None) => tx.blocking_send(Control::ToggleVoice),
            };
            if sent.is_err() {
                debug!("Session finished, console reader exiting");
                break;
            }
        }
    });
}

fn print_status(snapshot: &SessionSnapshot) {
    eprintln!(
        "[{}] step {}/{} | {} to next turn | {} remaining | delay {}s | voice {} | eta {}",
        snapshot.state,
        (snapshot.step_index + 1).min(snapshot.step_count),
        snapshot.step_count,
        format_distance(snapshot.distance_to_next_turn_m),
        format_distance(snapshot.remaining_distance_m),
        snapshot.accumulated_delay_s,
        if snapshot.voice_enabled { "on" } else { "off" },
        snapshot
            .eta
            .map_or_else(|| "-".to_string(), |eta| eta.format("%H:%M:%S").to_string()),
    );
}

fn print_summary(
    end: Option<&SessionEnd>,
    snapshot: &SessionSnapshot,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let summary = serde_json::json!({
            "end": end,
            "session": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!();
    println!("Session summary");
    println!("---------------");
    match end {
        Some(end) => {
            println!("Ended:           {:?}", end.reason);
            println!("Steps completed: {}/{}", end.step_index, snapshot.step_count);
            println!("Samples:         {}", end.samples_processed);
            println!("Traffic delay:   {}s", end.accumulated_delay_s);
        }
        None => {
            warn!("Session ended without reporting");
            println!("State:           {}", snapshot.state);
        }
    }
    Ok(())
}

async fn handle_route(config: &Config, cmd: RouteCommand) -> anyhow::Result<()> {
    match cmd {
        RouteCommand::Show { route, format } => {
            let route = load_route(&route).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&route)?),
                OutputFormat::Table => print_route(&route),
            }
        }
        RouteCommand::Validate { route: path } => {
            let route = load_route(&path).await?;
            println!(
                "{}: OK ({} steps, {}, {} min)",
                path.display(),
                route.step_count(),
                format_distance(route.total_distance_m),
                route.total_duration_s.div_ceil(60)
            );
        }
        RouteCommand::Simulate {
            route,
            speed,
            interval_ms,
            format,
        } => {
            let route = load_route(&route).await?;
            let speed = speed.unwrap_or(config.location.walking_speed_mps);
            let interval = interval_or_default(config, interval_ms);
            let track = synthesize_track(&route, speed, interval)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&track)?),
                OutputFormat::Table => {
                    println!("{:>5}  {:>11}  {:>11}  {:>7}", "#", "LAT", "LNG", "HEADING");
                    for (i, sample) in track.iter().enumerate() {
                        println!(
                            "{:>5}  {:>11.6}  {:>11.6}  {:>7.1}",
                            i,
                            sample.lat,
                            sample.lng,
                            sample.heading.unwrap_or_default()
                        );
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_route(route: &Route) {
    println!(
        "Route: {} -> {} ({}, {}, {} min)",
        route.start,
        route.end,
        route.mode,
        format_distance(route.total_distance_m),
        route.total_duration_s.div_ceil(60)
    );
    println!();
    println!("{:>3}  {:<11}  {:>9}  {:>6}  INSTRUCTION", "#", "MANEUVER", "DISTANCE", "TIME");
    for (i, step) in route.steps.iter().enumerate() {
        println!(
            "{:>3}  {:<11}  {:>9}  {:>5}s  {}",
            i + 1,
            step.maneuver.to_string(),
            format_distance(step.distance_m),
            step.duration_s,
            step.instruction
        );
        if let Some(note) = &step.accessibility_note {
            println!("{:>36}  note: {note}", "");
        }
        if let Some(warning) = &step.warning {
            println!("{:>36}  caution: {warning}", "");
        }
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Navigation]");
                println!("  Advance threshold:  {} m", config.navigation.advance_threshold_m);
                println!("  Announce interval:  {}s", config.navigation.announce_interval_secs);
                println!("  Voice enabled:      {}", config.navigation.voice_enabled);
                println!();
                println!("[Location]");
                println!("  Sample interval:    {} ms", config.location.sample_interval_ms);
                println!("  First fix timeout:  {}s", config.location.first_fix_timeout_secs);
                println!("  Signal loss after:  {}s", config.location.signal_loss_timeout_secs);
                println!("  Channel capacity:   {}", config.location.channel_capacity);
                println!("  Walking speed:      {} m/s", config.location.walking_speed_mps);
                println!();
                println!("[Traffic]");
                println!(
                    "  Delay range:        {}-{}s",
                    config.traffic.min_delay_secs, config.traffic.max_delay_secs
                );
                println!("  Seed:               {}", config.traffic.seed);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            match Config::load_from(Some(path.clone())) {
                Ok(_) => println!("Configuration is valid: {}", path.display()),
                Err(e) => anyhow::bail!("invalid configuration in {}: {e}", path.display()),
            }
        }
    }
    Ok(())
}
