//! rover_control: entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  SimPwmPort / IoctlPwmPort   ThreadSpawner               │
//! │  (DevicePort)                (TaskSpawner)               │
//! │  LogEventSink                JsonConfigFile              │
//! │  (EventSink)                 (ConfigPort)                │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ───────────────     │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │   Dispatcher · Worker (pure logic)             │      │
//! │  │   StateCell · arming interlock                 │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `rover_control {start|stop|status} [params]`.  Once a worker has been
//! spawned the process keeps serving commands read line by line from
//! stdin, since the worker lives only as long as the process.  At EOF it
//! waits for running workers and exits with the first command's code.
#![deny(unused_must_use)]

use std::io::BufRead;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tracing_subscriber::EnvFilter;

use rovercontrol::adapters::config_file::{CONFIG_PATH_ENV, JsonConfigFile};
use rovercontrol::adapters::log_sink::LogEventSink;
use rovercontrol::adapters::thread_spawner::ThreadSpawner;
use rovercontrol::app::dispatcher::Dispatcher;
use rovercontrol::app::ports::{ConfigPort, DevicePort};
use rovercontrol::config::RoverConfig;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    #[cfg(feature = "nuttx")]
    let device = rovercontrol::adapters::pwm_ioctl::IoctlPwmPort;
    #[cfg(not(feature = "nuttx"))]
    let device = rovercontrol::adapters::sim_pwm::SimPwmPort::new(config.device_path.clone());

    run(config, device, &args)
}

fn load_config() -> Result<RoverConfig> {
    let Some(path) = std::env::var_os(CONFIG_PATH_ENV) else {
        return Ok(RoverConfig::default());
    };
    let store = JsonConfigFile::new(path);
    let config = store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))?;
    Ok(config)
}

fn run<D: DevicePort>(config: RoverConfig, device: D, args: &[String]) -> Result<ExitCode> {
    let spawner = Arc::new(ThreadSpawner::new());
    let mut dispatcher = Dispatcher::new(config, device, Arc::clone(&spawner), LogEventSink::new());

    let code = dispatcher.dispatch(args);
    if spawner.spawned() == 0 {
        return Ok(ExitCode::from(code));
    }

    info!("worker running; reading commands from stdin (EOF to exit)");
    for line in std::io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        let words: Vec<&str> = line.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        dispatcher.dispatch(&words);
    }

    spawner.join_all();
    Ok(ExitCode::from(code))
}
