//! # casahubd — casahub daemon
//!
//! Composition root that wires storage and plugins into the core and runs
//! the reactor.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Construct the storage adapter
//! - Construct the [`Core`], registering every enabled plugin
//! - Load persisted devices and rules
//! - Run the reactor until SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use casahub_adapter_storage_json::JsonStorage;
use casahub_core::reactor::{Core, CoreConfig, CoreMessage};
use casahub_plugin_virtual::VirtualPlugin;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let storage = JsonStorage::new(&config.storage.dir);
    let core_config = CoreConfig {
        timer_interval: Duration::from_secs(config.hardware.timer_interval_secs),
        ..CoreConfig::default()
    };
    let mut core = Core::new(storage.clone(), storage, core_config);

    if config.plugins.virtual_enabled {
        core.register_plugin(Box::new(VirtualPlugin::new()))?;
    }

    core.load().await?;
    info!(
        devices = core.devices().devices().count(),
        rules = core.rules().rule_ids().len(),
        "casahubd loaded"
    );

    let shutdown = core.message_sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            let _ = shutdown.send(CoreMessage::Shutdown);
        }
    });

    core.run().await;
    Ok(())
}
