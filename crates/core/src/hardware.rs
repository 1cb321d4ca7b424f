//! Hardware resource arbiter — process-wide singletons shared by plugins.
//!
//! Plugins declare the resources they need; the arbiter creates each one
//! lazily on first demand and never twice. The reactor owns the arbiter, so
//! a plain "already created" check is all the guarding required.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::reactor::CoreMessage;

/// Default interval of the shared plugin timer.
pub const DEFAULT_TIMER_INTERVAL: Duration = Duration::from_secs(15);

/// A shared physical capability plugins can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HardwareResource {
    /// The 433 MHz radio receiver.
    Radio433,
    /// The 868 MHz radio receiver.
    Radio868,
    /// The shared periodic timer. Plugins must not run their own timers.
    Timer,
}

/// Entry point for radio transports to push raw timing samples inbound.
///
/// Cloneable; samples are broadcast to every plugin that declared the
/// resource, regardless of which device triggered the underlying interrupt.
#[derive(Debug, Clone)]
pub struct RadioInjector {
    resource: HardwareResource,
    sender: UnboundedSender<CoreMessage>,
}

impl RadioInjector {
    /// Feed one received signal into the core.
    pub fn inject(&self, samples: Vec<i32>) {
        let _ = self.sender.send(CoreMessage::RadioData {
            resource: self.resource,
            samples,
        });
    }
}

/// Guarantees at most one instance per resource kind exists process-wide.
pub struct HardwareArbiter {
    sender: UnboundedSender<CoreMessage>,
    timer_interval: Duration,
    timer: Option<tokio::task::JoinHandle<()>>,
    radios: HashMap<HardwareResource, RadioInjector>,
}

impl HardwareArbiter {
    /// Create an arbiter feeding the given reactor channel.
    #[must_use]
    pub fn new(sender: UnboundedSender<CoreMessage>, timer_interval: Duration) -> Self {
        Self {
            sender,
            timer_interval,
            timer: None,
            radios: HashMap::new(),
        }
    }

    /// Make sure every requested resource exists. Idempotent.
    pub fn ensure(&mut self, resources: &HashSet<HardwareResource>) {
        for resource in resources {
            match resource {
                HardwareResource::Timer => self.ensure_timer(),
                HardwareResource::Radio433 | HardwareResource::Radio868 => {
                    self.ensure_radio(*resource);
                }
            }
        }
    }

    fn ensure_timer(&mut self) {
        if self.timer.is_some() {
            return;
        }
        debug!(interval = ?self.timer_interval, "starting shared plugin timer");
        let sender = self.sender.clone();
        let interval = self.timer_interval;
        // tokio intervals complete their first tick immediately, which gives
        // plugins the bootstrap tick without waiting a full period.
        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if sender.send(CoreMessage::TimerTick).is_err() {
                    break;
                }
            }
        }));
    }

    fn ensure_radio(&mut self, resource: HardwareResource) {
        if self.radios.contains_key(&resource) {
            return;
        }
        debug!(?resource, "creating shared radio receiver");
        self.radios.insert(
            resource,
            RadioInjector {
                resource,
                sender: self.sender.clone(),
            },
        );
    }

    /// Whether the shared timer has been created.
    #[must_use]
    pub fn timer_active(&self) -> bool {
        self.timer.is_some()
    }

    /// The injector for a radio resource, if it has been created.
    #[must_use]
    pub fn radio_injector(&self, resource: HardwareResource) -> Option<RadioInjector> {
        self.radios.get(&resource).cloned()
    }

    /// Stop the timer task. Radios carry no background work to stop.
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for HardwareArbiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
