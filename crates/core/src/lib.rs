//! # casahub-core
//!
//! Application core — the device registry and rule automation engine.
//!
//! ## Responsibilities
//! - Define **port traits** that the outside world implements:
//!   - [`ports::plugin::DevicePlugin`] — the boundary every device plugin implements
//!   - [`ports::storage`] — repositories for devices and rules
//! - Hold the **capability registry** of plugin-contributed device classes
//! - Own configured **devices** and their live state values
//! - Arbitrate shared **hardware resources** (radios, the plugin timer)
//! - Drive the **pairing** state machine for multi-step device setup
//! - Evaluate **rules** against incoming events and collect actions
//! - Run the single-threaded **reactor** that keeps all of the above
//!   consistent under concurrent event arrival
//!
//! ## Dependency rule
//! Depends on `casahub-domain` only (plus `tokio::sync`/`tokio::time` for
//! channels and the timer). Never imports adapter or plugin crates; those
//! depend on *this* crate, not the reverse.

pub mod device_store;
pub mod hardware;
pub mod notify;
pub mod pairing;
pub mod ports;
pub mod reactor;
pub mod registry;
pub mod rule_engine;
