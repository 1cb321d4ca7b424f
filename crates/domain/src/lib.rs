//! # casahub-domain
//!
//! Pure domain model for the casahub home automation hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **DeviceClasses** (immutable capability templates contributed by plugins)
//! - Define **Devices** (configured instances with live parameter and state values)
//! - Define **Events** (instantaneous facts emitted by plugins)
//! - Define **Rules** (event descriptors → state evaluator → actions)
//! - Contain all matching and evaluation logic that needs no IO
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `core`, adapters, plugins, or external
//! IO crates. All IO boundaries are expressed as traits in the `core` crate
//! (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod descriptor;
pub mod device;
pub mod device_class;
pub mod event;
pub mod param;
pub mod rule;
pub mod state;
pub mod state_evaluator;
pub mod vendor;
