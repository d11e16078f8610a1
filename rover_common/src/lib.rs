//! Rover Common Library
//!
//! Shared types for the rover obstacle guard workspace: configuration
//! loading, constants, the hardware seams the control loop talks to, and
//! the event interface used for operator-facing reporting.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Default constants (pins, thresholds, timing)
//! - [`hal`] - Rangefinder / actuator traits, sample types, driver config
//! - [`event`] - `EventSink` interface and standard sinks
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rover_common::prelude::*;
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod consts;
pub mod event;
pub mod hal;
pub mod prelude;
