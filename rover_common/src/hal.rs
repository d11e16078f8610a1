//! Hardware abstraction seams.
//!
//! This module contains the traits the control loop drives, the sample
//! types flowing through them and the configuration of the drivers.

pub mod config;
pub mod driver;
pub mod types;
