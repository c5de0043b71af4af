//! Availability timeline construction.
//!
//! This module provides:
//! - Expansion of weekly time-map rules into concrete availability windows
//! - Interval subtraction for busy, pinned, and already-placed time

mod subtract;
mod window;

pub use subtract::{subtract_busy, subtract_span};
pub use window::{build_windows, Slot};
