//! Defines the data structures and models used throughout the application.
//!
//! This includes the validated hardware address a lookup is keyed on and the
//! normalized per-provider result that the CLI renders.

mod bssid;
mod location;

pub use bssid::*;
pub use location::*;
