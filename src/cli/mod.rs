//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes the argument definition, the application state holding the provider
//! clients, the concurrent lookup and the rendering of its results.

mod commands;

pub use commands::*;
