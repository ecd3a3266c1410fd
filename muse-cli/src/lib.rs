//! Command-line front end for the muse creative studio.
//!
//! The binary wires a [`muse::Studio`] to the terminal; this library holds the
//! parts worth testing on their own.

pub mod selector;
pub mod workbench;

pub use selector::TerminalSelector;
pub use workbench::Workbench;
