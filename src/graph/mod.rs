//! Rule graph analysis.
//!
//! Co-run rules form a directed graph over task IDs; phase-window rules
//! attach intervals to its nodes.

pub mod corun;

pub use corun::{overlaps, CoRunGraph, PhaseWindows, WindowConflict};
