//! Batch runner for applying one named image-editing action to a folder of
//! PNG images and reporting the outcome through a filesystem marker.
//!
//! One invocation processes one job: enumerate the source PNGs, apply the
//! configured action to each through an [`engine::ImageEngine`], write the
//! results under sequential names, and leave a `photoshop_done.tmp` signal
//! for the polling orchestrator.

pub mod cli;
pub mod engine;
pub mod error;
pub mod model;
pub mod runner;
pub mod signal;
