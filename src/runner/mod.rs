//! Batch run orchestration.
//!
//! Owns the per-job run lifecycle: startup delay, destination preparation,
//! source enumeration and ordering, the sequential per-file action loop, and
//! sequence naming. Presentation layers consume the emitted run events.

mod batch;
mod naming;

pub use batch::BatchRunner;
pub use naming::{output_file_name, pad};
