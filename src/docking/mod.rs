//! Docking step
//!
//! The docking program itself is opaque. This module defines the
//! [`DockingHandler`] seam, the CLI implementation that runs the external
//! executable, and collection of the poses it writes.
//!
//! - [`CliDockingHandler`]: runs the configured DOCK binary
//! - [`clear_previous_output`]: removes poses an earlier run left behind
//! - [`collect_output`]: turns `test.mol2.gz` into the final `output.mol2`

mod cli;
mod output;
mod traits;

pub use cli::CliDockingHandler;
pub use output::{DOCKED_POSES, DOCKED_POSES_GZ, clear_previous_output, collect_output};
pub use traits::DockingHandler;
