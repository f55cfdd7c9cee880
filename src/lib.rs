// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! # dcd_tools: PSF topologies and DCD trajectories of linear chain molecules
//!
//! Rust library for writing simulations of linear chain molecules in a form
//! that can be visualized using VMD. The topology of the system is written into
//! a CHARMM psf file and the bead positions together with the simulation cell
//! are written into a CHARMM dcd trajectory.
//!
//! ## Usage
//!
//! Run
//!
//! ```bash
//! $ cargo add dcd_tools
//! ```
//!
//! Import the crate in your Rust code:
//! ```
//! use dcd_tools::prelude::*;
//! ```
//!
//! ## Examples
//!
//! #### Writing the topology and a trajectory
//!
//! Write a psf file for 10 chains of 4 beads and a dcd trajectory with 100 frames.
//!
//! ```no_run
//! use dcd_tools::prelude::*;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let mut system = ChainSystem::new(10, 4)?
//!         .with_cell(CellMatrix::orthorhombic([11.0, 12.0, 13.0]));
//!
//!     // write the topology
//!     system.write_psf("chain.psf")?;
//!
//!     // open the trajectory and write the header
//!     system.dcd_writer_init("chain.dcd")?;
//!
//!     for step in 0..100 {
//!         // move the beads (replace with your own simulation)
//!         for chain in 0..system.get_n_chains() {
//!             for bead in 0..system.get_n_beads() {
//!                 let position = Vector3D::new(
//!                     chain as f64 * 1.1,
//!                     bead as f64 * 1.2,
//!                     step as f64 * 0.01,
//!                 );
//!                 system.set_bead_position(chain, bead, position)?;
//!             }
//!         }
//!
//!         // append a frame to the trajectory
//!         system.traj_write_frame()?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! #### Using your own array of positions
//!
//! Positions can be copied from any array of shape `[nchains, nbeads, 3]`.
//! The cell matrix is a 3x3 array where each row is one cell vector.
//!
//! ```no_run
//! use dcd_tools::prelude::*;
//! use ndarray::Array3;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let rchains = Array3::<f64>::zeros((10, 4, 3));
//!     let hmatrix = [[11.0, 0.0, 0.0], [0.0, 12.0, 0.0], [0.0, 0.0, 13.0]];
//!
//!     let system = ChainSystem::from_positions(rchains)?.with_cell(CellMatrix::from(hmatrix));
//!
//!     let mut writer = DcdWriter::new(&system, "chain.dcd")?;
//!     writer.write_frame(&system)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! #### Changing the content of the written files
//!
//! Names, masses, and charges of the beads, as well as the title, timestep, and byte order
//! of the written files are controlled by `VisConfig`. It can be constructed in code or read from a YAML file.
//!
//! ```no_run
//! use dcd_tools::prelude::*;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let config = VisConfig::from_file("config.yaml")?
//!         .with_bead_name("CB")
//!         .with_save_frequency(1000);
//!
//!     let system = ChainSystem::new(10, 4)?.with_config(config);
//!     system.write_psf("chain.psf")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! #### Reading a trajectory
//!
//! Print the header of a dcd file and the position of the first bead in every frame.
//!
//! ```no_run
//! use dcd_tools::prelude::*;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let reader = DcdReader::open("chain.dcd")?;
//!     print!("{}", reader.get_header());
//!
//!     for frame in reader.print_progress(ProgressPrinter::new()) {
//!         let frame = frame?;
//!         println!("{:?}", frame.positions[0]);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## C interface
//! With the `capi` feature, the library exports the functions `write_psf`, `write_dcd_header`,
//! and `write_dcd_snapshot` with C linkage. See the [`capi`] module.
//!
//! ## Error handling
//! The individual error types provided by the `dcd_tools` are not exported into the `prelude` module.
//!
//! If you want to use specific error type from the `dcd_tools` library, you will have to include
//! it explicitly from the `errors` module. For instance:
//! ```
//! use dcd_tools::errors::WriteDcdError;
//! ```
//!
//! ## Features
//! - `serde`: serialization of vectors and cell matrices.
//! - `parallel`: trajectory writers associated with a system become thread-safe.
//! - `capi`: the C interface.
//!
//! ## License
//! This library is released under the MIT License.

/// Current version of the `dcd_tools` library.
pub const DCD_TOOLS_VERSION: &str = env!("CARGO_PKG_VERSION");

mod auxiliary;
#[cfg(feature = "capi")]
pub mod capi;
pub mod config;
pub mod errors;
pub mod files;
pub mod io {
    pub mod dcd_io;
    pub(crate) mod fortran;
    pub mod psf_io;
    pub mod traj_write;
}
pub mod progress;
pub mod structures {
    pub mod cell;
    pub mod vector3d;
}
pub mod system {
    pub mod general;
}
mod test_utilities;

/// Reexported basic `dcd_tools` structures and traits.
pub mod prelude {
    pub use crate::config::VisConfig;
    pub use crate::io::dcd_io::{DcdFrame, DcdHeader, DcdReader, DcdWriter};
    pub use crate::io::fortran::ByteOrder;
    pub use crate::io::traj_write::TrajWrite;
    pub use crate::progress::ProgressPrinter;
    pub use crate::structures::cell::CellMatrix;
    pub use crate::structures::vector3d::Vector3D;
    pub use crate::system::general::ChainSystem;
}
