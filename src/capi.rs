// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! C interface for writing psf and dcd files of linear chain molecules.
//!
//! The functions are declared in `include/dcd_tools.h`:
//! ```c
//! int write_psf(int nchains, int nbeads);
//! int write_dcd_header(int nchains, int nbeads);
//! int write_dcd_snapshot(int nchains, int nbeads, const double *rchains, const double cell_matrix[3][3]);
//! ```
//!
//! The topology is written into `chain.psf` and the trajectory into `chain.dcd`, both in the
//! current working directory. `rchains` is a contiguous array of shape `[nchains][nbeads][3]`.
//! Each row of `cell_matrix` is one cell vector.
//!
//! All functions return [`CAPI_SUCCESS`] on success. Otherwise the error is printed to stderr
//! and one of the other `CAPI_*` codes is returned. Panics never unwind into the caller.

use ndarray::ArrayView3;
use parking_lot::Mutex;
use std::os::raw::{c_double, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use crate::config::VisConfig;
use crate::errors::{WriteDcdError, WritePsfError};
use crate::io::dcd_io::DcdWriter;
use crate::io::psf_io;
use crate::structures::cell::CellMatrix;

/// The operation succeeded.
pub const CAPI_SUCCESS: c_int = 0;
/// Counts are not positive, too large for the file format, or a pointer is null.
pub const CAPI_INVALID_ARGUMENTS: c_int = 1;
/// `write_dcd_snapshot` was called without a matching `write_dcd_header`.
pub const CAPI_NO_HEADER: c_int = 2;
/// The file could not be created or written.
pub const CAPI_WRITE_ERROR: c_int = 3;

/// Name of the psf file written by `write_psf`.
pub const PSF_FILENAME: &str = "chain.psf";
/// Name of the dcd file written by `write_dcd_header` and `write_dcd_snapshot`.
pub const DCD_FILENAME: &str = "chain.dcd";

/// Dcd file opened by `write_dcd_header`.
struct OpenTrajectory {
    writer: DcdWriter,
    nchains: usize,
    nbeads: usize,
}

static TRAJECTORY: Mutex<Option<OpenTrajectory>> = Mutex::new(None);

/// Write the topology of `nchains` linear chains of `nbeads` beads into `chain.psf`.
#[no_mangle]
pub extern "C" fn write_psf(nchains: c_int, nbeads: c_int) -> c_int {
    guarded("write_psf", || psf_to_file(PSF_FILENAME, nchains, nbeads))
}

/// Create `chain.dcd` and write its header for `nchains` linear chains of `nbeads` beads.
///
/// A previously opened dcd file is closed.
#[no_mangle]
pub extern "C" fn write_dcd_header(nchains: c_int, nbeads: c_int) -> c_int {
    guarded("write_dcd_header", || {
        open_trajectory(&TRAJECTORY, DCD_FILENAME, nchains, nbeads)
    })
}

/// Append a frame to `chain.dcd`.
///
/// # Safety
/// `rchains` must point to `nchains * nbeads * 3` readable doubles and
/// `cell_matrix` must point to 3 readable rows of 3 doubles.
#[no_mangle]
pub unsafe extern "C" fn write_dcd_snapshot(
    nchains: c_int,
    nbeads: c_int,
    rchains: *const c_double,
    cell_matrix: *const [c_double; 3],
) -> c_int {
    guarded("write_dcd_snapshot", || {
        if rchains.is_null() || cell_matrix.is_null() {
            eprintln!("write_dcd_snapshot: positions or cell matrix is a null pointer");
            return CAPI_INVALID_ARGUMENTS;
        }

        let Some((n_chains, n_beads)) = counts(nchains, nbeads) else {
            return CAPI_INVALID_ARGUMENTS;
        };

        let (positions, cell) = unsafe {
            (
                std::slice::from_raw_parts(rchains, n_chains * n_beads * 3),
                std::slice::from_raw_parts(cell_matrix, 3),
            )
        };

        write_snapshot(
            &TRAJECTORY,
            (n_chains, n_beads),
            positions,
            [cell[0], cell[1], cell[2]],
        )
    })
}

/// Run the body of an exported function. A panic is reported as `CAPI_WRITE_ERROR`.
fn guarded(name: &str, body: impl FnOnce() -> c_int) -> c_int {
    panic::catch_unwind(AssertUnwindSafe(body)).unwrap_or_else(|_| {
        eprintln!("{}: internal error", name);
        CAPI_WRITE_ERROR
    })
}

/// Convert the counts received from C and check that they are positive
/// and that the total number of coordinates can be addressed.
fn counts(nchains: c_int, nbeads: c_int) -> Option<(usize, usize)> {
    if nchains <= 0 || nbeads <= 0 {
        eprintln!(
            "number of chains ({}) and number of beads ({}) must be positive",
            nchains, nbeads
        );
        return None;
    }

    let (nchains, nbeads) = (nchains as usize, nbeads as usize);
    if nchains
        .checked_mul(nbeads)
        .and_then(|x| x.checked_mul(3))
        .is_none()
    {
        eprintln!(
            "system of {} chain(s) of {} bead(s) is too large",
            nchains, nbeads
        );
        return None;
    }

    Some((nchains, nbeads))
}

fn psf_to_file(filename: impl AsRef<Path>, nchains: c_int, nbeads: c_int) -> c_int {
    let Some((nchains, nbeads)) = counts(nchains, nbeads) else {
        return CAPI_INVALID_ARGUMENTS;
    };

    match psf_io::write_psf(filename, nchains, nbeads, &VisConfig::default()) {
        Ok(_) => CAPI_SUCCESS,
        Err(e @ (WritePsfError::TooManyChains(_) | WritePsfError::TooManyAtoms(_))) => {
            eprintln!("{}", e);
            CAPI_INVALID_ARGUMENTS
        }
        Err(e) => {
            eprintln!("{}", e);
            CAPI_WRITE_ERROR
        }
    }
}

fn open_trajectory(
    trajectory: &Mutex<Option<OpenTrajectory>>,
    filename: impl AsRef<Path>,
    nchains: c_int,
    nbeads: c_int,
) -> c_int {
    let Some((nchains, nbeads)) = counts(nchains, nbeads) else {
        return CAPI_INVALID_ARGUMENTS;
    };

    let mut guard = trajectory.lock();
    // close the previous file before a file with the same name is recreated
    *guard = None;

    match DcdWriter::create(filename, nchains * nbeads, &VisConfig::default()) {
        Ok(writer) => {
            *guard = Some(OpenTrajectory {
                writer,
                nchains,
                nbeads,
            });
            CAPI_SUCCESS
        }
        Err(e @ WriteDcdError::TooManyAtoms(_)) => {
            eprintln!("{}", e);
            CAPI_INVALID_ARGUMENTS
        }
        Err(e) => {
            eprintln!("{}", e);
            CAPI_WRITE_ERROR
        }
    }
}

fn write_snapshot(
    trajectory: &Mutex<Option<OpenTrajectory>>,
    (nchains, nbeads): (usize, usize),
    positions: &[f64],
    cell_matrix: [[f64; 3]; 3],
) -> c_int {
    let mut guard = trajectory.lock();
    let open = match guard.as_mut() {
        Some(x) => x,
        None => {
            eprintln!("dcd header must be written before the first snapshot");
            return CAPI_NO_HEADER;
        }
    };

    if open.nchains != nchains || open.nbeads != nbeads {
        eprintln!(
            "snapshot of {} chain(s) of {} bead(s) does not match the dcd header ({} chain(s) of {} bead(s))",
            nchains, nbeads, open.nchains, open.nbeads
        );
        return CAPI_NO_HEADER;
    }

    let view = match ArrayView3::from_shape((nchains, nbeads, 3), positions) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}", e);
            return CAPI_INVALID_ARGUMENTS;
        }
    };

    let cell = CellMatrix::from(cell_matrix);
    match open.writer.write_positions(view, Some(&cell)) {
        Ok(_) => CAPI_SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            CAPI_WRITE_ERROR
        }
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
