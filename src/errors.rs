// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of errors that can be returned by the `dcd_tools` library.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur when constructing or modifying a `ChainSystem`.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChainSystemError {
    #[error("System must contain at least one chain and one bead per chain (requested {0} chain(s) of {1} bead(s)).")]
    EmptySystem(usize, usize),
    #[error("Positions of shape `{0:?}` do not match the system shape `{1:?}`.")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
    #[error("Bead `{1}` of chain `{0}` does not exist in the system.")]
    BeadNotFound(usize, usize),
    #[error("System of {0} chain(s) of {1} bead(s) is too large to be stored in memory.")]
    TooLarge(usize, usize),
}

/// Errors that can occur when working with the simulation cell.
#[derive(Error, Debug, PartialEq)]
pub enum CellError {
    #[error("Cell matrix is degenerate (volume `{0}`).")]
    Degenerate(f64),
    #[error("Cell matrix contains non-finite values.")]
    NotFinite,
    #[error("Unit cell `{0:?}` read from a DCD file could not be converted to a cell matrix.")]
    InvalidUnitCell([f64; 6]),
}

/// Errors that can occur when reading or validating the visualization configuration.
#[derive(Error, Debug)]
pub enum ParseConfigError {
    #[error("File `{0}` was not found.")]
    FileNotFound(Box<Path>),
    #[error("File `{0}` could not be read.")]
    CouldNotRead(Box<Path>),
    #[error("File `{0}` is not a yaml file.")]
    UnknownExtension(Box<Path>),
    #[error("Could not parse yaml configuration: `{0}`.")]
    CouldNotParseYaml(serde_yaml::Error),
    #[error("Value `{1}` of field `{0}` is longer than 4 characters.")]
    FieldTooLong(String, String),
    #[error("Field `{0}` can not be empty.")]
    FieldEmpty(String),
    #[error("Value `{1}` of field `{0}` may only contain printable ASCII characters without whitespace.")]
    FieldInvalid(String, String),
    #[error("Save frequency must be positive, not `{0}`.")]
    InvalidSaveFrequency(i32),
    #[error("Timestep `{0}` is not a finite number.")]
    InvalidTimestep(f32),
    #[error("Title `{0}` is longer than 80 characters.")]
    TitleTooLong(String),
    #[error("Title `{0:?}` contains control characters.")]
    TitleInvalid(String),
    #[error("Mass `{0}` is not a finite number.")]
    InvalidMass(f64),
    #[error("Charge `{0}` is not a finite number.")]
    InvalidCharge(f64),
}

/// Errors that can occur when writing a psf file.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WritePsfError {
    #[error("File `{0}` could not be created.")]
    CouldNotCreate(Box<Path>),
    #[error("Could not write line into file.")]
    CouldNotWrite,
    #[error("System contains `{0}` chains but psf files only support up to 9999 chains.")]
    TooManyChains(usize),
    #[error("System contains `{0}` beads but psf files only support up to 99,999,999 beads.")]
    TooManyAtoms(usize),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors that can occur when writing a dcd file.
#[derive(Error, Debug, PartialEq)]
pub enum WriteDcdError {
    #[error("File `{0}` could not be created.")]
    CouldNotCreate(Box<Path>),
    #[error("Could not write data into the dcd file.")]
    CouldNotWrite,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("System contains `{0}` beads but the dcd file was opened for `{1}` beads.")]
    AtomCountMismatch(usize, usize),
    #[error("System contains `{0}` beads but dcd files only support up to 2,147,483,647 atoms.")]
    TooManyAtoms(usize),
    #[error("Unit cell is expected to be written but the system has no cell matrix.")]
    MissingCell,
    #[error("Cell matrix can not be written: {0}")]
    InvalidCell(CellError),
    #[error("Coordinate `{0}` of bead `{1}` can not be written into a dcd file.")]
    CoordinateOutOfRange(f64, usize),
    #[error("Dcd file already contains `{0}` frames which is the maximum number of frames.")]
    TooManyFrames(usize),
    #[error("A previous write failed and the dcd file could not be restored. No further frames can be written.")]
    WriterFailed,
}

/// Errors that can occur when reading a dcd file.
#[derive(Error, Debug, PartialEq)]
pub enum ReadDcdError {
    #[error("File `{0}` was not found.")]
    FileNotFound(Box<Path>),
    #[error("File is not a dcd file (first record has length `{0}`).")]
    NotDcd(u32),
    #[error("File does not start with `CORD` but with `{0}`.")]
    InvalidMagic(String),
    #[error("Record size mismatch: leading marker `{0}`, trailing marker `{1}`.")]
    RecordSizeMismatch(u32, u32),
    #[error("Record has length `{0}` but `{1}` was expected.")]
    UnexpectedRecordLength(u32, u32),
    #[error("File ended unexpectedly.")]
    UnexpectedEof,
    #[error("Could not read from the dcd file.")]
    CouldNotRead,
    #[error("Dcd file contains `{0}` atoms but the system contains `{1}` beads.")]
    AtomCountMismatch(usize, usize),
    #[error("Dcd file reports `{0}` atoms which is not a supported number of atoms.")]
    InvalidAtomCount(i32),
    #[error("Dcd feature is not supported: {0}")]
    Unsupported(String),
    #[error("Step `{0}` is not a valid iteration step.")]
    InvalidStep(usize),
    #[error("Unit cell could not be read: {0}")]
    InvalidCell(CellError),
}

/// Errors that can occur when working with trajectory writers associated with a `ChainSystem`.
#[derive(Error, Debug, PartialEq)]
pub enum WriteTrajError {
    #[error("File `{0}` has an unknown or unsupported file extension.")]
    UnknownExtension(Box<Path>),
    #[error("Writer for file `{0}` is already associated with the system.")]
    WriterAlreadyExists(String),
    #[error("No writer for file `{0}` is associated with the system.")]
    WriterNotFound(String),
    #[error("{0}")]
    Dcd(WriteDcdError),
}

impl From<WriteDcdError> for WriteTrajError {
    fn from(e: WriteDcdError) -> Self {
        WriteTrajError::Dcd(e)
    }
}
