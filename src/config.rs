// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of the VisConfig structure controlling the content of the written files.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::auxiliary::{DCD_TITLE_LENGTH, PSF_FIELD_WIDTH};
use crate::errors::ParseConfigError;
use crate::files::FileType;
use crate::io::fortran::ByteOrder;

/// Parameters of the written psf and dcd files.
///
/// All beads of all chains share the same segment, residue name, name, type, mass, and charge.
/// Every field is optional when the configuration is read from a YAML file; missing fields
/// take their default values.
///
/// ## Example YAML file
/// ```yaml
/// ---
/// title: Hard-sphere chains
/// segment: HSC
/// bead_name: CB
/// timestep: 0.002
/// save_frequency: 500
/// byte_order: little
/// ...
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisConfig {
    /// Title written into the psf REMARKS line and into the dcd title record.
    pub title: String,
    /// Segment identifier of all beads.
    pub segment: String,
    /// Residue name of all beads.
    pub residue_name: String,
    /// Atom name of all beads.
    pub bead_name: String,
    /// Atom type of all beads.
    pub bead_type: String,
    /// Mass of a bead.
    pub mass: f64,
    /// Charge of a bead.
    pub charge: f64,
    /// Time between two simulation steps (`DELTA` in the dcd header).
    pub timestep: f32,
    /// Number of simulation steps between two saved frames (`NSAVC` in the dcd header).
    pub save_frequency: i32,
    /// Simulation step of the first saved frame (`ISTART` in the dcd header).
    pub first_step: i32,
    /// Should the unit cell be written with every frame?
    pub unit_cell: bool,
    /// Byte order of the written dcd file.
    pub byte_order: ByteOrder,
}

impl Default for VisConfig {
    fn default() -> Self {
        VisConfig {
            title: String::from("Linear chain molecules written by dcd_tools"),
            segment: String::from("CHN"),
            residue_name: String::from("BEAD"),
            bead_name: String::from("C"),
            bead_type: String::from("C"),
            mass: 1.0,
            charge: 0.0,
            timestep: 1.0,
            save_frequency: 1,
            first_step: 0,
            unit_cell: true,
            byte_order: ByteOrder::Native,
        }
    }
}

impl VisConfig {
    /// Read the configuration from a YAML file.
    ///
    /// The file must have the `yaml` or `yml` extension.
    ///
    /// ## Returns
    /// `VisConfig` if the file could be read, parsed, and validated. `ParseConfigError` otherwise.
    pub fn from_file(filename: impl AsRef<Path>) -> Result<Self, ParseConfigError> {
        if FileType::from_name(&filename) != FileType::YAML {
            return Err(ParseConfigError::UnknownExtension(Box::from(
                filename.as_ref(),
            )));
        }

        let mut file = File::open(filename.as_ref())
            .map_err(|_| ParseConfigError::FileNotFound(Box::from(filename.as_ref())))?;

        let mut yaml = String::new();
        file.read_to_string(&mut yaml)
            .map_err(|_| ParseConfigError::CouldNotRead(Box::from(filename.as_ref())))?;

        VisConfig::from_yaml(&yaml)
    }

    /// Parse the configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ParseConfigError> {
        let config: VisConfig =
            serde_yaml::from_str(yaml).map_err(ParseConfigError::CouldNotParseYaml)?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration into a YAML string.
    ///
    /// ## Panics
    /// Panics if the serialization fails which should never happen.
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self)
            .expect("FATAL DCD_TOOLS ERROR | VisConfig::to_yaml | Could not serialize configuration.")
    }

    /// Check that the configuration can be written into psf and dcd files.
    pub fn validate(&self) -> Result<(), ParseConfigError> {
        for (field, value) in [
            ("segment", &self.segment),
            ("residue_name", &self.residue_name),
            ("bead_name", &self.bead_name),
            ("bead_type", &self.bead_type),
        ] {
            if value.trim().is_empty() {
                return Err(ParseConfigError::FieldEmpty(field.to_owned()));
            }

            // psf columns are fixed-width and whitespace-separated
            if !value.chars().all(|c| c.is_ascii_graphic()) {
                return Err(ParseConfigError::FieldInvalid(
                    field.to_owned(),
                    value.to_owned(),
                ));
            }

            if value.chars().count() > PSF_FIELD_WIDTH {
                return Err(ParseConfigError::FieldTooLong(
                    field.to_owned(),
                    value.to_owned(),
                ));
            }
        }

        if self.title.len() > DCD_TITLE_LENGTH {
            return Err(ParseConfigError::TitleTooLong(self.title.clone()));
        }

        if self.title.chars().any(char::is_control) {
            return Err(ParseConfigError::TitleInvalid(self.title.clone()));
        }

        if !self.mass.is_finite() {
            return Err(ParseConfigError::InvalidMass(self.mass));
        }

        if !self.charge.is_finite() {
            return Err(ParseConfigError::InvalidCharge(self.charge));
        }

        if self.save_frequency <= 0 {
            return Err(ParseConfigError::InvalidSaveFrequency(self.save_frequency));
        }

        if !self.timestep.is_finite() {
            return Err(ParseConfigError::InvalidTimestep(self.timestep));
        }

        Ok(())
    }

    /// Create new `VisConfig` with specific `title`.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    /// Create new `VisConfig` with specific `segment`.
    pub fn with_segment(mut self, segment: &str) -> Self {
        self.segment = segment.to_owned();
        self
    }

    /// Create new `VisConfig` with specific `residue_name`.
    pub fn with_residue_name(mut self, residue_name: &str) -> Self {
        self.residue_name = residue_name.to_owned();
        self
    }

    /// Create new `VisConfig` with specific `bead_name`.
    pub fn with_bead_name(mut self, bead_name: &str) -> Self {
        self.bead_name = bead_name.to_owned();
        self
    }

    /// Create new `VisConfig` with specific `bead_type`.
    pub fn with_bead_type(mut self, bead_type: &str) -> Self {
        self.bead_type = bead_type.to_owned();
        self
    }

    /// Create new `VisConfig` with specific bead `mass`.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Create new `VisConfig` with specific bead `charge`.
    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    /// Create new `VisConfig` with specific `timestep`.
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Create new `VisConfig` with specific `save_frequency`.
    pub fn with_save_frequency(mut self, save_frequency: i32) -> Self {
        self.save_frequency = save_frequency;
        self
    }

    /// Create new `VisConfig` with specific `first_step`.
    pub fn with_first_step(mut self, first_step: i32) -> Self {
        self.first_step = first_step;
        self
    }

    /// Create new `VisConfig` with unit cell writing turned on or off.
    pub fn with_unit_cell(mut self, unit_cell: bool) -> Self {
        self.unit_cell = unit_cell;
        self
    }

    /// Create new `VisConfig` with specific `byte_order`.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

/******************************/
/*         UNIT TESTS         */
/******************************/
