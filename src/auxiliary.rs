// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Simple, auxiliary functions and constants used through the `dcd_tools` library.

use std::path::Path;

/******************************/
/*         CONSTANTS          */
/******************************/

/// Largest number of chains a psf file can number (residue id field is 4 characters wide).
pub(crate) const PSF_MAX_CHAINS: usize = 9999;
/// Largest number of beads a psf file can number (atom index field is 8 characters wide).
pub(crate) const PSF_MAX_ATOMS: usize = 99_999_999;
/// Number of bonded pairs written on a single line of the psf bond block.
pub(crate) const PSF_BONDS_PER_LINE: usize = 4;
/// Width of string fields (segment, residue name, atom name, atom type) in a psf file.
pub(crate) const PSF_FIELD_WIDTH: usize = 4;

/// Magic string at the start of every dcd file.
pub(crate) const DCD_MAGIC: &[u8; 4] = b"CORD";
/// Version of CHARMM the written dcd files claim to be compatible with.
pub(crate) const DCD_CHARMM_VERSION: i32 = 24;
/// Length of a single title line in a dcd file.
pub(crate) const DCD_TITLE_LENGTH: usize = 80;
/// Length of the first record of a dcd file (magic + 20 control integers).
pub(crate) const DCD_HEADER_RECORD_LENGTH: u32 = 84;

/// Largest absolute coordinate that can be safely stored in a dcd file.
pub(crate) const DCD_MAX_COORDINATE: f64 = f32::MAX as f64;

/******************************/
/*           OTHER            */
/******************************/

/// Convert `impl AsRef<Path>` to `String` panicking with an error message in case the conversion fails.
#[inline(always)]
pub(crate) fn path2string(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .to_str()
        .expect("FATAL DCD_TOOLS ERROR | auxiliary::path2string | Could not convert Path to &str.")
        .to_owned()
}

/// Pad or truncate a string to exactly `len` bytes (ASCII space padding).
pub(crate) fn fixed_width_bytes(string: &str, len: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = string.bytes().take(len).collect();
    bytes.resize(len, b' ');
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_pads() {
        assert_eq!(fixed_width_bytes("CHN", 6), b"CHN   ".to_vec());
    }

    #[test]
    fn fixed_width_truncates() {
        assert_eq!(fixed_width_bytes("REMARKS", 3), b"REM".to_vec());
    }

    #[test]
    fn fixed_width_empty() {
        assert_eq!(fixed_width_bytes("", 2), b"  ".to_vec());
    }
}
