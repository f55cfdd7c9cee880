// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Implementation of functions for writing psf files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::auxiliary::{PSF_BONDS_PER_LINE, PSF_MAX_ATOMS, PSF_MAX_CHAINS};
use crate::config::VisConfig;
use crate::errors::WritePsfError;
use crate::system::general::ChainSystem;

/// Number of integers written on a single line of the non-bonded exclusion block.
const PSF_NNB_PER_LINE: usize = 8;

/// ## Methods for writing psf files.
impl ChainSystem {
    /// Write the topology of the system into a psf file with the given name.
    ///
    /// Each chain is written as a separate residue (the residue number is the 1-based index of the chain)
    /// and every two consecutive beads of a chain are bonded.
    ///
    /// ## Returns
    /// `Ok` if writing has been successful. Otherwise `WritePsfError`.
    ///
    /// ## Example
    /// ```no_run
    /// use dcd_tools::prelude::*;
    ///
    /// let system = ChainSystem::new(10, 4).unwrap();
    /// if let Err(e) = system.write_psf("chain.psf") {
    ///     eprintln!("{}", e);
    ///     return;
    /// }
    /// ```
    ///
    /// ## Notes
    /// - The residue number field of a psf file only has 4 columns, so at most 9999 chains can be written.
    /// - The file is not created if the system can not be written.
    pub fn write_psf(&self, filename: impl AsRef<Path>) -> Result<(), WritePsfError> {
        write_psf(
            filename,
            self.get_n_chains(),
            self.get_n_beads(),
            self.get_config(),
        )
    }

    /// Get all bonds of the system as pairs of 1-based bead indices.
    pub fn bonds(&self) -> Vec<(usize, usize)> {
        chain_bonds(self.get_n_chains(), self.get_n_beads()).collect()
    }
}

/// Write the topology of `nchains` linear chains of `nbeads` beads into a psf file
/// without constructing a `ChainSystem`.
///
/// All limits of the psf format are checked before the file is created.
///
/// ## Example
/// ```no_run
/// use dcd_tools::prelude::*;
/// use dcd_tools::io::psf_io;
///
/// let config = VisConfig::default().with_bead_name("CB");
/// psf_io::write_psf("chain.psf", 10, 4, &config).unwrap();
/// ```
pub fn write_psf(
    filename: impl AsRef<Path>,
    nchains: usize,
    nbeads: usize,
    config: &VisConfig,
) -> Result<(), WritePsfError> {
    psf_sanity_check(nchains, nbeads, config)?;

    let output = File::create(&filename)
        .map_err(|_| WritePsfError::CouldNotCreate(Box::from(filename.as_ref())))?;

    let mut writer = BufWriter::new(output);
    write_psf_content(&mut writer, nchains, nbeads, config)
        .map_err(|_| WritePsfError::CouldNotWrite)?;
    writer.flush().map_err(|_| WritePsfError::CouldNotWrite)?;

    Ok(())
}

/// Check that the topology can be written into a psf file.
fn psf_sanity_check(nchains: usize, nbeads: usize, config: &VisConfig) -> Result<(), WritePsfError> {
    if nchains > PSF_MAX_CHAINS {
        return Err(WritePsfError::TooManyChains(nchains));
    }

    match nchains.checked_mul(nbeads) {
        Some(n_atoms) if n_atoms <= PSF_MAX_ATOMS => (),
        Some(n_atoms) => return Err(WritePsfError::TooManyAtoms(n_atoms)),
        None => return Err(WritePsfError::TooManyAtoms(usize::MAX)),
    }

    config
        .validate()
        .map_err(|e| WritePsfError::InvalidConfig(e.to_string()))
}

/// Bonds between consecutive beads of every chain as pairs of 1-based bead indices.
fn chain_bonds(nchains: usize, nbeads: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..nchains).flat_map(move |chain| {
        (1..nbeads).map(move |bead| (chain * nbeads + bead, chain * nbeads + bead + 1))
    })
}

/// Write all sections of the psf file.
fn write_psf_content(
    writer: &mut impl Write,
    nchains: usize,
    nbeads: usize,
    config: &VisConfig,
) -> std::io::Result<()> {
    let n_atoms = nchains * nbeads;

    // header and title
    writeln!(writer, "PSF")?;
    writeln!(writer)?;
    writeln!(writer, "{:>8} !NTITLE", 1)?;
    writeln!(writer, " REMARKS {}", config.title)?;
    writeln!(writer)?;

    // atoms
    writeln!(writer, "{:>8} !NATOM", n_atoms)?;
    for chain in 0..nchains {
        for bead in 0..nbeads {
            writeln!(
                writer,
                "{:>8} {:<4} {:<4} {:<4} {:<4} {:<4} {:>14.6}{:>14.4}{:>12}",
                chain * nbeads + bead + 1,
                config.segment,
                chain + 1,
                config.residue_name,
                config.bead_name,
                config.bead_type,
                config.charge,
                config.mass,
                0
            )?;
        }
    }
    writeln!(writer)?;

    // bonds
    let n_bonds = nchains * nbeads.saturating_sub(1);
    writeln!(writer, "{:>8} !NBOND: bonds", n_bonds)?;
    for (i, (b1, b2)) in chain_bonds(nchains, nbeads).enumerate() {
        write!(writer, "{:>8}{:>8}", b1, b2)?;
        if (i + 1) % PSF_BONDS_PER_LINE == 0 || i + 1 == n_bonds {
            writeln!(writer)?;
        }
    }
    writeln!(writer)?;

    // empty sections
    for section in [
        "!NTHETA: angles",
        "!NPHI: dihedrals",
        "!NIMPHI: impropers",
        "!NDON: donors",
        "!NACC: acceptors",
    ] {
        writeln!(writer, "{:>8} {}", 0, section)?;
        writeln!(writer)?;
    }

    // non-bonded exclusions: no explicit exclusions, one zero per atom
    writeln!(writer, "{:>8} !NNB", 0)?;
    writeln!(writer)?;
    for start in (0..n_atoms).step_by(PSF_NNB_PER_LINE) {
        let end = (start + PSF_NNB_PER_LINE).min(n_atoms);
        for _ in start..end {
            write!(writer, "{:>8}", 0)?;
        }
        writeln!(writer)?;
    }
    writeln!(writer)?;

    // a single group containing all atoms
    writeln!(writer, "{:>8}{:>8} !NGRP", 1, 0)?;
    writeln!(writer, "{:>8}{:>8}{:>8}", 0, 0, 0)?;
    writeln!(writer)?;

    Ok(())
}

/******************************/
/*         UNIT TESTS         */
/******************************/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::utilities::create_named_path;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn read_output(path: &Path) -> String {
        let mut content = String::new();
        File::open(path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        content
    }

    #[test]
    fn bonds() {
        let system = ChainSystem::new(3, 4).unwrap();
        let bonds = system.bonds();

        assert_eq!(bonds.len(), 9);
        assert_eq!(bonds[0], (1, 2));
        assert_eq!(bonds[2], (3, 4));
        assert_eq!(bonds[3], (5, 6));
        assert_eq!(bonds[8], (11, 12));
    }

    #[test]
    fn bonds_single_bead() {
        let system = ChainSystem::new(5, 1).unwrap();
        assert!(system.bonds().is_empty());
    }

    #[test]
    fn write() {
        let system = ChainSystem::new(10, 4).unwrap();

        let psf_output = NamedTempFile::new().unwrap();
        let path_to_output = psf_output.path();

        if let Err(e) = system.write_psf(path_to_output) {
            panic!("Writing psf file failed: {}", e);
        }

        let mut result = File::open(path_to_output).unwrap();
        let mut expected = File::open("test_files/chain_10x4.psf").unwrap();

        assert!(file_diff::diff_files(&mut result, &mut expected));
    }

    #[test]
    fn write_custom_config() {
        let config = VisConfig::default()
            .with_title("Two dimers")
            .with_segment("HSC")
            .with_residue_name("DIM")
            .with_bead_name("CB")
            .with_bead_type("CT")
            .with_mass(14.027)
            .with_charge(-0.25);

        let system = ChainSystem::new(2, 2).unwrap().with_config(config);

        let psf_output = NamedTempFile::new().unwrap();
        system.write_psf(psf_output.path()).unwrap();
        let content = read_output(psf_output.path());
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "PSF");
        assert_eq!(lines[3], " REMARKS Two dimers");
        assert_eq!(lines[5], "       4 !NATOM");
        assert_eq!(
            lines[6],
            "       1 HSC  1    DIM  CB   CT        -0.250000       14.0270           0"
        );
        assert_eq!(
            lines[9],
            "       4 HSC  2    DIM  CB   CT        -0.250000       14.0270           0"
        );
        assert_eq!(lines[11], "       2 !NBOND: bonds");
        assert_eq!(lines[12], "       1       2       3       4");
        assert_eq!(lines[14], "       0 !NTHETA: angles");
        assert_eq!(lines[24], "       0 !NNB");
        assert_eq!(lines[26], "       0       0       0       0");
        assert_eq!(lines[28], "       1       0 !NGRP");
        assert_eq!(lines[29], "       0       0       0");
        assert_eq!(lines.len(), 31);
    }

    #[test]
    fn write_single_bead_chains() {
        let system = ChainSystem::new(3, 1).unwrap();

        let psf_output = NamedTempFile::new().unwrap();
        system.write_psf(psf_output.path()).unwrap();
        let content = read_output(psf_output.path());

        assert!(content.contains("\n       0 !NBOND: bonds\n\n       0 !NTHETA: angles\n"));
    }

    #[test]
    fn write_fails() {
        let system = ChainSystem::new(10, 4).unwrap();

        match system.write_psf("Xhfguiaghqueiowhd/nonexistent.psf") {
            Err(WritePsfError::CouldNotCreate(e)) => {
                assert_eq!(e, Box::from(Path::new("Xhfguiaghqueiowhd/nonexistent.psf")))
            }
            Ok(_) => panic!("Writing should have failed, but it did not."),
            Err(e) => panic!("Incorrect error type `{:?}` was returned.", e),
        }
    }

    #[test]
    fn write_too_many_chains() {
        let system = ChainSystem::new(10_000, 1).unwrap();

        let psf_output = NamedTempFile::new().unwrap();
        match system.write_psf(psf_output.path()) {
            Err(WritePsfError::TooManyChains(n)) => assert_eq!(n, 10_000),
            Ok(_) => panic!("Writing should have failed, but it did not."),
            Err(e) => panic!("Incorrect error type `{:?}` was returned.", e),
        }
    }

    #[test]
    fn write_from_counts() {
        let (_file, path) = create_named_path(".psf");
        write_psf(&path, 10, 4, &VisConfig::default()).unwrap();

        let mut result = File::open(&path).unwrap();
        let mut expected = File::open("test_files/chain_10x4.psf").unwrap();

        assert!(file_diff::diff_files(&mut result, &mut expected));
    }

    #[test]
    fn write_too_many_chains_without_system() {
        let (_file, path) = create_named_path(".psf");
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            write_psf(&path, 100_000, 100_000, &VisConfig::default()),
            Err(WritePsfError::TooManyChains(100_000))
        );
        assert!(!path.exists());
    }

    #[test]
    fn write_too_many_atoms() {
        let (_file, path) = create_named_path(".psf");
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            write_psf(&path, 9999, 100_000, &VisConfig::default()),
            Err(WritePsfError::TooManyAtoms(999_900_000))
        );
        assert_eq!(
            write_psf(&path, 9999, usize::MAX, &VisConfig::default()),
            Err(WritePsfError::TooManyAtoms(usize::MAX))
        );
        assert!(!path.exists());
    }

    #[test]
    fn write_invalid_config() {
        let system = ChainSystem::new(1, 1)
            .unwrap()
            .with_config(VisConfig::default().with_bead_name("TOOLONG"));

        let (_file, path) = create_named_path(".psf");
        std::fs::remove_file(&path).unwrap();

        match system.write_psf(&path) {
            Err(WritePsfError::InvalidConfig(_)) => assert!(!path.exists()),
            Ok(_) => panic!("Writing should have failed, but it did not."),
            Err(e) => panic!("Incorrect error type `{:?}` was returned.", e),
        }
    }
}
