// Released under MIT License.
// Copyright (c) 2024 David Quigley

//! Enum capturing file types supported by `dcd_tools`.

use std::path::Path;

/// Types of files supported by `dcd_tools`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum FileType {
    Unknown,
    DCD,
    YAML,
}

impl FileType {
    /// Identify file type from the name of the file (based on file extension).
    pub fn from_name(filename: impl AsRef<Path>) -> FileType {
        let extension = match filename.as_ref().extension() {
            Some(x) => x,
            None => return FileType::Unknown,
        };

        match extension.to_str() {
            Some("dcd") => FileType::DCD,
            Some("yaml") | Some("yml") => FileType::YAML,
            Some(_) | None => FileType::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_dcd() {
        assert_eq!(FileType::from_name("chain.dcd"), FileType::DCD);
    }

    #[test]
    fn identify_yaml() {
        assert_eq!(FileType::from_name("vis.yaml"), FileType::YAML);
        assert_eq!(FileType::from_name("vis.yml"), FileType::YAML);
    }

    #[test]
    fn identify_unknown() {
        assert_eq!(FileType::from_name("chain.xtc"), FileType::Unknown);
        assert_eq!(FileType::from_name("chain.psf"), FileType::Unknown);
    }

    #[test]
    fn identify_noextension() {
        assert_eq!(FileType::from_name("chain"), FileType::Unknown);
    }
}
