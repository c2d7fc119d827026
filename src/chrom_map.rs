use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::domain::Build;

const BUNDLED: &[(&str, &str)] = &[
    (
        "GRCh38",
        include_str!("../data/GRCh38_ensembl2UCSC.txt"),
    ),
    (
        "GRCh37",
        include_str!("../data/GRCh37_ensembl2UCSC.txt"),
    ),
    (
        "GRCm39",
        include_str!("../data/GRCm39_ensembl2UCSC.txt"),
    ),
    (
        "GRCm38",
        include_str!("../data/GRCm38_ensembl2UCSC.txt"),
    ),
];

/// Source-name to target-name mapping for one genome build.
///
/// An empty map is a valid value: it means conversion is unavailable for
/// the build. There is no mutating API once the map is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromosomeMap {
    entries: HashMap<String, String>,
}

impl ChromosomeMap {
    /// Parses a two-column `source<TAB>target` resource.
    ///
    /// Comment lines, blank lines and lines without exactly two fields are
    /// skipped.
    pub fn parse(content: &str) -> Self {
        let mut entries = HashMap::new();
        for line in content.lines() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let mut fields = line.trim().split('\t');
            if let (Some(source), Some(target), None) = (fields.next(), fields.next(), fields.next())
            {
                entries.insert(source.to_string(), target.to_string());
            }
        }
        Self { entries }
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ChromosomeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(source, target)| (source.into(), target.into()))
                .collect(),
        }
    }
}

/// Resolves a build identifier to its chromosome map.
///
/// A missing resource yields an empty map, never an error.
pub trait MappingCatalog: Send + Sync {
    fn lookup(&self, build: &Build) -> ChromosomeMap;
}

impl<T: MappingCatalog + ?Sized> MappingCatalog for Box<T> {
    fn lookup(&self, build: &Build) -> ChromosomeMap {
        (**self).lookup(build)
    }
}

pub fn mapping_file_name(build: &Build) -> String {
    format!("{}_ensembl2UCSC.txt", build.as_str())
}

/// Mapping resources compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledMappings;

impl BundledMappings {
    pub fn builds() -> impl Iterator<Item = &'static str> {
        BUNDLED.iter().map(|(build, _)| *build)
    }
}

impl MappingCatalog for BundledMappings {
    fn lookup(&self, build: &Build) -> ChromosomeMap {
        BUNDLED
            .iter()
            .find(|(name, _)| *name == build.as_str())
            .map(|(_, content)| ChromosomeMap::parse(content))
            .unwrap_or_default()
    }
}

/// Reads `<dir>/<build>_ensembl2UCSC.txt`, falling back to the bundled set.
#[derive(Debug, Clone)]
pub struct DirectoryMappings {
    dir: PathBuf,
}

impl DirectoryMappings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MappingCatalog for DirectoryMappings {
    fn lookup(&self, build: &Build) -> ChromosomeMap {
        let path = self.dir.join(mapping_file_name(build));
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "loaded chromosome mapping");
                ChromosomeMap::parse(&content)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => BundledMappings.lookup(build),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable chromosome mapping");
                ChromosomeMap::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_comments_and_malformed_lines() {
        let map = ChromosomeMap::parse("# header\n1\tchr1\n\nbroken\nX\tchrX\textra\nMT\tchrM\r\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("1"), Some("chr1"));
        assert_eq!(map.get("MT"), Some("chrM"));
        assert_eq!(map.get("X"), None);
    }

    #[test]
    fn bundled_grch38_has_primary_chromosomes() {
        let map = BundledMappings.lookup(&"GRCh38".parse().unwrap());
        assert_eq!(map.get("1"), Some("chr1"));
        assert_eq!(map.get("Y"), Some("chrY"));
        assert_eq!(map.get("MT"), Some("chrM"));
    }

    #[test]
    fn unknown_build_is_empty() {
        let map = BundledMappings.lookup(&"ROS_Cfam_1.0".parse().unwrap());
        assert!(map.is_empty());
    }
}
