use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::AnnofetchError;

static SPECIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid species pattern"));
static BUILD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").expect("valid build pattern"));

/// Ensembl species name, stored lower-cased (e.g. `homo_sapiens`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Species(String);

impl Species {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cases the first character only: `homo_sapiens` -> `Homo_sapiens`.
    pub fn capitalized(&self) -> String {
        capitalize_first(&self.0)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Species {
    type Err = AnnofetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        if !SPECIES_RE.is_match(&normalized) {
            return Err(AnnofetchError::InvalidSpecies(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Archive release number. Zero is rejected along with negatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Release(u32);

impl Release {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Release {
    type Error = AnnofetchError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match u32::try_from(value) {
            Ok(release) if release > 0 => Ok(Self(release)),
            _ => Err(AnnofetchError::InvalidRelease(value)),
        }
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Genome assembly name, kept exactly as given (e.g. `GRCh38`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Build(String);

impl Build {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Build {
    type Err = AnnofetchError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if !BUILD_RE.is_match(trimmed) {
            return Err(AnnofetchError::InvalidBuild(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Genome,
    Annotation,
}

impl FileKind {
    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Genome => "fa",
            FileKind::Annotation => "gtf",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Genome => write!(f, "genome"),
            FileKind::Annotation => write!(f, "annotation"),
        }
    }
}

/// The identifying triple every fetch needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub species: Species,
    pub release: Release,
    pub build: Build,
}

impl Assembly {
    pub fn parse(species: &str, release: i64, build: &str) -> Result<Self, AnnofetchError> {
        Ok(Self {
            species: species.parse()?,
            release: Release::try_from(release)?,
            build: build.parse()?,
        })
    }

    /// `<species>_<build>_<release>.<ext>`
    pub fn output_file_name(&self, kind: FileKind) -> String {
        format!(
            "{}_{}_{}.{}",
            self.species,
            self.build,
            self.release,
            kind.extension()
        )
    }
}

pub fn capitalize_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn capitalize_touches_first_char_only() {
        assert_eq!(capitalize_first("homo_sapiens"), "Homo_sapiens");
        assert_eq!(capitalize_first("mus_Musculus"), "Mus_Musculus");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn species_is_lowercased() {
        let species: Species = " Homo_Sapiens ".parse().unwrap();
        assert_eq!(species.as_str(), "homo_sapiens");
        assert_eq!(species.capitalized(), "Homo_sapiens");
    }

    #[test]
    fn release_zero_rejected() {
        assert_matches!(Release::try_from(0), Err(AnnofetchError::InvalidRelease(0)));
        assert_matches!(Release::try_from(-3), Err(AnnofetchError::InvalidRelease(-3)));
        assert_eq!(Release::try_from(112).unwrap().get(), 112);
    }

    #[test]
    fn empty_build_rejected() {
        assert_matches!("".parse::<Build>(), Err(AnnofetchError::InvalidBuild(_)));
        assert_matches!("GRCh 38".parse::<Build>(), Err(AnnofetchError::InvalidBuild(_)));
    }
}
