use std::borrow::Cow;

use serde::Serialize;

use crate::chrom_map::ChromosomeMap;
use crate::domain::FileKind;

/// Outcome of the pre-flight check for chromosome renaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    Enabled,
    /// Renaming was requested but the build has no mapping; the download
    /// goes ahead unconverted.
    DisabledNoMap,
    DisabledByRequest,
}

impl Conversion {
    pub fn resolve(requested: bool, map: &ChromosomeMap) -> Self {
        match (requested, map.is_empty()) {
            (false, _) => Conversion::DisabledByRequest,
            (true, true) => Conversion::DisabledNoMap,
            (true, false) => Conversion::Enabled,
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Conversion::Enabled)
    }
}

/// Per-line rewrite applied by the stream pipeline.
#[derive(Debug, Clone, Copy)]
pub enum LineTransform<'m> {
    None,
    FastaRename(&'m ChromosomeMap),
    AnnotationRename(&'m ChromosomeMap),
}

impl<'m> LineTransform<'m> {
    /// Picks the rename for `kind` when conversion is enabled, otherwise `None`.
    pub fn select(kind: FileKind, conversion: Conversion, map: &'m ChromosomeMap) -> Self {
        if !conversion.is_enabled() || map.is_empty() {
            return LineTransform::None;
        }
        match kind {
            FileKind::Genome => LineTransform::FastaRename(map),
            FileKind::Annotation => LineTransform::AnnotationRename(map),
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, LineTransform::None)
    }

    /// `line` includes its terminator, if it had one.
    pub fn apply<'l>(&self, line: &'l str) -> Cow<'l, str> {
        match self {
            LineTransform::None => Cow::Borrowed(line),
            LineTransform::FastaRename(map) => rename_fasta_header(map, line),
            LineTransform::AnnotationRename(map) => rename_annotation_seqname(map, line),
        }
    }
}

fn rename_fasta_header<'l>(map: &ChromosomeMap, line: &'l str) -> Cow<'l, str> {
    let Some(header) = line.strip_prefix('>') else {
        return Cow::Borrowed(line);
    };
    let name_end = header.find(char::is_whitespace).unwrap_or(header.len());
    let (name, rest) = header.split_at(name_end);
    let Some(target) = map.get(name) else {
        return Cow::Borrowed(line);
    };

    let mut renamed = String::with_capacity(line.len() + target.len());
    renamed.push('>');
    renamed.push_str(target);
    if rest.is_empty() {
        renamed.push('\n');
    } else {
        renamed.push_str(rest);
    }
    Cow::Owned(renamed)
}

fn rename_annotation_seqname<'l>(map: &ChromosomeMap, line: &'l str) -> Cow<'l, str> {
    if line.starts_with('#') {
        return Cow::Borrowed(line);
    }
    let body_end = line.trim_end_matches(['\n', '\r']).len();
    let name_end = line[..body_end].find('\t').unwrap_or(body_end);
    let (name, rest) = line.split_at(name_end);
    match map.get(name) {
        Some(target) => {
            let mut renamed = String::with_capacity(line.len() + target.len());
            renamed.push_str(target);
            renamed.push_str(rest);
            Cow::Owned(renamed)
        }
        None => Cow::Borrowed(line),
    }
}
