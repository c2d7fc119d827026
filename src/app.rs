use std::fs;

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::debug;

use crate::archive::{ArchiveClient, ArchiveLayout, DEFAULT_GENOME_SUFFIX};
use crate::chrom_map::MappingCatalog;
use crate::domain::{Assembly, FileKind};
use crate::error::AnnofetchError;
use crate::pipeline::{DownloadOutcome, StreamPipeline};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::transform::{Conversion, LineTransform};

#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub add_ucsc_style: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct GenomeRequest {
    pub assembly: Assembly,
    pub suffix: String,
}

impl GenomeRequest {
    pub fn new(assembly: Assembly) -> Self {
        Self {
            assembly,
            suffix: DEFAULT_GENOME_SUFFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationRequest {
    pub assembly: Assembly,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub kind: FileKind,
    pub species: String,
    pub release: u32,
    pub build: String,
    pub url: String,
    pub destination: Utf8PathBuf,
    pub conversion: Conversion,
    pub action: String,
    pub outcome: Option<DownloadOutcome>,
    pub finished_at: String,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.outcome
            .as_ref()
            .map(DownloadOutcome::is_success)
            .unwrap_or(true)
    }
}

pub struct App<C: ArchiveClient, M: MappingCatalog> {
    pipeline: StreamPipeline<C>,
    mappings: M,
    layout: ArchiveLayout,
    output_dir: Utf8PathBuf,
}

impl<C: ArchiveClient, M: MappingCatalog> App<C, M> {
    pub fn new(client: C, mappings: M, layout: ArchiveLayout, output_dir: Utf8PathBuf) -> Self {
        Self {
            pipeline: StreamPipeline::new(client),
            mappings,
            layout,
            output_dir,
        }
    }

    pub fn fetch_genome(
        &self,
        request: &GenomeRequest,
        options: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, AnnofetchError> {
        let url = self.layout.genome_url(&request.assembly, &request.suffix);
        self.fetch(FileKind::Genome, &request.assembly, url, options, sink)
    }

    pub fn fetch_annotation(
        &self,
        request: &AnnotationRequest,
        options: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, AnnofetchError> {
        let url = self.layout.annotation_url(&request.assembly);
        self.fetch(FileKind::Annotation, &request.assembly, url, options, sink)
    }

    fn fetch(
        &self,
        kind: FileKind,
        assembly: &Assembly,
        url: String,
        options: &FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, AnnofetchError> {
        sink.event(ProgressEvent::Note(format!(
            "{kind} fetch for {} (release {}, build {})",
            assembly.species, assembly.release, assembly.build
        )));
        let destination = self.output_dir.join(assembly.output_file_name(kind));

        let map = self.mappings.lookup(&assembly.build);
        debug!(build = %assembly.build, entries = map.len(), "chromosome mapping resolved");
        if map.is_empty() {
            sink.event(ProgressEvent::Note(format!(
                "no chromosome mapping for build '{}'; UCSC-style conversion is unavailable",
                assembly.build
            )));
        }

        let conversion = Conversion::resolve(options.add_ucsc_style, &map);
        match conversion {
            Conversion::DisabledNoMap => {
                sink.event(ProgressEvent::Warning(format!(
                    "cannot convert {kind} chromosome names: no mapping for build '{}'; \
                     downloading without conversion",
                    assembly.build
                )));
            }
            Conversion::Enabled => {
                sink.event(ProgressEvent::Note(format!(
                    "using '{}' map to convert {kind} chromosome names to UCSC style",
                    assembly.build
                )));
            }
            Conversion::DisabledByRequest => {}
        }

        if options.dry_run {
            return Ok(self.result(kind, assembly, url, destination, conversion, None));
        }

        fs::create_dir_all(self.output_dir.as_std_path()).map_err(|err| {
            AnnofetchError::Filesystem(format!("create {}: {err}", self.output_dir))
        })?;

        let transform = LineTransform::select(kind, conversion, &map);
        let outcome = self
            .pipeline
            .run(&url, destination.as_std_path(), transform, sink);
        Ok(self.result(kind, assembly, url, destination, conversion, Some(outcome)))
    }

    fn result(
        &self,
        kind: FileKind,
        assembly: &Assembly,
        url: String,
        destination: Utf8PathBuf,
        conversion: Conversion,
        outcome: Option<DownloadOutcome>,
    ) -> FetchResult {
        let action = if outcome.is_some() {
            "download"
        } else {
            "dry-run"
        };
        FetchResult {
            kind,
            species: assembly.species.to_string(),
            release: assembly.release.get(),
            build: assembly.build.to_string(),
            url,
            destination,
            conversion,
            action: action.to_string(),
            outcome,
            finished_at: iso_timestamp(),
        }
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
