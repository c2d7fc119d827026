use std::io::{self, Write};
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use annofetch::app::{AnnotationRequest, App, FetchOptions, FetchResult, GenomeRequest};
use annofetch::archive::{ArchiveLayout, DEFAULT_GENOME_SUFFIX, HttpArchiveClient};
use annofetch::chrom_map::{BundledMappings, DirectoryMappings, MappingCatalog};
use annofetch::config::{ConfigLoader, ResolvedConfig};
use annofetch::domain::Assembly;
use annofetch::error::AnnofetchError;
use annofetch::pipeline::DownloadOutcome;
use annofetch::progress::{LogSink, ProgressSink, TerminalSink};

#[derive(Parser)]
#[command(name = "annofetch")]
#[command(about = "Download genome and annotation files from Ensembl")]
#[command(version)]
struct Cli {
    /// Print the result as JSON and log progress instead of drawing a bar
    #[arg(long, global = true)]
    non_interactive: bool,

    /// Path to an annofetch.json config file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Resolve URL and destination without downloading
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Download a genome FASTA file")]
    Genome(GenomeArgs),
    #[command(about = "Download a GTF annotation file", visible_alias = "annotation")]
    Gtf(AssemblyArgs),
}

#[derive(Args)]
struct AssemblyArgs {
    /// Ensembl species name (e.g. homo_sapiens)
    #[arg(long)]
    species: String,

    /// Ensembl release number (e.g. 112)
    #[arg(long)]
    release: i64,

    /// Genome build (e.g. GRCh38)
    #[arg(long)]
    build: String,

    /// Directory to save the file in
    #[arg(long)]
    output_dir: Option<String>,

    /// Convert chromosome names to UCSC style ('1' -> 'chr1'); needs a mapping for the build
    #[arg(long)]
    add_ucsc_style: bool,
}

#[derive(Args)]
struct GenomeArgs {
    #[command(flatten)]
    assembly: AssemblyArgs,

    /// File suffix of the FASTA file
    #[arg(long, default_value = DEFAULT_GENOME_SUFFIX)]
    suffix: String,
}

#[derive(Debug, Clone, Copy)]
enum OutputMode {
    Interactive,
    NonInteractive,
}

impl AssemblyArgs {
    fn assembly(&self) -> Result<Assembly, AnnofetchError> {
        Assembly::parse(&self.species, self.release, &self.build)
    }

    fn options(&self, dry_run: bool) -> FetchOptions {
        FetchOptions {
            add_ucsc_style: self.add_ucsc_style,
            dry_run,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(error) = report.downcast_ref::<AnnofetchError>() {
                return ExitCode::from(map_exit_code(error));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &AnnofetchError) -> u8 {
    match error {
        AnnofetchError::RemoteStatus { .. } => 2,
        AnnofetchError::Http(_) | AnnofetchError::Decompress(_) | AnnofetchError::Encoding(_) => 3,
        _ => 1,
    }
}

fn outcome_exit_code(outcome: Option<&DownloadOutcome>) -> u8 {
    match outcome {
        Some(DownloadOutcome::Failure {
            http_status: Some(_),
            ..
        }) => 2,
        Some(DownloadOutcome::Failure { .. }) => 3,
        _ => 0,
    }
}

fn run() -> miette::Result<ExitCode> {
    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let default_level = match output_mode {
        OutputMode::NonInteractive => "info",
        OutputMode::Interactive => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let sink: Box<dyn ProgressSink> = match output_mode {
        OutputMode::Interactive => Box::new(TerminalSink::new()),
        OutputMode::NonInteractive => Box::new(LogSink),
    };

    let result = match cli.command {
        Commands::Genome(args) => {
            let request = GenomeRequest {
                assembly: args.assembly.assembly()?,
                suffix: args.suffix,
            };
            let app = build_app(&config, args.assembly.output_dir.as_deref())?;
            app.fetch_genome(&request, &args.assembly.options(cli.dry_run), sink.as_ref())?
        }
        Commands::Gtf(args) => {
            let request = AnnotationRequest {
                assembly: args.assembly()?,
            };
            let app = build_app(&config, args.output_dir.as_deref())?;
            app.fetch_annotation(&request, &args.options(cli.dry_run), sink.as_ref())?
        }
    };

    print_result(&result, output_mode)?;
    Ok(ExitCode::from(outcome_exit_code(result.outcome.as_ref())))
}

fn build_app(
    config: &ResolvedConfig,
    output_dir: Option<&str>,
) -> Result<App<HttpArchiveClient, Box<dyn MappingCatalog>>, AnnofetchError> {
    let client = HttpArchiveClient::new(config.user_agent.as_deref(), config.connect_timeout)?;
    let mappings: Box<dyn MappingCatalog> = match &config.mapping_dir {
        Some(dir) => Box::new(DirectoryMappings::new(dir.as_std_path())),
        None => Box::new(BundledMappings),
    };
    let output_dir = output_dir
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| config.output_dir.clone());
    Ok(App::new(
        client,
        mappings,
        ArchiveLayout::new(&config.archive_url),
        output_dir,
    ))
}

fn print_result(result: &FetchResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => print_json(result).into_diagnostic(),
        OutputMode::Interactive => {
            match &result.outcome {
                None => {
                    println!("url:         {}", result.url);
                    println!("destination: {}", result.destination);
                }
                Some(DownloadOutcome::Success { path, .. }) => {
                    println!("{}", path.display());
                }
                Some(DownloadOutcome::Failure {
                    http_status: Some(_),
                    ..
                }) => {
                    eprintln!("check the species, release and build parameters");
                }
                Some(DownloadOutcome::Failure { .. }) => {}
            }
            Ok(())
        }
    }
}

fn print_json(result: &FetchResult) -> io::Result<()> {
    let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
    let mut stdout = io::stdout();
    stdout.write_all(json.as_bytes())?;
    stdout.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn errors_map_to_exit_codes() {
        let remote = AnnofetchError::RemoteStatus {
            status: 404,
            url: "https://archive.test/x.gtf.gz".to_string(),
        };
        assert_eq!(map_exit_code(&remote), 2);
        assert_eq!(map_exit_code(&AnnofetchError::Http("reset".into())), 3);
        assert_eq!(map_exit_code(&AnnofetchError::Decompress("bad header".into())), 3);
        assert_eq!(map_exit_code(&AnnofetchError::Encoding("bad utf-8".into())), 3);
        assert_eq!(map_exit_code(&AnnofetchError::InvalidRelease(0)), 1);
        assert_eq!(map_exit_code(&AnnofetchError::ConfigParse("eof".into())), 1);
    }

    #[test]
    fn outcomes_map_to_exit_codes() {
        let success = DownloadOutcome::Success {
            path: PathBuf::from("/tmp/out.fa"),
            bytes_written: 10,
            lines: 1,
        };
        let rejected = DownloadOutcome::Failure {
            http_status: Some(404),
            message: "archive returned status 404".into(),
        };
        let broken = DownloadOutcome::Failure {
            http_status: None,
            message: "stream is not valid UTF-8 text".into(),
        };
        assert_eq!(outcome_exit_code(None), 0);
        assert_eq!(outcome_exit_code(Some(&success)), 0);
        assert_eq!(outcome_exit_code(Some(&rejected)), 2);
        assert_eq!(outcome_exit_code(Some(&broken)), 3);
    }

    #[test]
    fn cli_accepts_annotation_alias() {
        let cli = Cli::try_parse_from([
            "annofetch",
            "--non-interactive",
            "annotation",
            "--species",
            "homo_sapiens",
            "--release",
            "112",
            "--build",
            "GRCh38",
        ])
        .unwrap();
        assert!(cli.non_interactive);
        assert!(matches!(cli.command, Commands::Gtf(_)));
    }
}
