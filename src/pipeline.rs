use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use flate2::read::MultiGzDecoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::archive::ArchiveClient;
use crate::error::AnnofetchError;
use crate::progress::{ProgressEvent, ProgressSink, ProgressTracker};
use crate::transform::LineTransform;

const DECODED_BUF_SIZE: usize = 256 * 1024;
const WRITE_BUF_SIZE: usize = 256 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadOutcome {
    Success {
        path: PathBuf,
        bytes_written: u64,
        lines: u64,
    },
    Failure {
        http_status: Option<u16>,
        message: String,
    },
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success { .. })
    }
}

struct DownloadSession<'a> {
    url: &'a str,
    destination: &'a Path,
    transform: LineTransform<'a>,
    tracker: ProgressTracker,
    transferred: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct WriteSummary {
    bytes_written: u64,
    lines: u64,
}

pub struct StreamPipeline<C: ArchiveClient> {
    client: C,
}

impl<C: ArchiveClient> StreamPipeline<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Runs one download to completion. Every error is folded into the
    /// returned outcome and reported to `sink`.
    pub fn run(
        &self,
        url: &str,
        destination: &Path,
        transform: LineTransform<'_>,
        sink: &dyn ProgressSink,
    ) -> DownloadOutcome {
        sink.event(ProgressEvent::Started {
            url: url.to_string(),
            destination: destination.to_path_buf(),
        });

        match self.stream(url, destination, transform, sink) {
            Ok((path, summary)) => {
                info!(
                    path = %path.display(),
                    bytes_written = summary.bytes_written,
                    lines = summary.lines,
                    "download complete"
                );
                sink.event(ProgressEvent::Completed {
                    path: path.clone(),
                    bytes_written: summary.bytes_written,
                });
                DownloadOutcome::Success {
                    path,
                    bytes_written: summary.bytes_written,
                    lines: summary.lines,
                }
            }
            Err(err) => {
                let message = err.to_string();
                debug!(url, error = %message, "download failed");
                sink.event(ProgressEvent::Failed {
                    message: message.clone(),
                });
                DownloadOutcome::Failure {
                    http_status: err.status(),
                    message,
                }
            }
        }
    }

    fn stream(
        &self,
        url: &str,
        destination: &Path,
        transform: LineTransform<'_>,
        sink: &dyn ProgressSink,
    ) -> Result<(PathBuf, WriteSummary), AnnofetchError> {
        let body = self.client.open(url)?;
        let mut session = DownloadSession {
            url,
            destination,
            transform,
            tracker: ProgressTracker::new(body.content_length),
            transferred: Arc::new(AtomicU64::new(0)),
        };
        debug!(
            url = session.url,
            total = ?session.tracker.total(),
            "streaming archive body"
        );

        let counting = CountingReader {
            inner: body.reader,
            count: session.transferred.clone(),
        };
        let mut reader =
            BufReader::with_capacity(DECODED_BUF_SIZE, MultiGzDecoder::new(counting));

        let file = File::create(session.destination).map_err(|err| {
            AnnofetchError::Filesystem(format!(
                "create {}: {err}",
                session.destination.display()
            ))
        })?;
        let mut writer = BufWriter::with_capacity(WRITE_BUF_SIZE, file);

        let summary = copy_lines(&mut reader, &mut writer, &mut session, sink)?;
        writer
            .flush()
            .map_err(|err| AnnofetchError::Filesystem(err.to_string()))?;
        drop(writer);

        let path = fs::canonicalize(session.destination)
            .map_err(|err| AnnofetchError::Filesystem(err.to_string()))?;
        Ok((path, summary))
    }
}

fn copy_lines<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    session: &mut DownloadSession<'_>,
    sink: &dyn ProgressSink,
) -> Result<WriteSummary, AnnofetchError> {
    let mut summary = WriteSummary::default();
    let mut buf = Vec::with_capacity(8 * 1024);
    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(read_error)?;
        if read == 0 {
            break;
        }
        let line =
            std::str::from_utf8(&buf).map_err(|err| AnnofetchError::Encoding(err.to_string()))?;

        let write_result = if session.transform.is_configured() {
            let out = session.transform.apply(line);
            writer.write_all(out.as_bytes()).map(|_| out.len())
        } else {
            writer.write_all(line.as_bytes()).map(|_| line.len())
        };
        let written =
            write_result.map_err(|err| AnnofetchError::Filesystem(err.to_string()))?;
        summary.bytes_written += written as u64;
        summary.lines += 1;

        let raw = session.transferred.load(Ordering::Relaxed);
        if let Some(update) = session.tracker.advance_to(raw) {
            sink.event(ProgressEvent::Progress(update));
        }
    }
    Ok(summary)
}

fn read_error(err: io::Error) -> AnnofetchError {
    match err.kind() {
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            AnnofetchError::Decompress(err.to_string())
        }
        _ => AnnofetchError::Http(err.to_string()),
    }
}

/// Counts compressed bytes as the decoder pulls them.
struct CountingReader<R> {
    inner: R,
    count: Arc<AtomicU64>,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}
