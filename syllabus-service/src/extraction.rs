//! Upload staging and extraction-process streaming.
//!
//! One upload request owns one staged file and one external extraction
//! process. The process's output is bridged to the HTTP response through a
//! bounded mpsc channel: reader tasks feed chunks in as they arrive, the
//! response body drains them. A slow consumer backpressures the readers (and
//! transitively the process via its pipe buffers) instead of buffering
//! unboundedly; a consumer that disconnects kills the process.
//!
//! Once streaming has begun the transport cannot change status codes, so
//! every outcome ends with an in-stream terminal marker.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, warn};

use crate::error::{ServiceError, ServiceResult};
use crate::service::SyllabusService;
use crate::views::{VIEW_BROWSE, VIEW_DASHBOARD};

const SUCCESS_MARKER: &str = "\n✅ Process completed successfully!";
const LOG_PREFIX: &str = "[log] ";
const READ_CHUNK_BYTES: usize = 8192;
const STREAM_BUFFER_CHUNKS: usize = 64;

/// Replace whitespace and path separators in the original filename so the
/// staged path stays a single shell- and URL-friendly name inside the
/// staging directory.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Microsecond timestamp prefix, forced strictly increasing within this
/// process so concurrent uploads of the same filename never collide.
fn next_timestamp() -> i64 {
    static LAST: AtomicI64 = AtomicI64::new(0);

    let now = chrono::Utc::now().timestamp_micros();
    loop {
        let last = LAST.load(Ordering::SeqCst);
        let candidate = now.max(last + 1);
        if LAST
            .compare_exchange(last, candidate, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return candidate;
        }
    }
}

/// Write an uploaded file into the staging directory, creating it on demand.
pub async fn stage_upload(
    staging_dir: &Path,
    original_name: &str,
    data: &[u8],
) -> ServiceResult<PathBuf> {
    tokio::fs::create_dir_all(staging_dir)
        .await
        .map_err(ServiceError::Staging)?;

    let staged_name = format!("{}_{}", next_timestamp(), sanitize_filename(original_name));
    let path = staging_dir.join(staged_name);
    tokio::fs::write(&path, data)
        .await
        .map_err(ServiceError::Staging)?;

    Ok(path)
}

/// Spawn the extraction process against a staged file and return the stream
/// of its combined output.
///
/// The returned stream yields stdout chunks verbatim and stderr chunks with a
/// `[log] ` prefix, ends with a terminal success or failure marker, and
/// closes once the process is done and the staged file has been cleaned up.
pub fn extraction_stream(
    service: Arc<SyllabusService>,
    staged_file: PathBuf,
) -> ReceiverStream<Bytes> {
    let (tx, rx) = mpsc::channel::<Bytes>(STREAM_BUFFER_CHUNKS);
    tokio::spawn(run_extraction(service, staged_file, tx));
    ReceiverStream::new(rx)
}

async fn run_extraction(
    service: Arc<SyllabusService>,
    staged_file: PathBuf,
    tx: mpsc::Sender<Bytes>,
) {
    let extractor = &service.config.extractor;
    let db_path = service.config.storage.db_path();

    let mut command = Command::new(&extractor.interpreter);
    command
        // -u keeps the script's progress output unbuffered
        .arg("-u")
        .arg(&extractor.script)
        .arg(&staged_file)
        .arg("--db")
        .arg(&db_path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    info!(
        file = %staged_file.display(),
        script = %extractor.script.display(),
        "Starting extraction process"
    );

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(error = %e, "Failed to spawn extraction process");
            send_text(&tx, format!("\n❌ Failed to start extraction: {}", e)).await;
            remove_staged(&staged_file).await;
            return;
        }
    };

    let mut readers: Vec<JoinHandle<()>> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_output(stdout, tx.clone(), None)));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_output(
            stderr,
            tx.clone(),
            Some(LOG_PREFIX),
        )));
    }

    let outcome = wait_for_exit(&mut child, &tx, extractor.max_runtime()).await;

    // On a real exit, flush whatever the readers still hold before any
    // terminal marker. After a kill the pipes can stay open indefinitely
    // (grandchildren inherit them), so stop the readers instead.
    let flush_readers = matches!(outcome, Outcome::Exited(_) | Outcome::WaitFailed(_));
    for reader in readers {
        if !flush_readers {
            reader.abort();
        }
        let _ = reader.await;
    }

    // Staged-file removal is best-effort in every path, including start
    // timeouts and disconnects
    remove_staged(&staged_file).await;

    match outcome {
        Outcome::Exited(status) if status.success() => {
            // The script wrote to the database directly; drop the cached
            // connection before telling view consumers to re-read
            if let Err(e) = service.db.reconnect() {
                warn!(error = %e, "Database reconnect after extraction failed");
            }
            service.invalidate_views(&[VIEW_DASHBOARD, VIEW_BROWSE]);

            info!(file = %staged_file.display(), "Extraction completed");
            send_text(&tx, SUCCESS_MARKER.to_string()).await;
        }
        Outcome::Exited(status) => {
            let marker = match status.code() {
                Some(code) => format!("\n❌ Process failed with code {}", code),
                None => "\n❌ Process terminated by signal".to_string(),
            };
            warn!(file = %staged_file.display(), status = %status, "Extraction failed");
            send_text(&tx, marker).await;
        }
        Outcome::TimedOut { limit } => {
            warn!(
                file = %staged_file.display(),
                limit_secs = limit.as_secs(),
                "Extraction exceeded max runtime, killed"
            );
            send_text(
                &tx,
                format!("\n❌ Process timed out after {}s", limit.as_secs()),
            )
            .await;
        }
        Outcome::Disconnected => {
            // Receiver is gone; nothing left to tell anyone
            info!(file = %staged_file.display(), "Client disconnected, extraction killed");
        }
        Outcome::WaitFailed(e) => {
            error!(error = %e, "Failed to await extraction process");
            send_text(&tx, format!("\n❌ Lost track of extraction process: {}", e)).await;
        }
    }
}

enum Outcome {
    Exited(std::process::ExitStatus),
    TimedOut { limit: Duration },
    Disconnected,
    WaitFailed(std::io::Error),
}

/// Wait for the process to exit, the client to disconnect, or the optional
/// runtime limit to expire, whichever comes first. The last two kill the
/// process before returning.
async fn wait_for_exit(
    child: &mut Child,
    tx: &mpsc::Sender<Bytes>,
    max_runtime: Option<Duration>,
) -> Outcome {
    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => Outcome::Exited(status),
            Err(e) => Outcome::WaitFailed(e),
        },
        _ = tx.closed() => {
            kill_and_reap(child).await;
            Outcome::Disconnected
        }
        _ = runtime_limit(max_runtime) => {
            kill_and_reap(child).await;
            // This branch only fires when a limit is set
            Outcome::TimedOut {
                limit: max_runtime.unwrap_or_default(),
            }
        }
    }
}

async fn kill_and_reap(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "Kill signal failed (process likely already exited)");
    }
    let _ = child.wait().await;
}

async fn runtime_limit(limit: Option<Duration>) {
    match limit {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}

/// Relay one output pipe into the stream, chunk by chunk, optionally
/// prefixing each chunk. Stops when the pipe closes or the consumer is gone.
async fn forward_output<R>(mut source: R, tx: mpsc::Sender<Bytes>, prefix: Option<&'static str>)
where
    R: AsyncRead + Unpin + Send,
{
    let mut buf = [0u8; READ_CHUNK_BYTES];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = match prefix {
                    Some(prefix) => {
                        let mut prefixed = BytesMut::with_capacity(prefix.len() + n);
                        prefixed.extend_from_slice(prefix.as_bytes());
                        prefixed.extend_from_slice(&buf[..n]);
                        prefixed.freeze()
                    }
                    None => Bytes::copy_from_slice(&buf[..n]),
                };
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "Extraction output pipe read failed");
                break;
            }
        }
    }
}

async fn send_text(tx: &mpsc::Sender<Bytes>, text: String) {
    if tx.send(Bytes::from(text)).await.is_err() {
        debug!("Stream consumer dropped before terminal marker delivery");
    }
}

async fn remove_staged(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(file = %path.display(), error = %e, "Failed to delete staged file");
    }
}
