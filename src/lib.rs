pub mod agent_core;
pub mod config;
pub mod inference;
pub mod session;
pub mod status;
pub mod tool_backend;

pub use agent_core::{ConversationEvent, ConversationStore, Message, OrchestrationLoop, RunOutcome, RunStatus};
pub use config::AppConfig;
pub use session::ChatSession;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Return the platform-standard data directory for mcp-chat.
///
/// - macOS: `~/Library/Application Support/mcp-chat/`
/// - Windows: `{FOLDERID_RoamingAppData}\mcp-chat\`
/// - Linux: `$XDG_DATA_HOME/mcp-chat/` (fallback `~/.local/share/...`)
///
/// Falls back to `~/.mcp-chat/` only if none of the above can be resolved.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = dirs::data_dir() {
        return dir.join("mcp-chat");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mcp-chat")
}

/// Install the global subscriber, logging to a fresh `agent.log` in `log_dir`.
///
/// The previous three logs are kept as `agent.log.1` to `.3`. `RUST_LOG`
/// overrides the `mcp_chat=info,warn` filter. Returns the log file path.
pub fn init_tracing(log_dir: &Path, json: bool) -> io::Result<PathBuf> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join("agent.log");

    rotate_log_file(&log_path, 3);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let writer = FlushingWriter::new(log_file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mcp_chat=info,warn"));

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_path.display(),
        pid = std::process::id(),
        "=== mcp-chat starting ==="
    );

    Ok(log_path)
}

/// Shift `agent.log.{n}` to `.{n+1}` and the live log to `.1`, dropping
/// anything past `keep`.
fn rotate_log_file(base_path: &Path, keep: u32) {
    let numbered = |n: u32| {
        let mut name = base_path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    };

    let _ = std::fs::remove_file(numbered(keep));
    for n in (1..keep).rev() {
        let _ = std::fs::rename(numbered(n), numbered(n + 1));
    }
    if base_path.exists() {
        let _ = std::fs::rename(base_path, numbered(1));
    }
}

/// Log sink shared by every subscriber thread; flushes on each write.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<Mutex<File>>,
}

impl FlushingWriter {
    fn new(file: File) -> Self {
        Self {
            file: Arc::new(Mutex::new(file)),
        }
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, File>> {
        self.file
            .lock()
            .map_err(|e| io::Error::other(format!("log file lock poisoned: {e}")))
    }
}

impl Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.lock()?;
        let written = file.write(buf)?;
        file.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
