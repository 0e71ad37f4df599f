//! libmagic-backed signature matcher.
//!
//! Loads a libmagic database, either compiled (`magic.mgc`) or magic(5)
//! source, and identifies buffers with `magic_buffer`. A libmagic handle
//! must not be used from two threads at once, so each matcher owns one
//! worker thread that holds the handles and serves requests in order.

use crate::core::error::{SignatureError, SignatureResult};
use crate::core::{Identification, MatchError, SignatureMatcher};

use magic::cookie::{DatabasePaths, Flags};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use tokio::sync::oneshot;
use tracing::debug;

/// Result handed back by the worker for one buffer.
type Reply = Result<Identification, String>;

/// One identification request for the worker.
#[derive(Debug)]
struct Request {
    buffer: Vec<u8>,
    reply: mpsc::SyncSender<Reply>,
}

/// Identifies content with libmagic.
///
/// # Examples
///
/// ```rust,no_run
/// use sigbridge::backends::LibmagicMatcher;
/// use sigbridge::core::SignatureMatcher;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let matcher = LibmagicMatcher::open("/usr/share/misc/magic.mgc").await?;
/// let id = matcher.identify(b"%PDF-1.7\n")?;
/// println!("{} ({:?})", id.description, id.mime);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LibmagicMatcher {
    name: String,
    path: PathBuf,
    requests: Mutex<mpsc::Sender<Request>>,
}

impl LibmagicMatcher {
    /// Loads the database at `path` and starts the worker serving it.
    ///
    /// Fails with [`SignatureError::NotFound`] when the file is missing and
    /// [`SignatureError::Load`] when libmagic rejects it.
    pub async fn open(path: impl AsRef<Path>) -> SignatureResult<Self> {
        let path = path.as_ref().to_path_buf();
        match tokio::fs::metadata(&path).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SignatureError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let (ready_tx, ready_rx) = oneshot::channel();
        let (requests, queue) = mpsc::channel();
        let worker_path = path.clone();
        thread::Builder::new()
            .name("libmagic".to_string())
            .spawn(move || serve(&worker_path, queue, ready_tx))?;

        let loaded = ready_rx
            .await
            .unwrap_or_else(|_| Err("libmagic worker exited while loading".to_string()));
        if let Err(reason) = loaded {
            return Err(SignatureError::load(path.display().to_string(), reason));
        }

        debug!(path = %path.display(), "Loaded libmagic database");

        Ok(Self {
            name: "libmagic".to_string(),
            path,
            requests: Mutex::new(requests),
        })
    }

    /// Sets the name of this matcher.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the path of the loaded database.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn worker_gone(&self) -> MatchError {
        MatchError::failed(&self.name, "libmagic worker is not running")
    }
}

/// Worker loop: loads one description handle and one MIME handle, then
/// answers requests until every sender is dropped.
fn serve(path: &Path, queue: mpsc::Receiver<Request>, ready: oneshot::Sender<Result<(), String>>) {
    let databases: DatabasePaths = match [path].try_into() {
        Ok(databases) => databases,
        Err(e) => {
            let _ = ready.send(Err(format!("invalid database path: {}", e)));
            return;
        }
    };

    let load = |flags: Flags| {
        magic::Cookie::open(flags)
            .map_err(|e| e.to_string())
            .and_then(|cookie| cookie.load(&databases).map_err(|e| e.to_string()))
    };

    let (description, mime) = match load(Flags::empty()) {
        Ok(description) => match load(Flags::MIME_TYPE) {
            Ok(mime) => (description, mime),
            Err(reason) => {
                let _ = ready.send(Err(reason));
                return;
            }
        },
        Err(reason) => {
            let _ = ready.send(Err(reason));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    for request in queue {
        let reply = description
            .buffer(&request.buffer)
            .map(|text| {
                let identification = Identification::new(text);
                match mime.buffer(&request.buffer) {
                    Ok(mime_type) => identification.with_mime(mime_type),
                    Err(_) => identification,
                }
            })
            .map_err(|e| e.to_string());
        let _ = request.reply.send(reply);
    }
}

impl SignatureMatcher for LibmagicMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn identify(&self, buffer: &[u8]) -> Result<Identification, MatchError> {
        let (reply, response) = mpsc::sync_channel(1);
        let request = Request {
            buffer: buffer.to_vec(),
            reply,
        };

        self.requests
            .lock()
            .unwrap()
            .send(request)
            .map_err(|_| self.worker_gone())?;

        response
            .recv()
            .map_err(|_| self.worker_gone())?
            .map_err(|reason| MatchError::failed(&self.name, reason))
    }

    fn database_version(&self) -> Option<String> {
        Some(format!("{} (libmagic)", self.path.display()))
    }
}
