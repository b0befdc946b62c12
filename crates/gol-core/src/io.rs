//! Request/response protocol to the image I/O collaborator.
//!
//! The collaborator runs on its own blocking thread and serves requests
//! strictly in arrival order. Loads and saves answer through a oneshot
//! reply, so a save is only reported complete once the store has accepted
//! it. [`IoRequest::CheckIdle`] is the rendezvous the coordinator uses to
//! make sure every earlier request has drained before it announces
//! shutdown.
//!
//! Storage itself sits behind the [`ImageStore`] trait. [`MemoryStore`]
//! keeps images in memory; the `gol-io` crate provides PGM files.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::grid::{Grid, GridError};

/// Errors surfaced by the I/O collaborator.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The collaborator is no longer running.
    #[error("I/O service is not running")]
    ServiceStopped,

    /// No image exists under the requested label.
    #[error("image {label:?} not found")]
    NotFound {
        /// The requested label.
        label: String,
    },

    /// The stored image has different dimensions than requested.
    #[error("image {label:?} is {actual_width}x{actual_height}, expected {width}x{height}")]
    DimensionMismatch {
        /// The requested label.
        label: String,
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Stored width.
        actual_width: usize,
        /// Stored height.
        actual_height: usize,
    },

    /// Loaded bytes do not form a grid of the requested size.
    #[error("image {label:?} is malformed: {source}")]
    Malformed {
        /// The requested label.
        label: String,
        /// The underlying grid error.
        source: GridError,
    },

    /// The backing store failed.
    #[error("image store failed for {label:?}: {message}")]
    Store {
        /// The label being read or written.
        label: String,
        /// Description of the failure.
        message: String,
    },
}

/// A request to the I/O collaborator.
#[derive(Debug)]
pub enum IoRequest {
    /// Read `width * height` row-major cell bytes stored under `label`.
    Load {
        /// Image label, e.g. `"512x512"`.
        label: String,
        /// Expected width.
        width: usize,
        /// Expected height.
        height: usize,
        /// Receives the bytes or the failure.
        reply: oneshot::Sender<Result<Vec<u8>, IoError>>,
    },

    /// Write `cells` under `label`.
    Save {
        /// Image label, e.g. `"512x512x100"`.
        label: String,
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
        /// Row-major cell bytes.
        cells: Vec<u8>,
        /// Receives the write result.
        reply: oneshot::Sender<Result<(), IoError>>,
    },

    /// Answer once every earlier request has been served.
    CheckIdle {
        /// Answered once every request ahead of it has been served.
        reply: oneshot::Sender<()>,
    },
}

/// Storage backend driven by the I/O service.
///
/// Methods are blocking; the service calls them from its own thread.
pub trait ImageStore: Send + 'static {
    /// Read the row-major cell bytes stored under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`] if the image is missing, unreadable, or not
    /// `width × height`.
    fn read(&mut self, label: &str, width: usize, height: usize) -> Result<Vec<u8>, IoError>;

    /// Store row-major cell bytes under `label`, replacing any previous image.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`] if the image cannot be written.
    fn write(&mut self, label: &str, width: usize, height: usize, cells: &[u8])
    -> Result<(), IoError>;
}

/// An image kept by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Image width.
    pub width: usize,
    /// Image height.
    pub height: usize,
    /// Row-major cell bytes.
    pub cells: Vec<u8>,
}

/// In-memory [`ImageStore`]. Clones share the same images.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    images: Arc<Mutex<BTreeMap<String, StoredImage>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `grid` under `label`.
    pub fn insert_grid(&self, label: impl Into<String>, grid: &Grid) {
        let image = StoredImage {
            width: grid.width(),
            height: grid.height(),
            cells: grid.to_bytes(),
        };
        self.lock().insert(label.into(), image);
    }

    /// The image stored under `label`, if any.
    pub fn get(&self, label: &str) -> Option<StoredImage> {
        self.lock().get(label).cloned()
    }

    /// Labels of every stored image, sorted.
    pub fn labels(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredImage>> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageStore for MemoryStore {
    fn read(&mut self, label: &str, width: usize, height: usize) -> Result<Vec<u8>, IoError> {
        let image = self.get(label).ok_or_else(|| IoError::NotFound {
            label: label.to_owned(),
        })?;
        if image.width != width || image.height != height {
            return Err(IoError::DimensionMismatch {
                label: label.to_owned(),
                width,
                height,
                actual_width: image.width,
                actual_height: image.height,
            });
        }
        Ok(image.cells)
    }

    fn write(
        &mut self,
        label: &str,
        width: usize,
        height: usize,
        cells: &[u8],
    ) -> Result<(), IoError> {
        let image = StoredImage {
            width,
            height,
            cells: cells.to_vec(),
        };
        self.lock().insert(label.to_owned(), image);
        Ok(())
    }
}

/// Client side of the I/O protocol. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IoHandle {
    requests: mpsc::Sender<IoRequest>,
}

impl IoHandle {
    /// Wrap the sending half of a request channel.
    pub const fn new(requests: mpsc::Sender<IoRequest>) -> Self {
        Self { requests }
    }

    /// Load the grid stored under `label`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`] if the service is gone or the image cannot be
    /// read as a `width × height` grid.
    pub async fn load(&self, label: &str, width: usize, height: usize) -> Result<Grid, IoError> {
        let (reply, response) = oneshot::channel();
        self.send(IoRequest::Load {
            label: label.to_owned(),
            width,
            height,
            reply,
        })
        .await?;
        let bytes = response.await.map_err(|_closed| IoError::ServiceStopped)??;
        Grid::from_bytes(width, height, &bytes).map_err(|source| IoError::Malformed {
            label: label.to_owned(),
            source,
        })
    }

    /// Write `grid` under `label` and wait for the store to finish.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`] if the service is gone or the write fails.
    pub async fn save(&self, label: &str, grid: &Grid) -> Result<(), IoError> {
        let (reply, response) = oneshot::channel();
        self.send(IoRequest::Save {
            label: label.to_owned(),
            width: grid.width(),
            height: grid.height(),
            cells: grid.to_bytes(),
            reply,
        })
        .await?;
        response.await.map_err(|_closed| IoError::ServiceStopped)?
    }

    /// Wait until every earlier request has been served.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::ServiceStopped`] if the service is gone.
    pub async fn wait_idle(&self) -> Result<(), IoError> {
        let (reply, response) = oneshot::channel();
        self.send(IoRequest::CheckIdle { reply }).await?;
        response.await.map_err(|_closed| IoError::ServiceStopped)
    }

    async fn send(&self, request: IoRequest) -> Result<(), IoError> {
        self.requests
            .send(request)
            .await
            .map_err(|_closed| IoError::ServiceStopped)
    }
}

/// Start the I/O service on a dedicated blocking thread.
///
/// The service runs until every [`IoHandle`] clone is dropped; the returned
/// join handle completes after the last request has been served.
pub fn spawn_io_service<S: ImageStore>(store: S, buffer: usize) -> (IoHandle, JoinHandle<()>) {
    let (requests, inbox) = mpsc::channel(buffer.max(1));
    let handle = tokio::task::spawn_blocking(move || serve(store, inbox));
    (IoHandle::new(requests), handle)
}

fn serve<S: ImageStore>(mut store: S, mut inbox: mpsc::Receiver<IoRequest>) {
    while let Some(request) = inbox.blocking_recv() {
        match request {
            IoRequest::Load {
                label,
                width,
                height,
                reply,
            } => {
                let result = store.read(&label, width, height);
                match &result {
                    Ok(_) => info!(label, width, height, "Image loaded"),
                    Err(e) => error!(label, error = %e, "Image load failed"),
                }
                if reply.send(result).is_err() {
                    debug!(label, "Load requester went away");
                }
            }
            IoRequest::Save {
                label,
                width,
                height,
                cells,
                reply,
            } => {
                let result = store.write(&label, width, height, &cells);
                match &result {
                    Ok(()) => info!(label, width, height, "Image written"),
                    Err(e) => error!(label, error = %e, "Image write failed"),
                }
                if reply.send(result).is_err() {
                    debug!(label, "Save requester went away");
                }
            }
            IoRequest::CheckIdle { reply } => {
                if reply.send(()).is_err() {
                    debug!("Idle requester went away");
                }
            }
        }
    }
    debug!("I/O service stopped");
}
