//! Request-scoped temporary artifacts.
//!
//! Every conversion request owns one directory under the temp root, keyed
//! by its `RequestId`. Paths handed out by [`ArtifactManager::acquire`]
//! live inside that directory and disappear together with it.
//!
//! ```text
//! <temp_root>/
//!     req-<id>/
//!         score.mid
//!         dry.wav
//!         encoded.opus
//!         notation.log
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{OutputFormat, RequestId, StageName};

/// Errors from artifact allocation and cleanup.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("failed to create request directory {path}: {source}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to clean up request directory {path}: {source}")]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Named intermediate file within a request directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactSlot {
    /// Output of the notation stage.
    Midi,
    /// Output of the synthesis stage.
    RawAudio,
    /// Output of the encode stage, before it is moved into place.
    Encoded(OutputFormat),
    /// Captured stdout/stderr of a stage.
    StageLog(StageName),
}

impl ArtifactSlot {
    pub fn file_name(&self) -> String {
        match self {
            ArtifactSlot::Midi => "score.mid".to_string(),
            ArtifactSlot::RawAudio => "dry.wav".to_string(),
            ArtifactSlot::Encoded(format) => format!("encoded.{}", format.extension()),
            ArtifactSlot::StageLog(stage) => format!("{}.log", stage.as_str()),
        }
    }
}

/// Allocates and releases request-scoped temporary paths.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    root: PathBuf,
}

impl ArtifactManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by `request`.
    pub fn request_dir(&self, request: &RequestId) -> PathBuf {
        self.root.join(format!("req-{}", request))
    }

    /// Allocate the path for `slot`, creating the request directory on
    /// first use.
    pub fn acquire(&self, request: &RequestId, slot: ArtifactSlot) -> Result<PathBuf, ArtifactError> {
        let dir = self.request_dir(request);
        fs::create_dir_all(&dir).map_err(|source| ArtifactError::CreateFailed {
            path: dir.clone(),
            source,
        })?;
        Ok(dir.join(slot.file_name()))
    }

    /// Delete the request directory and everything in it.
    ///
    /// Releasing a request that never acquired anything is not an error.
    pub fn release_all(&self, request: &RequestId) -> Result<(), ArtifactError> {
        let dir = self.request_dir(request);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ArtifactError::CleanupFailed { path: dir, source }),
        }
    }

    /// Open a guard that releases the request's artifacts when dropped.
    pub fn scope(&self, request: RequestId) -> ArtifactScope<'_> {
        ArtifactScope {
            manager: self,
            request,
            keep: false,
        }
    }
}

/// Guard tying a request's artifacts to a lexical scope.
///
/// Dropping the guard runs `release_all`; a cleanup failure is logged and
/// swallowed so it can never mask the conversion result.
pub struct ArtifactScope<'a> {
    manager: &'a ArtifactManager,
    request: RequestId,
    keep: bool,
}

impl ArtifactScope<'_> {
    pub fn request(&self) -> &RequestId {
        &self.request
    }

    pub fn acquire(&self, slot: ArtifactSlot) -> Result<PathBuf, ArtifactError> {
        self.manager.acquire(&self.request, slot)
    }

    /// Leave the directory on disk instead of deleting it.
    pub fn keep(&mut self) -> PathBuf {
        self.keep = true;
        self.manager.request_dir(&self.request)
    }
}

impl Drop for ArtifactScope<'_> {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = self.manager.release_all(&self.request) {
            tracing::warn!("{}", e);
        }
    }
}
