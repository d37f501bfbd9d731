//! `Orchestrator::convert` - one request from notation file to final audio.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use super::errors::{ConversionError, ConversionResult, StageError};
use super::pipeline::Pipeline;
use super::types::{ArtifactPaths, Context, ConversionState};
use crate::artifacts::ArtifactManager;
use crate::config::Settings;
use crate::logging::{LogCallback, LogConfig, RequestLogger};
use crate::models::{ConversionRequest, OutputFormat, RequestId, StageName};
use crate::reverb::{catalog, ReverbPreset};
use crate::runner::{CancelHandle, StageRunner};
use crate::tools::BinaryResolver;

type SharedCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Runs conversion requests.
///
/// One instance can serve many requests, sequentially or from several
/// threads at once; each request gets its own temporary directory and
/// its own child processes.
pub struct Orchestrator {
    settings: Settings,
    resolver: BinaryResolver,
    artifacts: ArtifactManager,
    runner: StageRunner,
    pipeline: Pipeline,
    callback: Option<SharedCallback>,
}

impl Orchestrator {
    /// Build an orchestrator from settings.
    pub fn new(settings: Settings) -> Self {
        let resolver = BinaryResolver::new(settings.paths.bundled_tools_dir());
        let artifacts = ArtifactManager::new(settings.paths.temp_root_dir());
        let runner = StageRunner::new().with_excerpt_lines(settings.logging.error_tail as usize);

        Self {
            settings,
            resolver,
            artifacts,
            runner,
            pipeline: Pipeline::standard(),
            callback: None,
        }
    }

    /// Replace the tool resolver.
    pub fn with_resolver(mut self, resolver: BinaryResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Forward every request log line to `callback`.
    pub fn with_log_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &BinaryResolver {
        &self.resolver
    }

    /// Convert one request. See `convert_with_cancel`.
    pub fn convert(&self, request: &ConversionRequest) -> ConversionResult<PathBuf> {
        self.convert_with_cancel(request, &CancelHandle::new())
    }

    /// Convert one request, stopping early when `cancel` is set.
    ///
    /// Nothing is launched unless the input, the preset, the assets, the
    /// destination and all three tools check out. The request's temporary directory is removed
    /// on every exit path (unless `[debug] keep_intermediates_on_failure`
    /// is set and the conversion failed).
    pub fn convert_with_cancel(
        &self,
        request: &ConversionRequest,
        cancel: &CancelHandle,
    ) -> ConversionResult<PathBuf> {
        let request_id = RequestId::new();
        let started = Instant::now();

        check_input(request.input())
            .map_err(|e| ConversionError::stage_failed(StageName::Notation, e))?;

        let preset = self.preset_for(request)?;
        let impulse = preset.impulse_path(&self.settings.paths.impulses_path());
        let soundfont = self.settings.paths.soundfont_path();
        check_asset("sample bank", &soundfont)?;
        if let Some(ref impulse) = impulse {
            check_asset("impulse response", impulse)?;
        }

        let destination = request.resolve_output(self.settings.paths.output_dir().as_deref());
        if same_file(&destination, request.input()) {
            return Err(ConversionError::invalid_request(format!(
                "output {} would overwrite the input",
                destination.display()
            )));
        }

        let tools = self.resolver.resolve_all()?;

        let logger = RequestLogger::new(
            &request_id,
            &self.settings.paths.logs_folder,
            LogConfig::from(&self.settings.logging),
            self.request_callback(),
        )
        .map_err(|e| ConversionError::internal(format!("creating request log: {}", e)))?;

        logger.info(&format!(
            "Converting {} to {} (reverb: {})",
            request.input().display(),
            request.format(),
            preset.name
        ));
        for tool in [&tools.notation, &tools.synthesizer, &tools.encoder] {
            logger.debug(&format!(
                "{} -> {} ({})",
                tool.tool,
                tool.path.display(),
                tool.origin
            ));
        }

        let mut scope = self.artifacts.scope(request_id.clone());
        let artifacts = ArtifactPaths::acquire(&scope, request.format())?;

        let ctx = Context {
            request,
            request_id: &request_id,
            settings: &self.settings,
            tools: &tools,
            artifacts: &artifacts,
            preset,
            impulse: impulse.as_deref(),
            soundfont: &soundfont,
            logger: &logger,
            cancel,
        };

        let mut state = ConversionState::new(&request_id);
        let outcome = self
            .pipeline
            .run(&ctx, &self.runner, &mut state)
            .and_then(|()| finalize(&artifacts.encoded, &destination, request.format(), &logger));

        match outcome {
            Ok(()) => {
                if let Ok(summary) = serde_json::to_string(&state) {
                    logger.debug(&summary);
                }
                logger.success(&format!(
                    "Wrote {} in {:.2}s",
                    destination.display(),
                    started.elapsed().as_secs_f64()
                ));
                tracing::info!(
                    "[{}] {} -> {}",
                    request_id,
                    request.input().display(),
                    destination.display()
                );
                Ok(destination)
            }
            Err(e) => {
                if self.settings.debug.keep_intermediates_on_failure {
                    let kept = scope.keep();
                    logger.warn(&format!("Keeping intermediates in {}", kept.display()));
                }
                tracing::error!("[{}] {}", request_id, e);
                Err(e)
            }
        }
    }

    fn preset_for(&self, request: &ConversionRequest) -> ConversionResult<&'static ReverbPreset> {
        let name = request
            .reverb()
            .unwrap_or(self.settings.reverb.default_preset.as_str());
        Ok(catalog().get(name)?)
    }

    fn request_callback(&self) -> Option<LogCallback> {
        self.callback.as_ref().map(|cb| {
            let cb = Arc::clone(cb);
            Box::new(move |line: &str| cb(line)) as LogCallback
        })
    }
}

fn check_asset(what: &str, path: &Path) -> ConversionResult<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ConversionError::invalid_request(format!(
            "{} not found at {}",
            what,
            path.display()
        )))
    }
}

/// True when both paths name the same file. Paths that do not exist yet
/// are compared as written.
fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn check_input(path: &Path) -> Result<(), StageError> {
    File::open(path)
        .and_then(|f| f.metadata())
        .map_err(|e| StageError::input_unreadable(path, e.to_string()))
        .and_then(|m| {
            if m.is_file() {
                Ok(())
            } else {
                Err(StageError::input_unreadable(path, "not a regular file"))
            }
        })
}

/// Move the encoded artifact to its final location.
fn finalize(
    encoded: &Path,
    destination: &Path,
    format: OutputFormat,
    logger: &RequestLogger,
) -> ConversionResult<()> {
    let header = read_header(encoded).unwrap_or_default();
    if !format.matches_signature(&header) {
        logger.warn(&format!(
            "{} does not look like a {} file",
            encoded.display(),
            format
        ));
    }

    let io_failure = |operation: &str, e: io::Error| {
        ConversionError::stage_failed(StageName::Encode, StageError::io_error(operation, e))
    };

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_failure("creating output directory", e))?;
    }

    if fs::rename(encoded, destination).is_err() {
        // Temp root and destination may sit on different filesystems. Copy
        // next to the destination first so a failed copy never leaves a
        // truncated file under the final name.
        let partial = partial_path(destination);
        let placed = fs::copy(encoded, &partial)
            .map_err(|e| io_failure("copying final output", e))
            .and_then(|_| {
                fs::rename(&partial, destination)
                    .map_err(|e| io_failure("moving final output into place", e))
            });
        if let Err(e) = placed {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        let _ = fs::remove_file(encoded);
    }
    Ok(())
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(12);
    File::open(path)?.take(12).read_to_end(&mut header)?;
    Ok(header)
}
