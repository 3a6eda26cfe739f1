//! Task runner: select files, process them in parallel, write results back.
//!
//! Each [`Task`] pairs a file selection (include/exclude globs from its config
//! section) with one engine:
//!
//! | Task | Selects (stock) | Engine |
//! |---|---|---|
//! | `js` | `**/*.js` minus `*.min.js`, `*-min.js` | minify-js |
//! | `css` | `**/*.css` minus `*.min.css`, `*-min.css` | lightningcss |
//! | `html` | `**/*.html` | minify-html |
//! | `images` | `**/*.jpg`, `**/*.jpeg`, `**/*.png` | planner → scale → compress |
//! | `vectors` | `**/*.gif`, `**/*.svg` | GIF re-encode / usvg rewrite |
//!
//! ## Per-file flow
//!
//! ```text
//! read ─► ledger hit? ──yes──► Cached
//!            │ no
//!            ▼
//!         engine ─► image, new file name, or smaller? ──no──► Unchanged
//!                                  │ yes
//!                                  ▼
//!                               write ─► Written
//! ```
//!
//! Image outputs are always written: the rescale is the point of the task,
//! even when the recompressed file comes out larger than the source. Text and
//! vector outputs replace the source only when they are smaller.
//!
//! Images may get a new name (target format, suffix tokens). The output is
//! written next to the source and the source is left in place. A new name
//! that is itself a file selected by the same run is not written (the file is
//! reported `Skipped`), and two sources renamed onto the same output fail the
//! task.
//!
//! ## Failure
//!
//! The first file that fails stops its task: the error (naming the file) is
//! returned and no report is produced. The ledger is saved either way, so
//! files finished before the failure are not redone on the next run.
//!
//! ## Parallel Processing
//!
//! Files of one task run on the global [rayon](https://docs.rs/rayon) pool.
//! [`Pipeline::run_all`] also runs several tasks at once. The ledger is the
//! only shared mutable state and sits behind a `Mutex`.

use crate::cache::{self, Ledger};
use crate::config::AssetConfig;
use crate::imaging::{
    BackendError, CompressParams, ImageBackend, PlanError, RescalePlanner, RustBackend,
    SourceImage, vector,
};
use crate::minify::{self, HtmlOptions, MinifyError};
use crate::scan::{self, ScanError, SelectedFile};
use lightningcss::targets::Browsers;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("Image processing failed for {path}: {source}")]
    Image { path: PathBuf, source: BackendError },
    #[error("Minification failed for {path}: {source}")]
    Minify { path: PathBuf, source: MinifyError },
    #[error("css.compatibility: {0}")]
    Compatibility(MinifyError),
    #[error("Failed to hash task settings: {0}")]
    Params(#[from] serde_json::Error),
    #[error("Failed to save ledger: {0}")]
    Ledger(std::io::Error),
    #[error("{first} and {second} would both be written to {output}")]
    OutputCollision {
        output: String,
        first: String,
        second: String,
    },
}

/// A named unit of work over the public tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    Js,
    Css,
    Html,
    #[serde(alias = "jpg|png")]
    Images,
    #[serde(alias = "gif|svg")]
    Vectors,
}

impl Task {
    pub const ALL: [Task; 5] = [Task::Js, Task::Css, Task::Html, Task::Images, Task::Vectors];

    pub fn name(self) -> &'static str {
        match self {
            Task::Js => "js",
            Task::Css => "css",
            Task::Html => "html",
            Task::Images => "images",
            Task::Vectors => "vectors",
        }
    }
}

impl std::fmt::Display for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened to one selected file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// New bytes were written to `output`.
    Written,
    /// The engine's result was not smaller; the original was kept.
    Unchanged,
    /// The ledger says this exact file was already processed with these settings.
    Cached,
    /// The renamed output would overwrite another file selected in the same run.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Source path relative to the public root.
    pub source: String,
    /// Where the result lives; equals `source` unless the file was renamed.
    pub output: String,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub status: FileStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: Task,
    pub files: Vec<FileOutcome>,
}

impl TaskReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    /// Bytes before and after, summed over written files.
    pub fn written_bytes(&self) -> (u64, u64) {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Written)
            .fold((0, 0), |(before, after), f| {
                (before + f.bytes_before, after + f.bytes_after)
            })
    }
}

/// Progress events sent to the CLI while tasks run.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    TaskStarted { task: Task, file_count: usize },
    FileDone { task: Task, outcome: FileOutcome },
}

/// Task settings resolved once per run.
enum Engine {
    Js,
    Css(Option<Browsers>),
    Html(HtmlOptions),
    Images {
        planner: RescalePlanner,
        compress: CompressParams,
    },
    Vectors {
        gif_level: u8,
    },
}

impl Engine {
    /// Whether a same-name result only replaces the source when it is smaller.
    fn writes_only_if_smaller(&self) -> bool {
        !matches!(self, Engine::Images { .. })
    }
}

struct Job {
    task: Task,
    engine: Engine,
    params_hash: String,
}

/// Output names seen during one task run.
struct Outputs<'f> {
    /// Relative paths of every file the task selected.
    selected: HashSet<&'f str>,
    /// Renamed output → the source that produced it.
    claimed: Mutex<HashMap<String, String>>,
}

impl<'f> Outputs<'f> {
    fn new(files: &'f [SelectedFile]) -> Self {
        Self {
            selected: files.iter().map(|f| f.relative.as_str()).collect(),
            claimed: Mutex::new(HashMap::new()),
        }
    }

    /// Reserve `output` for `source`, failing if another source holds it.
    fn claim(&self, output: &str, source: &str) -> Result<(), TaskError> {
        let mut claimed = self.claimed.lock().unwrap_or_else(|e| e.into_inner());
        match claimed.get(output) {
            Some(owner) if owner != source => {
                let (first, second) = if owner.as_str() < source {
                    (owner.clone(), source.to_string())
                } else {
                    (source.to_string(), owner.clone())
                };
                Err(TaskError::OutputCollision {
                    output: output.to_string(),
                    first,
                    second,
                })
            }
            _ => {
                claimed.insert(output.to_string(), source.to_string());
                Ok(())
            }
        }
    }
}

/// Engine result for one file.
struct Produced {
    /// New file name in the source's directory; `None` overwrites the source.
    rename: Option<String>,
    /// `None` when the engine chose to leave the file alone.
    bytes: Option<Vec<u8>>,
}

/// Runs tasks over one public tree with one backend and one ledger.
pub struct Pipeline<'a, B: ImageBackend> {
    backend: &'a B,
    config: &'a AssetConfig,
    public_dir: PathBuf,
    ledger: Mutex<Ledger>,
    events: Option<Sender<TaskEvent>>,
}

impl<'a, B: ImageBackend> Pipeline<'a, B> {
    /// `use_cache = false` starts from an empty ledger (`--no-cache`).
    pub fn new(backend: &'a B, config: &'a AssetConfig, public_dir: &Path, use_cache: bool) -> Self {
        let ledger = if use_cache {
            Ledger::load(public_dir)
        } else {
            Ledger::empty()
        };
        Self {
            backend,
            config,
            public_dir: public_dir.to_path_buf(),
            ledger: Mutex::new(ledger),
            events: None,
        }
    }

    pub fn with_events(mut self, events: Sender<TaskEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: TaskEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }

    /// Run one task and save the ledger, even when the task fails.
    pub fn run(&self, task: Task) -> Result<TaskReport, TaskError> {
        let result = self.run_files(task);
        let saved = self.save_ledger();
        let report = result?;
        saved?;
        Ok(report)
    }

    /// Run several tasks concurrently. Every task runs to completion or to its
    /// own first error; results come back in the order given, with repeated
    /// tasks run once.
    pub fn run_all(&self, tasks: &[Task]) -> Vec<Result<TaskReport, TaskError>> {
        let mut unique = Vec::with_capacity(tasks.len());
        for task in tasks {
            if !unique.contains(task) {
                unique.push(*task);
            }
        }
        unique.par_iter().map(|task| self.run(*task)).collect()
    }

    fn save_ledger(&self) -> Result<(), TaskError> {
        let mut ledger = self.ledger.lock().unwrap_or_else(|e| e.into_inner());
        ledger.prune(&self.public_dir);
        ledger.save(&self.public_dir).map_err(TaskError::Ledger)
    }

    fn run_files(&self, task: Task) -> Result<TaskReport, TaskError> {
        let files = select(self.config, &self.public_dir, task)?;
        let job = self.job(task)?;
        tracing::info!(%task, files = files.len(), "task started");
        self.emit(TaskEvent::TaskStarted {
            task,
            file_count: files.len(),
        });

        let outputs = Outputs::new(&files);
        let outcomes = files
            .par_iter()
            .map(|file| {
                let outcome = self.process_file(&job, &outputs, file)?;
                self.emit(TaskEvent::FileDone {
                    task,
                    outcome: outcome.clone(),
                });
                Ok(outcome)
            })
            .collect::<Result<Vec<_>, TaskError>>()?;

        Ok(TaskReport {
            task,
            files: outcomes,
        })
    }

    fn job(&self, task: Task) -> Result<Job, TaskError> {
        let config = self.config;
        let (engine, params_hash) = match task {
            Task::Js => (Engine::Js, cache::hash_params("js", &())?),
            Task::Css => (
                Engine::Css(config.css.browsers().map_err(TaskError::Compatibility)?),
                cache::hash_params("css", &config.css.compatibility)?,
            ),
            Task::Html => {
                let options = config.html.options();
                let key = (options.remove_comments, options.minify_js, options.minify_css);
                (Engine::Html(options), cache::hash_params("html", &key)?)
            }
            Task::Images => (
                Engine::Images {
                    planner: config.images.planner(),
                    compress: config.compress.params(),
                },
                cache::hash_params("images", &(&config.images, &config.compress))?,
            ),
            Task::Vectors => (
                Engine::Vectors {
                    gif_level: config.vectors.gif_level,
                },
                cache::hash_params("vectors", &config.vectors.gif_level)?,
            ),
        };
        Ok(Job {
            task,
            engine,
            params_hash,
        })
    }

    fn is_cached(&self, relative: &str, content_hash: &str, params_hash: &str) -> bool {
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_current(relative, content_hash, params_hash)
    }

    fn record(&self, relative: &str, content_hash: String, params_hash: &str) {
        self.ledger
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(relative.to_string(), content_hash, params_hash.to_string());
    }

    fn process_file(
        &self,
        job: &Job,
        outputs: &Outputs<'_>,
        file: &SelectedFile,
    ) -> Result<FileOutcome, TaskError> {
        let bytes = std::fs::read(&file.path).map_err(|source| TaskError::Read {
            path: file.path.clone(),
            source,
        })?;
        let bytes_before = bytes.len() as u64;
        let content_hash = cache::hash_bytes(&bytes);

        let outcome = |output: String, bytes_after: u64, status| FileOutcome {
            source: file.relative.clone(),
            output,
            bytes_before,
            bytes_after,
            status,
        };

        if self.is_cached(&file.relative, &content_hash, &job.params_hash) {
            tracing::debug!(task = %job.task, file = %file.relative, "unchanged since last run, skipping");
            return Ok(outcome(file.relative.clone(), bytes_before, FileStatus::Cached));
        }

        let produced = self.apply(&job.engine, file, bytes)?;

        let Some(new_bytes) = produced.bytes else {
            self.record(&file.relative, content_hash, &job.params_hash);
            return Ok(outcome(file.relative.clone(), bytes_before, FileStatus::Unchanged));
        };

        let (output_rel, output_path) = match &produced.rename {
            Some(name) => (sibling(&file.relative, name), file.path.with_file_name(name)),
            None => (file.relative.clone(), file.path.clone()),
        };
        let renamed = output_rel != file.relative;

        if renamed {
            if outputs.selected.contains(output_rel.as_str()) {
                tracing::warn!(
                    task = %job.task,
                    file = %file.relative,
                    output = %output_rel,
                    "output name belongs to another selected file, skipping"
                );
                return Ok(outcome(output_rel, bytes_before, FileStatus::Skipped));
            }
            outputs.claim(&output_rel, &file.relative)?;
        }

        if !renamed
            && job.engine.writes_only_if_smaller()
            && new_bytes.len() as u64 >= bytes_before
        {
            tracing::debug!(task = %job.task, file = %file.relative, "result not smaller, keeping original");
            self.record(&file.relative, content_hash, &job.params_hash);
            return Ok(outcome(file.relative.clone(), bytes_before, FileStatus::Unchanged));
        }

        std::fs::write(&output_path, &new_bytes).map_err(|source| TaskError::Write {
            path: output_path.clone(),
            source,
        })?;
        let bytes_after = new_bytes.len() as u64;
        self.record(&output_rel, cache::hash_bytes(&new_bytes), &job.params_hash);
        if renamed {
            // The source stays in place and must not be picked up again either
            self.record(&file.relative, content_hash, &job.params_hash);
        }

        Ok(outcome(output_rel, bytes_after, FileStatus::Written))
    }

    fn apply(&self, engine: &Engine, file: &SelectedFile, bytes: Vec<u8>) -> Result<Produced, TaskError> {
        let minify_err = |source| TaskError::Minify {
            path: file.path.clone(),
            source,
        };
        let image_err = |source| TaskError::Image {
            path: file.path.clone(),
            source,
        };
        let in_place = |bytes| Produced {
            rename: None,
            bytes,
        };

        match engine {
            Engine::Js => Ok(in_place(Some(minify::minify_js(&bytes).map_err(minify_err)?))),
            Engine::Css(browsers) => Ok(in_place(Some(
                minify::minify_css(&bytes, *browsers).map_err(minify_err)?,
            ))),
            Engine::Html(options) => Ok(in_place(Some(minify::minify_html(&bytes, options)))),
            Engine::Images { planner, compress } => {
                let source = SourceImage::new(&file.path, bytes);
                let planned = planner.plan(self.backend, &source)?;
                let scaled = self.backend.scale(&planned).map_err(image_err)?;
                let compressed = self
                    .backend
                    .compress(&scaled, planned.output_format, compress)
                    .map_err(image_err)?;
                let original_name = file.path.file_name().map(|n| n.to_string_lossy());
                let rename = (original_name.as_deref() != Some(planned.output_name.as_str()))
                    .then_some(planned.output_name);
                Ok(Produced {
                    rename,
                    bytes: Some(compressed),
                })
            }
            Engine::Vectors { gif_level } => {
                let extension = file
                    .path
                    .extension()
                    .map(|e| e.to_string_lossy().to_ascii_lowercase());
                let optimized = match extension.as_deref() {
                    Some("gif") => vector::optimize_gif(&bytes, *gif_level).map_err(image_err)?,
                    Some("svg") => vector::optimize_svg(&bytes).map_err(image_err)?,
                    _ => {
                        tracing::debug!(file = %file.relative, "no vector optimizer for this extension");
                        None
                    }
                };
                Ok(in_place(optimized))
            }
        }
    }
}

/// `relative` with its file name replaced by `name`.
fn sibling(relative: &str, name: &str) -> String {
    match relative.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{name}"),
        None => name.to_string(),
    }
}

/// Files a task would process, without touching them.
pub fn select(
    config: &AssetConfig,
    public_dir: &Path,
    task: Task,
) -> Result<Vec<SelectedFile>, TaskError> {
    let selector = config.selector(task)?;
    Ok(scan::scan(public_dir, &selector)?)
}

/// Run one task with the pure-Rust image backend.
pub fn run_task(
    config: &AssetConfig,
    public_dir: &Path,
    task: Task,
    use_cache: bool,
) -> Result<TaskReport, TaskError> {
    let backend = RustBackend::new();
    Pipeline::new(&backend, config, public_dir, use_cache).run(task)
}
