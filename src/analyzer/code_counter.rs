//! # Code Counter
//!
//! Walks the project once, recording every file in a [`FileIndex`] and
//! queueing the files of known languages for counting. Counting runs on a
//! pool of worker threads; a single aggregator thread folds their results.

use crate::analyzer::file_index::{file_extension, FileIndex};
use crate::analyzer::line_counter::{FileStats, LineCounter};
use crate::analyzer::rules::{LanguageCatalog, LanguageDefinition};
use crate::analyzer::{AnalysisConfig, LanguageInfo};
use crate::common::file_utils::validate_project_path;
use crate::error::Result;
use crossbeam::channel::{bounded, Receiver, Sender};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use walkdir::{DirEntry, WalkDir};

/// Running totals of one language. Only the aggregator mutates these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangSummary {
    pub name: String,
    pub code: u64,
    pub comment: u64,
    pub blank: u64,
    pub count: usize,
}

impl LangSummary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn absorb(&mut self, stats: &FileStats) {
        self.code += stats.code;
        self.comment += stats.comment;
        self.blank += stats.blank;
        self.count += 1;
    }
}

impl From<LangSummary> for LanguageInfo {
    fn from(summary: LangSummary) -> Self {
        LanguageInfo {
            name: summary.name,
            files: summary.count,
            code_lines: summary.code,
            comment_lines: summary.comment,
            blank_lines: summary.blank,
        }
    }
}

/// Result of one counting pass.
#[derive(Debug)]
pub struct CountOutcome {
    pub root: PathBuf,
    pub index: FileIndex,
    /// Sorted by language name.
    pub summaries: Vec<LangSummary>,
    pub error_files: usize,
}

struct CountTask<'a> {
    path: PathBuf,
    language: &'a LanguageDefinition,
}

struct CountResult<'a> {
    language: &'a str,
    path: PathBuf,
    outcome: io::Result<FileStats>,
}

pub struct CodeCounter<'a> {
    catalog: &'a LanguageCatalog,
    counter: &'a dyn LineCounter,
    config: &'a AnalysisConfig,
}

impl<'a> CodeCounter<'a> {
    pub fn new(
        catalog: &'a LanguageCatalog,
        counter: &'a dyn LineCounter,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            catalog,
            counter,
            config,
        }
    }

    /// Indexes and counts the project at `path`. Only an invalid root fails.
    pub fn count(&self, path: &Path) -> Result<CountOutcome> {
        let root = validate_project_path(path)?;
        let (index, tasks) = self.walk(&root);
        info!(
            "Indexed {} files under {}, {} in known languages",
            index.len(),
            root.display(),
            tasks.len()
        );

        let (summaries, error_files) = self.run_pool(tasks);
        if error_files > 0 {
            warn!("{} files could not be counted", error_files);
        }

        Ok(CountOutcome {
            root,
            index,
            summaries: summaries.into_values().collect(),
            error_files,
        })
    }

    fn walk(&self, root: &Path) -> (FileIndex, Vec<CountTask<'a>>) {
        let mut index = FileIndex::new(root);
        let mut tasks = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden_dir(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            let name = entry.file_name().to_string_lossy().into_owned();
            let ext = file_extension(&name);

            index.add_file(&relative, &name, ext);

            if let Some(language) = self.catalog.resolve(&name, ext) {
                trace!("{} -> {}", relative, language.name);
                tasks.push(CountTask {
                    path: entry.into_path(),
                    language,
                });
            }
        }

        (index, tasks)
    }

    fn run_pool(&self, tasks: Vec<CountTask<'a>>) -> (BTreeMap<String, LangSummary>, usize) {
        let thread_count = worker_count(self.config);
        let (task_sender, task_receiver) = bounded::<CountTask<'a>>(thread_count * 16);
        let (result_sender, result_receiver) = bounded::<CountResult<'a>>(thread_count * 16);
        let progress = progress_bar(tasks.len() as u64, self.config.show_progress);
        let counter = self.counter;

        debug!("Counting {} files with {} workers", tasks.len(), thread_count);

        let aggregated = thread::scope(|scope| {
            let aggregator = scope.spawn(move || aggregate(result_receiver));

            let workers: Vec<_> = (0..thread_count)
                .map(|worker_id| {
                    let task_receiver = task_receiver.clone();
                    let result_sender = result_sender.clone();
                    let progress = progress.clone();
                    scope.spawn(move || {
                        run_worker(worker_id, counter, task_receiver, result_sender, progress)
                    })
                })
                .collect();
            drop(task_receiver);

            for task in tasks {
                if task_sender.send(task).is_err() {
                    break;
                }
            }
            drop(task_sender);

            for worker in workers {
                if worker.join().is_err() {
                    warn!("A counting worker panicked; its remaining files were not counted");
                }
            }
            drop(result_sender);

            aggregator.join().unwrap_or_else(|_| {
                warn!("The aggregator panicked; line counts are unavailable");
                (BTreeMap::new(), 0)
            })
        });

        progress.finish_and_clear();
        aggregated
    }
}

/// `max(1, cpus / 4)` unless configured explicitly.
pub fn worker_count(config: &AnalysisConfig) -> usize {
    if config.worker_threads > 0 {
        config.worker_threads
    } else {
        (num_cpus::get() / 4).max(1)
    }
}

fn run_worker<'a>(
    worker_id: usize,
    counter: &dyn LineCounter,
    tasks: Receiver<CountTask<'a>>,
    results: Sender<CountResult<'a>>,
    progress: ProgressBar,
) {
    trace!("Counting worker {} started", worker_id);

    while let Ok(task) = tasks.recv() {
        let outcome = counter.count_file(&task.path, task.language);
        progress.inc(1);

        let result = CountResult {
            language: &task.language.name,
            path: task.path,
            outcome,
        };
        if results.send(result).is_err() {
            break;
        }
    }

    trace!("Counting worker {} finished", worker_id);
}

fn aggregate(results: Receiver<CountResult<'_>>) -> (BTreeMap<String, LangSummary>, usize) {
    let mut summaries: BTreeMap<String, LangSummary> = BTreeMap::new();
    let mut error_files = 0;

    while let Ok(result) = results.recv() {
        match result.outcome {
            Ok(stats) => summaries
                .entry(result.language.to_string())
                .or_insert_with(|| LangSummary::new(result.language))
                .absorb(&stats),
            Err(e) => {
                error_files += 1;
                debug!("Failed to count {}: {}", result.path.display(), e);
            }
        }
    }

    (summaries, error_files)
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

fn progress_bar(len: u64, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    let template = "{spinner} counting [{bar:40}] {pos}/{len} files";
    if let Ok(style) = ProgressStyle::with_template(template) {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
