//! dupkeeper - duplicate file finder with a result cache and safe deletion.
//!
//! A scan walks one or more directory trees, groups regular files by size
//! and confirms duplicates by BLAKE3 content hash. Results are cached per
//! directory set so they can be shown again or acted on later. The deletion
//! engine never removes the last copy of a file.

pub mod actions;
pub mod cache;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::actions::{DeleteConfig, DeletionEngine, DeletionReport};
use crate::cache::ResultCache;
use crate::cli::{Cli, Commands, DeleteArgs, DeleteTarget, FindArgs, OutputFormat, ShowArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, SortOrder};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::scanner::DirectorySet;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error for invalid directories, unsafe deletion requests and
/// failures writing the cache or stdout.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config = match cli.config {
        Some(ref path) => Config::load_from_path(path),
        None => Config::load(),
    };
    config.merge_cli(&cli);
    log::debug!("Effective configuration: {:?}", config);

    let color = !cli.no_color && std::io::stdout().is_terminal();
    let app = App {
        cache: config.result_cache(),
        text: TextOutput::new(color),
        quiet: cli.quiet,
        config,
    };

    match cli.command {
        Commands::FindDuplicates(args) => app.find_duplicates(&args),
        Commands::ShowDuplicates(args) => app.show_duplicates(&args),
        Commands::DeleteDuplicates(args) => app.delete_duplicates(&args),
        Commands::ClearCache => app.clear_cache(),
    }
}

struct App {
    config: Config,
    cache: ResultCache,
    text: TextOutput,
    quiet: bool,
}

impl App {
    fn scan(&self, directories: DirectorySet, config: &Config) -> Result<DuplicateFinder> {
        let finder_config = config
            .finder_config()
            .with_progress_callback(Arc::new(Progress::new(self.quiet)));
        let mut finder =
            DuplicateFinder::scan(directories, finder_config).context("Failed to scan directories")?;
        finder.sort_duplicates_alphabetically();

        let summary = finder.summary();
        log::info!(
            "Scanned {} files: {} duplicate group(s), {} reclaimable",
            summary.total_files,
            summary.duplicate_groups,
            summary.reclaimable_display()
        );
        Ok(finder)
    }

    fn find_duplicates(&self, args: &FindArgs) -> Result<ExitCode> {
        let mut config = self.config.clone();
        config.merge_hashing_args(&args.hashing);

        let directories =
            DirectorySet::resolve(&args.directories).context("Invalid directory argument")?;
        let finder = self.scan(directories, &config)?;
        let exit_code = self.print_duplicates(&finder, args.output, false)?;

        let entry = self
            .cache
            .store(finder.result())
            .context("Failed to store scan result in cache")?;
        log::debug!("Cached scan result at {}", entry.display());

        Ok(exit_code)
    }

    fn show_duplicates(&self, args: &ShowArgs) -> Result<ExitCode> {
        let directories =
            DirectorySet::resolve(&args.directories).context("Invalid directory argument")?;
        let threshold = args.threshold.map_or_else(
            || self.config.show_threshold(),
            |m| std::time::Duration::from_secs(m.saturating_mul(60)),
        );

        let Some(result) = self.cache.lookup(&directories, threshold) else {
            let dirs: Vec<String> = directories
                .iter()
                .map(|d| d.display().to_string())
                .collect();
            println!(
                "No cached result for dirs: [{}] exist within threshold. Use dupkeeper find-duplicates",
                dirs.join(", ")
            );
            return Ok(ExitCode::NoDuplicates);
        };

        let mut finder = DuplicateFinder::from_result(result, self.config.finder_config());
        finder.sort_duplicates_alphabetically();
        self.print_duplicates(&finder, args.output, true)
    }

    fn print_duplicates(
        &self,
        finder: &DuplicateFinder,
        format: OutputFormat,
        from_cache: bool,
    ) -> Result<ExitCode> {
        let exit_code = if finder.result().has_duplicates() {
            ExitCode::Success
        } else {
            ExitCode::NoDuplicates
        };
        let sorted = finder.size_sorted_duplicates(SortOrder::Descending);

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        match format {
            OutputFormat::Text => {
                write!(out, "{}", self.text.duplicates(&sorted))?;
                if let Some(hint) = self.text.empty_files_hint(finder.empty_files().len()) {
                    log::info!("{}", hint);
                }
            }
            OutputFormat::Json => {
                JsonOutput::new(
                    &sorted,
                    finder.empty_files(),
                    finder.summary(),
                    from_cache,
                    exit_code,
                )
                .write_to(&mut out)
                .context("Failed to write JSON output")?;
            }
        }
        out.flush()?;
        Ok(exit_code)
    }

    fn delete_duplicates(&self, args: &DeleteArgs) -> Result<ExitCode> {
        let mut config = self.config.clone();
        config.merge_hashing_args(&args.hashing);

        let directories =
            DirectorySet::resolve(&args.directories).context("Invalid directory argument")?;

        let cached = if args.rescan {
            None
        } else {
            self.cache.lookup(&directories, config.reuse_threshold())
        };

        let finder = match cached {
            Some(result) => {
                log::info!("Using cached scan result");
                DuplicateFinder::from_result(result, config.finder_config())
            }
            None => {
                let finder = self.scan(directories, &config)?;
                if let Err(e) = self.cache.store(finder.result()) {
                    log::warn!("Failed to cache scan result: {}", e);
                }
                finder
            }
        };

        let mut engine = DeletionEngine::new(finder);
        let delete_config = if args.dry_run {
            DeleteConfig::dry_run()
        } else {
            DeleteConfig::execute()
        }
        .with_trash(args.trash);

        let report: DeletionReport = match args.target.target() {
            DeleteTarget::Directories(dirs) => engine.remove_in_directories(&dirs, &delete_config),
            DeleteTarget::Patterns(patterns) => engine.remove_by_pattern(&patterns, &delete_config),
            DeleteTarget::EmptyFiles => engine.delete_empty_files(&delete_config),
        }
        .context("Refusing to delete")?;

        print!("{}", self.text.deletion(&report));
        log::info!("{}", report.summary());

        if report.removed_any() {
            let cleanup = self.cache.invalidate(engine.finder().directories());
            log::debug!("Invalidated {} cache entr(ies)", cleanup.removed.len());
            for (path, err) in &cleanup.failed {
                log::warn!("Failed to invalidate cache entry {}: {}", path.display(), err);
            }
        }

        Ok(if report.all_succeeded() {
            ExitCode::Success
        } else {
            ExitCode::PartialFailure
        })
    }

    fn clear_cache(&self) -> Result<ExitCode> {
        let report = self.cache.clear_all();
        print!("{}", self.text.cleanup(&report));
        Ok(if report.has_failures() {
            ExitCode::PartialFailure
        } else {
            ExitCode::Success
        })
    }
}
