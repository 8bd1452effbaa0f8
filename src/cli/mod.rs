//! # CLI Module
//!
//! Command-line interface for the theme pair matcher.
//!
//! ## Usage
//! ```bash
//! # Build a session from a folder of screenshots
//! pair-match scan ~/Screenshots/app
//!
//! # Add another batch, matching it against the leftovers
//! pair-match append ~/Screenshots/app-v2
//!
//! # Work through the review queue
//! pair-match show --verbose
//! pair-match accept "pair:img-3+img-7"
//!
//! # JSON output
//! pair-match show --output json
//! ```

mod render;

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::thread;
use theme_pair_matcher::core::pipeline::{Pipeline, PipelineResult};
use theme_pair_matcher::core::scorer::ScoringConfig;
use theme_pair_matcher::core::session::{
    accept_review_pair, clear_pair_completed, mark_pair_completed, reject_review_pair,
    remove_images_from_session, unpair_library_pair, AppendMode, LibrarySession,
};
use theme_pair_matcher::error::{PairMatcherError, Result};
use theme_pair_matcher::events::{
    Event, EventChannel, EventSender, ExtractEvent, PipelineEvent, ScanEvent,
};
use theme_pair_matcher::store::{ExportFormat, JsonStore, StoreBackend};

/// Theme Pair Matcher - pair dark and light screenshots of the same screen
#[derive(Parser, Debug)]
#[command(name = "pair-match")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding session.json and preferences.json
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan directories and start a new session
    Scan {
        /// Directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        matching: MatchArgs,
    },
    /// Add screenshots to the current session
    Append {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Also rematch pairs that are neither completed nor accepted by hand
        #[arg(long)]
        release_incomplete: bool,

        #[command(flatten)]
        matching: MatchArgs,
    },
    /// Accept a review item as a pair
    Accept { review_id: String },
    /// Reject a review item; both images become unmatched
    Reject { review_id: String },
    /// Break up a pair; both images become unmatched
    Unpair {
        pair_id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove images from the session
    Remove {
        #[arg(required = true)]
        image_ids: Vec<String>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark a pair as finished editing
    Complete {
        pair_id: String,
        /// Clear the completion mark instead
        #[arg(long)]
        clear: bool,
    },
    /// Show the current session
    Show {
        /// Include the score breakdown of every pair
        #[arg(short, long)]
        verbose: bool,
    },
    /// Discard the current session
    Reset {
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or change preferences
    Prefs {
        #[arg(long)]
        export_format: Option<ExportFormatArg>,
        #[arg(long)]
        skip_delete_confirm: Option<bool>,
        #[arg(long)]
        skip_unpair_confirm: Option<bool>,
        #[arg(long)]
        skip_reset_confirm: Option<bool>,
    },
}

#[derive(clap::Args, Debug)]
struct MatchArgs {
    /// Matching preset
    #[arg(short, long, default_value = "balanced")]
    preset: Preset,

    /// Include hidden files
    #[arg(long)]
    include_hidden: bool,

    /// Show each file as it is analyzed
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    /// Fewer auto-pairs, more review items
    Strict,
    /// Default thresholds
    Balanced,
    /// More auto-pairs
    Lenient,
}

impl From<Preset> for ScoringConfig {
    fn from(preset: Preset) -> Self {
        match preset {
            Preset::Strict => ScoringConfig::strict(),
            Preset::Balanced => ScoringConfig::balanced(),
            Preset::Lenient => ScoringConfig::lenient(),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportFormatArg {
    Png,
    Jpeg,
    Webp,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(format: ExportFormatArg) -> Self {
        match format {
            ExportFormatArg::Png => ExportFormat::Png,
            ExportFormatArg::Jpeg => ExportFormat::Jpeg,
            ExportFormatArg::Webp => ExportFormat::Webp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
    /// Minimal output (one pair per line)
    Minimal,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let store = JsonStore::open(cli.store.unwrap_or_else(JsonStore::default_dir))?;
    let term = Term::stderr();
    let output = cli.output;

    match cli.command {
        Commands::Scan { paths, matching } => {
            let result = run_pipeline(&term, paths, &matching, output, |pipeline, events| {
                pipeline.run_with_events(events)
            })?;
            store.save_session(&result.session)?;
            render::pipeline_result(&term, &result, output);
        }
        Commands::Append {
            paths,
            release_incomplete,
            matching,
        } => {
            let session = store.load_session();
            let mode = if release_incomplete {
                AppendMode::ReleaseIncomplete
            } else {
                AppendMode::UnmatchedOnly
            };
            let result = run_pipeline(&term, paths, &matching, output, |pipeline, events| {
                pipeline.append_with_events(&session, mode, events)
            })?;
            store.save_session(&result.session)?;
            render::pipeline_result(&term, &result, output);
        }
        Commands::Accept { review_id } => {
            let session = store.load_session();
            let next = accept_review_pair(&session, &review_id);
            commit(&store, &term, &session, next, output, "review item", &review_id)?;
        }
        Commands::Reject { review_id } => {
            let session = store.load_session();
            let next = reject_review_pair(&session, &review_id);
            commit(&store, &term, &session, next, output, "review item", &review_id)?;
        }
        Commands::Unpair { pair_id, yes } => {
            let session = store.load_session();
            let skip = yes || store.load_preferences().confirmations.skip_unpair;
            if !confirm(&term, skip, &format!("Unpair {}?", pair_id)) {
                return Ok(());
            }
            let next = unpair_library_pair(&session, &pair_id);
            commit(&store, &term, &session, next, output, "pair", &pair_id)?;
        }
        Commands::Remove { image_ids, yes } => {
            let session = store.load_session();
            let skip = yes || store.load_preferences().confirmations.skip_delete;
            let prompt = format!("Remove {} image(s) from the session?", image_ids.len());
            if !confirm(&term, skip, &prompt) {
                return Ok(());
            }
            let next = remove_images_from_session(&session, &image_ids);
            commit(&store, &term, &session, next, output, "image", &image_ids.join(", "))?;
        }
        Commands::Complete { pair_id, clear } => {
            let session = store.load_session();
            let next = if clear {
                clear_pair_completed(&session, &pair_id)
            } else {
                mark_pair_completed(&session, &pair_id, chrono::Utc::now())
            };
            commit(&store, &term, &session, next, output, "pair", &pair_id)?;
        }
        Commands::Show { verbose } => {
            render::session(&term, &store.load_session(), output, verbose);
        }
        Commands::Reset { yes } => {
            let skip = yes || store.load_preferences().confirmations.skip_reset;
            if !confirm(&term, skip, "Discard the current session?") {
                return Ok(());
            }
            store.save_session(&LibrarySession::default())?;
            render::notice(&term, output, "Session cleared");
        }
        Commands::Prefs {
            export_format,
            skip_delete_confirm,
            skip_unpair_confirm,
            skip_reset_confirm,
        } => {
            let mut preferences = store.load_preferences();
            let before = preferences.clone();

            if let Some(format) = export_format {
                preferences.export_format = format.into();
            }
            if let Some(skip) = skip_delete_confirm {
                preferences.confirmations.skip_delete = skip;
            }
            if let Some(skip) = skip_unpair_confirm {
                preferences.confirmations.skip_unpair = skip;
            }
            if let Some(skip) = skip_reset_confirm {
                preferences.confirmations.skip_reset = skip;
            }

            if preferences != before {
                store.save_preferences(&preferences)?;
            }
            render::preferences(&term, &preferences, output);
        }
    }

    Ok(())
}

fn run_pipeline<F>(
    term: &Term,
    paths: Vec<PathBuf>,
    matching: &MatchArgs,
    output: OutputFormat,
    execute: F,
) -> Result<PipelineResult>
where
    F: FnOnce(&Pipeline, &EventSender) -> Result<PipelineResult>,
{
    if output == OutputFormat::Pretty {
        term.write_line(&format!(
            "{} {}",
            style("Theme Pair Matcher").bold().cyan(),
            style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let pipeline = Pipeline::builder()
        .paths(paths)
        .include_hidden(matching.include_hidden)
        .scoring(matching.preset.into())
        .build()?;

    let (sender, receiver) = EventChannel::new();

    let progress = if output == OutputFormat::Pretty {
        let pb = ProgressBar::new(0);
        let template = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| PairMatcherError::Config(e.to_string()))?;
        pb.set_style(template.progress_chars("█▓░"));
        Some(pb)
    } else {
        None
    };

    let verbose = matching.verbose;

    let event_thread = thread::spawn(move || {
        let Some(pb) = progress else {
            // Drain so senders never see a full channel
            for _ in receiver.iter() {}
            return;
        };
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Completed { total_images }) => {
                    pb.set_length(total_images as u64);
                }
                Event::Extract(ExtractEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                    if verbose {
                        pb.set_message(
                            p.current_path
                                .file_name()
                                .unwrap_or_default()
                                .to_string_lossy()
                                .into_owned(),
                        );
                    }
                }
                Event::Extract(ExtractEvent::Error { path, message }) => {
                    pb.println(format!(
                        "{} {}: {}",
                        style("!").yellow().bold(),
                        path.display(),
                        message
                    ));
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = execute(&pipeline, &sender);

    drop(sender);
    event_thread.join().ok();

    result
}

/// Save `next` if it differs from `current`, otherwise report the unknown id
fn commit(
    store: &JsonStore,
    term: &Term,
    current: &LibrarySession,
    next: LibrarySession,
    output: OutputFormat,
    kind: &str,
    id: &str,
) -> Result<()> {
    if &next == current {
        render::notice(term, output, &format!("No {} matches {}; nothing changed", kind, id));
        return Ok(());
    }
    store.save_session(&next)?;
    render::session(term, &next, output, false);
    Ok(())
}

/// Ask before a destructive action unless the user opted out
fn confirm(term: &Term, skip: bool, prompt: &str) -> bool {
    if skip {
        return true;
    }
    if !term.is_term() {
        term.write_line(&format!("{} (pass --yes to confirm)", prompt)).ok();
        return false;
    }

    term.write_str(&format!("{} [y/N] ", prompt)).ok();
    matches!(
        term.read_line().map(|answer| answer.trim().to_ascii_lowercase()),
        Ok(answer) if answer == "y" || answer == "yes"
    )
}
