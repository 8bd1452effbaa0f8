//! Output rendering for the CLI.

use super::OutputFormat;
use console::{style, Term};
use serde::Serialize;
use serde_json::{json, Value};
use theme_pair_matcher::core::pipeline::PipelineResult;
use theme_pair_matcher::core::scorer::{score_breakdown, ScoringConfig};
use theme_pair_matcher::core::session::{LibraryImage, LibraryPair, LibrarySession, PairStatus};
use theme_pair_matcher::store::Preferences;

pub(super) fn pipeline_result(term: &Term, result: &PipelineResult, output: OutputFormat) {
    match output {
        OutputFormat::Pretty => {
            term.write_line("").ok();
            term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
                .ok();
            term.write_line("").ok();
            term.write_line(&format!(
                "  {} images analyzed in {:.1}s",
                style(result.loaded_images).cyan(),
                result.duration_ms as f64 / 1000.0
            ))
            .ok();

            let skipped = result.total_images - result.loaded_images;
            if skipped > 0 {
                term.write_line(&format!(
                    "  {} files could not be read",
                    style(skipped).yellow()
                ))
                .ok();
            }
            if !result.errors.is_empty() {
                for error in &result.errors {
                    term.write_line(&format!("    {}", style(error).dim())).ok();
                }
            }

            term.write_line("").ok();
            session(term, &result.session, output, false);
        }
        OutputFormat::Json => print_json(&json!({
            "total_images": result.total_images,
            "loaded_images": result.loaded_images,
            "duration_ms": result.duration_ms,
            "errors": result.errors,
            "session": session_summary(&result.session),
        })),
        OutputFormat::Minimal => session(term, &result.session, output, false),
    }
}

pub(super) fn session(term: &Term, session: &LibrarySession, output: OutputFormat, verbose: bool) {
    match output {
        OutputFormat::Pretty => print_pretty_session(term, session, verbose),
        OutputFormat::Json => print_json(&session_summary(session)),
        OutputFormat::Minimal => {
            for pair in &session.pairs {
                println!("{}\t{}", pair.dark_image.source, pair.light_image.source);
            }
        }
    }
}

pub(super) fn preferences(term: &Term, preferences: &Preferences, output: OutputFormat) {
    match output {
        OutputFormat::Pretty => {
            let on_off = |skip: bool| if skip { "skipped" } else { "asked" };
            term.write_line(&format!("{}", style("Preferences").bold().underlined()))
                .ok();
            term.write_line(&format!("  Export format:        {}", preferences.export_format))
                .ok();
            term.write_line(&format!(
                "  Delete confirmation:  {}",
                on_off(preferences.confirmations.skip_delete)
            ))
            .ok();
            term.write_line(&format!(
                "  Unpair confirmation:  {}",
                on_off(preferences.confirmations.skip_unpair)
            ))
            .ok();
            term.write_line(&format!(
                "  Reset confirmation:   {}",
                on_off(preferences.confirmations.skip_reset)
            ))
            .ok();
            for template in &preferences.templates {
                term.write_line(&format!(
                    "  Template {} ({} regions)",
                    style(&template.name).cyan(),
                    template.regions.len()
                ))
                .ok();
            }
        }
        OutputFormat::Json | OutputFormat::Minimal => print_json(preferences),
    }
}

pub(super) fn notice(term: &Term, output: OutputFormat, message: &str) {
    match output {
        OutputFormat::Json => print_json(&json!({ "message": message })),
        _ => {
            term.write_line(&format!("{} {}", style("•").yellow(), message)).ok();
        }
    }
}

fn print_pretty_session(term: &Term, session: &LibrarySession, verbose: bool) {
    term.write_line(&format!(
        "  {} pairs ({} completed), {} to review, {} unmatched",
        style(session.pairs.len()).cyan(),
        style(session.completed_count()).green(),
        style(session.review_pairs.len()).yellow(),
        style(session.unmatched_image_ids.len()).dim()
    ))
    .ok();
    term.write_line("").ok();

    if !session.pairs.is_empty() {
        term.write_line(&format!("{}", style("Pairs:").bold().underlined()))
            .ok();
        for pair in &session.pairs {
            let marker = match (pair.is_completed(), pair.status) {
                (true, _) => style("✓").green().to_string(),
                (false, PairStatus::Manual) => style("★").cyan().to_string(),
                (false, PairStatus::Auto) => style("○").dim().to_string(),
            };
            write_pair(term, &marker, pair, verbose);
        }
        term.write_line("").ok();
    }

    if !session.review_pairs.is_empty() {
        term.write_line(&format!("{}", style("Needs review:").bold().underlined()))
            .ok();
        for item in &session.review_pairs {
            write_pair(term, &style("?").yellow().to_string(), &item.pair, verbose);
        }
        term.write_line("").ok();
    }

    let unmatched = session.unmatched_images();
    if !unmatched.is_empty() {
        term.write_line(&format!("{}", style("Unmatched:").bold().underlined()))
            .ok();
        for image in unmatched {
            term.write_line(&format!(
                "    {} {}",
                style(&image.id).dim(),
                image.file_name
            ))
            .ok();
        }
        term.write_line("").ok();
    }
}

fn write_pair(term: &Term, marker: &str, pair: &LibraryPair, verbose: bool) {
    term.write_line(&format!(
        "  {} {} {:.0}% ({})",
        marker,
        style(&pair.id).bold(),
        pair.score * 100.0,
        pair.reason
    ))
    .ok();
    term.write_line(&format!("      dark:  {}", pair.dark_image.file_name))
        .ok();
    term.write_line(&format!("      light: {}", pair.light_image.file_name))
        .ok();

    if verbose {
        let breakdown = score_breakdown(
            &pair.dark_image.features,
            &pair.light_image.features,
            &ScoringConfig::default(),
        );
        term.write_line(&format!("      {}", style(breakdown.describe()).dim()))
            .ok();
    }
}

/// Session without pixel-derived payloads
fn session_summary(session: &LibrarySession) -> Value {
    let image = |image: &LibraryImage| {
        json!({
            "id": image.id,
            "fileName": image.file_name,
            "source": image.source,
            "meanLuminance": image.features.mean_luminance,
            "edgeHash": image.features.edge_hash.to_hex(),
        })
    };
    let pair = |pair: &LibraryPair| {
        json!({
            "id": pair.id,
            "darkImage": image(&pair.dark_image),
            "lightImage": image(&pair.light_image),
            "score": pair.score,
            "status": pair.status,
            "reason": pair.reason,
            "completedAt": pair.completed_at,
        })
    };

    json!({
        "pairs": session.pairs.iter().map(&pair).collect::<Vec<_>>(),
        "reviewPairs": session.review_pairs.iter().map(|item| pair(&item.pair)).collect::<Vec<_>>(),
        "unmatched": session.unmatched_images().into_iter().map(&image).collect::<Vec<_>>(),
        "appendBatches": session.append_batches,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render JSON: {}", e),
    }
}
