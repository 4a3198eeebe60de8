//! Candidate ranker: adaptive job-candidate ranking with feedback-driven weights

mod cli;
mod config;
mod embedding;
mod error;
mod extraction;
mod index;
mod model;
mod ranking;

use clap::Parser;
use cli::{CandidatesAction, Cli, Commands, FeedbackAction, WeightsAction};
use colored::Colorize;
use config::Config;
use embedding::EmbeddingService;
use error::{CandidateRankerError, Result};
use extraction::RequirementExtractor;
use index::CandidateIndex;
use indicatif::ProgressBar;
use log::{error, info};
use model::Candidate;
use ranking::{
    AdjustmentOutcome, FeedbackStore, FeedbackSubmission, RankingEngine, ScoringEngine,
    WeightVector, WeightsManager,
};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

async fn run_command(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Rank {
            job,
            candidates,
            semantic,
            json,
        } => {
            let job_text = load_job_description(&job)?;
            let pool = load_candidates(&candidates)?;
            let use_semantic = semantic || config.scoring.use_semantic;
            info!(
                "event=rank_requested candidates={} semantic={}",
                pool.len(),
                use_semantic
            );

            let engine = ranking_engine(&config)?;
            // The embedding model is only worth loading when semantic scoring
            // was requested; lexical ranking runs entirely offline.
            let embeddings = if use_semantic {
                Arc::new(EmbeddingService::new(&config.embedding).await)
            } else {
                Arc::new(EmbeddingService::unavailable(&config.embedding))
            };
            let scoring = ScoringEngine::new(Arc::clone(&embeddings))?;

            let weights = engine.weights();
            let ranked = scoring
                .score_candidates(&job_text, pool, &weights, use_semantic)
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&ranked)?);
            } else {
                print_ranked(&ranked, &weights);
            }
        }

        Commands::Extract { job, json } => {
            let job_text = load_job_description(&job)?;
            let extractor = RequirementExtractor::new()?;
            let requirements = extractor.parse(&job_text);

            if json {
                println!("{}", serde_json::to_string_pretty(&requirements)?);
            } else {
                println!("📋 Extracted Requirements\n");
                if requirements.required_skills.is_empty() {
                    println!("Required skills: none detected");
                } else {
                    println!(
                        "Required skills: {}",
                        requirements.required_skills.join(", ")
                    );
                }
                println!(
                    "Minimum experience: {} years",
                    requirements.min_experience_years
                );
                if !requirements.keywords.is_empty() {
                    println!("Keywords: {}", requirements.keywords.join(", "));
                }
            }
        }

        Commands::Index {
            candidates,
            recruiter,
        } => {
            let pool = load_candidates(&candidates)?;
            let recruiter = recruiter.unwrap_or_else(|| "default".to_string());

            println!(
                "📦 Indexing {} candidates for recruiter '{}'",
                pool.len(),
                recruiter
            );

            let (embeddings, index) = candidate_index(&config, true).await?;

            let spinner = ProgressBar::new_spinner();
            spinner.set_message("Embedding and indexing candidates...");
            spinner.enable_steady_tick(Duration::from_millis(100));
            let indexed = index.index_candidates(&pool, &recruiter);
            spinner.finish_and_clear();

            if indexed == 0 && !pool.is_empty() {
                println!("⚠️  No candidates indexed (embedding backend or store unavailable)");
            } else {
                println!("✅ Indexed {} of {} candidates", indexed, pool.len());
            }

            let cache = embeddings.cache_stats();
            info!(
                "event=index_command_done indexed={} cache_entries={} cache_misses={}",
                indexed, cache.entries, cache.misses
            );
        }

        Commands::Search {
            query,
            recruiter,
            top_k,
            json,
        } => {
            let (_embeddings, index) = candidate_index(&config, true).await?;
            let matches = index.semantic_search(&query, recruiter.as_deref(), top_k);

            if json {
                println!("{}", serde_json::to_string_pretty(&matches)?);
            } else if matches.is_empty() {
                println!("🔍 No matches (index empty or embedding backend unavailable)");
            } else {
                println!("🔍 Top {} semantic matches\n", matches.len());
                for (i, candidate) in matches.iter().enumerate() {
                    println!(
                        "{}. {} {}",
                        i + 1,
                        candidate.name.bold(),
                        format_score(candidate.match_score.unwrap_or(0.0))
                    );
                    println!(
                        "   {} years | skills: {}",
                        candidate.experience_years,
                        candidate.skills.join(", ")
                    );
                }
            }
        }

        Commands::Candidates { action } => match action {
            CandidatesAction::List {
                recruiter,
                limit,
                json,
            } => {
                let (_embeddings, index) = candidate_index(&config, false).await?;
                let listed = index.list_candidates(recruiter.as_deref(), limit);

                if json {
                    println!("{}", serde_json::to_string_pretty(&listed)?);
                } else if listed.is_empty() {
                    println!("📭 No indexed candidates");
                } else {
                    println!("👥 {} indexed candidates\n", listed.len());
                    for candidate in &listed {
                        println!(
                            "  • {} ({} years) skills: {}",
                            candidate.name,
                            candidate.experience_years,
                            candidate.skills.join(", ")
                        );
                    }
                }
            }

            CandidatesAction::Find {
                name,
                recruiter,
                json,
            } => {
                let (_embeddings, index) = candidate_index(&config, false).await?;

                match index.find_candidate_by_name(&name, recruiter.as_deref()) {
                    Some(candidate) => {
                        if json {
                            println!("{}", serde_json::to_string_pretty(&candidate)?);
                        } else {
                            println!("👤 {}", candidate.name.bold());
                            println!("  id: {}", candidate.id);
                            println!("  experience: {} years", candidate.experience_years);
                            println!("  skills: {}", candidate.skills.join(", "));
                        }
                    }
                    None => println!("❌ No indexed candidate named '{}'", name),
                }
            }

            CandidatesAction::Stats { json } => {
                let (embeddings, index) = candidate_index(&config, false).await?;
                let index_stats = index.stats();
                let cache_stats = embeddings.cache_stats();

                if json {
                    let combined = serde_json::json!({
                        "index": index_stats,
                        "embedding_cache": cache_stats,
                    });
                    println!("{}", serde_json::to_string_pretty(&combined)?);
                } else {
                    println!("📊 Index Statistics\n");
                    println!("  Available: {}", index_stats.available);
                    println!("  Entries: {}", index_stats.total_entries);
                    println!("\n🧠 Embedding Cache");
                    println!(
                        "  {} of {} entries | {} hits, {} misses",
                        cache_stats.entries,
                        cache_stats.capacity,
                        cache_stats.hits,
                        cache_stats.misses
                    );
                }
            }
        },

        Commands::Weights { action } => {
            let engine = ranking_engine(&config)?;

            match action {
                WeightsAction::Show { json } => {
                    let weights = engine.weights();
                    if json {
                        println!("{}", serde_json::to_string_pretty(&weights)?);
                    } else {
                        print_weights("⚖️  Adaptive scoring weights", &weights);
                    }
                }

                WeightsAction::Set {
                    skills,
                    experience,
                    summary,
                } => {
                    if skills.is_none() && experience.is_none() && summary.is_none() {
                        return Err(CandidateRankerError::InvalidInput(
                            "Provide at least one of --skills, --experience, --summary"
                                .to_string(),
                        ));
                    }

                    let updated = engine.weights_manager().update(skills, experience, summary);
                    print_weights("✅ Weights updated", &updated);
                }

                WeightsAction::Reset => {
                    let weights = engine.weights_manager().reset();
                    print_weights("🔄 Weights reset to defaults", &weights);
                }
            }
        }

        Commands::Feedback { action } => {
            let engine = ranking_engine(&config)?;

            match action {
                FeedbackAction::Add {
                    candidate,
                    job,
                    recruiter,
                    relevant,
                    score,
                    reason,
                    adjust,
                } => {
                    cli::validate_score(score).map_err(CandidateRankerError::InvalidInput)?;

                    let submission = FeedbackSubmission {
                        candidate_id: candidate,
                        job_id: job,
                        recruiter_id: recruiter,
                        is_relevant: relevant,
                        predicted_score: score,
                        feedback_reason: reason.unwrap_or_default(),
                    };
                    submission.validate()?;

                    let (record, adjustment) = engine.record_and_adjust(
                        &submission,
                        adjust,
                        config.scoring.adjustment_limit,
                    );

                    println!("✅ Feedback recorded: {}", record.id);
                    if let Some(outcome) = adjustment {
                        print_adjustment(&outcome);
                    }
                }

                FeedbackAction::Batch { file, adjust } => {
                    cli::validate_file_extension(&file, &["json"])
                        .map_err(CandidateRankerError::InvalidInput)?;
                    let content = std::fs::read_to_string(&file)?;
                    let submissions: Vec<FeedbackSubmission> = serde_json::from_str(&content)?;

                    println!("📨 Processing {} feedback submissions", submissions.len());
                    let outcome =
                        engine.record_batch(&submissions, adjust, config.scoring.adjustment_limit);

                    println!(
                        "✅ Batch complete: {} recorded, {} rejected",
                        outcome.recorded, outcome.rejected
                    );
                    if let Some(adjustment) = outcome.adjustment {
                        print_adjustment(&adjustment);
                    }
                }

                FeedbackAction::Stats {
                    recruiter,
                    days,
                    json,
                } => {
                    let stats = engine.feedback_store().stats(recruiter.as_deref(), days);

                    if json {
                        println!("{}", serde_json::to_string_pretty(&stats)?);
                    } else {
                        println!("📊 Feedback over the last {} days\n", days);
                        println!("  Total: {}", stats.total_feedback);
                        println!(
                            "  Relevant: {} | Irrelevant: {}",
                            stats.relevant_count, stats.irrelevant_count
                        );
                        println!("  Accuracy: {:.1}%", stats.accuracy * 100.0);
                        println!(
                            "  Avg predicted score (relevant): {:.4}",
                            stats.avg_predicted_score_relevant
                        );
                        println!(
                            "  Avg predicted score (irrelevant): {:.4}",
                            stats.avg_predicted_score_irrelevant
                        );
                    }
                }

                FeedbackAction::History { limit, json } => {
                    let records = engine.feedback_store().history(limit);

                    if json {
                        println!("{}", serde_json::to_string_pretty(&records)?);
                    } else if records.is_empty() {
                        println!("📭 No feedback recorded yet");
                    } else {
                        println!("🗒️  Last {} feedback records\n", records.len());
                        for record in &records {
                            let verdict = if record.is_relevant { "✅" } else { "❌" };
                            println!(
                                "  {} {} candidate={} job={} predicted={:.2}",
                                verdict,
                                record.timestamp,
                                record.candidate_id,
                                record.job_id,
                                record.predicted_score
                            );
                        }
                    }
                }

                FeedbackAction::Adjust => {
                    let outcome =
                        engine.adjust_weights_from_feedback(config.scoring.adjustment_limit);
                    print_adjustment(&outcome);
                }
            }
        }
    }

    Ok(())
}

fn ranking_engine(config: &Config) -> Result<RankingEngine> {
    config.ensure_data_dir()?;
    Ok(RankingEngine::new(
        WeightsManager::new(config.weights_path()),
        FeedbackStore::new(config.feedback_path()),
        config.scoring.feedback_window_days,
    ))
}

async fn candidate_index(
    config: &Config,
    load_model: bool,
) -> Result<(Arc<EmbeddingService>, CandidateIndex)> {
    config.ensure_data_dir()?;

    let embeddings = if load_model {
        Arc::new(EmbeddingService::new(&config.embedding).await)
    } else {
        Arc::new(EmbeddingService::unavailable(&config.embedding))
    };
    let index = CandidateIndex::new(
        &config.index,
        config.index_path(),
        Arc::clone(&embeddings),
    );

    Ok((embeddings, index))
}

fn load_job_description(path: &Path) -> Result<String> {
    cli::validate_file_extension(path, &["txt", "md"])
        .map_err(|e| CandidateRankerError::InvalidInput(format!("Job description file: {}", e)))?;

    Ok(std::fs::read_to_string(path)?.trim().to_string())
}

fn load_candidates(path: &Path) -> Result<Vec<Candidate>> {
    cli::validate_file_extension(path, &["json"])
        .map_err(|e| CandidateRankerError::InvalidInput(format!("Candidates file: {}", e)))?;

    let content = std::fs::read_to_string(path)?;
    let parsed: Vec<Candidate> = serde_json::from_str(&content)?;

    // Deserialization bypasses the normalization constructor, so re-apply it
    // here at the boundary.
    Ok(parsed
        .into_iter()
        .map(|c| Candidate::new(c.id, c.name, c.summary, c.experience_years, c.skills))
        .collect())
}

fn print_ranked(candidates: &[Candidate], weights: &WeightVector) {
    println!("\n🏆 Ranked Candidates");
    println!(
        "⚖️  Weights: skills {:.2} | experience {:.2} | summary {:.2}\n",
        weights.skills, weights.experience, weights.summary
    );

    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "{}. {} {}",
            i + 1,
            candidate.name.bold(),
            format_score(candidate.match_score.unwrap_or(0.0))
        );

        if let Some(breakdown) = &candidate.score_breakdown {
            println!(
                "   skills {:.2} | experience {:.2} | summary {:.2} | semantic {:.2}",
                breakdown.skills_score,
                breakdown.experience_score,
                breakdown.summary_similarity,
                breakdown.semantic_score
            );
        }

        for reason in &candidate.match_reasons {
            println!("   • {}", reason);
        }
        println!();
    }
}

fn print_weights(title: &str, weights: &WeightVector) {
    println!("{}\n", title);
    println!("  Skills:     {:.4}", weights.skills);
    println!("  Experience: {:.4}", weights.experience);
    println!("  Summary:    {:.4}", weights.summary);
}

fn print_adjustment(outcome: &AdjustmentOutcome) {
    match outcome {
        AdjustmentOutcome::Skipped {
            reason,
            feedback_count,
            min_required,
        } => {
            println!(
                "⏭️  Adjustment skipped ({}): {} of {} required records",
                reason, feedback_count, min_required
            );
        }
        AdjustmentOutcome::Adjusted {
            feedback_count,
            accuracy,
            previous_weights,
            new_weights,
            adjustments,
        } => {
            println!(
                "🔧 Weights adjusted from {} feedback records (accuracy {:.1}%)",
                feedback_count,
                accuracy * 100.0
            );
            println!(
                "  Skills:     {:.4} -> {:.4} (step {:+.2})",
                previous_weights.skills, new_weights.skills, adjustments.skills
            );
            println!(
                "  Experience: {:.4} -> {:.4} (step {:+.2})",
                previous_weights.experience, new_weights.experience, adjustments.experience
            );
            println!(
                "  Summary:    {:.4} -> {:.4} (step {:+.2})",
                previous_weights.summary, new_weights.summary, adjustments.summary
            );
        }
    }
}

/// Color a score green/yellow/red for quick scanning in the terminal.
fn format_score(score: f32) -> String {
    let text = format!("{:.4}", score);

    if score >= 0.7 {
        text.green().bold().to_string()
    } else if score >= 0.4 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}
