//! # Moodmuse
//!
//! Command-line front end for the mood engine: detect a mood from text or a
//! facial-expression frame, and build playlists that match it from a local
//! track catalog.
//!
//! ## Usage
//!
//! ```bash
//! # Load tracks into the local catalog
//! moodmuse catalog import tracks.json
//!
//! # Detect a mood
//! moodmuse detect text "so tired and drained today"
//! moodmuse detect face frame.json --record
//!
//! # Build and save a playlist
//! moodmuse playlist --mood calm --limit 15 --save "Wind down"
//! ```
//!
//! Logging is controlled with `RUST_LOG`, e.g. `RUST_LOG=moodmuse=debug`.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use moodmuse::catalog::sqlite::{self, SqliteCatalog};
use moodmuse::cli::{self, CatalogAction, Command, DetectSource, FeedbackArg, PlaylistArgs};
use moodmuse::completion;
use moodmuse::config::{self, EngineConfig};
use moodmuse::db::{self, FeedbackKind, NewFeedback, PreferencesUpdate};
use moodmuse::engine::{MoodEngine, Playlist};
use moodmuse::mood::{Mood, MoodSignal};
use moodmuse::resolver::PlaylistRequest;
use moodmuse::retriever::SeededGenrePicker;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Storage locations for one invocation.
struct Paths {
    db: PathBuf,
    catalog: PathBuf,
    config: PathBuf,
}

impl Paths {
    fn resolve(args: &cli::Args) -> Result<Self> {
        Ok(Self {
            db: args.db.clone().map_or_else(config::get_db_path, Ok)?,
            catalog: args.catalog.clone().map_or_else(config::get_catalog_path, Ok)?,
            config: args.config.clone().map_or_else(config::get_config_path, Ok)?,
        })
    }
}

fn build_engine(paths: &Paths, config: &EngineConfig, seed: Option<u64>) -> Result<MoodEngine> {
    let catalog = SqliteCatalog::new(&paths.catalog, config.catalog_timeout_ms);
    let mut builder = MoodEngine::builder(Arc::new(catalog))
        .lexicon(Arc::new(config.load_lexicon()?))
        .tables(Arc::new(config.load_mood_tables()?))
        .market(config.market.clone())
        .default_limit(config.default_limit);
    if let Some(seed) = seed {
        debug!("Using seeded genre selection ({seed})");
        builder = builder.genre_picker(Arc::new(SeededGenrePicker::new(seed)));
    }
    Ok(builder.build())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

fn print_signal(signal: &MoodSignal) {
    println!(
        "Mood: {} ({:.0}% confidence, {})",
        signal.mood,
        signal.confidence * 100.0,
        signal.method
    );
}

fn print_playlist(playlist: &Playlist) {
    println!("{} [{}]", playlist.name, playlist.id);
    println!("{}", playlist.description);
    if let Some(genre) = &playlist.genre {
        println!("Genre: {genre}");
    }
    if playlist.fallback_used {
        println!("(broadened beyond the genre to find enough tracks)");
    }
    for (i, track) in playlist.tracks.iter().enumerate() {
        let seconds = track.duration_ms / 1000;
        println!(
            "{:>3}. {} - {} ({}:{:02})",
            i + 1,
            track.artist_line(),
            track.name,
            seconds / 60,
            seconds % 60
        );
    }
    if playlist.tracks.is_empty() {
        println!("No tracks found. Import some with `moodmuse catalog import <FILE>`.");
    }
}

fn detect(paths: &Paths, config: &EngineConfig, source: DetectSource) -> Result<()> {
    let engine = build_engine(paths, config, None)?;
    match source {
        DetectSource::Text { text, record, json } => {
            let analysis = engine.analyze_text(&text)?;
            let signal = &analysis.signal;
            let energy = engine.text_classifier().detect_energy_level(&text);
            let suggestions = engine.text_classifier().suggestions(&signal.mood);

            if record {
                let conn = db::connect(&paths.db)?;
                db::record_mood(&conn, signal, Some(&text))?;
            }
            if json {
                return print_json(&serde_json::json!({
                    "analysis": analysis,
                    "energy": energy,
                    "suggestions": suggestions,
                }));
            }
            print_signal(signal);
            println!("Energy: {energy:?}");
            if !analysis.positive.is_empty() || !analysis.negative.is_empty() {
                println!(
                    "Words: +[{}] -[{}]",
                    analysis.positive.join(", "),
                    analysis.negative.join(", ")
                );
            }
            for line in suggestions {
                println!("  * {line}");
            }
        }
        DetectSource::Face { frame, record, json } => {
            let bytes = fs::read(&frame)
                .with_context(|| format!("Failed to read frame {}", frame.display()))?;
            let analysis = engine.detect_expression(&bytes)?;

            if record {
                let conn = db::connect(&paths.db)?;
                db::record_mood(&conn, &analysis.signal, None)?;
            }
            if json {
                return print_json(&analysis);
            }
            print_signal(&analysis.signal);
            for (label, probability) in &analysis.expressions {
                println!("  {label:<10} {probability:.2}");
            }
        }
    }
    Ok(())
}

fn playlist(paths: &Paths, config: &EngineConfig, args: PlaylistArgs) -> Result<()> {
    let engine = build_engine(paths, config, args.seed)?;

    let mood = match (args.mood, args.text) {
        (Some(mood), _) => mood,
        (None, Some(text)) => {
            let signal = engine.classify_text(&text)?;
            if !args.json {
                print_signal(&signal);
            }
            signal.mood.to_string()
        }
        (None, None) => anyhow::bail!("Either --mood or --text is required"),
    };

    let mut request = PlaylistRequest::for_mood(mood);
    if !args.genres.is_empty() {
        request = request.with_genres(args.genres);
    }
    request.artist = args.artist;
    request.energy_level = args.energy;
    request.limit = args.limit;
    request.market = args.market;

    info!("Building playlist for {}", request.mood);
    let playlist = engine.build_playlist(&request)?;

    if let Some(name) = args.save {
        let mut conn = db::connect(&paths.db)?;
        let saved = db::save_playlist(&mut conn, &playlist, Some(&name), false)?;
        if args.json {
            return print_json(&saved);
        }
        print_playlist(&saved.playlist);
        println!("Saved as #{}", saved.id);
        return Ok(());
    }

    if args.json {
        return print_json(&playlist);
    }
    print_playlist(&playlist);
    Ok(())
}

fn catalog(paths: &Paths, action: CatalogAction) -> Result<()> {
    match action {
        CatalogAction::Import { file } => {
            let json = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let count = sqlite::import_tracks(&paths.catalog, &json)?;
            println!("Imported {count} tracks into {}", paths.catalog.display());
        }
        CatalogAction::Stats => {
            ensure_exists(&paths.catalog, "Catalog")?;
            let stats = sqlite::stats(&paths.catalog)?;
            println!("Tracks: {} ({} with audio features)", stats.tracks, stats.with_features);
            for (genre, count) in stats.genres {
                println!("  {genre:<20} {count}");
            }
        }
    }
    Ok(())
}

fn ensure_exists(path: &Path, what: &str) -> Result<()> {
    anyhow::ensure!(path.exists(), "{what} not found at {}", path.display());
    Ok(())
}

const fn feedback_kind(kind: FeedbackArg) -> FeedbackKind {
    match kind {
        FeedbackArg::Like => FeedbackKind::Like,
        FeedbackArg::Dislike => FeedbackKind::Dislike,
        FeedbackArg::Skip => FeedbackKind::Skip,
        FeedbackArg::Replay => FeedbackKind::Replay,
        FeedbackArg::Rating => FeedbackKind::Rating,
    }
}

fn parse_mood(label: &str) -> Result<Mood> {
    label.parse::<Mood>().map_err(anyhow::Error::msg)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();
    let paths = Paths::resolve(&args)?;
    let engine_config = EngineConfig::load_from(&paths.config)?;

    match args.command {
        Command::Detect { source } => detect(&paths, &engine_config, source)?,
        Command::Playlist(playlist_args) => playlist(&paths, &engine_config, playlist_args)?,
        Command::Catalog { action } => catalog(&paths, action)?,
        Command::Feedback { track, mood, kind, rating, playlist } => {
            let conn = db::connect(&paths.db)?;
            let stored = db::record_feedback(
                &conn,
                NewFeedback {
                    track_id: track,
                    mood: parse_mood(&mood)?,
                    kind: feedback_kind(kind),
                    rating,
                    playlist_id: playlist,
                },
            )?;
            println!("Recorded {} feedback for {} (#{})", stored.kind, stored.track_id, stored.id);
        }
        Command::FeedbackList { mood, track, json } => {
            let conn = db::connect(&paths.db)?;
            let mood = mood.as_deref().map(parse_mood).transpose()?;
            let feedback = db::list_feedback(&conn, mood.as_ref(), track.as_deref())?;
            let stats = db::feedback_stats(&feedback);
            if json {
                return print_json(&serde_json::json!({ "feedback": feedback, "stats": stats }));
            }
            for entry in &feedback {
                let rating = entry.rating.map(|r| format!(" {r}/5")).unwrap_or_default();
                println!(
                    "#{} {} {} [{}]{rating}",
                    entry.id, entry.kind, entry.track_id, entry.mood
                );
            }
            println!("Total: {}, average rating: {:.1}", stats.total, stats.average_rating);
        }
        Command::Playlists { id, json } => {
            let conn = db::connect(&paths.db)?;
            match id {
                Some(id) => {
                    let saved = db::get_playlist(&conn, id)?
                        .with_context(|| format!("No saved playlist with id {id}"))?;
                    if json {
                        return print_json(&saved);
                    }
                    print_playlist(&saved.playlist);
                }
                None => {
                    let playlists = db::list_playlists(&conn)?;
                    if json {
                        return print_json(&playlists);
                    }
                    for saved in &playlists {
                        println!(
                            "#{} {} ({} tracks, {})",
                            saved.id,
                            saved.playlist.name,
                            saved.playlist.tracks.len(),
                            saved.saved_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
        }
        Command::History { limit, json } => {
            let conn = db::connect(&paths.db)?;
            let history = db::mood_history(&conn, limit)?;
            if json {
                return print_json(&history);
            }
            for record in &history {
                println!(
                    "{} {:<10} {:.2} ({})",
                    record.signal.timestamp.format("%Y-%m-%d %H:%M"),
                    record.signal.mood.as_str(),
                    record.signal.confidence,
                    record.signal.method
                );
            }
        }
        Command::Preferences { energy, genres, artists } => {
            let conn = db::connect(&paths.db)?;
            let preferences = if energy.is_none() && genres.is_empty() && artists.is_empty() {
                db::get_preferences(&conn)?
            } else {
                db::update_preferences(
                    &conn,
                    PreferencesUpdate {
                        preferred_genres: (!genres.is_empty()).then_some(genres),
                        preferred_artists: (!artists.is_empty()).then_some(artists),
                        energy_level: energy,
                    },
                )?
            };
            print_json(&preferences)?;
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(shell);
            completion::generate_completions(shell, &mut cmd);
        }
        Command::CompleteMoods => {
            completion::print_mood_completions(&engine_config)?;
        }
    }

    Ok(())
}
