//! Mood detection and mood-matched playlist building.
//!
//! Core modules:
//! - [`text`] - Lexicon-based text mood classifier
//! - [`expression`] - Facial-expression mood classifier
//! - [`resolver`] - Mood to audio-feature target and genre resolution
//! - [`retriever`] - Catalog search with a one-shot genre-relaxed fallback
//! - [`ranker`] - Fail-open audio-feature filter
//! - [`engine`] - [`engine::MoodEngine`], the `build_playlist` entry point
//!
//! ### Supporting Modules
//!
//! - [`catalog`] - The track catalog seam and its SQLite implementation
//! - [`mood`], [`features`], [`lexicon`], [`tables`] - Shared types and data tables
//! - [`db`] - Saved playlists, feedback, preferences and mood history
//! - [`config`] - Configuration and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodmuse::catalog::sqlite::SqliteCatalog;
//! use moodmuse::engine::MoodEngine;
//! use moodmuse::expression::ExpressionProbabilities;
//! use moodmuse::resolver::PlaylistRequest;
//! use std::sync::Arc;
//!
//! let catalog = SqliteCatalog::new(moodmuse::config::get_catalog_path()?, 5000);
//! let engine = MoodEngine::builder(Arc::new(catalog)).build();
//!
//! // Text: "feeling tired and drained" reads as sad with low energy
//! let signal = engine.classify_text("feeling tired and drained")?;
//! println!("{} ({:.2})", signal.mood, signal.confidence);
//!
//! // Face: the dominant expression wins
//! let face = ExpressionProbabilities { happy: 0.7, neutral: 0.2, ..Default::default() };
//! assert_eq!(engine.classify_expression(&face).mood.as_str(), "happy");
//!
//! // Playlist
//! let request = PlaylistRequest::for_mood("calm").with_limit(10);
//! let playlist = engine.build_playlist(&request)?;
//! println!("{}: {} tracks", playlist.name, playlist.tracks.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Playlist Pipeline
//!
//! 1. Resolve the request into a feature target, genre set and limit
//! 2. Search the catalog with one genre picked from the set
//! 3. If fewer than half the limit came back, search once more without a genre
//! 4. Fetch audio features and keep tracks within tolerance of the target
//!
//! Feature lookups fail open: when they are unavailable, the unfiltered
//! candidates are returned, truncated to the limit.
//!
//! ## Error Handling
//!
//! Engine operations return [`error::MoodResult`]; storage, config and CLI
//! code uses `anyhow::Result` with context.

pub mod catalog;
pub mod cli;
pub mod completion;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod expression;
pub mod features;
pub mod lexicon;
pub mod mood;
pub mod ranker;
pub mod resolver;
pub mod retriever;
pub mod tables;
pub mod text;
