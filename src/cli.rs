//! # Command-Line Interface Module
//!
//! Clap definitions for the `moodmuse` binary.
//!
//! ## Commands
//!
//! - `detect text|face`: Read a mood from text or from an expression frame
//! - `playlist`: Build a mood-matched playlist from the local catalog
//! - `catalog import|stats`: Load tracks into the local catalog
//! - `feedback`, `feedback-list`: Record and review track feedback
//! - `playlists`, `history`, `preferences`: Inspect stored data
//!
//! ## Examples
//!
//! ```bash
//! moodmuse catalog import tracks.json
//! moodmuse detect text "feeling pumped for the gym"
//! moodmuse playlist --text "a quiet rainy evening" --limit 10
//! moodmuse playlist --mood party --genre house --energy 0.9 --save "Friday"
//! ```

use clap::{ArgGroup, Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Feedback types accepted on the command line.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum FeedbackArg {
    Like,
    Dislike,
    Skip,
    Replay,
    Rating,
}

/// Main application arguments structure.
///
/// Storage locations default to the platform data directory and can be
/// overridden per invocation or through the environment.
#[derive(Parser, Debug)]
#[command(name = "moodmuse")]
#[command(about = "Moodmuse: detect your mood, get a playlist that fits it")]
#[command(version)]
pub struct Args {
    /// Persistence database (playlists, feedback, preferences, history)
    #[arg(long, global = true, env = "MOODMUSE_DB", value_hint = clap::ValueHint::FilePath)]
    pub db: Option<PathBuf>,

    /// Local track catalog database
    #[arg(long, global = true, env = "MOODMUSE_CATALOG", value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Engine config file (JSON)
    #[arg(long, global = true, env = "MOODMUSE_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect a mood from text or a facial-expression frame
    Detect {
        #[command(subcommand)]
        source: DetectSource,
    },

    /// Build a playlist for a mood
    ///
    /// The mood is either given directly or read from a text description.
    /// Tracks come from the local catalog (see `catalog import`).
    Playlist(PlaylistArgs),

    /// Manage the local track catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },

    /// Record feedback for a track
    ///
    /// Feedback is stored for later use; it does not change how playlists
    /// are built.
    Feedback {
        /// Catalog track id
        #[arg(long)]
        track: String,

        /// Mood the track was played for
        #[arg(long)]
        mood: String,

        /// Kind of feedback
        #[arg(long, value_enum)]
        kind: FeedbackArg,

        /// Rating from 1 to 5 (required for `--kind rating`)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: Option<u8>,

        /// Playlist the track was part of
        #[arg(long)]
        playlist: Option<String>,
    },

    /// List recorded feedback with summary statistics
    FeedbackList {
        #[arg(long)]
        mood: Option<String>,

        #[arg(long)]
        track: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List saved playlists
    Playlists {
        /// Show one playlist with its tracks
        #[arg(long)]
        id: Option<i64>,

        #[arg(long)]
        json: bool,
    },

    /// Show recently detected moods
    History {
        #[arg(long, default_value = "10")]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Show or update listener preferences
    ///
    /// Without options, prints the current preferences.
    Preferences {
        /// Preferred energy level between 0 and 1
        #[arg(long)]
        energy: Option<f64>,

        /// Preferred genre (repeatable; replaces the stored list)
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Preferred artist (repeatable; replaces the stored list)
        #[arg(long = "artist")]
        artists: Vec<String>,
    },

    /// Generate shell completions
    ///
    /// Usage: moodmuse completion bash > ~/.local/share/bash-completion/completions/moodmuse
    Completion {
        shell: Shell,
    },

    /// List known mood labels (used by completion scripts)
    #[command(hide = true)]
    CompleteMoods,
}

#[derive(Subcommand, Debug)]
pub enum DetectSource {
    /// Classify a free-text description
    Text {
        text: String,

        /// Store the detected mood in the history
        #[arg(long)]
        record: bool,

        #[arg(long)]
        json: bool,
    },

    /// Classify a face-expression frame
    ///
    /// The file holds the expression detector's JSON output, for example
    /// `{"happy": 0.1, "neutral": 0.8, ...}`.
    Face {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        frame: PathBuf,

        #[arg(long)]
        record: bool,

        #[arg(long)]
        json: bool,
    },
}

#[derive(ClapArgs, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["mood", "text"])))]
pub struct PlaylistArgs {
    /// Mood label (happy, sad, calm, party, ...)
    #[arg(long)]
    pub mood: Option<String>,

    /// Describe how you feel; the mood is detected from it
    #[arg(long)]
    pub text: Option<String>,

    /// Genre to search instead of the mood's own (repeatable)
    #[arg(long = "genre")]
    pub genres: Vec<String>,

    #[arg(long)]
    pub artist: Option<String>,

    /// Target energy between 0 and 1
    #[arg(long)]
    pub energy: Option<f64>,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub market: Option<String>,

    /// Seed for genre selection, for repeatable playlists
    #[arg(long)]
    pub seed: Option<u64>,

    /// Save the playlist under this name
    #[arg(long)]
    pub save: Option<String>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum CatalogAction {
    /// Import tracks from a JSON file
    Import {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show catalog size and genre counts
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_playlist_needs_mood_or_text() {
        assert!(Args::try_parse_from(["moodmuse", "playlist"]).is_err());
        let both = ["moodmuse", "playlist", "--mood", "a", "--text", "b"];
        assert!(Args::try_parse_from(both).is_err());

        let args = Args::try_parse_from([
            "moodmuse", "playlist", "--mood", "calm", "--genre", "jazz", "--genre", "soul",
            "--limit", "5",
        ])
        .unwrap();
        match args.command {
            Command::Playlist(playlist) => {
                assert_eq!(playlist.mood.as_deref(), Some("calm"));
                assert_eq!(playlist.genres, vec!["jazz".to_string(), "soul".to_string()]);
                assert_eq!(playlist.limit, Some(5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_feedback_rating_range() {
        let base = ["moodmuse", "feedback", "--track", "t1", "--mood", "happy", "--kind", "rating"];
        assert!(Args::try_parse_from(base.iter().chain(&["--rating", "6"])).is_err());
        assert!(Args::try_parse_from(base.iter().chain(&["--rating", "3"])).is_ok());
    }

    #[test]
    fn test_global_paths() {
        let args =
            Args::try_parse_from(["moodmuse", "history", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(args.db, Some(PathBuf::from("/tmp/x.db")));
    }
}
