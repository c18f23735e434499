//! Persistence for everything the engine hands back to the application:
//! saved playlists, track feedback, listener preferences, and mood history.
//!
//! All functions take an open [`Connection`]; [`connect`] opens the database
//! and makes sure the schema exists. Timestamps are stored as RFC 3339 text.

use crate::catalog::Candidate;
use crate::engine::Playlist;
use crate::mood::{DetectionMethod, Mood, MoodSignal};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, trace};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS playlists (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        playlist_id TEXT    NOT NULL,
        name        TEXT    NOT NULL,
        description TEXT    NOT NULL,
        mood        TEXT    NOT NULL,
        genre       TEXT,
        energy      REAL,
        is_public   INTEGER NOT NULL DEFAULT 0,
        created_at  TEXT    NOT NULL,
        saved_at    TEXT    NOT NULL
    );
    CREATE TABLE IF NOT EXISTS playlist_tracks (
        playlist  INTEGER NOT NULL REFERENCES playlists(id) ON DELETE CASCADE,
        position  INTEGER NOT NULL,
        track     TEXT    NOT NULL,
        PRIMARY KEY (playlist, position)
    );
    CREATE TABLE IF NOT EXISTS feedback (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        track_id    TEXT    NOT NULL,
        playlist_id TEXT,
        mood        TEXT    NOT NULL,
        kind        TEXT    NOT NULL,
        rating      INTEGER,
        created_at  TEXT    NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_feedback_mood ON feedback(mood);
    CREATE INDEX IF NOT EXISTS idx_feedback_track ON feedback(track_id);
    CREATE TABLE IF NOT EXISTS preferences (
        id                INTEGER PRIMARY KEY CHECK (id = 1),
        preferred_genres  TEXT NOT NULL,
        preferred_artists TEXT NOT NULL,
        energy_level      REAL,
        updated_at        TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS mood_history (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        mood        TEXT NOT NULL,
        confidence  REAL NOT NULL,
        method      TEXT NOT NULL,
        raw_score   REAL,
        input       TEXT,
        detected_at TEXT NOT NULL
    );
";

/// Open (or create) the database at `path` with the schema in place.
pub fn connect(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("Failed to enable foreign keys")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Create all tables if they do not exist yet. Safe to call repeatedly.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to create database tables")?;
    Ok(())
}

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|err: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.to_string().into())
    })
}

fn parse_json<T: serde::de::DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

// ---------------------------------------------------------------------------
// Playlists
// ---------------------------------------------------------------------------

/// A playlist as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedPlaylist {
    /// Row id, used to fetch the playlist again.
    pub id: i64,
    pub playlist: Playlist,
    pub is_public: bool,
    pub saved_at: DateTime<Utc>,
}

/// Store `playlist`, optionally under a different `name`.
pub fn save_playlist(
    conn: &mut Connection,
    playlist: &Playlist,
    name: Option<&str>,
    is_public: bool,
) -> Result<SavedPlaylist> {
    let mut stored = playlist.clone();
    if let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) {
        stored.name = name.to_string();
    }
    let saved_at = Utc::now();

    let tx = conn.transaction().context("Failed to start transaction")?;
    tx.execute(
        "INSERT INTO playlists (playlist_id, name, description, mood, genre, energy,
                                is_public, created_at, saved_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            stored.id,
            stored.name,
            stored.description,
            stored.mood.as_str(),
            stored.genre,
            stored.energy,
            is_public,
            stored.created_at.to_rfc3339(),
            saved_at.to_rfc3339(),
        ],
    )
    .with_context(|| format!("Failed to insert playlist `{}`", stored.name))?;
    let id = tx.last_insert_rowid();

    {
        let mut stmt = tx.prepare(
            "INSERT INTO playlist_tracks (playlist, position, track) VALUES (?1, ?2, ?3)",
        )?;
        for (position, track) in stored.tracks.iter().enumerate() {
            let json = serde_json::to_string(track).context("Failed to serialize track")?;
            stmt.execute(params![id, position, json])
                .with_context(|| format!("Failed to insert track `{}`", track.id))?;
        }
    }

    tx.commit().context("Committing playlist transaction failed")?;
    debug!("Saved playlist {id} ({} tracks)", stored.tracks.len());

    Ok(SavedPlaylist {
        id,
        playlist: stored,
        is_public,
        saved_at,
    })
}

const PLAYLIST_COLUMNS: &str = "id, playlist_id, name, description, mood, genre, energy,
                                is_public, created_at, saved_at";

fn playlist_row(row: &Row<'_>) -> rusqlite::Result<SavedPlaylist> {
    Ok(SavedPlaylist {
        id: row.get(0)?,
        playlist: Playlist {
            id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            mood: parse_text(row, 4)?,
            genre: row.get(5)?,
            energy: row.get(6)?,
            tracks: Vec::new(),
            created_at: parse_time(row, 8)?,
            fallback_used: false,
        },
        is_public: row.get(7)?,
        saved_at: parse_time(row, 9)?,
    })
}

fn load_tracks(conn: &Connection, playlist: i64) -> Result<Vec<Candidate>> {
    let mut stmt = conn
        .prepare("SELECT track FROM playlist_tracks WHERE playlist = ?1 ORDER BY position")
        .context("Failed to query playlist tracks")?;
    let tracks = stmt
        .query_map([playlist], |row| parse_json(row, 0))?
        .collect::<rusqlite::Result<Vec<Candidate>>>()
        .with_context(|| format!("Failed to read tracks of playlist {playlist}"))?;
    Ok(tracks)
}

/// All saved playlists, newest first.
pub fn list_playlists(conn: &Connection) -> Result<Vec<SavedPlaylist>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {PLAYLIST_COLUMNS} FROM playlists ORDER BY id DESC"))
        .context("Failed to query playlists")?;
    let mut playlists = stmt
        .query_map([], playlist_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read playlists")?;

    for saved in &mut playlists {
        saved.playlist.tracks = load_tracks(conn, saved.id)?;
    }
    Ok(playlists)
}

/// Saved playlist by row id.
pub fn get_playlist(conn: &Connection, id: i64) -> Result<Option<SavedPlaylist>> {
    let saved = conn
        .query_row(
            &format!("SELECT {PLAYLIST_COLUMNS} FROM playlists WHERE id = ?1"),
            [id],
            playlist_row,
        )
        .optional()
        .with_context(|| format!("Failed to query playlist {id}"))?;

    match saved {
        Some(mut saved) => {
            saved.playlist.tracks = load_tracks(conn, id)?;
            Ok(Some(saved))
        }
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Feedback
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
    Skip,
    Replay,
    Rating,
}

impl FeedbackKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            FeedbackKind::Like => "like",
            FeedbackKind::Dislike => "dislike",
            FeedbackKind::Skip => "skip",
            FeedbackKind::Replay => "replay",
            FeedbackKind::Rating => "rating",
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedbackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "like" => Ok(FeedbackKind::Like),
            "dislike" => Ok(FeedbackKind::Dislike),
            "skip" => Ok(FeedbackKind::Skip),
            "replay" => Ok(FeedbackKind::Replay),
            "rating" => Ok(FeedbackKind::Rating),
            other => Err(format!(
                "unknown feedback type `{other}` (expected like, dislike, skip, replay, rating)"
            )),
        }
    }
}

/// Feedback to record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFeedback {
    pub track_id: String,
    pub mood: Mood,
    pub kind: FeedbackKind,
    /// Required (1..=5) for [`FeedbackKind::Rating`], optional otherwise.
    pub rating: Option<u8>,
    pub playlist_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub track_id: String,
    pub playlist_id: Option<String>,
    pub mood: Mood,
    pub kind: FeedbackKind,
    pub rating: Option<u8>,
    pub created_at: DateTime<Utc>,
}

/// Record one piece of feedback. Nothing is derived from it here.
pub fn record_feedback(conn: &Connection, feedback: NewFeedback) -> Result<Feedback> {
    let track_id = feedback.track_id.trim();
    anyhow::ensure!(!track_id.is_empty(), "Track ID is required");
    if let Some(rating) = feedback.rating {
        anyhow::ensure!((1..=5).contains(&rating), "Rating must be between 1 and 5");
    }
    if feedback.kind == FeedbackKind::Rating {
        anyhow::ensure!(
            feedback.rating.is_some(),
            "Rating must be between 1 and 5 for rating feedback type"
        );
    }

    let created_at = Utc::now();
    conn.execute(
        "INSERT INTO feedback (track_id, playlist_id, mood, kind, rating, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            track_id,
            feedback.playlist_id,
            feedback.mood.as_str(),
            feedback.kind.as_str(),
            feedback.rating,
            created_at.to_rfc3339(),
        ],
    )
    .with_context(|| format!("Failed to record feedback for track `{track_id}`"))?;
    trace!("Recorded {} feedback for {track_id}", feedback.kind);

    Ok(Feedback {
        id: conn.last_insert_rowid(),
        track_id: track_id.to_string(),
        playlist_id: feedback.playlist_id,
        mood: feedback.mood,
        kind: feedback.kind,
        rating: feedback.rating,
        created_at,
    })
}

/// Feedback in recording order, optionally narrowed to a mood and/or a track.
pub fn list_feedback(
    conn: &Connection,
    mood: Option<&Mood>,
    track_id: Option<&str>,
) -> Result<Vec<Feedback>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, track_id, playlist_id, mood, kind, rating, created_at FROM feedback
             WHERE (?1 IS NULL OR mood = ?1) AND (?2 IS NULL OR track_id = ?2)
             ORDER BY id",
        )
        .context("Failed to query feedback")?;
    let feedback = stmt
        .query_map(params![mood.map(Mood::as_str), track_id], |row| {
            Ok(Feedback {
                id: row.get(0)?,
                track_id: row.get(1)?,
                playlist_id: row.get(2)?,
                mood: parse_text(row, 3)?,
                kind: parse_text(row, 4)?,
                rating: row.get(5)?,
                created_at: parse_time(row, 6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read feedback")?;
    Ok(feedback)
}

/// Aggregate view over a feedback list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub total: usize,
    /// Mean over rated entries only; 0 when nothing was rated.
    pub average_rating: f64,
    pub by_kind: Vec<(FeedbackKind, usize)>,
}

pub fn feedback_stats(feedback: &[Feedback]) -> FeedbackStats {
    let ratings: Vec<f64> = feedback
        .iter()
        .filter_map(|entry| entry.rating.map(f64::from))
        .collect();
    #[allow(clippy::cast_precision_loss)]
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        ratings.iter().sum::<f64>() / ratings.len() as f64
    };

    let mut by_kind: Vec<(FeedbackKind, usize)> = Vec::new();
    for entry in feedback {
        match by_kind.iter_mut().find(|(kind, _)| *kind == entry.kind) {
            Some((_, count)) => *count += 1,
            None => by_kind.push((entry.kind, 1)),
        }
    }
    by_kind.sort();

    FeedbackStats {
        total: feedback.len(),
        average_rating,
        by_kind,
    }
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub preferred_genres: Vec<String>,
    pub preferred_artists: Vec<String>,
    pub energy_level: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PreferencesUpdate {
    pub preferred_genres: Option<Vec<String>>,
    pub preferred_artists: Option<Vec<String>>,
    pub energy_level: Option<f64>,
}

/// Current preferences, or empty ones if none were ever stored.
pub fn get_preferences(conn: &Connection) -> Result<Preferences> {
    let stored = conn
        .query_row(
            "SELECT preferred_genres, preferred_artists, energy_level, updated_at
             FROM preferences WHERE id = 1",
            [],
            |row| {
                Ok(Preferences {
                    preferred_genres: parse_json(row, 0)?,
                    preferred_artists: parse_json(row, 1)?,
                    energy_level: row.get(2)?,
                    updated_at: Some(parse_time(row, 3)?),
                })
            },
        )
        .optional()
        .context("Failed to query preferences")?;
    Ok(stored.unwrap_or_default())
}

/// Merge `update` into the stored preferences.
pub fn update_preferences(conn: &Connection, update: PreferencesUpdate) -> Result<Preferences> {
    if let Some(energy) = update.energy_level {
        anyhow::ensure!(
            (0.0..=1.0).contains(&energy),
            "Energy level must be a number between 0 and 1"
        );
    }

    let current = get_preferences(conn)?;
    let merged = Preferences {
        preferred_genres: update.preferred_genres.unwrap_or(current.preferred_genres),
        preferred_artists: update.preferred_artists.unwrap_or(current.preferred_artists),
        energy_level: update.energy_level.or(current.energy_level),
        updated_at: Some(Utc::now()),
    };

    conn.execute(
        "INSERT INTO preferences (id, preferred_genres, preferred_artists, energy_level, updated_at)
         VALUES (1, ?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
             preferred_genres = excluded.preferred_genres,
             preferred_artists = excluded.preferred_artists,
             energy_level = excluded.energy_level,
             updated_at = excluded.updated_at",
        params![
            serde_json::to_string(&merged.preferred_genres)?,
            serde_json::to_string(&merged.preferred_artists)?,
            merged.energy_level,
            merged.updated_at.map(|time| time.to_rfc3339()),
        ],
    )
    .context("Failed to store preferences")?;

    Ok(merged)
}

// ---------------------------------------------------------------------------
// Mood history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodRecord {
    pub id: i64,
    pub signal: MoodSignal,
    /// Text the mood was read from, if any.
    pub input: Option<String>,
}

/// Append a detected mood to the history. Returns the new row id.
pub fn record_mood(conn: &Connection, signal: &MoodSignal, input: Option<&str>) -> Result<i64> {
    conn.execute(
        "INSERT INTO mood_history (mood, confidence, method, raw_score, input, detected_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            signal.mood.as_str(),
            signal.confidence,
            signal.method.to_string(),
            signal.raw_score,
            input,
            signal.timestamp.to_rfc3339(),
        ],
    )
    .context("Failed to record mood")?;
    Ok(conn.last_insert_rowid())
}

/// The `limit` most recent moods, newest first.
pub fn mood_history(conn: &Connection, limit: usize) -> Result<Vec<MoodRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, mood, confidence, method, raw_score, input, detected_at
             FROM mood_history ORDER BY id DESC LIMIT ?1",
        )
        .context("Failed to query mood history")?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let records = stmt
        .query_map([limit], |row| {
            let method: String = row.get(3)?;
            let method = match method.as_str() {
                "facial" => DetectionMethod::Facial,
                _ => DetectionMethod::Text,
            };
            Ok(MoodRecord {
                id: row.get(0)?,
                signal: MoodSignal::at(
                    parse_text(row, 1)?,
                    row.get(2)?,
                    method,
                    row.get(4)?,
                    parse_time(row, 6)?,
                ),
                input: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read mood history")?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", true).unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn playlist() -> Playlist {
        let mut first = Candidate::new("t1", "One", "Artist");
        first.duration_ms = 1000;
        Playlist {
            id: "mood-calm-1".into(),
            name: "Calm Vibes".into(),
            description: "A calm playlist curated just for you".into(),
            mood: Mood::Calm,
            genre: Some("ambient".into()),
            energy: Some(0.3),
            tracks: vec![first, Candidate::new("t2", "Two", "Other")],
            created_at: Utc::now(),
            fallback_used: true,
        }
    }

    fn feedback(kind: FeedbackKind, rating: Option<u8>) -> NewFeedback {
        NewFeedback {
            track_id: "t1".into(),
            mood: Mood::Happy,
            kind,
            rating,
            playlist_id: None,
        }
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = memory();
        init_schema(&conn).unwrap();
    }

    #[test]
    fn test_save_and_get_playlist() {
        let mut conn = memory();
        let saved = save_playlist(&mut conn, &playlist(), Some("Evening"), false).unwrap();
        assert_eq!(saved.playlist.name, "Evening");

        let loaded = get_playlist(&conn, saved.id).unwrap().unwrap();
        assert_eq!(loaded.playlist.name, "Evening");
        assert_eq!(loaded.playlist.mood, Mood::Calm);
        assert_eq!(loaded.playlist.tracks, playlist().tracks);
        assert!(!loaded.is_public);

        assert!(get_playlist(&conn, saved.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_list_playlists_newest_first() {
        let mut conn = memory();
        save_playlist(&mut conn, &playlist(), None, false).unwrap();
        let second = save_playlist(&mut conn, &playlist(), Some("Later"), true).unwrap();
        let all = list_playlists(&conn).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].playlist.name, "Calm Vibes");
        assert_eq!(all[1].playlist.tracks.len(), 2);
    }

    #[test]
    fn test_feedback_validation() {
        let conn = memory();
        assert!(record_feedback(&conn, feedback(FeedbackKind::Rating, None)).is_err());
        assert!(record_feedback(&conn, feedback(FeedbackKind::Rating, Some(6))).is_err());
        assert!(record_feedback(&conn, feedback(FeedbackKind::Like, Some(0))).is_err());
        let mut blank = feedback(FeedbackKind::Like, None);
        blank.track_id = "  ".into();
        assert!(record_feedback(&conn, blank).is_err());

        let stored = record_feedback(&conn, feedback(FeedbackKind::Rating, Some(4))).unwrap();
        assert_eq!(stored.rating, Some(4));
        assert_eq!(list_feedback(&conn, None, None).unwrap().len(), 1);
    }

    #[test]
    fn test_feedback_filters_and_stats() {
        let conn = memory();
        record_feedback(&conn, feedback(FeedbackKind::Like, None)).unwrap();
        record_feedback(&conn, feedback(FeedbackKind::Rating, Some(5))).unwrap();
        record_feedback(&conn, feedback(FeedbackKind::Rating, Some(2))).unwrap();
        let mut sad = feedback(FeedbackKind::Skip, None);
        sad.mood = Mood::Sad;
        sad.track_id = "t9".into();
        record_feedback(&conn, sad).unwrap();

        assert_eq!(list_feedback(&conn, Some(&Mood::Happy), None).unwrap().len(), 3);
        assert_eq!(list_feedback(&conn, None, Some("t9")).unwrap().len(), 1);
        assert!(list_feedback(&conn, Some(&Mood::Sad), Some("t1")).unwrap().is_empty());

        let stats = feedback_stats(&list_feedback(&conn, None, None).unwrap());
        assert_eq!(stats.total, 4);
        assert!((stats.average_rating - 3.5).abs() < 1e-9);
        assert_eq!(
            stats.by_kind,
            vec![(FeedbackKind::Like, 1), (FeedbackKind::Skip, 1), (FeedbackKind::Rating, 2)]
        );
    }

    #[test]
    fn test_feedback_kind_parsing() {
        assert_eq!("Replay".parse::<FeedbackKind>(), Ok(FeedbackKind::Replay));
        assert!("love".parse::<FeedbackKind>().is_err());
    }

    #[test]
    fn test_preferences_merge() {
        let conn = memory();
        assert_eq!(get_preferences(&conn).unwrap(), Preferences::default());

        update_preferences(
            &conn,
            PreferencesUpdate {
                preferred_genres: Some(vec!["rock".into(), "indie".into()]),
                energy_level: Some(0.7),
                ..Default::default()
            },
        )
        .unwrap();
        let merged = update_preferences(
            &conn,
            PreferencesUpdate {
                preferred_artists: Some(vec!["Radiohead".into()]),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(merged.preferred_genres, vec!["rock".to_string(), "indie".to_string()]);
        assert_eq!(merged.energy_level, Some(0.7));

        let stored = get_preferences(&conn).unwrap();
        assert_eq!(stored.preferred_artists, vec!["Radiohead".to_string()]);
        assert!(stored.updated_at.is_some());

        let invalid = PreferencesUpdate {
            energy_level: Some(1.2),
            ..Default::default()
        };
        assert!(update_preferences(&conn, invalid).is_err());
    }

    #[test]
    fn test_mood_history_newest_first() {
        let conn = memory();
        let first = MoodSignal::new(Mood::Sad, 0.8, DetectionMethod::Text, Some(-2.0));
        let second = MoodSignal::new(Mood::Surprise, 0.6, DetectionMethod::Facial, None);
        record_mood(&conn, &first, Some("miserable, lonely")).unwrap();
        record_mood(&conn, &second, None).unwrap();

        let history = mood_history(&conn, 10).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].signal.mood, Mood::Surprise);
        assert_eq!(history[0].signal.method, DetectionMethod::Facial);
        assert_eq!(history[1].input.as_deref(), Some("miserable, lonely"));
        assert_eq!(history[1].signal.raw_score, Some(-2.0));
        assert_eq!(history[1].signal.timestamp, first.timestamp);

        assert_eq!(mood_history(&conn, 1).unwrap().len(), 1);
    }
}
