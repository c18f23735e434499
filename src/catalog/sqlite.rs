//! Local SQLite catalog.
//!
//! Tracks are imported once from JSON (see [`import_tracks`]) and then served
//! read-only. Each call opens its own read-only connection, so a
//! `SqliteCatalog` can be shared across threads without locking.

use super::{Candidate, Catalog, CatalogQuery};
use crate::error::CatalogError;
use crate::features::{FeatureHint, FeatureVector};
use anyhow::{Context, Result};
use log::{debug, info, trace};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tracks (
        seq              INTEGER PRIMARY KEY AUTOINCREMENT,
        id               TEXT    NOT NULL UNIQUE,
        name             TEXT    NOT NULL,
        album            TEXT,
        duration_ms      INTEGER NOT NULL DEFAULT 0,
        preview_url      TEXT,
        image_url        TEXT,
        energy           REAL,
        valence          REAL,
        danceability     REAL,
        tempo            REAL,
        acousticness     REAL,
        instrumentalness REAL
    );
    CREATE TABLE IF NOT EXISTS track_artists (
        track_id TEXT    NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        name     TEXT    NOT NULL,
        PRIMARY KEY (track_id, position)
    );
    CREATE TABLE IF NOT EXISTS track_genres (
        track_id TEXT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
        genre    TEXT NOT NULL,
        PRIMARY KEY (track_id, genre)
    );
    CREATE TABLE IF NOT EXISTS track_markets (
        track_id TEXT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
        market   TEXT NOT NULL,
        PRIMARY KEY (track_id, market)
    );
    CREATE INDEX IF NOT EXISTS idx_track_genres_genre ON track_genres(genre);
";

/// Tracks matching a hint sort ahead of the rest; ties keep import order.
const SEARCH: &str = "
    SELECT t.id, t.name, t.album, t.duration_ms, t.preview_url, t.image_url
    FROM tracks t
    WHERE (?1 IS NULL OR EXISTS (
            SELECT 1 FROM track_genres g WHERE g.track_id = t.id AND g.genre = lower(?1)))
      AND (?2 IS NULL OR EXISTS (
            SELECT 1 FROM track_artists a
            WHERE a.track_id = t.id AND instr(lower(a.name), lower(?2)) > 0))
      AND (NOT EXISTS (SELECT 1 FROM track_markets m WHERE m.track_id = t.id)
           OR EXISTS (SELECT 1 FROM track_markets m
                      WHERE m.track_id = t.id AND m.market = upper(?3)))
    ORDER BY (CASE WHEN ?4 AND t.energy > 0.7 THEN 1 ELSE 0 END)
           + (CASE WHEN ?5 AND t.valence > 0.7 THEN 1 ELSE 0 END)
           + (CASE WHEN ?6 AND t.danceability > 0.7 THEN 1 ELSE 0 END) DESC,
             t.seq
    LIMIT ?7
";

/// Read-only catalog over a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    path: PathBuf,
    timeout: Duration,
}

impl SqliteCatalog {
    pub fn new(path: impl Into<PathBuf>, timeout_ms: u64) -> Self {
        Self {
            path: path.into(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn open(&self) -> Result<Connection, CatalogError> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|err| self.classify(err))?;
        conn.busy_timeout(self.timeout).map_err(|err| self.classify(err))?;
        Ok(conn)
    }

    /// A busy or locked database means we waited out the busy timeout.
    fn classify(&self, err: rusqlite::Error) -> CatalogError {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                ) =>
            {
                CatalogError::Timeout(self.timeout_ms())
            }
            _ => err.into(),
        }
    }

    /// Run `call` against a fresh connection, failing if it overran the timeout.
    fn timed<T>(
        &self,
        call: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, CatalogError> {
        let started = Instant::now();
        let conn = self.open()?;
        let result = call(&conn).map_err(|err| self.classify(err))?;
        let elapsed = started.elapsed();
        if elapsed > self.timeout {
            debug!("Catalog call took {elapsed:?}, over the {:?} limit", self.timeout);
            return Err(CatalogError::Timeout(self.timeout_ms()));
        }
        Ok(result)
    }
}

impl Catalog for SqliteCatalog {
    fn search(
        &self,
        query: &CatalogQuery,
        limit: usize,
        market: &str,
    ) -> Result<Vec<Candidate>, CatalogError> {
        trace!("Catalog search `{query}` (limit {limit}, market {market})");
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let has_hint = |hint: FeatureHint| query.hints.contains(&hint);

        self.timed(|conn| {
            let mut stmt = conn.prepare(SEARCH)?;
            let rows = stmt.query_map(
                params![
                    query.genre,
                    query.artist,
                    market,
                    has_hint(FeatureHint::HighEnergy),
                    has_hint(FeatureHint::HighValence),
                    has_hint(FeatureHint::HighDanceability),
                    limit,
                ],
                |row| {
                    Ok(Candidate {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        artists: Vec::new(),
                        album: row.get(2)?,
                        duration_ms: row.get(3)?,
                        preview_url: row.get(4)?,
                        image_url: row.get(5)?,
                        features: None,
                    })
                },
            )?;
            let mut candidates = rows.collect::<rusqlite::Result<Vec<_>>>()?;

            let mut artists = conn.prepare(
                "SELECT name FROM track_artists WHERE track_id = ?1 ORDER BY position",
            )?;
            for candidate in &mut candidates {
                candidate.artists = artists
                    .query_map([&candidate.id], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
            }
            Ok(candidates)
        })
    }

    fn audio_features(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, FeatureVector>, CatalogError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, energy, valence, danceability, tempo, acousticness, instrumentalness
             FROM tracks WHERE energy IS NOT NULL AND id IN ({placeholders})"
        );

        self.timed(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(ids), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    FeatureVector {
                        energy: row.get(1)?,
                        valence: row.get(2)?,
                        danceability: row.get(3)?,
                        tempo: row.get(4)?,
                        acousticness: row.get(5)?,
                        instrumentalness: row.get(6)?,
                    },
                ))
            })?;
            rows.collect()
        })
    }
}

/// One track in an import file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogTrack {
    #[serde(flatten)]
    pub track: Candidate,
    #[serde(default)]
    pub genres: Vec<String>,
    /// Empty means available in every market.
    #[serde(default)]
    pub markets: Vec<String>,
}

/// Summary of what a catalog file holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub tracks: usize,
    pub with_features: usize,
    /// Genre tag and track count, most common first.
    pub genres: Vec<(String, usize)>,
}

/// Create the catalog tables if they do not exist yet.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to create catalog tables")?;
    Ok(())
}

/// Load a JSON array of tracks into the catalog at `path`, creating it if
/// needed. Tracks already present (by id) are replaced. Returns the number
/// of tracks written.
pub fn import_tracks(path: &Path, json: &str) -> Result<usize> {
    let tracks: Vec<CatalogTrack> =
        serde_json::from_str(json).context("Catalog import file is not a JSON array of tracks")?;

    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open catalog database at {}", path.display()))?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("Failed to enable foreign keys")?;
    init_schema(&conn)?;

    let tx = conn.transaction().context("Failed to start import transaction")?;
    {
        let mut delete = tx.prepare("DELETE FROM tracks WHERE id = ?1")?;
        let mut insert = tx.prepare(
            "INSERT INTO tracks (id, name, album, duration_ms, preview_url, image_url,
                                 energy, valence, danceability, tempo,
                                 acousticness, instrumentalness)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;
        let mut insert_artist =
            tx.prepare("INSERT INTO track_artists (track_id, position, name) VALUES (?1, ?2, ?3)")?;
        let mut insert_genre =
            tx.prepare("INSERT OR IGNORE INTO track_genres (track_id, genre) VALUES (?1, ?2)")?;
        let mut insert_market =
            tx.prepare("INSERT OR IGNORE INTO track_markets (track_id, market) VALUES (?1, ?2)")?;

        for entry in &tracks {
            let track = &entry.track;
            if track.id.trim().is_empty() {
                anyhow::bail!("Catalog track `{}` has an empty id", track.name);
            }
            let features = track.features;

            delete.execute([&track.id])?;
            insert
                .execute(params![
                    track.id,
                    track.name,
                    track.album,
                    track.duration_ms,
                    track.preview_url,
                    track.image_url,
                    features.map(|f| f.energy),
                    features.map(|f| f.valence),
                    features.map(|f| f.danceability),
                    features.map(|f| f.tempo),
                    features.map(|f| f.acousticness),
                    features.map(|f| f.instrumentalness),
                ])
                .with_context(|| format!("Failed to insert catalog track `{}`", track.id))?;

            for (position, artist) in track.artists.iter().enumerate() {
                insert_artist.execute(params![track.id, position, artist])?;
            }
            for genre in &entry.genres {
                insert_genre.execute(params![track.id, genre.trim().to_lowercase()])?;
            }
            for market in &entry.markets {
                insert_market.execute(params![track.id, market.trim().to_uppercase()])?;
            }
        }
    }
    tx.commit().context("Failed to commit catalog import")?;

    info!("Imported {} tracks into {}", tracks.len(), path.display());
    Ok(tracks.len())
}

/// Count tracks, tracks with features, and tracks per genre.
pub fn stats(path: &Path) -> Result<CatalogStats> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open catalog database at {}", path.display()))?;

    let count = |sql: &str| -> Result<usize> {
        let value: Option<i64> = conn
            .query_row(sql, [], |row| row.get(0))
            .optional()
            .with_context(|| format!("Catalog query failed: {sql}"))?;
        Ok(usize::try_from(value.unwrap_or(0)).unwrap_or(0))
    };
    let tracks = count("SELECT COUNT(*) FROM tracks")?;
    let with_features = count("SELECT COUNT(*) FROM tracks WHERE energy IS NOT NULL")?;

    let mut stmt = conn
        .prepare(
            "SELECT genre, COUNT(*) FROM track_genres
             GROUP BY genre ORDER BY COUNT(*) DESC, genre",
        )
        .context("Failed to query catalog genres")?;
    let genres = stmt
        .query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok((row.get(0)?, usize::try_from(count).unwrap_or(0)))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read catalog genres")?;

    Ok(CatalogStats {
        tracks,
        with_features,
        genres,
    })
}
