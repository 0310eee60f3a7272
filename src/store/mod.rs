// SPDX-FileCopyrightText: 2026 The metaresolvr Contributors
// SPDX-License-Identifier: GPL-3.0-or-later

//! SQLite-backed persistent store for the identifier backlog and tracker
//! statistics.
//!
//! The backlog is split into two partitions: `hashes` holds identifiers that
//! have never been attempted, `aged_hashes` holds identifiers that already
//! burned through at least one full attempt together with their accumulated
//! active time. An identifier lives in exactly one partition at a time; the
//! only path between them is `offload`.

use crate::errors::StoreError;
use crate::infohash::InfoHash;
use crate::trackers::TrackerRecord;

use rusqlite::{params, Connection};

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    New,
    Aged,
}

impl Partition {
    fn table(self) -> &'static str {
        match self {
            Partition::New => "hashes",
            Partition::Aged => "aged_hashes",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IdentifierRecord {
    pub id: i64,
    pub infohash: InfoHash,
    pub accumulated_runtime: Duration,
    pub partition: Partition,
}

/// Summary persisted once an identifier has been resolved. `files` carries
/// slash-joined paths with their sizes.
#[derive(Debug, Clone)]
pub struct ResolvedSummary {
    pub infohash: InfoHash,
    pub name: String,
    pub total_size: u64,
    pub files: Vec<(String, u64)>,
}

pub struct Store {
    db: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let db = Connection::open(path)?;
        Self::init_schema(&db)?;
        Ok(Store { db })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let db = Connection::open_in_memory()?;
        Self::init_schema(&db)?;
        Ok(Store { db })
    }

    fn init_schema(db: &Connection) -> Result<(), StoreError> {
        db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS hashes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                infohash TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS aged_hashes (
                id INTEGER PRIMARY KEY,
                infohash TEXT NOT NULL UNIQUE,
                runtime INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_aged_hashes_runtime ON aged_hashes(runtime);

            CREATE TABLE IF NOT EXISTS trackers (
                url TEXT PRIMARY KEY,
                uses INTEGER NOT NULL DEFAULT 0,
                resolves INTEGER NOT NULL DEFAULT 0,
                ratio REAL NOT NULL DEFAULT 0.0
            );

            CREATE TABLE IF NOT EXISTS resolved (
                infohash TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                num_files INTEGER NOT NULL,
                total_size INTEGER NOT NULL,
                resolved_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS resolved_files (
                infohash TEXT NOT NULL,
                path TEXT NOT NULL,
                size INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_resolved_files_infohash ON resolved_files(infohash);
            "#,
        )?;
        Ok(())
    }

    /// Loads up to `limit` never-attempted identifiers, oldest first.
    pub fn load_new(&self, limit: usize) -> Result<Vec<IdentifierRecord>, StoreError> {
        let mut stmt = self
            .db
            .prepare("SELECT id, infohash FROM hashes ORDER BY id ASC LIMIT ?1")?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, hex) = row?;
            records.push(IdentifierRecord {
                id,
                infohash: InfoHash::from_hex(&hex).map_err(StoreError::CorruptRow)?,
                accumulated_runtime: Duration::ZERO,
                partition: Partition::New,
            });
        }
        Ok(records)
    }

    /// Loads up to `limit` previously-attempted identifiers, least-attempted
    /// first so starved identifiers get another turn before heavy repeaters.
    pub fn load_aged(&self, limit: usize) -> Result<Vec<IdentifierRecord>, StoreError> {
        let mut stmt = self
            .db
            .prepare("SELECT id, infohash, runtime FROM aged_hashes ORDER BY runtime ASC LIMIT ?1")?;
        let rows = stmt.query_map([limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, hex, runtime) = row?;
            records.push(IdentifierRecord {
                id,
                infohash: InfoHash::from_hex(&hex).map_err(StoreError::CorruptRow)?,
                accumulated_runtime: Duration::from_secs(runtime.max(0) as u64),
                partition: Partition::Aged,
            });
        }
        Ok(records)
    }

    /// Deletes a backlog record from whichever partition it is in. Removing a
    /// record that is already gone is not an error.
    pub fn remove(&self, record: &IdentifierRecord) -> Result<(), StoreError> {
        let sql = format!(
            "DELETE FROM {} WHERE id = ?1 AND infohash = ?2",
            record.partition.table()
        );
        self.db
            .execute(&sql, params![record.id, record.infohash.to_hex()])?;
        Ok(())
    }

    /// Moves a record onto the aged partition, accumulating the active time
    /// the failed attempt burned. The two-statement New path commits
    /// atomically.
    pub fn offload(
        &mut self,
        record: &IdentifierRecord,
        added_runtime: Duration,
    ) -> Result<(), StoreError> {
        let tx = self.db.transaction()?;
        match record.partition {
            Partition::New => {
                tx.execute(
                    "DELETE FROM hashes WHERE id = ?1 AND infohash = ?2",
                    params![record.id, record.infohash.to_hex()],
                )?;
                tx.execute(
                    "INSERT INTO aged_hashes (id, infohash, runtime) VALUES (?1, ?2, ?3)",
                    params![
                        record.id,
                        record.infohash.to_hex(),
                        added_runtime.as_secs() as i64
                    ],
                )?;
            }
            Partition::Aged => {
                let total = record.accumulated_runtime + added_runtime;
                tx.execute(
                    "UPDATE aged_hashes SET runtime = ?1 WHERE id = ?2 AND infohash = ?3",
                    params![total.as_secs() as i64, record.id, record.infohash.to_hex()],
                )?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Ingests one identifier into the New partition. Returns false if it was
    /// already queued.
    pub fn add_new_hash(&self, infohash: &InfoHash) -> Result<bool, StoreError> {
        let changed = self.db.execute(
            "INSERT OR IGNORE INTO hashes (infohash) VALUES (?1)",
            [infohash.to_hex()],
        )?;
        Ok(changed > 0)
    }

    pub fn load_trackers(&self) -> Result<Vec<TrackerRecord>, StoreError> {
        let mut stmt = self
            .db
            .prepare("SELECT url, uses, resolves, ratio FROM trackers")?;
        let rows = stmt.query_map([], |row| {
            Ok(TrackerRecord {
                url: row.get(0)?,
                uses: row.get::<_, i64>(1)?.max(0) as u64,
                resolves: row.get::<_, i64>(2)?.max(0) as u64,
                ratio: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    pub fn upsert_trackers(&mut self, records: &[TrackerRecord]) -> Result<(), StoreError> {
        let tx = self.db.transaction()?;
        for record in records {
            tx.execute(
                r#"
                INSERT INTO trackers (url, uses, resolves, ratio)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(url) DO UPDATE SET
                    uses = excluded.uses,
                    resolves = excluded.resolves,
                    ratio = excluded.ratio
                "#,
                params![
                    record.url,
                    record.uses as i64,
                    record.resolves as i64,
                    record.ratio
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Seeds the tracker table from a list of announce URLs. Already-known
    /// URLs keep their counters. Returns the number of new entries.
    pub fn import_trackers(&mut self, urls: &[String]) -> Result<usize, StoreError> {
        let tx = self.db.transaction()?;
        let mut added = 0;
        for url in urls {
            added += tx.execute(
                "INSERT OR IGNORE INTO trackers (url, uses, resolves, ratio) VALUES (?1, 0, 0, 0.0)",
                [url],
            )?;
        }
        tx.commit()?;
        Ok(added)
    }

    pub fn insert_resolved(&mut self, summary: &ResolvedSummary) -> Result<(), StoreError> {
        let resolved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs() as i64;
        let hex = summary.infohash.to_hex();

        let tx = self.db.transaction()?;
        tx.execute(
            r#"
            INSERT OR REPLACE INTO resolved (infohash, name, num_files, total_size, resolved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                hex,
                summary.name,
                summary.files.len() as i64,
                summary.total_size as i64,
                resolved_at
            ],
        )?;
        tx.execute("DELETE FROM resolved_files WHERE infohash = ?1", [&hex])?;
        for (path, size) in &summary.files {
            tx.execute(
                "INSERT INTO resolved_files (infohash, path, size) VALUES (?1, ?2, ?3)",
                params![hex, path, *size as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count_new(&self) -> Result<u64, StoreError> {
        self.count_table("hashes")
    }

    pub fn count_aged(&self) -> Result<u64, StoreError> {
        self.count_table("aged_hashes")
    }

    pub fn count_resolved(&self) -> Result<u64, StoreError> {
        self.count_table("resolved")
    }

    pub fn count_trackers(&self) -> Result<u64, StoreError> {
        self.count_table("trackers")
    }

    fn count_table(&self, table: &str) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(1) FROM {}", table);
        let count: i64 = self.db.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
