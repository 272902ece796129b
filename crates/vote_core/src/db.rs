use rusqlite::{Connection, OptionalExtension, Row, params};
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::schema::{VoteRecord, Watermark};

/// Text columns hold at most this many characters; longer values are cut.
pub const MAX_TEXT_LEN: usize = 2048;

/// Reports the ingestion boundary.
pub trait WatermarkStore {
    /// `(0, 0)` on an empty store, otherwise the highest parliament and the
    /// highest vote number within it.
    fn current_watermark(&self) -> Result<Watermark>;
}

/// Durable home of ingested votes.
pub trait VoteStore: WatermarkStore {
    /// Inserts every vote in one transaction, in the order given, and
    /// returns the assigned surrogate ids. Either all rows land or none do.
    fn insert_all(&mut self, votes: &[VoteRecord]) -> Result<Vec<i64>>;

    /// The `n` most recently inserted votes, newest first.
    fn latest(&self, n: usize) -> Result<Vec<VoteRecord>>;
}

pub fn open(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    init(&conn)?;
    Ok(conn)
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS vote (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          number INTEGER NOT NULL,
          parliament INTEGER NOT NULL,
          session INTEGER NOT NULL,
          sitting INTEGER NOT NULL,
          date TEXT NOT NULL,
          description_english TEXT NOT NULL,
          description_french TEXT NOT NULL,
          decision TEXT NOT NULL,
          related_bill TEXT NOT NULL,
          total_yeas INTEGER NOT NULL,
          total_nays INTEGER NOT NULL,
          total_paired INTEGER NOT NULL,
          inserted_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_vote_parliament_number ON vote(parliament, number);
        "#,
    )?;
    Ok(())
}

fn truncate_text(value: &str) -> Cow<'_, str> {
    match value.char_indices().nth(MAX_TEXT_LEN) {
        Some((cut, _)) => Cow::Owned(value[..cut].to_string()),
        None => Cow::Borrowed(value),
    }
}

fn vote_from_row(row: &Row<'_>) -> rusqlite::Result<VoteRecord> {
    Ok(VoteRecord {
        id: Some(row.get(0)?),
        number: row.get(1)?,
        parliament: row.get(2)?,
        session: row.get(3)?,
        sitting: row.get(4)?,
        date: row.get(5)?,
        description_english: row.get(6)?,
        description_french: row.get(7)?,
        decision: row.get(8)?,
        related_bill: row.get(9)?,
        total_yeas: row.get(10)?,
        total_nays: row.get(11)?,
        total_paired: row.get(12)?,
    })
}

pub struct SqliteVoteStore {
    conn: Connection,
}

impl SqliteVoteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self {
            conn: open(db_path)?,
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;
        Ok(Self { conn })
    }

    pub fn count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vote", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl WatermarkStore for SqliteVoteStore {
    fn current_watermark(&self) -> Result<Watermark> {
        let mark = self
            .conn
            .query_row(
                "SELECT parliament, number FROM vote ORDER BY parliament DESC, number DESC LIMIT 1",
                [],
                |row| Ok(Watermark::new(row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(mark.unwrap_or_default())
    }
}

impl VoteStore for SqliteVoteStore {
    fn insert_all(&mut self, votes: &[VoteRecord]) -> Result<Vec<i64>> {
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(votes.len());

        for vote in votes {
            tx.execute(
                r#"
                INSERT INTO vote (
                  number, parliament, session, sitting, date,
                  description_english, description_french, decision, related_bill,
                  total_yeas, total_nays, total_paired
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
                params![
                    vote.number,
                    vote.parliament,
                    vote.session,
                    vote.sitting,
                    truncate_text(&vote.date),
                    truncate_text(&vote.description_english),
                    truncate_text(&vote.description_french),
                    truncate_text(&vote.decision),
                    truncate_text(&vote.related_bill),
                    vote.total_yeas,
                    vote.total_nays,
                    vote.total_paired,
                ],
            )?;
            ids.push(tx.last_insert_rowid());
        }

        tx.commit()?;
        debug!(rows = ids.len(), "committed vote batch");
        Ok(ids)
    }

    fn latest(&self, n: usize) -> Result<Vec<VoteRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, number, parliament, session, sitting, date,
                   description_english, description_french, decision, related_bill,
                   total_yeas, total_nays, total_paired
            FROM vote
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([n as i64], vote_from_row)?;
        let mut votes = Vec::new();
        for r in rows {
            votes.push(r?);
        }
        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(parliament: u32, number: u32) -> VoteRecord {
        VoteRecord {
            parliament,
            number,
            session: 1,
            date: "2012-03-28".to_string(),
            description_english: format!("Vote {parliament}-{number}"),
            decision: "Agreed to".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_store_has_zero_watermark() {
        let store = SqliteVoteStore::in_memory().unwrap();
        assert_eq!(store.current_watermark().unwrap(), Watermark::new(0, 0));
    }

    #[test]
    fn watermark_is_max_parliament_then_number() {
        let mut store = SqliteVoteStore::in_memory().unwrap();
        store
            .insert_all(&[vote(41, 900), vote(42, 3), vote(42, 17), vote(42, 5)])
            .unwrap();
        assert_eq!(store.current_watermark().unwrap(), Watermark::new(42, 17));
    }

    #[test]
    fn ids_follow_insertion_order() {
        let mut store = SqliteVoteStore::in_memory().unwrap();
        let ids = store.insert_all(&[vote(41, 1), vote(41, 2), vote(41, 3)]).unwrap();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));

        let latest = store.latest(2).unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].number, 3);
        assert_eq!(latest[1].number, 2);
        assert_eq!(latest[0].id, Some(ids[2]));
    }

    #[test]
    fn duplicate_key_rolls_back_whole_batch() {
        let mut store = SqliteVoteStore::in_memory().unwrap();
        store.insert_all(&[vote(41, 1)]).unwrap();

        let err = store.insert_all(&[vote(41, 2), vote(41, 1)]).unwrap_err();
        assert!(matches!(err, crate::IngestError::Persistence(_)));
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.current_watermark().unwrap(), Watermark::new(41, 1));
    }

    #[test]
    fn long_text_is_truncated_not_rejected() {
        let mut store = SqliteVoteStore::in_memory().unwrap();
        let mut long = vote(41, 1);
        long.description_english = "é".repeat(MAX_TEXT_LEN + 10);
        store.insert_all(&[long]).unwrap();

        let stored = store.latest(1).unwrap().remove(0);
        assert_eq!(stored.description_english.chars().count(), MAX_TEXT_LEN);
    }

    #[test]
    fn round_trips_fields() {
        let mut store = SqliteVoteStore::in_memory().unwrap();
        let mut v = vote(41, 102);
        v.related_bill = "C-31".to_string();
        v.description_french = "2e lecture".to_string();
        v.total_yeas = 150;
        v.total_nays = 123;
        store.insert_all(&[v.clone()]).unwrap();

        let mut stored = store.latest(10).unwrap().remove(0);
        assert!(stored.id.is_some());
        stored.id = None;
        assert_eq!(stored, v);
    }

    #[test]
    fn open_creates_schema_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.sqlite3");

        {
            let mut store = SqliteVoteStore::open(&path).unwrap();
            store.insert_all(&[vote(41, 1)]).unwrap();
        }
        let store = SqliteVoteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.current_watermark().unwrap(), Watermark::new(41, 1));
    }
}
