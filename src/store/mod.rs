//! SQLite persistence for finalized guardian documents and pioneer scores.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::PointsError;
use crate::model::{PioneerUser, User};

pub type Db = Arc<Mutex<Connection>>;

/// Guardian documents keyed by guardian address (and unique referrer code),
/// with a referral → guardian index for point lookups.
#[derive(Clone)]
pub struct Store {
    db: Db,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("creating db directory")?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("opening sqlite at {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrate(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    // ── Guardians ────────────────────────────────────────────────────

    /// Store a finalized guardian, keeping ledger history of earlier runs
    /// for days this document does not cover.
    pub async fn save_guardian(&self, guardian: &User) -> Result<(), PointsError> {
        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;

        let mut document = guardian.clone();
        if let Some(previous) = load_guardian(&tx, &guardian.guardian_address)? {
            document.absorb_history(&previous);
        }
        let json = serde_json::to_string(&document)?;

        tx.execute(
            "INSERT INTO guardians (guardian_address, referrer_code, document, updated_at)
             VALUES (?1, ?2, ?3, unixepoch())
             ON CONFLICT(guardian_address) DO UPDATE SET
                 referrer_code = excluded.referrer_code,
                 document = excluded.document,
                 updated_at = excluded.updated_at",
            params![document.guardian_address, document.referrer_code, json],
        )?;

        tx.execute(
            "DELETE FROM referrals WHERE guardian_address = ?1",
            [&document.guardian_address],
        )?;
        for referral in &document.referrals {
            tx.execute(
                "INSERT INTO referrals (referral_address, guardian_address) VALUES (?1, ?2)
                 ON CONFLICT(referral_address) DO UPDATE SET
                     guardian_address = excluded.guardian_address",
                params![referral.referral_address, document.guardian_address],
            )?;
        }

        tx.commit()?;
        debug!(
            guardian = %document.guardian_address,
            referrals = document.referrals.len(),
            "stored guardian"
        );
        Ok(())
    }

    pub async fn find_by_guardian(&self, address: &str) -> Result<Option<User>, PointsError> {
        let conn = self.db.lock().await;
        load_guardian(&conn, &address.to_lowercase())
    }

    /// Guardian document that lists `address` as a referral.
    pub async fn find_by_referral(&self, address: &str) -> Result<Option<User>, PointsError> {
        let conn = self.db.lock().await;
        let guardian: Option<String> = conn
            .query_row(
                "SELECT guardian_address FROM referrals WHERE referral_address = ?1",
                [address.to_lowercase()],
                |row| row.get(0),
            )
            .optional()?;
        match guardian {
            Some(g) => load_guardian(&conn, &g),
            None => Ok(None),
        }
    }

    pub async fn list_guardians(&self) -> Result<Vec<User>, PointsError> {
        let conn = self.db.lock().await;
        let mut stmt =
            conn.prepare("SELECT document FROM guardians ORDER BY guardian_address")?;
        let docs = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        docs.iter()
            .map(|d| serde_json::from_str(d).map_err(PointsError::from))
            .collect()
    }

    // ── Pioneers ─────────────────────────────────────────────────────

    pub async fn save_pioneers(&self, pioneers: &[PioneerUser]) -> Result<(), PointsError> {
        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;
        for p in pioneers {
            tx.execute(
                "INSERT INTO pioneers (address, total_usd, has_pioneer_nft, points, updated_at)
                 VALUES (?1, ?2, ?3, ?4, unixepoch())
                 ON CONFLICT(address) DO UPDATE SET
                     total_usd = excluded.total_usd,
                     has_pioneer_nft = excluded.has_pioneer_nft,
                     points = excluded.points,
                     updated_at = excluded.updated_at",
                params![p.address, p.total_usd, p.has_pioneer_nft, p.points],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub async fn find_pioneer(&self, address: &str) -> Result<Option<PioneerUser>, PointsError> {
        let conn = self.db.lock().await;
        let pioneer = conn
            .query_row(
                "SELECT address, total_usd, has_pioneer_nft, points FROM pioneers WHERE address = ?1",
                [address.to_lowercase()],
                |row| {
                    Ok(PioneerUser {
                        address: row.get(0)?,
                        total_usd: row.get(1)?,
                        has_pioneer_nft: row.get(2)?,
                        points: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(pioneer)
    }
}

fn load_guardian(conn: &Connection, address: &str) -> Result<Option<User>, PointsError> {
    let doc: Option<String> = conn
        .query_row(
            "SELECT document FROM guardians WHERE guardian_address = ?1",
            [address],
            |row| row.get(0),
        )
        .optional()?;
    doc.map(|d| serde_json::from_str(&d).map_err(PointsError::from))
        .transpose()
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS guardians (
            guardian_address  TEXT PRIMARY KEY,
            referrer_code     TEXT UNIQUE NOT NULL,
            document          TEXT NOT NULL,
            updated_at        INTEGER DEFAULT (unixepoch())
        );

        CREATE TABLE IF NOT EXISTS referrals (
            referral_address  TEXT PRIMARY KEY,
            guardian_address  TEXT NOT NULL REFERENCES guardians(guardian_address) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS pioneers (
            address          TEXT PRIMARY KEY,
            total_usd        REAL NOT NULL,
            has_pioneer_nft  INTEGER NOT NULL,
            points           REAL NOT NULL,
            updated_at       INTEGER DEFAULT (unixepoch())
        );
        ",
    )?;
    Ok(())
}
