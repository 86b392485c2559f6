//! LMDB-backed key-value store holding the client-side state of the catalog.
//!
//! The store plays the role browser storage plays for a web client: a small
//! number of string keys (catalog snapshot, last update stamp, admin marker)
//! mapped to UTF-8 string values.

use std::fs;
use std::path::{Path, PathBuf};

use lmdb::{Database, DatabaseFlags, Environment, Transaction, WriteFlags};
use log::{info, warn};

const DB_NAME: &str = "library_state";
const MAP_SIZE: usize = 64 * 1024 * 1024;

pub struct AppDbState {
    env: Option<Environment>,
    db: Database,
    path: PathBuf,
}

impl AppDbState {
    /// Opens (creating if needed) the store in directory `path`.
    pub fn open_at(path: PathBuf) -> Result<Self, lmdb::Error> {
        if let Err(e) = fs::create_dir_all(&path) {
            warn!("Could not create store directory {}: {e}", path.display());
            return Err(lmdb::Error::Invalid);
        }

        let env = Environment::new()
            .set_max_dbs(1)
            .set_map_size(MAP_SIZE)
            .open(&path)?;
        let db = env.create_db(Some(DB_NAME), DatabaseFlags::empty())?;

        info!("Opened local store at {}", path.display());
        Ok(Self { env: Some(env), db, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn env(&self) -> Result<&Environment, lmdb::Error> {
        self.env.as_ref().ok_or(lmdb::Error::BadTxn)
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, lmdb::Error> {
        let txn = self.env()?.begin_ro_txn()?;
        let value = match txn.get(self.db, &key) {
            Ok(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            Err(lmdb::Error::NotFound) => None,
            Err(e) => return Err(e),
        };
        txn.commit()?;
        Ok(value)
    }

    pub fn put(&self, key: &str, value: &str) -> Result<(), lmdb::Error> {
        let mut txn = self.env()?.begin_rw_txn()?;
        txn.put(self.db, &key, &value, WriteFlags::empty())?;
        txn.commit()
    }

    /// Writes several keys in one transaction.
    pub fn put_all(&self, entries: &[(&str, &str)]) -> Result<(), lmdb::Error> {
        let mut txn = self.env()?.begin_rw_txn()?;
        for (key, value) in entries {
            txn.put(self.db, key, value, WriteFlags::empty())?;
        }
        txn.commit()
    }

    /// Returns `true` if the key existed.
    pub fn remove(&self, key: &str) -> Result<bool, lmdb::Error> {
        let mut txn = self.env()?.begin_rw_txn()?;
        let removed = match txn.del(self.db, &key, None) {
            Ok(()) => true,
            Err(lmdb::Error::NotFound) => false,
            Err(e) => return Err(e),
        };
        txn.commit()?;
        Ok(removed)
    }

    pub fn contains(&self, key: &str) -> Result<bool, lmdb::Error> {
        Ok(self.get(key)?.is_some())
    }

    pub fn clear_all_records(&self) -> Result<(), lmdb::Error> {
        let mut txn = self.env()?.begin_rw_txn()?;
        txn.clear_db(self.db)?;
        txn.commit()
    }

    /// Drops the environment. Every later call fails with `BadTxn`.
    pub fn close_database(&mut self) -> Result<(), lmdb::Error> {
        match self.env.take() {
            Some(env) => {
                env.sync(true)?;
                info!("Closed local store at {}", self.path.display());
                Ok(())
            }
            None => {
                warn!("Local store at {} was already closed", self.path.display());
                Ok(())
            }
        }
    }
}
