use super::{check_card_id, CardStore, Counter};
use crate::error::{CardError, Result};
use crate::model::{CardPatch, CardRecord};
use chrono::Utc;
use fs2::FileExt;
use log::debug;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const DATA_FILENAME: &str = "cards.json";
const LOCK_FILENAME: &str = "cards.lock";

/// Durable card storage: every card in one JSON document.
///
/// Each mutation holds the in-process mutex and an exclusive lock on
/// `cards.lock` across load, modify and save, so it stays atomic when
/// several processes (e.g. concurrent CLI invocations) share a data dir.
/// Reads take the lock shared.
pub struct FileStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_file(&self) -> PathBuf {
        self.root.join(DATA_FILENAME)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(CardError::Io)?;
        }
        Ok(())
    }

    fn open_lock_file(&self) -> Result<File> {
        self.ensure_dir()?;
        OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILENAME))
            .map_err(CardError::Io)
    }

    /// The lock is released when the returned file is dropped.
    fn lock_exclusive(&self) -> Result<File> {
        let lock_file = self.open_lock_file()?;
        FileExt::lock_exclusive(&lock_file).map_err(CardError::Io)?;
        Ok(lock_file)
    }

    fn load_shared(&self) -> Result<Vec<CardRecord>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let lock_file = self.open_lock_file()?;
        FileExt::lock_shared(&lock_file).map_err(CardError::Io)?;
        self.load()
    }

    fn load(&self) -> Result<Vec<CardRecord>> {
        let data_file = self.data_file();
        if !data_file.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(data_file).map_err(CardError::Io)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let cards: Vec<CardRecord> =
            serde_json::from_str(&content).map_err(CardError::Serialization)?;
        Ok(cards)
    }

    fn save(&self, cards: &[CardRecord]) -> Result<()> {
        self.ensure_dir()?;
        let content = serde_json::to_string_pretty(cards).map_err(CardError::Serialization)?;

        // Write to a sibling temp file first so a crash never leaves half a document.
        let tmp = self.root.join(format!("{}.tmp", DATA_FILENAME));
        fs::write(&tmp, content).map_err(CardError::Io)?;
        fs::rename(&tmp, self.data_file()).map_err(CardError::Io)?;
        Ok(())
    }
}

impl CardStore for FileStore {
    fn put(&self, card_id: &str, patch: CardPatch) -> Result<CardRecord> {
        check_card_id(card_id)?;
        let _guard = self.lock.lock();
        let _file_lock = self.lock_exclusive()?;

        let mut cards = self.load()?;
        let now = Utc::now();
        let record = match cards.iter().position(|c| c.card_id == card_id) {
            Some(idx) => {
                cards[idx].apply(patch, now);
                cards[idx].clone()
            }
            None => {
                let mut record = CardRecord::new(card_id, now);
                record.apply(patch, now);
                cards.push(record.clone());
                debug!("appended card to {} (card_id={})", DATA_FILENAME, card_id);
                record
            }
        };

        self.save(&cards)?;
        Ok(record)
    }

    fn get(&self, card_id: &str) -> Result<Option<CardRecord>> {
        let _guard = self.lock.lock();
        Ok(self.load_shared()?.into_iter().find(|c| c.card_id == card_id))
    }

    fn list(&self) -> Result<Vec<CardRecord>> {
        let _guard = self.lock.lock();
        self.load_shared()
    }

    fn increment(&self, card_id: &str, counter: Counter) -> Result<bool> {
        let _guard = self.lock.lock();
        let _file_lock = self.lock_exclusive()?;

        let mut cards = self.load()?;
        let Some(record) = cards.iter_mut().find(|c| c.card_id == card_id) else {
            return Ok(false);
        };
        counter.bump(record);
        self.save(&cards)?;
        Ok(true)
    }
}
