use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

use directories::ProjectDirs;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SECRET_KEY: &[u8] = b"pairs_score_key_v1_do_not_edit";
const HMAC_SIZE: usize = 32;

/// Where the best score lives.  Synchronous and infallible from the game's
/// point of view: a store that cannot load reports no score, a store that
/// cannot save swallows the failure.
pub trait ScoreStore {
    /// The recorded best attempt count, if any.
    fn load(&self) -> Option<u32>;
    /// Record a new best attempt count.
    fn save(&self, value: u32);
}

/// The single persisted record: the fewest attempts any finished game took.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct ScoreRecord {
    best: u32,
}

/// File-backed store under the platform data directory.  The payload carries
/// an HMAC trailer; a score file that fails verification is treated the same
/// as a missing one, so a hand-edited record never loads.
pub struct FileScoreStore {
    path: Option<PathBuf>,
}

impl FileScoreStore {
    pub fn new() -> Self {
        let path = ProjectDirs::from("com", "pairs", "pairs-rs")
            .map(|dirs| dirs.data_dir().join("high_score.dat"));
        FileScoreStore { path }
    }

    /// Store backed by an explicit file (for testing).
    #[cfg(test)]
    pub fn at_path(path: PathBuf) -> Self {
        FileScoreStore { path: Some(path) }
    }
}

impl ScoreStore for FileScoreStore {
    fn load(&self) -> Option<u32> {
        let path = self.path.as_ref()?;
        if !path.exists() {
            return None;
        }

        let mut file = File::open(path).ok()?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).ok()?;

        if data.len() < HMAC_SIZE {
            // Too small to even contain the trailer.
            return None;
        }
        let split_idx = data.len() - HMAC_SIZE;
        let payload = &data[..split_idx];
        let signature = &data[split_idx..];

        let mut mac = HmacSha256::new_from_slice(SECRET_KEY).ok()?;
        mac.update(payload);
        if mac.verify_slice(signature).is_err() {
            // Tampered or corrupted file.
            return None;
        }

        let record: ScoreRecord = bincode::deserialize(payload).ok()?;
        Some(record.best)
    }

    fn save(&self, value: u32) {
        let Some(path) = self.path.as_ref() else { return };

        if let Some(dir) = path.parent() {
            let _ = fs::create_dir_all(dir);
        }

        let payload = match bincode::serialize(&ScoreRecord { best: value }) {
            Ok(p) => p,
            Err(_) => return,
        };

        let mut mac = match HmacSha256::new_from_slice(SECRET_KEY) {
            Ok(m) => m,
            Err(_) => return,
        };
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        let mut final_data = payload;
        final_data.extend_from_slice(&signature);

        // Atomic write: temp file, then rename over the old record.
        let mut temp_path = path.clone();
        temp_path.set_extension("tmp");

        let mut temp_file = match File::create(&temp_path) {
            Ok(f) => f,
            Err(_) => return,
        };
        if temp_file.write_all(&final_data).is_err() {
            let _ = fs::remove_file(&temp_path);
            return;
        }
        // Flush OS buffers before the rename so a crash mid-save leaves the
        // previous record intact rather than a torn file.
        if temp_file.sync_all().is_err() {
            let _ = fs::remove_file(&temp_path);
            return;
        }

        let _ = fs::rename(&temp_path, path);
    }
}

/// In-memory store used by tests in place of the real file.  Counts writes
/// so a test can assert the winning transition persists exactly once.
#[cfg(test)]
pub struct MemoryScoreStore {
    value: std::cell::Cell<Option<u32>>,
    saves: std::cell::Cell<u32>,
}

#[cfg(test)]
impl MemoryScoreStore {
    pub fn empty() -> Self {
        MemoryScoreStore {
            value: std::cell::Cell::new(None),
            saves: std::cell::Cell::new(0),
        }
    }

    pub fn with(value: u32) -> Self {
        let store = Self::empty();
        store.value.set(Some(value));
        store
    }

    pub fn saves(&self) -> u32 {
        self.saves.get()
    }
}

#[cfg(test)]
impl ScoreStore for MemoryScoreStore {
    fn load(&self) -> Option<u32> {
        self.value.get()
    }

    fn save(&self, value: u32) {
        self.value.set(Some(value));
        self.saves.set(self.saves.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(tag: &str) -> FileScoreStore {
        let path = std::env::temp_dir().join(format!(
            "pairs_rs_score_{}_{}.dat",
            tag,
            std::process::id()
        ));
        let _ = fs::remove_file(&path);
        FileScoreStore::at_path(path)
    }

    #[test]
    fn missing_file_loads_as_absent() {
        let store = temp_store("missing");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = temp_store("roundtrip");
        store.save(12);
        assert_eq!(store.load(), Some(12));
        store.save(9);
        assert_eq!(store.load(), Some(9));
    }

    #[test]
    fn tampered_file_loads_as_absent() {
        let store = temp_store("tampered");
        store.save(12);

        let path = store.path.clone().unwrap();
        let mut data = fs::read(&path).unwrap();
        data[0] ^= 0xff;
        fs::write(&path, data).unwrap();

        assert_eq!(store.load(), None);
    }

    #[test]
    fn truncated_file_loads_as_absent() {
        let store = temp_store("truncated");
        let path = store.path.clone().unwrap();
        fs::write(&path, b"short").unwrap();
        assert_eq!(store.load(), None);
    }
}
