use sapper_core as game;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_NAME: &str = "Anonymous";

pub trait StorageKey {
    const KEY: &'static str;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub marks: bool,
    pub difficulty: game::Difficulty,
    /// Last board used for a custom game.
    pub custom: game::BoardConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marks: true,
            difficulty: game::Difficulty::Beginner,
            custom: game::BoardConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestTime {
    pub seconds: u16,
    pub name: String,
}

impl Default for BestTime {
    fn default() -> Self {
        Self {
            seconds: game::MAX_SECONDS,
            name: DEFAULT_NAME.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Records {
    pub settings: Settings,
    pub best_times: BTreeMap<game::Difficulty, BestTime>,
}

impl Default for Records {
    fn default() -> Self {
        let mut records = Self {
            settings: Settings::default(),
            best_times: BTreeMap::new(),
        };
        records.reset_times();
        records
    }
}

impl StorageKey for Records {
    const KEY: &'static str = "sapper-records-v1";
}

impl Records {
    /// Puts every preset back to 999 seconds by "Anonymous".
    pub fn reset_times(&mut self) {
        self.best_times = game::Difficulty::PRESETS
            .into_iter()
            .map(|difficulty| (difficulty, BestTime::default()))
            .collect();
    }

    pub fn best_time(&self, difficulty: game::Difficulty) -> Option<&BestTime> {
        self.best_times.get(&difficulty)
    }

    /// Whether `seconds` beats the stored time. Custom games never hold records.
    pub fn is_record(&self, difficulty: game::Difficulty, seconds: u16) -> bool {
        difficulty.preset().is_some()
            && self
                .best_time(difficulty)
                .is_none_or(|best| seconds < best.seconds)
    }

    pub fn set_best_time(&mut self, difficulty: game::Difficulty, seconds: u16, name: &str) -> bool {
        if !self.is_record(difficulty, seconds) {
            return false;
        }
        let name = match name.trim() {
            "" => DEFAULT_NAME,
            name => name,
        };
        log::info!("New best time for {}: {} by {}", difficulty.name(), seconds, name);
        self.best_times.insert(
            difficulty,
            BestTime {
                seconds,
                name: name.to_string(),
            },
        );
        true
    }
}

/// JSON file holding [`Records`] inside a data directory.
#[derive(Clone, Debug)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{}.json", Records::KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored records into `records`, resetting it to defaults on failure.
    pub fn load(&self, records: &mut Records) -> bool {
        if !self.path.exists() {
            log::debug!("No records at {} yet", self.path.display());
            *records = Records::default();
            return false;
        }
        let loaded = fs::read_to_string(&self.path)
            .map_err(|err| err.to_string())
            .and_then(|text| serde_json::from_str(&text).map_err(|err| err.to_string()));
        match loaded {
            Ok(stored) => {
                *records = stored;
                log::debug!("Loaded records from {}", self.path.display());
                true
            }
            Err(err) => {
                log::warn!("Could not load records from {}: {}", self.path.display(), err);
                *records = Records::default();
                false
            }
        }
    }

    pub fn save(&self, records: &Records) -> bool {
        let saved = serde_json::to_string_pretty(records)
            .map_err(|err| err.to_string())
            .and_then(|text| fs::write(&self.path, text).map_err(|err| err.to_string()));
        match saved {
            Ok(()) => true,
            Err(err) => {
                log::error!("Could not save records to {}: {}", self.path.display(), err);
                false
            }
        }
    }
}
