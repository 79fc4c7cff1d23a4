use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashSet;
use parking_lot::Mutex;

use crate::logger::AsyncLogger;

pub const DEFAULT_KEYWORDS_FILE: &str = "BlockedKeywords.txt";
pub const DEFAULT_KEYWORDS: [&str; 5] = ["facebook", "gambling", "casino", "adult", "nsfw"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddKeyword {
    Added(String),
    Empty,
    Duplicate(String),
}

/// Keywords that block any URL containing them. Shared between threads;
/// every decision is reported through the logger.
pub struct BlockList {
    keywords: DashSet<String>,
    path: PathBuf,
    // held across snapshot + write
    save_lock: Mutex<()>,
    logger: Arc<AsyncLogger>,
}

fn normalize(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

impl BlockList {
    pub fn new<P: AsRef<Path>>(path: P, logger: Arc<AsyncLogger>) -> Self {
        BlockList {
            keywords: DashSet::new(),
            path: path.as_ref().to_path_buf(),
            save_lock: Mutex::new(()),
            logger,
        }
    }

    /// Reads the keyword file, or seeds and saves the defaults when there is
    /// none. A read error falls back to the defaults.
    pub fn load<P: AsRef<Path>>(path: P, logger: Arc<AsyncLogger>) -> Self {
        let list = Self::new(path, logger);

        if !list.path.exists() {
            list.seed_defaults();
            // save() already logs its own failure
            let _ = list.save();
            list.logger.log_event(&format!(
                "Initialized {} default blocked keywords",
                list.len()
            ));
            return list;
        }

        match fs::read_to_string(&list.path) {
            Ok(contents) => {
                for keyword in contents.lines().map(normalize).filter(|k| !k.is_empty()) {
                    list.keywords.insert(keyword);
                }
                list.logger.log_event(&format!(
                    "Loaded {} blocked keywords from file",
                    list.len()
                ));
            }
            Err(e) => {
                list.logger.log_event(&format!(
                    "ERROR: Failed to load blocked keywords. Exception: {}",
                    e
                ));
                list.seed_defaults();
            }
        }

        list
    }

    fn seed_defaults(&self) {
        for keyword in DEFAULT_KEYWORDS {
            self.keywords.insert(keyword.to_string());
        }
    }

    /// Writes the keywords sorted, one per line.
    pub fn save(&self) -> io::Result<()> {
        let _guard = self.save_lock.lock();

        let snapshot = self.sorted();
        let mut contents = snapshot.join("\n");
        contents.push('\n');

        match fs::write(&self.path, contents) {
            Ok(()) => {
                let message = format!("Saved {} blocked keywords to file", snapshot.len());
                self.logger.log_event(&message);
                Ok(())
            }
            Err(e) => {
                self.logger.log_event(&format!(
                    "ERROR: Failed to save blocked keywords. Exception: {}",
                    e
                ));
                Err(e)
            }
        }
    }

    pub fn add(&self, keyword: &str) -> AddKeyword {
        let keyword = normalize(keyword);

        if keyword.is_empty() {
            self.logger.log_event("Add blocked keyword failed: Empty keyword");
            return AddKeyword::Empty;
        }

        if !self.keywords.insert(keyword.clone()) {
            self.logger.log_event(&format!(
                "Add blocked keyword failed: '{}' already exists",
                keyword
            ));
            return AddKeyword::Duplicate(keyword);
        }

        self.logger.log_event(&format!("Blocked keyword added: '{}'", keyword));
        AddKeyword::Added(keyword)
    }

    /// Returns the keyword that blocks `url`, if any.
    pub fn check_navigation(&self, url: &str) -> Option<String> {
        let url = url.trim();
        if url.is_empty() {
            self.logger.log_event("Navigation failed: Empty URL provided");
            return None;
        }

        self.logger.log_event(&format!("Attempting navigation to: {}", url));

        let lowered = url.to_lowercase();
        let hit = self
            .sorted()
            .into_iter()
            .find(|keyword| lowered.contains(keyword.as_str()));

        match &hit {
            Some(keyword) => self.logger.log_event(&format!(
                "BLOCKED: Navigation to '{}' blocked by keyword: '{}'",
                url, keyword
            )),
            None => self.logger.log_event(&format!("Successfully navigated to: {}", url)),
        }

        hit
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.keywords.contains(&normalize(keyword))
    }

    pub fn sorted(&self) -> Vec<String> {
        let mut keywords: Vec<String> = self.keywords.iter().map(|k| k.key().clone()).collect();
        keywords.sort();
        keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
