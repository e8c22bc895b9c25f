//! Core [`RuleLoader`] struct: filesystem-backed rule loading with optional hot-reload.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::schema::{RuleDefinition, RuleFile};
use crate::source::{RuleSource, SourceError};

use super::error::{LoadResult, LoadStatus, Result, RuleError, SkipReason};
use super::watcher::handle_fs_event;

/// Loaded definitions keyed by id, plus which file each came from.
///
/// Several files may claim the same id. The most recently loaded claim
/// supplies the definition; the others are remembered so that deleting
/// the winning file falls back to the next one instead of losing the rule.
#[derive(Debug, Default)]
pub(super) struct RuleStore {
    by_id: BTreeMap<String, RuleDefinition>,
    by_path: HashMap<PathBuf, String>,
    /// Files claiming each id, oldest claim first. The last one is live.
    claims: BTreeMap<String, Vec<PathBuf>>,
}

/// What happened to a rule id when a file stopped defining it.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Release {
    /// No other file defines the id; the rule is gone.
    Dropped(RuleDefinition),
    /// Another file still defines the id and now supplies it.
    FellBack { rule_id: String, path: PathBuf },
}

impl Release {
    fn log(&self, from: &Path) {
        match self {
            Release::Dropped(def) => {
                info!(rule_id = %def.id, path = %from.display(), "removed rule, no other file defines it")
            }
            Release::FellBack { rule_id, path } => {
                info!(rule_id = %rule_id, removed = %from.display(), path = %path.display(), "rule now supplied by remaining duplicate")
            }
        }
    }
}

impl RuleStore {
    /// Insert or replace the rule defined by `path`.
    pub(super) fn upsert(&mut self, path: &Path, def: RuleDefinition) {
        let id = def.id.to_string();
        // A file may have been edited to carry a different id.
        if self.by_path.get(path).is_some_and(|old| *old != id) {
            if let Some(release) = self.release(path) {
                release.log(path);
            }
        }

        let claims = self.claims.entry(id.clone()).or_default();
        claims.retain(|p| p != path);
        if let Some(previous) = claims.last() {
            warn!(rule_id = %id, previous = %previous.display(), path = %path.display(), "duplicate rule id, later file wins");
        }
        claims.push(path.to_path_buf());

        self.by_path.insert(path.to_path_buf(), id.clone());
        self.by_id.insert(id, def);
    }

    /// Forget `path`. Returns `None` when the file supplied no live rule.
    pub(super) fn remove_path(&mut self, path: &Path) -> Option<Release> {
        let release = self.release(path)?;
        release.log(path);
        Some(release)
    }

    fn release(&mut self, path: &Path) -> Option<Release> {
        let id = self.by_path.remove(path)?;
        let claims = self.claims.get_mut(&id)?;
        let was_live = claims.last().is_some_and(|p| p == path);
        claims.retain(|p| p != path);
        if !was_live {
            // A shadowed duplicate went away; the live rule is unchanged.
            return None;
        }

        while let Some(candidate) = self.claims.get_mut(&id).and_then(Vec::pop) {
            match parse_rule_file(&candidate) {
                Ok(def) if def.id.as_str() == id => {
                    if let Some(claims) = self.claims.get_mut(&id) {
                        claims.push(candidate.clone());
                    }
                    self.by_id.insert(id.clone(), def);
                    return Some(Release::FellBack {
                        rule_id: id,
                        path: candidate,
                    });
                }
                Ok(def) => {
                    // Edited on disk without an event yet; its own event re-adds it.
                    debug!(rule_id = %id, now = %def.id, path = %candidate.display(), "duplicate no longer defines this id");
                    self.by_path.remove(&candidate);
                }
                Err(e) => {
                    warn!(rule_id = %id, path = %candidate.display(), error = %e, "duplicate rule file no longer loads");
                    self.by_path.remove(&candidate);
                }
            }
        }

        self.claims.remove(&id);
        self.by_id.remove(&id).map(Release::Dropped)
    }
}

/// True for the file extensions the loader reads.
pub(super) fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "yml" || e == "yaml" || e == "json")
        .unwrap_or(false)
}

/// Parse one rule file into its stored definition.
pub(super) fn parse_rule_file(path: &Path) -> Result<RuleDefinition> {
    let contents = fs::read_to_string(path).map_err(|source| RuleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    // YAML is a superset of JSON, so one parser covers both extensions.
    let file: RuleFile = serde_yaml::from_str(&contents)?;
    file.check_header()?;
    Ok(file.into_definition())
}

/// Filesystem-backed rule loader with optional hot-reload.
///
/// Scans a directory (recursively) for `*.yml` / `*.yaml` / `*.json` rule
/// files and keeps the definitions in an in-memory map keyed by rule id.
/// As a [`RuleSource`] it yields enabled rules in id order.
pub struct RuleLoader {
    /// Root directory containing rule files.
    rules_dir: PathBuf,
    store: Arc<RwLock<RuleStore>>,
    /// Active filesystem watcher (held to keep it alive).
    _watcher: Option<RecommendedWatcher>,
}

impl RuleLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: PathBuf) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            store: Arc::new(RwLock::new(RuleStore::default())),
            _watcher: None,
        }
    }

    /// Recursively scan the rules directory and load every rule file.
    ///
    /// Dotfiles and files with other extensions are skipped. A file that
    /// fails to parse is reported in the results and does not abort the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir, &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        // Sorted so duplicate-id resolution does not depend on readdir order.
        let mut paths = entries
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|source| RuleError::Read {
                path: dir.to_path_buf(),
                source,
            })?;
        paths.sort();

        for path in paths {
            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped(SkipReason::Dotfile),
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            if !is_rule_file(&path) {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped(SkipReason::NotRuleFile),
                });
                continue;
            }

            match self.load_file(&path) {
                Ok(def) => {
                    let rule_id = def.id.to_string();
                    let enabled = def.is_active;
                    info!(rule_id = %rule_id, rule_type = %def.rule_type, enabled, path = %path.display(), "loaded rule");
                    self.store
                        .write()
                        .expect("rule store lock poisoned")
                        .upsert(&path, def);
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id, enabled },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule file");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed(e),
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse a single rule file without adding it to the loader.
    pub fn load_file(&self, path: &Path) -> Result<RuleDefinition> {
        parse_rule_file(path)
    }

    /// Start a recursive filesystem watcher.
    ///
    /// On file create/modify the rule is re-parsed and upserted.
    /// On file delete the rule is removed.
    /// Parse errors are logged as warnings; the previous version is kept.
    pub fn watch(&mut self) -> Result<()> {
        let store = Arc::clone(&self.store);

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => handle_fs_event(&event, &store),
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;

        watcher.watch(&self.rules_dir, RecursiveMode::Recursive)?;

        let _ = watcher
            .configure(notify::Config::default().with_poll_interval(Duration::from_millis(500)));

        info!(path = %self.rules_dir.display(), "watching rules directory for changes (recursive)");
        self._watcher = Some(watcher);
        Ok(())
    }

    /// Get the rules directory path.
    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// All loaded definitions, enabled or not, in id order.
    pub fn definitions(&self) -> Vec<RuleDefinition> {
        self.store
            .read()
            .expect("rule store lock poisoned")
            .by_id
            .values()
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<RuleDefinition> {
        self.store
            .read()
            .expect("rule store lock poisoned")
            .by_id
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.store.read().expect("rule store lock poisoned").by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(super) fn store(&self) -> Arc<RwLock<RuleStore>> {
        Arc::clone(&self.store)
    }
}

impl RuleSource for RuleLoader {
    fn active_rules(&self) -> std::result::Result<Vec<RuleDefinition>, SourceError> {
        let store = self
            .store
            .read()
            .map_err(|_| SourceError::Unavailable("rule store lock poisoned".to_string()))?;
        Ok(store.by_id.values().filter(|d| d.is_active).cloned().collect())
    }
}
