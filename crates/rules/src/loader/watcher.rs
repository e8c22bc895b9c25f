//! Filesystem event handler for the notify watcher (hot-reload).

use std::sync::{Arc, RwLock};

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind};
use tracing::{info, warn};

use super::core::{is_rule_file, parse_rule_file, RuleStore};

/// Handle a single filesystem event from the notify watcher.
pub(super) fn handle_fs_event(event: &Event, store: &Arc<RwLock<RuleStore>>) {
    for path in &event.paths {
        if !is_rule_file(path) {
            continue;
        }

        // Skip dotfiles (editor swap files, temp files)
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }

        match &event.kind {
            EventKind::Create(CreateKind::File)
            | EventKind::Create(CreateKind::Any)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(_)) => {
                if !path.exists() {
                    // Rename away from this path.
                    remove_rule_by_path(store, path);
                    continue;
                }
                match parse_rule_file(path) {
                    Ok(def) => {
                        info!(rule_id = %def.id, rule_type = %def.rule_type, path = %path.display(), "hot-reloaded rule");
                        store
                            .write()
                            .expect("rule store lock poisoned")
                            .upsert(path, def);
                    }
                    Err(e) => {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to parse rule during hot-reload, keeping previous version"
                        );
                    }
                }
            }
            EventKind::Remove(RemoveKind::File) | EventKind::Remove(RemoveKind::Any) => {
                remove_rule_by_path(store, path);
            }
            _ => {}
        }
    }
}

fn remove_rule_by_path(store: &Arc<RwLock<RuleStore>>, path: &std::path::Path) {
    store
        .write()
        .expect("rule store lock poisoned")
        .remove_path(path);
}
