//! Orphan ledger persistence in choirconfig
//!
//! The ledger of a [`crate::MediaLibrary`] lives in memory. Short-lived
//! processes (the CLI) carry it over between runs in the configuration file
//! under `library.orphans.<category>`.

use crate::models::Category;
use crate::orphans::OrphanLedger;
use anyhow::Result;
use choirconfig::Config;
use serde_yaml::Value;

pub trait LibraryConfigExt {
    /// Orphaned object paths recorded for `category`
    fn get_orphaned_paths(&self, category: Category) -> Result<Vec<String>>;

    /// Replaces the orphaned object paths of `category`
    fn set_orphaned_paths(&self, category: Category, paths: &[String]) -> Result<()>;

    /// Loads the stored paths of `category` into `ledger`
    fn restore_orphans(&self, category: Category, ledger: &OrphanLedger) -> Result<usize> {
        let paths = self.get_orphaned_paths(category)?;
        for path in &paths {
            ledger.record(path.clone(), "recorded by a previous run");
        }
        Ok(paths.len())
    }

    /// Stores the current content of `ledger` for `category`
    fn persist_orphans(&self, category: Category, ledger: &OrphanLedger) -> Result<()> {
        self.set_orphaned_paths(category, &ledger.paths())
    }
}

impl LibraryConfigExt for Config {
    fn get_orphaned_paths(&self, category: Category) -> Result<Vec<String>> {
        match self.get_value(&["library", "orphans", category.as_str()]) {
            Ok(Value::Sequence(items)) => Ok(items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()),
            _ => Ok(Vec::new()),
        }
    }

    fn set_orphaned_paths(&self, category: Category, paths: &[String]) -> Result<()> {
        let items = paths.iter().cloned().map(Value::String).collect();
        self.set_value(
            &["library", "orphans", category.as_str()],
            Value::Sequence(items),
        )
    }
}
