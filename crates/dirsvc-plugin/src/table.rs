// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin table: one record per known backend.
//!
//! Records are kept in insertion order and indexed by name and by token. The
//! table never calls into plugin code; callers snapshot a record, release the
//! lock, do their slow work and come back only to commit the results.

use std::collections::HashMap;
use std::sync::Arc;

use dirsvc_core::{ConfiguredState, DirError, DirectoryPlugin, LoadTier, PluginState, Token};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::factory::PluginFactory;

/// Position of a record in the table's insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

impl RecordId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A backend known to the service.
pub struct PluginRecord {
    name: String,
    version: String,
    token: Token,
    state: PluginState,
    module: Option<Arc<dyn DirectoryPlugin>>,
    tier: LoadTier,
    lazy: bool,
    valid_data_stamp: u64,
    factory: Option<Arc<dyn PluginFactory>>,
}

impl PluginRecord {
    /// Build an unregistered record with a fresh capability token.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        tier: LoadTier,
        factory: Option<Arc<dyn PluginFactory>>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            token: Token::generate(),
            state: PluginState::UNINITIALIZED | PluginState::ACTIVE,
            module: None,
            tier,
            lazy: false,
            valid_data_stamp: 0,
            factory,
        }
    }

    /// Mark the record as deferring construction until first demand.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> Token {
        self.token
    }

    fn snapshot(&self) -> PluginSnapshot {
        PluginSnapshot {
            name: self.name.clone(),
            version: self.version.clone(),
            token: self.token,
            state: self.state,
            tier: self.tier,
            lazy: self.lazy,
            valid_data_stamp: self.valid_data_stamp,
            module: self.module.clone(),
            factory: self.factory.clone(),
        }
    }
}

impl std::fmt::Debug for PluginRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRecord")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("token", &self.token)
            .field("state", &self.state)
            .field("tier", &self.tier)
            .field("lazy", &self.lazy)
            .field("loaded", &self.module.is_some())
            .field("valid_data_stamp", &self.valid_data_stamp)
            .finish()
    }
}

/// Copy of a record taken under the table lock.
#[derive(Clone)]
pub struct PluginSnapshot {
    pub name: String,
    pub version: String,
    pub token: Token,
    pub state: PluginState,
    pub tier: LoadTier,
    pub lazy: bool,
    pub valid_data_stamp: u64,
    pub module: Option<Arc<dyn DirectoryPlugin>>,
    pub factory: Option<Arc<dyn PluginFactory>>,
}

impl PluginSnapshot {
    pub fn is_loaded(&self) -> bool {
        self.module.is_some()
    }
}

impl std::fmt::Debug for PluginSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSnapshot")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("token", &self.token)
            .field("state", &self.state)
            .field("tier", &self.tier)
            .field("loaded", &self.module.is_some())
            .finish()
    }
}

#[derive(Default)]
struct Records {
    entries: Vec<PluginRecord>,
    by_name: HashMap<String, usize>,
    by_token: HashMap<Token, usize>,
}

impl Records {
    fn get_mut(&mut self, name: &str) -> Result<&mut PluginRecord, DirError> {
        let index = *self
            .by_name
            .get(name)
            .ok_or_else(|| DirError::PluginNameNotFound {
                name: name.to_string(),
            })?;
        Ok(&mut self.entries[index])
    }
}

/// Insertion-ordered plugin records behind a single mutex.
#[derive(Default)]
pub struct PluginTable {
    inner: Mutex<Records>,
}

impl PluginTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, seeding its state from the persisted configuration.
    ///
    /// Names are unique; a second record with the same name is rejected.
    pub fn register(
        &self,
        mut record: PluginRecord,
        configured: ConfiguredState,
    ) -> Result<RecordId, DirError> {
        let mut inner = self.inner.lock();
        if inner.by_name.contains_key(&record.name) {
            return Err(DirError::PluginAlreadyLoaded { name: record.name });
        }
        record.state = PluginState::registered(configured);

        let index = inner.entries.len();
        info!(
            plugin = %record.name,
            version = %record.version,
            tier = %record.tier,
            state = %record.state,
            "plugin registered"
        );
        inner.by_name.insert(record.name.clone(), index);
        inner.by_token.insert(record.token, index);
        inner.entries.push(record);
        Ok(RecordId(index))
    }

    pub fn get(&self, name: &str) -> Option<PluginSnapshot> {
        let inner = self.inner.lock();
        inner
            .by_name
            .get(name)
            .map(|index| inner.entries[*index].snapshot())
    }

    pub fn get_by_token(&self, token: Token) -> Option<PluginSnapshot> {
        let inner = self.inner.lock();
        inner
            .by_token
            .get(&token)
            .map(|index| inner.entries[*index].snapshot())
    }

    pub fn get_by_id(&self, id: RecordId) -> Option<PluginSnapshot> {
        self.inner.lock().entries.get(id.0).map(PluginRecord::snapshot)
    }

    /// Returns true if `token` belongs to a registered record.
    pub fn contains_token(&self, token: Token) -> bool {
        self.inner.lock().by_token.contains_key(&token)
    }

    /// Every record in insertion order.
    pub fn snapshot(&self) -> Vec<PluginSnapshot> {
        self.inner
            .lock()
            .entries
            .iter()
            .map(PluginRecord::snapshot)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Number of records whose Active bit is set.
    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|record| record.state.is_active())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Attach a constructed module to a record that has none.
    ///
    /// Returns the module the record ends up holding, which is the existing
    /// one if another path already committed a module.
    pub fn commit_module(
        &self,
        name: &str,
        module: Arc<dyn DirectoryPlugin>,
    ) -> Result<Arc<dyn DirectoryPlugin>, DirError> {
        let mut inner = self.inner.lock();
        let record = inner.get_mut(name)?;
        match &record.module {
            Some(existing) => Ok(Arc::clone(existing)),
            None => {
                debug!(plugin = %name, "module handle committed");
                record.module = Some(Arc::clone(&module));
                Ok(module)
            }
        }
    }

    /// Overwrite a record's state.
    pub fn commit_state(&self, name: &str, state: PluginState) -> Result<(), DirError> {
        let mut inner = self.inner.lock();
        let record = inner.get_mut(name)?;
        debug!(plugin = %name, from = %record.state, to = %state, "state committed");
        record.state = state;
        Ok(())
    }

    /// Apply `update` to a record's state and return the new value.
    pub fn update_state(
        &self,
        name: &str,
        update: impl FnOnce(PluginState) -> PluginState,
    ) -> Result<PluginState, DirError> {
        let mut inner = self.inner.lock();
        let record = inner.get_mut(name)?;
        let next = update(record.state);
        if next != record.state {
            debug!(plugin = %name, from = %record.state, to = %next, "state updated");
        }
        record.state = next;
        Ok(next)
    }

    /// Signal that the plugin's underlying data changed.
    pub fn bump_data_stamp(&self, name: &str) -> Result<u64, DirError> {
        let mut inner = self.inner.lock();
        let record = inner.get_mut(name)?;
        record.valid_data_stamp += 1;
        Ok(record.valid_data_stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> PluginRecord {
        PluginRecord::new(name, "1.0.0", LoadTier::Static, None)
    }

    #[test]
    fn register_assigns_state_from_configuration() {
        let table = PluginTable::new();
        table.register(record("Local"), ConfiguredState::Active).unwrap();
        table.register(record("NIS"), ConfiguredState::Inactive).unwrap();

        assert_eq!(
            table.get("Local").unwrap().state,
            PluginState::UNINITIALIZED | PluginState::ACTIVE
        );
        assert_eq!(
            table.get("NIS").unwrap().state,
            PluginState::UNINITIALIZED | PluginState::INACTIVE
        );
        assert_eq!(table.count(), 2);
        assert_eq!(table.active_count(), 1);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let table = PluginTable::new();
        table.register(record("Cache"), ConfiguredState::Active).unwrap();
        let err = table
            .register(record("Cache"), ConfiguredState::Active)
            .unwrap_err();
        assert!(matches!(err, DirError::PluginAlreadyLoaded { name } if name == "Cache"));
        assert_eq!(table.count(), 1);
    }

    #[test]
    fn lookup_by_token_and_id() {
        let table = PluginTable::new();
        let rec = record("LDAPv3");
        let token = rec.token();
        let id = table.register(rec, ConfiguredState::Active).unwrap();

        assert_eq!(table.get_by_token(token).unwrap().name, "LDAPv3");
        assert_eq!(table.get_by_id(id).unwrap().token, token);
        assert!(table.contains_token(token));
        assert!(!table.contains_token(Token::nil()));
        assert!(table.get_by_token(Token::generate()).is_none());
    }

    #[test]
    fn snapshot_preserves_insertion_order() {
        let table = PluginTable::new();
        for name in ["Search", "Configure", "BSD", "Cache"] {
            table.register(record(name), ConfiguredState::Active).unwrap();
        }
        let names: Vec<String> = table.snapshot().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Search", "Configure", "BSD", "Cache"]);
    }

    #[test]
    fn active_count_follows_state_updates() {
        let table = PluginTable::new();
        table.register(record("A"), ConfiguredState::Active).unwrap();
        table.register(record("B"), ConfiguredState::Active).unwrap();
        assert_eq!(table.active_count(), 2);

        table
            .update_state("B", |s| s.with_activity(ConfiguredState::Inactive))
            .unwrap();
        assert_eq!(table.active_count(), 1);

        table.commit_state("A", PluginState::gave_up()).unwrap();
        assert_eq!(table.active_count(), 0);
        assert!(table.get("A").unwrap().state.has_failed());
    }

    #[test]
    fn data_stamp_increments() {
        let table = PluginTable::new();
        table.register(record("Local"), ConfiguredState::Active).unwrap();
        assert_eq!(table.bump_data_stamp("Local").unwrap(), 1);
        assert_eq!(table.bump_data_stamp("Local").unwrap(), 2);
        assert_eq!(table.get("Local").unwrap().valid_data_stamp, 2);
    }

    #[test]
    fn updates_on_unknown_name_report_not_found() {
        let table = PluginTable::new();
        assert!(matches!(
            table.bump_data_stamp("missing"),
            Err(DirError::PluginNameNotFound { .. })
        ));
        assert!(matches!(
            table.commit_state("missing", PluginState::gave_up()),
            Err(DirError::PluginNameNotFound { .. })
        ));
    }

    #[test]
    fn fresh_record_has_no_module() {
        let table = PluginTable::new();
        table.register(record("Local"), ConfiguredState::Active).unwrap();
        assert!(!table.get("Local").unwrap().is_loaded());
    }
}
