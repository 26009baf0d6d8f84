use log::{debug, info};

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Table;

/// The identity of a source: where it was read from, and a digest of its content.
///
/// Two reads of the same file with the same content have the same key.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct SourceKey {
    pub path: String,
    pub digest: String,
}

impl SourceKey {
    pub fn new(path: &str, content: &[u8]) -> SourceKey {
        SourceKey {
            path: path.to_string(),
            digest: sha256::digest(content),
        }
    }
}

/// Holds the canonical tables that have already been computed.
///
/// The tables are handed out behind an `Arc` and are never modified: a table
/// is either reused as a whole or recomputed from scratch. At most one table
/// is kept per path; loading a new version of a file replaces the old one.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<SourceKey, Arc<Table>>,
}

impl TableCache {
    pub fn new() -> TableCache {
        TableCache {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &SourceKey) -> Option<Arc<Table>> {
        self.entries.get(key).cloned()
    }

    /// Returns the cached table for this key, or runs the loader and caches its result.
    ///
    /// Nothing is cached when the loader fails.
    pub fn get_or_load<E, F>(&mut self, key: SourceKey, load: F) -> Result<Arc<Table>, E>
    where
        F: FnOnce() -> Result<Table, E>,
    {
        if let Some(t) = self.entries.get(&key) {
            debug!("get_or_load: reusing table for {:?}", key.path);
            return Ok(t.clone());
        }
        self.reload(key, load)
    }

    /// Runs the loader and replaces whatever was cached for this path.
    pub fn reload<E, F>(&mut self, key: SourceKey, load: F) -> Result<Arc<Table>, E>
    where
        F: FnOnce() -> Result<Table, E>,
    {
        info!("reload: computing table for {:?} ({})", key.path, key.digest);
        let table = Arc::new(load()?);
        self.invalidate(&key.path);
        self.entries.insert(key, table.clone());
        Ok(table)
    }

    /// Forgets the tables read from this path. Returns how many were dropped.
    pub fn invalidate(&mut self, path: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.path != path);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::PipelineError;

    fn table(name: &str) -> Table {
        let mut b = Builder::new(&["Nome"]).unwrap();
        b.add_row(&[name]).unwrap();
        b.build()
    }

    #[test]
    fn same_content_same_key() {
        let a = SourceKey::new("dados.csv", b"a,b\n1,2\n");
        let b = SourceKey::new("dados.csv", b"a,b\n1,2\n");
        let c = SourceKey::new("dados.csv", b"a,b\n1,3\n");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.digest.len(), 64);
    }

    #[test]
    fn loads_once() {
        let mut cache = TableCache::new();
        let key = SourceKey::new("dados.csv", b"x");
        let mut calls = 0;
        let t1 = cache
            .get_or_load(key.clone(), || -> Result<Table, PipelineError> {
                calls += 1;
                Ok(table("Ana"))
            })
            .unwrap();
        let t2 = cache
            .get_or_load(key, || -> Result<Table, PipelineError> {
                calls += 1;
                Ok(table("Bia"))
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert!(Arc::ptr_eq(&t1, &t2));
    }

    #[test]
    fn new_content_replaces_old_entry() {
        let mut cache = TableCache::new();
        let old = SourceKey::new("dados.csv", b"v1");
        let new = SourceKey::new("dados.csv", b"v2");
        cache
            .get_or_load(old.clone(), || Ok::<Table, PipelineError>(table("Ana")))
            .unwrap();
        let t = cache
            .get_or_load(new.clone(), || Ok::<Table, PipelineError>(table("Bia")))
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&old).is_none());
        assert_eq!(cache.get(&new), Some(t));
    }

    #[test]
    fn failed_load_is_not_cached() {
        let mut cache = TableCache::new();
        let key = SourceKey::new("dados.csv", b"x");
        let res = cache.get_or_load(key.clone(), || Err(PipelineError::EmptyHeader));
        assert_eq!(res, Err(PipelineError::EmptyHeader));
        assert!(cache.is_empty());
    }

    #[test]
    fn reload_and_invalidate() {
        let mut cache = TableCache::new();
        let key = SourceKey::new("dados.csv", b"x");
        let t1 = cache
            .get_or_load(key.clone(), || Ok::<Table, PipelineError>(table("Ana")))
            .unwrap();
        let t2 = cache
            .reload(key.clone(), || Ok::<Table, PipelineError>(table("Ana")))
            .unwrap();
        assert!(!Arc::ptr_eq(&t1, &t2));
        assert_eq!(t1, t2);
        assert_eq!(cache.invalidate("other.csv"), 0);
        assert_eq!(cache.invalidate("dados.csv"), 1);
        assert!(cache.get(&key).is_none());
    }
}
