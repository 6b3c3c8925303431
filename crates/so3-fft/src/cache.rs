//! Process-wide LRU cache of precomputed transform tables.
//!
//! Wigner-d and DFT tables depend only on bandwidths (and, for local
//! tables, the kernel grid), and every forward pass of every layer needs
//! them. They are built once on the CPU in f64 and shared as `Arc<Table>`.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

/// Default number of resident tables.
pub const DEFAULT_CAPACITY: usize = 32;

static GLOBAL_CACHE: Lazy<Mutex<TableCache>> =
    Lazy::new(|| Mutex::new(TableCache::new(DEFAULT_CAPACITY)));

/// Identifies a precomputed table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableKey {
    /// Quadrature-weighted `d^l(β_j)`, input bandwidth `b_in`, degrees `< nl`.
    ForwardWigner { b_in: usize, nl: usize },
    /// `(2l+1) d^l(β_j)` for synthesis at bandwidth `b`.
    InverseWigner { b: usize },
    /// `exp(+imα_j)`, `2b` samples, orders `|m| < nl`.
    ForwardDft { b: usize, nl: usize },
    /// `exp(-imα_j)`, orders `|m| < b`, `2b` samples.
    InverseDft { b: usize },
    /// `2b · conj(D^l(g))` on a kernel grid.
    LocalFt { b: usize, grid: Vec<[u64; 3]> },
    /// Normalized SOFT quadrature weights.
    Quadrature { b: usize },
}

/// A dense row-major real or complex matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub rows: usize,
    pub cols: usize,
    pub re: Vec<f64>,
    pub im: Option<Vec<f64>>,
}

impl Table {
    pub fn real(rows: usize, cols: usize, re: Vec<f64>) -> Self {
        assert_eq!(re.len(), rows * cols, "table data does not match its shape");
        Self {
            rows,
            cols,
            re,
            im: None,
        }
    }

    pub fn complex(rows: usize, cols: usize, re: Vec<f64>, im: Vec<f64>) -> Self {
        assert_eq!(re.len(), rows * cols, "table data does not match its shape");
        assert_eq!(im.len(), rows * cols, "table data does not match its shape");
        Self {
            rows,
            cols,
            re,
            im: Some(im),
        }
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }
}

/// LRU map from [`TableKey`] to shared tables.
#[derive(Debug)]
pub struct TableCache {
    capacity: usize,
    entries: IndexMap<TableKey, Arc<Table>>,
}

impl TableCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: IndexMap::new(),
        }
    }

    /// Look up a table, marking it most recently used.
    pub fn get(&mut self, key: &TableKey) -> Option<Arc<Table>> {
        let idx = self.entries.get_index_of(key)?;
        let last = self.entries.len() - 1;
        self.entries.move_index(idx, last);
        self.entries.get_index(last).map(|(_, table)| Arc::clone(table))
    }

    /// Insert a table, evicting least recently used entries over capacity.
    pub fn insert(&mut self, key: TableKey, table: Arc<Table>) {
        self.entries.shift_remove(&key);
        self.entries.insert(key, table);
        self.evict();
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.evict();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &TableKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            if let Some((key, _)) = self.entries.shift_remove_index(0) {
                log::debug!("Evicted transform table {:?}", key);
            }
        }
    }
}

/// Fetch a table from the global cache, building it on a miss.
///
/// The lock is released while `build` runs, so two threads missing on the
/// same key may both build it; the second insert wins.
pub fn get_or_build(key: TableKey, build: impl FnOnce() -> Table) -> Arc<Table> {
    if let Some(table) = lock().get(&key) {
        return table;
    }

    log::debug!("Building transform table {:?}", key);
    let table = Arc::new(build());
    lock().insert(key, Arc::clone(&table));
    table
}

/// Resize the global cache (e.g. from `RuntimeConfig::table_cache_capacity`).
pub fn set_capacity(capacity: usize) {
    lock().set_capacity(capacity);
}

pub fn capacity() -> usize {
    lock().capacity()
}

pub fn len() -> usize {
    lock().len()
}

pub fn clear() {
    lock().clear();
}

fn lock() -> std::sync::MutexGuard<'static, TableCache> {
    // A panic while holding the lock cannot leave the map half-updated
    GLOBAL_CACHE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
