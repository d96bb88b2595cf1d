use crate::types::Dataset;
use parking_lot::Mutex;

/// Holder of the current working datasets.
///
/// Implementations must be safe to share across request threads. Callers
/// cluster a [`snapshot`](DatasetStore::snapshot), never the stored data
/// itself, so the lock is only held while copying or swapping.
pub trait DatasetStore: Send + Sync {
    /// Copy of the current datasets.
    fn snapshot(&self) -> Vec<Dataset>;

    /// Atomically swap in a new set of datasets.
    fn replace(&self, datasets: Vec<Dataset>);
}

/// Process-memory store behind a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    datasets: Mutex<Vec<Dataset>>,
}

impl InMemoryStore {
    /// Create a store holding `datasets`
    pub fn new(datasets: Vec<Dataset>) -> Self {
        Self {
            datasets: Mutex::new(datasets),
        }
    }

    /// Number of datasets currently held
    pub fn len(&self) -> usize {
        self.datasets.lock().len()
    }

    /// Whether the store holds no datasets
    pub fn is_empty(&self) -> bool {
        self.datasets.lock().is_empty()
    }
}

impl DatasetStore for InMemoryStore {
    fn snapshot(&self) -> Vec<Dataset> {
        self.datasets.lock().clone()
    }

    fn replace(&self, datasets: Vec<Dataset>) {
        *self.datasets.lock() = datasets;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;
    use std::sync::Arc;
    use std::thread;

    fn fixture(value: f64) -> Vec<Dataset> {
        vec![Dataset::from_points(&[Point::new(value, value)]); 3]
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = InMemoryStore::new(fixture(1.0));

        let before = store.snapshot();
        store.replace(fixture(2.0));

        assert_eq!(before[0].point(0), Point::new(1.0, 1.0));
        assert_eq!(store.snapshot()[0].point(0), Point::new(2.0, 2.0));
    }

    #[test]
    fn test_default_store_is_empty() {
        let store = InMemoryStore::default();
        assert!(store.is_empty());
        store.replace(fixture(0.0));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_concurrent_replace_never_tears() {
        let store = Arc::new(InMemoryStore::new(fixture(0.0)));

        let writers: Vec<_> = (1..=4)
            .map(|i| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.replace(fixture(i as f64));
                    }
                })
            })
            .collect();

        for _ in 0..100 {
            let snapshot = store.snapshot();
            let first = snapshot[0].point(0);
            assert!(snapshot.iter().all(|d| d.point(0) == first));
        }

        for writer in writers {
            writer.join().unwrap();
        }
    }
}
