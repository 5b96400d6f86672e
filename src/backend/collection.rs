//! Thread-safe point collection shared by the ingestion server and readers
//!
//! [`SharedCollection`] is a small monitor: a mutex around the point vector
//! and the `closed` flag, plus a condition variable that is notified on every
//! append and on close. Each operation holds the lock only for its own
//! duration, so readers taking snapshots never stall the writer for long.

use crate::types::Point;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Inner {
    points: Vec<Point>,
    closed: bool,
}

/// Append-only point sequence with a one-way "stream closed" flag.
///
/// Cheap to clone; all clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct SharedCollection {
    state: Arc<(Mutex<Inner>, Condvar)>,
}

impl SharedCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an already closed collection, e.g. from a result file.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            state: Arc::new((
                Mutex::new(Inner {
                    points,
                    closed: true,
                }),
                Condvar::new(),
            )),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.state.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a point. Returns `false` and drops the point if the collection
    /// is already closed.
    pub fn append(&self, point: Point) -> bool {
        let mut inner = self.lock();
        if inner.closed {
            tracing::warn!("Dropping point {} appended after stream close", point);
            return false;
        }
        inner.points.push(point);
        drop(inner);
        self.state.1.notify_all();
        true
    }

    /// Point-in-time copy of all points appended so far, in append order
    pub fn snapshot(&self) -> Vec<Point> {
        self.lock().points.clone()
    }

    /// Copy of the points from index `from` onwards. Lets incremental readers
    /// avoid copying what they already have.
    pub fn snapshot_from(&self, from: usize) -> Vec<Point> {
        let inner = self.lock();
        inner.points.get(from..).map(<[Point]>::to_vec).unwrap_or_default()
    }

    /// Close the collection. Later appends are rejected. Idempotent.
    pub fn mark_closed(&self) {
        let mut inner = self.lock();
        if !inner.closed {
            inner.closed = true;
            tracing::debug!("Point collection closed with {} points", inner.points.len());
        }
        drop(inner);
        self.state.1.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block until more than `seen` points exist, the collection is closed,
    /// or `timeout` elapses. Returns the length at wake-up.
    pub fn wait_for_growth(&self, seen: usize, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        while inner.points.len() <= seen && !inner.closed {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            inner = self
                .state
                .1
                .wait_timeout(inner, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        inner.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_append_and_snapshot_order() {
        let collection = SharedCollection::new();
        assert!(collection.is_empty());

        for i in 0..10 {
            assert!(collection.append(Point::new(i as f64, (i * i) as f64)));
        }
        collection.mark_closed();

        let snapshot = collection.snapshot();
        assert_eq!(snapshot.len(), 10);
        for (i, p) in snapshot.iter().enumerate() {
            assert_eq!(*p, Point::new(i as f64, (i * i) as f64));
        }
    }

    #[test]
    fn test_append_after_close_rejected() {
        let collection = SharedCollection::new();
        collection.append(Point::new(1.0, 1.0));
        collection.mark_closed();
        collection.mark_closed();

        assert!(collection.is_closed());
        assert!(!collection.append(Point::new(2.0, 2.0)));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let collection = SharedCollection::new();
        collection.append(Point::new(1.0, 2.0));
        let snapshot = collection.snapshot();
        collection.append(Point::new(3.0, 4.0));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(collection.snapshot_from(1), vec![Point::new(3.0, 4.0)]);
        assert!(collection.snapshot_from(5).is_empty());
    }

    #[test]
    fn test_from_points_is_closed() {
        let collection = SharedCollection::from_points(vec![Point::new(1.0, 1.0)]);
        assert!(collection.is_closed());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_concurrent_snapshots_see_whole_points_in_order() {
        const N: usize = 5_000;
        let collection = SharedCollection::new();

        let writer = {
            let collection = collection.clone();
            thread::spawn(move || {
                for i in 0..N {
                    // Both coordinates derive from the index, so a torn point
                    // would break x == -y
                    collection.append(Point::new(i as f64, -(i as f64)));
                }
                collection.mark_closed();
            })
        };

        let mut last_len = 0;
        loop {
            let closed = collection.is_closed();
            let snapshot = collection.snapshot();
            assert!(snapshot.len() >= last_len, "length must never shrink");
            for (i, p) in snapshot.iter().enumerate() {
                assert_eq!(p.x, i as f64);
                assert_eq!(p.y, -p.x);
            }
            last_len = snapshot.len();
            if closed {
                break;
            }
        }

        writer.join().unwrap();
        assert_eq!(collection.len(), N);
    }

    #[test]
    fn test_wait_for_growth() {
        let collection = SharedCollection::new();

        // Times out without growth
        assert_eq!(collection.wait_for_growth(0, Duration::from_millis(10)), 0);

        let writer = collection.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            writer.append(Point::new(1.0, 1.0));
        });
        assert_eq!(collection.wait_for_growth(0, Duration::from_secs(5)), 1);
        handle.join().unwrap();

        // Close wakes waiters even without growth
        let closer = collection.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            closer.mark_closed();
        });
        assert_eq!(collection.wait_for_growth(1, Duration::from_secs(5)), 1);
        assert!(collection.is_closed());
        handle.join().unwrap();
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_snapshot_after_close_matches_appends(
            coords in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 0..200),
            extra in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 0..20)
        ) {
            let collection = SharedCollection::new();
            for &(x, y) in &coords {
                prop_assert!(collection.append(Point::new(x, y)));
            }
            collection.mark_closed();
            for &(x, y) in &extra {
                prop_assert!(!collection.append(Point::new(x, y)));
            }

            let expected: Vec<Point> = coords.iter().map(|&c| Point::from(c)).collect();
            prop_assert_eq!(collection.snapshot(), expected);
        }
    }
}
