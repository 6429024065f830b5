//! Round-robin host selection.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

use crate::http::request::RequestId;

/// A host slot and the request id issued with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub host_index: usize,
    pub request_id: RequestId,
}

/// Round-robin cursor over a fixed number of upstream hosts.
///
/// The cursor is used, then advanced: the first request goes to host 0.
/// Advances are serialized by a lock, so serial callers see the exact cycle
/// `0, 1, .., n-1, 0, ..`. Concurrent callers each receive a distinct slot of
/// that cycle, but which caller gets which slot depends on scheduling.
#[derive(Debug)]
pub struct HostSelector {
    cursor: Mutex<usize>,
    host_count: NonZeroUsize,
}

impl HostSelector {
    pub fn new(host_count: NonZeroUsize) -> Self {
        Self {
            cursor: Mutex::new(0),
            host_count,
        }
    }

    pub fn host_count(&self) -> usize {
        self.host_count.get()
    }

    /// Return the current host index and advance the cursor.
    pub fn next_host_index(&self) -> usize {
        let mut cursor = self.lock();
        self.advance(&mut cursor)
    }

    /// Pick the host and issue a request id under one lock.
    pub fn assign(&self) -> Assignment {
        let mut cursor = self.lock();
        let host_index = self.advance(&mut cursor);
        Assignment {
            host_index,
            request_id: RequestId::new(),
        }
    }

    fn advance(&self, cursor: &mut usize) -> usize {
        let index = *cursor;
        *cursor = (index + 1) % self.host_count.get();
        index
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        // the cursor is always a valid index, even if a holder panicked
        self.cursor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn selector(hosts: usize) -> HostSelector {
        HostSelector::new(NonZeroUsize::new(hosts).unwrap())
    }

    #[test]
    fn test_round_robin() {
        let rr = selector(3);
        let picks: Vec<usize> = (0..7).map(|_| rr.next_host_index()).collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_single_host() {
        let rr = selector(1);
        for _ in 0..5 {
            assert_eq!(rr.next_host_index(), 0);
        }
    }

    #[test]
    fn test_assign_continues_cycle() {
        let rr = selector(2);
        assert_eq!(rr.next_host_index(), 0);
        let a = rr.assign();
        let b = rr.assign();
        assert_eq!(a.host_index, 1);
        assert_eq!(b.host_index, 0);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_concurrent_assignment_is_even() {
        let hosts = 4;
        let per_thread = 250;
        let threads = 8;
        let rr = Arc::new(selector(hosts));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let rr = rr.clone();
                std::thread::spawn(move || (0..per_thread).map(|_| rr.assign()).collect::<Vec<_>>())
            })
            .collect();

        let mut counts = vec![0usize; hosts];
        let mut ids = HashSet::new();
        for handle in handles {
            for assignment in handle.join().unwrap() {
                assert!(assignment.host_index < hosts);
                counts[assignment.host_index] += 1;
                assert!(ids.insert(assignment.request_id));
            }
        }

        // every slot of the cycle is handed out exactly once
        let expected = threads * per_thread / hosts;
        assert_eq!(counts, vec![expected; hosts]);
    }
}
