//! Per-file fetch lock table (§4.3): a process-global, case-insensitive
//! path-keyed table of reference-counted entries, each guarding exactly
//! one concurrent fetch per path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// A single-permit signaling primitive: starts signaled (one permit
/// available). `try_acquire` consumes the permit if present; `wait`
/// blocks until a permit becomes available without consuming it;
/// `signal` restores the permit.
struct Permit {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl Permit {
    fn new_signaled() -> Self {
        Permit {
            signaled: Mutex::new(true),
            condvar: Condvar::new(),
        }
    }

    fn try_acquire(&self) -> bool {
        let mut signaled = self.signaled.lock().unwrap();
        if *signaled {
            *signaled = false;
            true
        } else {
            false
        }
    }

    /// Blocks, without a timeout, until the permit is signaled. Does not
    /// consume the permit (§4.1.3 step 4's non-fetcher path observes the
    /// signal but never re-takes it).
    fn wait_for_signal(&self) {
        let guard = self.signaled.lock().unwrap();
        let _unused = self
            .condvar
            .wait_while(guard, |signaled| !*signaled)
            .unwrap();
    }

    fn signal(&self) {
        let mut signaled = self.signaled.lock().unwrap();
        *signaled = true;
        self.condvar.notify_one();
    }
}

struct FetchLockEntry {
    permit: Permit,
    refcount: AtomicI32,
}

fn normalize(path: &str) -> String {
    path.to_lowercase()
}

#[derive(Default)]
pub struct FetchLockTable {
    entries: Mutex<HashMap<String, Arc<FetchLockEntry>>>,
}

/// A handle held by a caller between [`FetchLockTable::get`] and
/// [`FetchLockTable::release`]. Callers must release exactly once
/// regardless of whether they ended up as the fetcher or a waiter
/// (§4.3 invariants).
pub struct FetchLockHandle {
    path: String,
    entry: Arc<FetchLockEntry>,
}

impl FetchLockTable {
    pub fn new() -> Self {
        FetchLockTable {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, path: &str) -> FetchLockHandle {
        let key = normalize(path);
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(key.clone())
            .and_modify(|e| {
                e.refcount.fetch_add(1, Ordering::SeqCst);
            })
            .or_insert_with(|| {
                Arc::new(FetchLockEntry {
                    permit: Permit::new_signaled(),
                    refcount: AtomicI32::new(1),
                })
            });
        FetchLockHandle {
            path: key,
            entry: entry.clone(),
        }
    }

    /// Non-blocking try-acquire of the entry's permit (§4.1.3 step 4).
    pub fn try_acquire(&self, handle: &FetchLockHandle) -> bool {
        handle.entry.permit.try_acquire()
    }

    /// Blocks until the entry's permit is signaled by a releasing
    /// fetcher, without consuming it.
    pub fn wait_for_release(&self, handle: &FetchLockHandle) {
        handle.entry.permit.wait_for_signal();
    }

    pub fn release(&self, handle: FetchLockHandle) {
        let mut entries = self.entries.lock().unwrap();
        let remaining = handle.entry.refcount.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining <= 0 {
            entries.remove(&handle.path);
        } else {
            handle.entry.permit.signal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn first_acquirer_becomes_fetcher() {
        let table = FetchLockTable::new();
        let handle = table.get("C:\\data\\file.bin");
        assert!(table.try_acquire(&handle));
        table.release(handle);
    }

    #[test]
    fn second_acquirer_blocks_until_release() {
        let table = Arc::new(FetchLockTable::new());
        let fetcher_handle = table.get("C:\\data\\file.bin");
        assert!(table.try_acquire(&fetcher_handle));

        let table2 = table.clone();
        let waiter = thread::spawn(move || {
            let handle = table2.get("c:\\data\\file.bin");
            assert!(!table2.try_acquire(&handle));
            table2.wait_for_release(&handle);
            table2.release(handle);
        });

        thread::sleep(Duration::from_millis(50));
        table.release(fetcher_handle);
        waiter.join().unwrap();
    }

    #[test]
    fn path_lookup_is_case_insensitive() {
        let table = FetchLockTable::new();
        let a = table.get("C:\\Data\\File.bin");
        let b = table.get("c:\\data\\file.bin");
        assert!(table.try_acquire(&a));
        assert!(!table.try_acquire(&b));
        table.release(a);
        table.release(b);
    }

    #[test]
    fn entry_is_reusable_after_full_release() {
        let table = FetchLockTable::new();
        let first = table.get("C:\\data\\file.bin");
        assert!(table.try_acquire(&first));
        table.release(first);

        let second = table.get("C:\\data\\file.bin");
        assert!(table.try_acquire(&second));
        table.release(second);
    }
}
