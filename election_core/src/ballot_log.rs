use std::fmt::{Debug, Formatter};
use std::sync::Arc;

// A persistent, append-only list.
//
// Every push creates a new head pointing to the previous one, so all the values derived
// from the same log share the prefix they have in common. Nodes are never mutated after
// creation.
struct Node<T> {
    value: T,
    prev: Option<Arc<Node<T>>>,
}

pub(crate) struct BallotLog<T> {
    head: Option<Arc<Node<T>>>,
    len: usize,
}

impl<T> BallotLog<T> {
    pub(crate) const fn new() -> BallotLog<T> {
        BallotLog { head: None, len: 0 }
    }

    /// Returns a new log with `value` appended. `self` is left untouched.
    pub(crate) fn push(&self, value: T) -> BallotLog<T> {
        BallotLog {
            head: Some(Arc::new(Node {
                value,
                prev: self.head.clone(),
            })),
            len: self.len + 1,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True if both logs are the very same storage, not merely equal.
    pub(crate) fn ptr_eq(&self, other: &BallotLog<T>) -> bool {
        match (&self.head, &other.head) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// All the values, in insertion order.
    pub(crate) fn to_vec(&self) -> Vec<&T> {
        let mut res: Vec<&T> = Vec::with_capacity(self.len);
        let mut cur = self.head.as_deref();
        while let Some(node) = cur {
            res.push(&node.value);
            cur = node.prev.as_deref();
        }
        res.reverse();
        res
    }
}

impl<T> Clone for BallotLog<T> {
    fn clone(&self) -> Self {
        BallotLog {
            head: self.head.clone(),
            len: self.len,
        }
    }
}

impl<T> Default for BallotLog<T> {
    fn default() -> Self {
        BallotLog::new()
    }
}

impl<T: PartialEq> PartialEq for BallotLog<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && (self.ptr_eq(other) || self.to_vec() == other.to_vec())
    }
}

impl<T: Eq> Eq for BallotLog<T> {}

impl<T: Debug> Debug for BallotLog<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.to_vec()).finish()
    }
}

// The default drop is recursive along the chain and overflows the stack on large logs.
impl<T> Drop for BallotLog<T> {
    fn drop(&mut self) {
        let mut cur = self.head.take();
        while let Some(node) = cur {
            // Exactly one of the concurrent droppers of a shared node gets it back.
            match Arc::into_inner(node) {
                Some(mut n) => cur = n.prev.take(),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_does_not_touch_the_original() {
        let empty: BallotLog<u32> = BallotLog::new();
        let one = empty.push(1);
        let two = one.push(2);
        assert!(empty.is_empty());
        assert_eq!(one.to_vec(), vec![&1]);
        assert_eq!(two.to_vec(), vec![&1, &2]);
        assert_eq!(two.len(), 2);
    }

    #[test]
    fn branches_share_the_prefix() {
        let base = BallotLog::new().push("a").push("b");
        let left = base.push("c");
        let right = base.push("c");
        assert_eq!(left, right);
        assert!(!left.ptr_eq(&right));
        assert!(base.ptr_eq(&base.clone()));
        assert_eq!(base.to_vec(), vec![&"a", &"b"]);
    }

    #[test]
    fn long_logs_drop_without_overflow() {
        let mut log: BallotLog<u64> = BallotLog::new();
        for i in 0..1_000_000 {
            log = log.push(i);
        }
        assert_eq!(log.len(), 1_000_000);
        drop(log);
    }

    #[test]
    fn shared_logs_drop_concurrently_without_overflow() {
        use std::sync::Barrier;
        use std::thread;

        for _ in 0..20 {
            let mut log: BallotLog<u64> = BallotLog::new();
            for i in 0..300_000 {
                log = log.push(i);
            }
            let barrier = Arc::new(Barrier::new(2));
            let handles: Vec<_> = [log.clone(), log]
                .into_iter()
                .map(|l| {
                    let barrier = barrier.clone();
                    thread::Builder::new()
                        .stack_size(256 * 1024)
                        .spawn(move || {
                            barrier.wait();
                            drop(l);
                        })
                        .unwrap()
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
        }
    }
}
