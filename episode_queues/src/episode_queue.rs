use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue {name} is full ({max_size} items)")]
    Full { name: &'static str, max_size: usize },
}

/// A bounded FIFO shared between the stages of one iteration.
///
/// Any number of threads may push concurrently; each push holds the lock only
/// for the append itself. Unlike a replay memory, a full queue never evicts:
/// pushing into it is an error, since every queue is drained each iteration.
pub struct EpisodeQueue<T> {
    name: &'static str,
    items: Mutex<VecDeque<T>>,
    max_size: usize,
}

impl<T> EpisodeQueue<T> {
    pub fn with_max_size(name: &'static str, max_size: usize) -> Self {
        Self {
            name,
            items: Mutex::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }
    pub fn push(&self, item: T) -> Result<(), QueueError> {
        let mut items = self.items.lock();
        if items.len() >= self.max_size {
            return Err(QueueError::Full {
                name: self.name,
                max_size: self.max_size,
            });
        }
        items.push_back(item);
        Ok(())
    }
    pub fn pop(&self) -> Option<T> {
        self.items.lock().pop_front()
    }
    /// Removes every item, oldest first.
    pub fn drain_all(&self) -> Vec<T> {
        self.items.lock().drain(..).collect()
    }
    /// Runs `f` on the current contents without removing them.
    pub fn with_contents<R>(&self, f: impl FnOnce(&VecDeque<T>) -> R) -> R {
        let items = self.items.lock();
        f(&*items)
    }
    pub fn clear(&self) {
        self.items.lock().clear();
    }
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_beyond_max_size_fails_without_evicting() {
        let queue = EpisodeQueue::with_max_size("policy", 2);
        queue.push(1).unwrap();
        queue.push(2).unwrap();
        assert_eq!(
            queue.push(3),
            Err(QueueError::Full {
                name: "policy",
                max_size: 2
            })
        );
        assert_eq!(queue.drain_all(), vec![1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn pop_is_fifo() {
        let queue = EpisodeQueue::with_max_size("dynamics", 4);
        for i in 0..3 {
            queue.push(i).unwrap();
        }
        assert_eq!(queue.pop(), Some(0));
        assert_eq!(queue.with_contents(|items| items.len()), 2);
        queue.clear();
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn concurrent_pushes_all_land() {
        let queue = EpisodeQueue::with_max_size("anticipator", 64);
        std::thread::scope(|scope| {
            for worker in 0..8 {
                let queue = &queue;
                scope.spawn(move || {
                    for i in 0..8 {
                        queue.push(worker * 8 + i).unwrap();
                    }
                });
            }
        });
        let mut items = queue.drain_all();
        items.sort_unstable();
        assert_eq!(items, (0..64).collect::<Vec<_>>());
    }
}
