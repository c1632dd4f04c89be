//! Subscribe/notify plumbing shared by the query and dialog state holders.

use flume::{Receiver, Sender};

/// Fan-out list of subscribers; each gets its own unbounded channel.
#[derive(Debug)]
pub struct Subscribers<E> {
    senders: Vec<Sender<E>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            senders: Vec::new(),
        }
    }
}

impl<E: Clone> Subscribers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<E> {
        let (send, recv) = flume::unbounded();
        self.senders.push(send);
        recv
    }

    /// Deliver `event` to every live subscriber, forgetting dropped ones.
    pub fn notify(&mut self, event: E) {
        self.senders.retain(|s| s.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_receivers_are_pruned() {
        let mut subs = Subscribers::<u8>::new();
        let keep = subs.subscribe();
        let gone = subs.subscribe();
        drop(gone);
        subs.notify(7);
        assert_eq!(subs.len(), 1);
        assert_eq!(keep.try_recv(), Ok(7));
    }
}
