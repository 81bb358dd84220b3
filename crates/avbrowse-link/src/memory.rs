use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use bytes::Bytes;

use crate::traits::Datagram;

type Queue = Rc<RefCell<VecDeque<Bytes>>>;

/// One end of an in-process datagram pair.
///
/// Units sent on one end queue up on the other. Receiving from an empty queue
/// fails with [`io::ErrorKind::WouldBlock`] while the peer is alive and
/// yields an empty unit once it has been dropped.
#[derive(Debug)]
pub struct MemoryDatagram {
    inbox: Queue,
    outbox: Queue,
}

impl MemoryDatagram {
    /// Create two connected ends.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Queue::default();
        let b_to_a = Queue::default();
        (
            Self {
                inbox: Rc::clone(&b_to_a),
                outbox: Rc::clone(&a_to_b),
            },
            Self {
                inbox: a_to_b,
                outbox: b_to_a,
            },
        )
    }

    /// Units waiting to be received on this end.
    pub fn pending(&self) -> usize {
        self.inbox.borrow().len()
    }

    fn peer_alive(queue: &Queue) -> bool {
        Rc::strong_count(queue) > 1
    }
}

impl Datagram for MemoryDatagram {
    fn send_unit(&mut self, unit: &[u8]) -> io::Result<()> {
        if !Self::peer_alive(&self.outbox) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "memory datagram peer dropped",
            ));
        }
        self.outbox
            .borrow_mut()
            .push_back(Bytes::copy_from_slice(unit));
        Ok(())
    }

    fn recv_unit(&mut self, max_len: usize) -> io::Result<Bytes> {
        match self.inbox.borrow_mut().pop_front() {
            Some(mut unit) => {
                unit.truncate(max_len);
                Ok(unit)
            }
            None if Self::peer_alive(&self.inbox) => Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "no datagram queued",
            )),
            None => Ok(Bytes::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_cross_in_order() {
        let (mut a, mut b) = MemoryDatagram::pair();
        a.send_unit(b"one").unwrap();
        a.send_unit(b"two").unwrap();
        assert_eq!(b.pending(), 2);
        assert_eq!(b.recv_unit(16).unwrap().as_ref(), b"one");
        assert_eq!(b.recv_unit(16).unwrap().as_ref(), b"two");

        b.send_unit(b"back").unwrap();
        assert_eq!(a.recv_unit(16).unwrap().as_ref(), b"back");
    }

    #[test]
    fn oversized_unit_is_truncated() {
        let (mut a, mut b) = MemoryDatagram::pair();
        a.send_unit(b"abcdef").unwrap();
        assert_eq!(b.recv_unit(4).unwrap().as_ref(), b"abcd");
    }

    #[test]
    fn empty_queue_would_block() {
        let (_a, mut b) = MemoryDatagram::pair();
        let err = b.recv_unit(8).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn dropped_peer_reads_as_closed() {
        let (mut a, mut b) = MemoryDatagram::pair();
        a.send_unit(b"last").unwrap();
        drop(a);
        assert_eq!(b.recv_unit(8).unwrap().as_ref(), b"last");
        assert!(b.recv_unit(8).unwrap().is_empty());

        let err = b.send_unit(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
