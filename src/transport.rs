//! Thin transport layer over MPI point-to-point messaging. Everything
//! above this module talks in terms of `Message` values and ranks; this is
//! the only place that touches `mpi` crate types, grounded on this
//! codebase's other MPI-based examples' use of
//! `process_at_rank(..).send_with_tag`, `any_process().receive_vec`, and
//! non-blocking probes for dispatch loops.
//!
//! A `Transport` trait separates the real MPI backend from a single-process
//! loopback fake used in integration tests, since spawning real `mpirun`
//! subprocesses from `cargo test` is out of scope.

use std::collections::VecDeque;

use mpi::point_to_point as p2p;
use mpi::topology::{Communicator, Process, SystemCommunicator};
use mpi::traits::*;

use crate::error::Error;
use crate::message::Message;

/// A single process's view of the world: its own rank, the world size, and
/// the ability to send/receive tagged byte envelopes.
pub trait Transport {
    fn rank(&self) -> i32;
    fn size(&self) -> i32;

    /// Sends a message to `dest`, blocking until the local send buffer is
    /// handed off to the runtime.
    fn send(&mut self, dest: i32, msg: &Message);

    /// Non-blocking check for any message (of any tag) from any source.
    /// Returns the sender's rank without consuming the message if one is
    /// pending, so callers can decide whether to receive it now.
    fn probe(&mut self) -> Option<i32>;

    /// Blocking receive of the next message from any source, returning the
    /// sender's rank alongside the decoded message.
    fn recv(&mut self) -> Result<(i32, Message), Error>;
}

/// The production backend: a handle to the MPI world communicator.
pub struct MpiTransport {
    world: SystemCommunicator,
    rank: i32,
    size: i32,
}

impl MpiTransport {
    pub fn new(world: SystemCommunicator) -> Self {
        let rank = world.rank();
        let size = world.size();
        MpiTransport { world, rank, size }
    }

    fn process_at(&self, dest: i32) -> Process<'_, SystemCommunicator> {
        self.world.process_at_rank(dest)
    }
}

impl Transport for MpiTransport {
    fn rank(&self) -> i32 {
        self.rank
    }

    fn size(&self) -> i32 {
        self.size
    }

    fn send(&mut self, dest: i32, msg: &Message) {
        let bytes = msg.encode();
        self.process_at(dest).send_with_tag(&bytes[..], msg.tag());
    }

    fn probe(&mut self) -> Option<i32> {
        self.world
            .any_process()
            .immediate_probe()
            .map(|status| status.source_rank())
    }

    fn recv(&mut self) -> Result<(i32, Message), Error> {
        let (bytes, status): (Vec<u8>, p2p::Status) = self.world.any_process().receive_vec();
        let msg = Message::decode(&bytes)?;
        Ok((status.source_rank(), msg))
    }
}

/// A deterministic, single-process loopback transport for tests: `send`
/// enqueues onto a shared inbox instead of going through MPI, and `recv`
/// pops from it. Only meaningful with world size 1, matching the
/// integration-test strategy (no real `mpirun` is spawned).
#[derive(Default)]
pub struct LoopbackTransport {
    inbox: VecDeque<(i32, Message)>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        LoopbackTransport {
            inbox: VecDeque::new(),
        }
    }

    /// Test hook: injects a message as though it arrived from `source`.
    pub fn deliver(&mut self, source: i32, msg: Message) {
        self.inbox.push_back((source, msg));
    }
}

impl Transport for LoopbackTransport {
    fn rank(&self) -> i32 {
        0
    }

    fn size(&self) -> i32 {
        1
    }

    fn send(&mut self, dest: i32, msg: &Message) {
        // A single-process world only ever talks to itself.
        self.inbox.push_back((dest, msg.clone()));
    }

    fn probe(&mut self) -> Option<i32> {
        self.inbox.front().map(|(src, _)| *src)
    }

    fn recv(&mut self) -> Result<(i32, Message), Error> {
        self.inbox.pop_front().ok_or(Error::Protocol(
            "loopback transport recv with nothing queued".into(),
        ))
    }
}
