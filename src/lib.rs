//! Distributed branch-and-bound search for the minimum-weight balanced
//! graph bipartition, coordinated over MPI. The binary entry point lives
//! in `main.rs`; this crate root only wires the modules together so the
//! dispatcher and its collaborators can be exercised from integration
//! tests without going through MPI at all.

pub mod bitset;
pub mod context;
pub mod dfs;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod message;
pub mod stack_elem;
pub mod termination;
pub mod transport;
pub mod worksteal;

pub use context::Context;
pub use error::Error;
pub use graph::Graph;
