//! Per-process state: everything that changes while a process runs lives in
//! one `Context`, threaded through the dispatcher by `&mut` reference. There
//! is no shared/global mutable state and nothing is wrapped in a lock,
//! concurrency is entirely between processes, never within one.

use std::collections::VecDeque;

use crate::graph::Graph;
use crate::message::Color;
use crate::stack_elem::StackElem;

/// Local DFS stack plus every piece of coordination state a process needs
/// to answer messages and decide when it is done.
pub struct Context {
    pub rank: i32,
    pub world_size: i32,

    pub graph: Graph,

    /// DFS frontier at the front; donations are carved from the back.
    /// A `VecDeque` gives O(1) operations at both ends.
    pub stack: VecDeque<StackElem>,

    /// Best cut found so far, monotonically non-increasing in weight.
    pub best: StackElem,

    /// Rank 0 only: rotates over `0..world_size` to name donors for `DREQ`.
    pub donor_cursor: i32,

    pub mycolor: Color,
    pub token: Option<Color>,

    /// Cleared while a process is mid-hunt for a donor; while clear, every
    /// incoming `REQ` is answered with `DENY` regardless of stack contents.
    pub would_give: bool,

    /// Set once `best.weight == 1` is known locally; a process in idle-drain
    /// stops generating work and only services messages until `EOC`.
    pub idle_drain: bool,

    /// Set by rank 0 when it has declared the run over; by any other rank
    /// once it has received `EOC`. The dispatcher's main loop exits when
    /// this becomes true.
    pub done: bool,
}

impl Context {
    pub fn new(rank: i32, world_size: i32, graph: Graph) -> Self {
        let n = graph.n;
        Context {
            rank,
            world_size,
            graph,
            stack: VecDeque::from([StackElem::root(n)]),
            best: StackElem::worst(n),
            donor_cursor: 0,
            mycolor: Color::White,
            token: if rank == 0 { Some(Color::White) } else { None },
            would_give: true,
            idle_drain: false,
            done: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.rank == 0
    }

    /// Rank 0's donor rotation: hand out the current cursor, then advance
    /// it modulo the world size.
    pub fn next_donor(&mut self) -> i32 {
        let d = self.donor_cursor;
        self.donor_cursor = (self.donor_cursor + 1) % self.world_size;
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn graph(n: usize) -> Graph {
        let input = format!("{n}\n") + &"0 ".repeat(n * n);
        let mut rng = StdRng::seed_from_u64(1);
        Graph::load(input.as_bytes(), &mut rng).unwrap()
    }

    #[test]
    fn new_context_has_single_root_stack_element() {
        let ctx = Context::new(0, 3, graph(4));
        assert_eq!(ctx.stack.len(), 1);
        assert_eq!(ctx.stack[0].next, 1);
        assert_eq!(ctx.best.weight, i32::MAX);
    }

    #[test]
    fn only_rank_zero_starts_holding_a_token() {
        let root = Context::new(0, 3, graph(4));
        let other = Context::new(1, 3, graph(4));
        assert_eq!(root.token, Some(Color::White));
        assert_eq!(other.token, None);
    }

    #[test]
    fn donor_rotation_wraps_modulo_world_size() {
        let mut ctx = Context::new(0, 3, graph(4));
        assert_eq!(ctx.next_donor(), 0);
        assert_eq!(ctx.next_donor(), 1);
        assert_eq!(ctx.next_donor(), 2);
        assert_eq!(ctx.next_donor(), 0);
    }
}
