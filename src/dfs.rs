//! Local DFS engine: expansion of the search tree one vertex at a time,
//! incremental cut-weight refresh, and best-bound pruning/propagation.
//! Grounded on the node-processing step of this codebase's branch-and-bound
//! solvers, adapted from a shared best-bound read under a lock to one
//! diffused by message passing.

use log::{debug, info};

use crate::context::Context;
use crate::message::Message;
use crate::stack_elem::StackElem;
use crate::transport::Transport;

/// Expands the front element of the stack one step: flips the next
/// undecided vertex into Y, pushes the child as the new frontier, and
/// advances the parent's cursor so its next expansion flips the vertex
/// after that. Returns `true` if a child was pushed, `false` if the front
/// element has no more undecided vertices (caller should pop it).
pub fn expand(ctx: &mut Context) -> bool {
    let n = ctx.graph.n;
    let has_more = {
        let front = ctx.stack.front_mut().expect("expand called on empty stack");
        front.next < n as u32
    };
    if !has_more {
        return false;
    }

    let mut child = ctx.stack.front().unwrap().clone();
    let decided = child.next as usize;
    child.sigma.set(decided, true);
    child.next += 1;
    child.fresh = false;

    let front = ctx.stack.front_mut().unwrap();
    front.next += 1;

    ctx.stack.push_front(child);
    true
}

/// Recomputes the cut weight of the front stack element incrementally from
/// its parent's weight, given the single vertex that just moved from X to
/// Y. Panics (via debug assertion) if called on an already-fresh element,
/// double refresh is a hard invariant violation.
pub fn refresh(ctx: &mut Context) {
    let n = ctx.graph.n;
    let front = ctx.stack.front_mut().expect("refresh called on empty stack");
    debug_assert!(!front.fresh, "refresh called twice on the same element");

    let moved = (front.next - 1) as usize; // 0-based index of vertex u
    let u = moved + 1; // 1-based vertex number
    for idx in 0..n {
        if idx == moved {
            continue;
        }
        let i = idx + 1;
        if !ctx.graph.has_edge(u, i) {
            continue;
        }
        let w = ctx.graph.weight(u, i);
        if front.sigma.get(idx) {
            front.weight -= w;
        } else {
            front.weight += w;
        }
    }
    front.fresh = true;
}

/// Runs pruning/best-update after a refresh. Returns `true` if the
/// refreshed element is a weight-1 leaf, signaling the caller to trigger
/// end-of-computation (at rank 0) or enter idle-drain (elsewhere).
///
/// A cut of weight exactly 0 (both endpoints of every cross edge land on
/// the same side) still counts as an improvement here: only the shortcut
/// below is pinned to `weight == 1`, so a 0-weight leaf is recorded and
/// diffused like any other improving cut, just never triggers the early
/// exit. A disconnected instance can have a true optimum of 0, and the
/// final answer must report it even though the shortcut itself never
/// fires below weight 1.
pub fn prune_and_update_best<T: Transport>(ctx: &mut Context, transport: &mut T) -> bool {
    let weight = ctx.stack.front().unwrap().weight;
    if weight < ctx.best.weight {
        let candidate = ctx.stack.front().unwrap().clone();
        ctx.best = candidate.clone();
        info!("new best weight {}", weight);

        if !ctx.is_root() {
            transport.send(0, &Message::Best(candidate));
        }
        for peer in 0..ctx.world_size {
            if peer != ctx.rank {
                transport.send(peer, &Message::BWeight(weight));
            }
        }

        if weight == 1 {
            if ctx.is_root() {
                debug!("weight-1 leaf found locally, ending computation");
            } else {
                ctx.idle_drain = true;
            }
            return true;
        }
    }
    weight == 1
}

/// Bound-only update on receipt of `BWEIGHT`: tightens `best.weight`
/// but leaves `best.sigma` stale, since only rank 0's own replica of the
/// element is authoritative for the final answer. A peer's bound can reach
/// 1 before this process ever refreshes a weight-1 leaf of its own, so this
/// also arms idle-drain on the same terms as a local discovery would.
pub fn apply_bound(ctx: &mut Context, candidate_weight: i32) {
    if candidate_weight < ctx.best.weight {
        ctx.best.weight = candidate_weight;
        if candidate_weight == 1 && !ctx.is_root() {
            ctx.idle_drain = true;
        }
    }
}

/// Full-element update on receipt of `BEST` at rank 0.
pub fn apply_best(ctx: &mut Context, candidate: StackElem) -> bool {
    debug_assert!(ctx.is_root(), "BEST must only be handled at rank 0");
    if candidate.weight < ctx.best.weight {
        let weight = candidate.weight;
        ctx.best = candidate;
        return weight == 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::transport::LoopbackTransport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn triangle() -> Graph {
        let input = "3\n0 1 1\n1 0 1\n1 1 0\n";
        let mut rng = StdRng::seed_from_u64(7);
        Graph::load(input.as_bytes(), &mut rng).unwrap()
    }

    #[test]
    fn expand_advances_parent_cursor_and_pushes_child_to_front() {
        let mut ctx = Context::new(0, 1, triangle());
        let before_next = ctx.stack.front().unwrap().next;
        assert!(expand(&mut ctx));
        assert_eq!(ctx.stack.len(), 2);
        assert_eq!(ctx.stack[1].next, before_next + 1); // parent advanced
        assert!(ctx.stack[0].sigma.get(before_next as usize - 1)); // child flipped
        assert!(!ctx.stack[0].fresh);
    }

    #[test]
    fn expand_returns_false_when_no_more_vertices() {
        let mut ctx = Context::new(0, 1, triangle());
        ctx.stack.front_mut().unwrap().next = 3; // n = 3, nothing left
        assert!(!expand(&mut ctx));
    }

    #[test]
    fn refresh_matches_direct_recomputation() {
        let mut ctx = Context::new(0, 1, triangle());
        assert!(expand(&mut ctx)); // vertex 2 -> Y (vertex 1 is pinned to X)
        refresh(&mut ctx);
        let front = ctx.stack.front().unwrap();
        assert!(front.fresh);
        // cut weight of {Y={2}} is w(1,2) + w(2,3)
        let expected = ctx.graph.weight(1, 2) + ctx.graph.weight(2, 3);
        assert_eq!(front.weight, expected);
    }

    #[test]
    fn prune_updates_best_and_broadcasts_to_peers() {
        let mut ctx = Context::new(1, 3, triangle());
        assert!(expand(&mut ctx));
        refresh(&mut ctx);
        ctx.stack.front_mut().unwrap().weight = 5;
        let mut transport = LoopbackTransport::new();
        let is_leaf = prune_and_update_best(&mut ctx, &mut transport);
        assert!(!is_leaf);
        assert_eq!(ctx.best.weight, 5);
        // non-root: sent BEST to rank 0, plus BWEIGHT to the other two peers
        let mut sent = Vec::new();
        while let Ok(m) = transport.recv() {
            sent.push(m);
        }
        assert_eq!(sent.len(), 3);
    }

    #[test]
    fn prune_detects_weight_one_leaf_and_marks_idle_drain_off_root() {
        let mut ctx = Context::new(1, 2, triangle());
        ctx.stack.front_mut().unwrap().weight = 1;
        let mut transport = LoopbackTransport::new();
        assert!(prune_and_update_best(&mut ctx, &mut transport));
        assert!(ctx.idle_drain);
    }

    #[test]
    fn prune_records_zero_weight_leaf_but_does_not_trigger_shortcut() {
        let mut ctx = Context::new(0, 1, triangle());
        ctx.stack.front_mut().unwrap().weight = 0;
        let mut transport = LoopbackTransport::new();
        let is_leaf = prune_and_update_best(&mut ctx, &mut transport);
        assert!(!is_leaf);
        assert_eq!(ctx.best.weight, 0);
        assert!(!ctx.idle_drain);
    }

    #[test]
    fn apply_bound_only_tightens_never_loosens() {
        let mut ctx = Context::new(0, 1, triangle());
        ctx.best.weight = 10;
        apply_bound(&mut ctx, 4);
        assert_eq!(ctx.best.weight, 4);
        apply_bound(&mut ctx, 9);
        assert_eq!(ctx.best.weight, 4);
    }

    #[test]
    fn apply_bound_of_one_arms_idle_drain_off_root() {
        let mut ctx = Context::new(1, 2, triangle());
        apply_bound(&mut ctx, 1);
        assert!(ctx.idle_drain);
    }

    #[test]
    fn apply_bound_of_one_does_not_arm_idle_drain_at_root() {
        let mut ctx = Context::new(0, 2, triangle());
        apply_bound(&mut ctx, 1);
        assert!(!ctx.idle_drain);
    }
}
