//! Work-stealing protocol: requesting and donating stack fragments between
//! peers, and rank 0's donor-naming service. Grounded on this codebase's
//! `get_workload`/work-sharing logic in its thread-based parallel solver,
//! re-expressed over message passing instead of a shared `Mutex`-guarded
//! fringe.

use log::debug;

use crate::context::Context;
use crate::dfs;
use crate::message::{Color, Message};
use crate::termination;
use crate::transport::Transport;

/// Answers an incoming `REQ` from `requester`.
/// Donates half of the back element's remaining breadth, split by
/// expanding it in place; sends `DENY` if there is nothing to give.
pub fn handle_request<T: Transport>(ctx: &mut Context, transport: &mut T, requester: i32) {
    if !ctx.would_give || ctx.stack.is_empty() {
        transport.send(requester, &Message::Deny);
        return;
    }

    if !ctx.stack.back().unwrap().fresh {
        refresh_back(ctx);
    }

    let remaining = {
        let back = ctx.stack.back().unwrap();
        ctx.graph.n - back.next as usize
    };
    let half = remaining / 2;
    if half == 0 {
        transport.send(requester, &Message::Deny);
        return;
    }

    if requester < ctx.rank {
        ctx.mycolor = Color::Black;
        debug!("donating to lower rank {}, blackened", requester);
    }

    let mut donation = Vec::with_capacity(half);
    for _ in 0..half {
        let child = expand_back(ctx);
        donation.push(child);
    }
    // Drain from the back, matching the donor's own LIFO exploration order.
    while let Some(elem) = donation.pop() {
        transport.send(requester, &Message::StkElem(elem));
    }
    transport.send(requester, &Message::Eoe);
}

/// Expands the back element the same way `dfs::expand` expands the front:
/// flips the next undecided vertex into Y and returns the child, advancing
/// the parent's cursor in place.
fn expand_back(ctx: &mut Context) -> crate::stack_elem::StackElem {
    let n = ctx.graph.n;
    let back = ctx.stack.back_mut().unwrap();
    debug_assert!((back.next as usize) < n, "expand_back called with no room left");
    let mut child = back.clone();
    let decided = child.next as usize;
    child.sigma.set(decided, true);
    child.next += 1;
    child.fresh = false;
    back.next += 1;
    child
}

fn refresh_back(ctx: &mut Context) {
    // `dfs::refresh` operates on the stack front; temporarily rotate the
    // back element there, refresh it, then rotate it back.
    let elem = ctx.stack.pop_back().unwrap();
    ctx.stack.push_front(elem);
    dfs::refresh(ctx);
    let elem = ctx.stack.pop_front().unwrap();
    ctx.stack.push_back(elem);
}

/// Rank 0's donor-naming service: answers a `DREQ`
/// with the current cursor and advances it.
pub fn handle_donor_request<T: Transport>(ctx: &mut Context, transport: &mut T, requester: i32) {
    debug_assert!(ctx.is_root(), "DREQ must only be handled at rank 0");
    let donor = ctx.next_donor();
    transport.send(requester, &Message::Donor(donor));
}

/// Runs the seeker loop when the local stack is empty.
/// Blocks (servicing urgent/deferrable messages inline) until work is
/// obtained or end-of-computation is declared.
pub fn seek_work<T: Transport>(ctx: &mut Context, transport: &mut T) {
    loop {
        ctx.would_give = false;
        if termination::on_idle(ctx, transport) {
            crate::dispatch::end_computation(ctx, transport);
        }
        if ctx.done {
            return;
        }

        let donor = request_donor(ctx, transport);
        if ctx.done {
            return;
        }
        if donor == ctx.rank {
            continue; // new token round, new donor
        }

        transport.send(donor, &Message::Req);
        match receive_donation(ctx, transport, donor) {
            ReceiveOutcome::Denied => continue,
            ReceiveOutcome::Done => return,
            ReceiveOutcome::GotWork => {
                ctx.would_give = true;
                return;
            }
        }
    }
}

/// Asks rank 0 to name a donor; rank 0 answers itself
/// without sending a message.
fn request_donor<T: Transport>(ctx: &mut Context, transport: &mut T) -> i32 {
    if ctx.is_root() {
        return ctx.next_donor();
    }
    transport.send(0, &Message::Dreq);
    loop {
        let (source, msg) = crate::dispatch::blocking_recv(ctx, transport);
        if ctx.done {
            return ctx.rank;
        }
        if source == 0 {
            if let Message::Donor(r) = msg {
                return r;
            }
        }
        crate::dispatch::handle_urgent_or_deferrable(ctx, transport, source, msg);
    }
}

enum ReceiveOutcome {
    Denied,
    Done,
    GotWork,
}

/// Receives the reply stream from `donor`: a run of `STKELEM`s terminated
/// by `EOE` (success), or a single `DENY` (donor had nothing).
fn receive_donation<T: Transport>(ctx: &mut Context, transport: &mut T, donor: i32) -> ReceiveOutcome {
    let mut received_any = false;
    loop {
        let (source, msg) = crate::dispatch::blocking_recv(ctx, transport);
        if ctx.done {
            return ReceiveOutcome::Done;
        }
        if source == donor {
            match msg {
                Message::Deny => return ReceiveOutcome::Denied,
                Message::StkElem(e) => {
                    ctx.stack.push_back(e);
                    received_any = true;
                }
                Message::Eoe => {
                    return if received_any {
                        ReceiveOutcome::GotWork
                    } else {
                        ReceiveOutcome::Denied
                    };
                }
                other => crate::dispatch::handle_urgent_or_deferrable(ctx, transport, source, other),
            }
        } else {
            crate::dispatch::handle_urgent_or_deferrable(ctx, transport, source, msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::transport::LoopbackTransport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn wide_graph(n: usize) -> Graph {
        let mut rows = Vec::new();
        for i in 0..n {
            let mut row = vec!["1"; n];
            row[i] = "0";
            rows.push(row.join(" "));
        }
        let input = format!("{n}\n{}\n", rows.join("\n"));
        let mut rng = StdRng::seed_from_u64(3);
        Graph::load(input.as_bytes(), &mut rng).unwrap()
    }

    #[test]
    fn deny_when_would_give_is_false() {
        let mut ctx = Context::new(0, 2, wide_graph(6));
        ctx.would_give = false;
        let mut transport = LoopbackTransport::new();
        handle_request(&mut ctx, &mut transport, 1);
        assert_eq!(transport.recv().unwrap().1, Message::Deny);
    }

    #[test]
    fn deny_when_back_element_has_no_remaining_breadth() {
        let mut ctx = Context::new(0, 2, wide_graph(6));
        ctx.stack.back_mut().unwrap().next = 6; // n=6, nothing left to split
        let mut transport = LoopbackTransport::new();
        handle_request(&mut ctx, &mut transport, 1);
        assert_eq!(transport.recv().unwrap().1, Message::Deny);
    }

    #[test]
    fn donation_to_lower_rank_blackens_donor() {
        let mut ctx = Context::new(5, 6, wide_graph(10));
        let mut transport = LoopbackTransport::new();
        handle_request(&mut ctx, &mut transport, 2);
        assert_eq!(ctx.mycolor, Color::Black);
    }

    #[test]
    fn donation_to_higher_rank_does_not_blacken() {
        let mut ctx = Context::new(2, 6, wide_graph(10));
        let mut transport = LoopbackTransport::new();
        handle_request(&mut ctx, &mut transport, 5);
        assert_eq!(ctx.mycolor, Color::White);
    }

    #[test]
    fn donation_sends_half_floor_elements_then_eoe() {
        let mut ctx = Context::new(0, 2, wide_graph(10));
        // back element has next=1, so remaining = 9, half = 4
        let mut transport = LoopbackTransport::new();
        handle_request(&mut ctx, &mut transport, 1);
        let mut count = 0;
        loop {
            match transport.recv().unwrap().1 {
                Message::StkElem(_) => count += 1,
                Message::Eoe => break,
                other => panic!("unexpected message {:?}", other),
            }
        }
        assert_eq!(count, 4);
    }

    #[test]
    fn donor_naming_rotates_by_one_modulo_world_size() {
        let mut ctx = Context::new(0, 3, wide_graph(4));
        let mut transport = LoopbackTransport::new();
        handle_donor_request(&mut ctx, &mut transport, 1);
        handle_donor_request(&mut ctx, &mut transport, 2);
        handle_donor_request(&mut ctx, &mut transport, 1);
        assert_eq!(transport.recv().unwrap().1, Message::Donor(0));
        assert_eq!(transport.recv().unwrap().1, Message::Donor(1));
        assert_eq!(transport.recv().unwrap().1, Message::Donor(2));
    }
}
