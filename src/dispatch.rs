//! Main loop and message dispatcher: the per-process event loop that
//! alternates between draining the inbox and stepping the local DFS, plus
//! end-of-computation handling.

use log::{error, info};

use crate::context::Context;
use crate::dfs;
use crate::message::Message;
use crate::termination;
use crate::transport::Transport;
use crate::worksteal;

/// Runs a process to completion: repeats drain/step until `EOC` has been
/// seen (or declared, at rank 0). Returns the final best element, which is
/// only authoritative at rank 0.
pub fn run<T: Transport>(ctx: &mut Context, transport: &mut T) {
    while !ctx.done {
        drain_all(ctx, transport);
        if ctx.done {
            break;
        }

        if ctx.idle_drain && !ctx.is_root() {
            // Awaiting EOC; nothing else to do but keep servicing messages.
            continue;
        }

        if ctx.stack.is_empty() {
            worksteal::seek_work(ctx, transport);
            continue;
        }

        step(ctx, transport);
    }
}

/// One DFS step: refresh the front if stale, otherwise try
/// to expand it; pop it if expansion is impossible.
fn step<T: Transport>(ctx: &mut Context, transport: &mut T) {
    let front_fresh = ctx.stack.front().unwrap().fresh;
    if !front_fresh {
        dfs::refresh(ctx);
        if dfs::prune_and_update_best(ctx, transport) {
            handle_weight_one_leaf(ctx, transport);
        }
        return;
    }

    if dfs::expand(ctx) {
        dfs::refresh(ctx);
        if dfs::prune_and_update_best(ctx, transport) {
            handle_weight_one_leaf(ctx, transport);
        }
    } else {
        ctx.stack.pop_front();
    }
}

fn handle_weight_one_leaf<T: Transport>(ctx: &mut Context, transport: &mut T) {
    if ctx.is_root() {
        end_computation(ctx, transport);
    }
    // Non-root: `prune_and_update_best` already set `idle_drain`; the main
    // loop's idle-drain branch picks this up on its next iteration.
}

/// Drains every currently-probeable message, urgent class first, then
/// deferrable, without resuming DFS in between.
fn drain_all<T: Transport>(ctx: &mut Context, transport: &mut T) {
    while let Some(_source) = transport.probe() {
        let (source, msg) = transport.recv().expect("probed message vanished before recv");
        handle_urgent_or_deferrable(ctx, transport, source, msg);
        if ctx.done {
            return;
        }
    }
}

/// Routes one already-received message to its handler. Shared by the main
/// loop's drain and by the work-stealing protocol's blocking-wait loops
/// so a reply that doesn't match what a caller was waiting for is
/// still handled correctly instead of being dropped.
pub fn handle_urgent_or_deferrable<T: Transport>(
    ctx: &mut Context,
    transport: &mut T,
    source: i32,
    msg: Message,
) {
    match msg {
        Message::Req => worksteal::handle_request(ctx, transport, source),
        Message::Dreq => worksteal::handle_donor_request(ctx, transport, source),
        Message::Token(color) => {
            if termination::on_token_received(ctx, color) {
                end_computation(ctx, transport);
            }
        }
        Message::Best(candidate) => {
            if !ctx.is_root() {
                error!("BEST received at non-root rank {}", ctx.rank);
                panic!("protocol violation: BEST at non-root");
            }
            if dfs::apply_best(ctx, candidate) {
                end_computation(ctx, transport);
            }
        }
        Message::BWeight(w) => {
            if ctx.is_root() {
                error!("BWEIGHT received at rank 0");
                panic!("protocol violation: BWEIGHT at root");
            }
            dfs::apply_bound(ctx, w);
        }
        Message::Eoc => {
            ctx.done = true;
        }
        // Deny/Donor/StkElem/Eoe are only meaningful as replies awaited by
        // the work-stealing loops; if one arrives here it means a donor or
        // rank 0 answered after we stopped waiting (a benign race under
        // the at-most-one-outstanding-request discipline), so it is simply
        // dropped.
        Message::Deny | Message::Donor(_) | Message::StkElem(_) | Message::Eoe => {}
    }
}

/// Blocking receive used by the work-stealing protocol's wait loops:
/// services nothing itself, just forwards to the transport, but centralizes
/// the one place that notices `EOC` mid-wait.
pub fn blocking_recv<T: Transport>(ctx: &mut Context, transport: &mut T) -> (i32, Message) {
    let (source, msg) = transport.recv().expect("transport recv failed");
    if let Message::Eoc = msg {
        ctx.done = true;
    }
    (source, msg)
}

/// Only rank 0 may call this: announces `EOC` to every other rank,
/// prints the final answer, and marks itself done.
pub fn end_computation<T: Transport>(ctx: &mut Context, transport: &mut T) {
    debug_assert!(ctx.is_root(), "end_computation must only run at rank 0");
    for peer in 1..ctx.world_size {
        transport.send(peer, &Message::Eoc);
    }
    print_answer(ctx);
    ctx.done = true;
}

fn print_answer(ctx: &Context) {
    let n = ctx.graph.n;
    let mut x = Vec::new();
    let mut y = Vec::new();
    for i in 0..n {
        if ctx.best.sigma.get(i) {
            y.push((i + 1).to_string());
        } else {
            x.push((i + 1).to_string());
        }
    }
    println!("Weight of the best solution: {}", ctx.best.weight);
    println!("Set X: {}", x.join(" "));
    println!("Set Y: {}", y.join(" "));
    info!("end of computation: weight {}", ctx.best.weight);
}
