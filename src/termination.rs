//! Two-color (black/white) token-ring termination detector, the
//! Dijkstra-Safra scheme. The ring is rank 0 → 1 → … → W−1 → 0; a full
//! white round proves global quiescence.

use log::debug;

use crate::context::Context;
use crate::message::{Color, Message};
use crate::transport::Transport;

/// Called whenever a process's stack becomes empty, before it starts
/// hunting for a donor. Returns
/// `true` if this alone proves termination, which only happens for a
/// single-process world: with no peer to hand the token to, an idle rank 0
/// has, by definition, exhausted the whole search (a degenerate ring of
/// length one, not exercised by the original multi-process program, which
/// assumed at least two ranks).
pub fn on_idle<T: Transport>(ctx: &mut Context, transport: &mut T) -> bool {
    if ctx.world_size == 1 {
        return true;
    }
    if ctx.is_root() {
        transport.send(next_rank(ctx), &Message::Token(Color::White));
        ctx.token = None;
    } else if let Some(t) = ctx.token.take() {
        forward_token(ctx, transport, t);
    }
    // If rank != 0 and no token is held, there is nothing to forward this
    // round; the process simply proceeds to hunt for a donor.
    false
}

fn forward_token<T: Transport>(ctx: &mut Context, transport: &mut T, t: Color) {
    transport.send(next_rank(ctx), &Message::Token(t));
    ctx.mycolor = Color::White;
}

fn next_rank(ctx: &Context) -> i32 {
    (ctx.rank + 1) % ctx.world_size
}

/// Handles a received `TOKEN(color)`.
/// At rank 0, a white token proves termination; the caller is responsible
/// for invoking end-of-computation when this returns `true`. Elsewhere the
/// token is retained (possibly tainted black by this process's own color)
/// for the next idle round.
pub fn on_token_received(ctx: &mut Context, color: Color) -> bool {
    if ctx.is_root() {
        match color {
            Color::White => {
                debug!("white token returned: global termination");
                true
            }
            Color::Black => {
                ctx.token = Some(Color::White);
                false
            }
        }
    } else {
        ctx.token = Some(if ctx.mycolor == Color::White {
            color
        } else {
            Color::Black
        });
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::transport::LoopbackTransport;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn graph(n: usize) -> Graph {
        let input = format!("{n}\n") + &"0 ".repeat(n * n);
        let mut rng = StdRng::seed_from_u64(1);
        Graph::load(input.as_bytes(), &mut rng).unwrap()
    }

    #[test]
    fn rank_zero_sends_white_token_unconditionally_on_idle() {
        let mut ctx = Context::new(0, 3, graph(4));
        let mut transport = LoopbackTransport::new();
        on_idle(&mut ctx, &mut transport);
        assert_eq!(transport.recv().unwrap().1, Message::Token(Color::White));
        assert!(ctx.token.is_none());
    }

    #[test]
    fn non_root_forwards_held_token_and_resets_to_white() {
        let mut ctx = Context::new(1, 3, graph(4));
        ctx.mycolor = Color::Black;
        ctx.token = Some(Color::Black);
        let mut transport = LoopbackTransport::new();
        on_idle(&mut ctx, &mut transport);
        assert_eq!(transport.recv().unwrap().1, Message::Token(Color::Black));
        assert_eq!(ctx.mycolor, Color::White);
        assert!(ctx.token.is_none());
    }

    #[test]
    fn single_process_world_is_immediately_terminal_on_idle() {
        let mut ctx = Context::new(0, 1, graph(4));
        let mut transport = LoopbackTransport::new();
        assert!(on_idle(&mut ctx, &mut transport));
        assert!(transport.recv().is_err()); // no token was actually sent
    }

    #[test]
    fn non_root_with_no_token_sends_nothing() {
        let mut ctx = Context::new(1, 3, graph(4));
        ctx.token = None;
        let mut transport = LoopbackTransport::new();
        on_idle(&mut ctx, &mut transport);
        assert!(transport.recv().is_err());
    }

    #[test]
    fn root_receiving_white_token_declares_termination() {
        let mut ctx = Context::new(0, 3, graph(4));
        assert!(on_token_received(&mut ctx, Color::White));
    }

    #[test]
    fn root_receiving_black_token_resets_to_white_for_resend() {
        let mut ctx = Context::new(0, 3, graph(4));
        assert!(!on_token_received(&mut ctx, Color::Black));
        assert_eq!(ctx.token, Some(Color::White));
    }

    #[test]
    fn white_process_passes_token_color_through_unchanged() {
        let mut ctx = Context::new(1, 3, graph(4));
        ctx.mycolor = Color::White;
        on_token_received(&mut ctx, Color::White);
        assert_eq!(ctx.token, Some(Color::White));
    }

    #[test]
    fn black_process_taints_token_to_black() {
        let mut ctx = Context::new(1, 3, graph(4));
        ctx.mycolor = Color::Black;
        on_token_received(&mut ctx, Color::White);
        assert_eq!(ctx.token, Some(Color::Black));
    }
}
