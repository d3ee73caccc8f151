//! Transport-independent application commands.
//!
//! The gateway maps wire envelope variants into these DTOs so nothing below
//! the transport boundary knows about envelopes or correlation ids. Commands
//! never carry stored session state; the dispatch service loads that itself.

use crate::session::PlayerId;

/// An instruction addressed to one session. The session id travels
/// separately, extracted from the envelope by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    MovePiece {
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    },
    UndoMove,
    SubmitAnswer {
        player_id: PlayerId,
        answer: String,
    },
    RevealHint,
}
