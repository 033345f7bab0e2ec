use shakmaty::{CastlingMode, Chess, Color, Position, uci::UciMove};

use crate::error::ValidationError;

/// Result of a concluded game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameOutcome {
    /// Conventional score string, as reported on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            GameOutcome::WhiteWins => "1-0",
            GameOutcome::BlackWins => "0-1",
            GameOutcome::Draw => "1/2-1/2",
        }
    }
}

/// Where a validated move history leaves the game: still in progress
/// (carrying the reached position) or concluded.
#[derive(Debug, Clone)]
pub enum GameStage {
    Ongoing(Chess),
    Finished(GameOutcome),
}

/// Replay an ordered UCI move history from the initial position.
///
/// Each token must parse as UCI syntax and be legal in the position
/// reached by its predecessors; the first invalid token aborts the whole
/// replay. A history that conforms ends either in a playable position or
/// in a terminal outcome.
pub fn replay(moves: &[String]) -> Result<GameStage, ValidationError> {
    let mut pos = Chess::default();

    for token in moves {
        let uci: UciMove = token
            .parse()
            .map_err(|_| ValidationError::MalformedMove(token.clone()))?;
        // to_move resolves the token against the legal moves of `pos`,
        // so an Err here means "not in the legal-move set".
        let m = uci
            .to_move(&pos)
            .map_err(|_| ValidationError::IllegalMove(token.clone()))?;
        pos.play_unchecked(m);
    }

    Ok(match terminal_outcome(&pos) {
        Some(outcome) => GameStage::Finished(outcome),
        None => GameStage::Ongoing(pos),
    })
}

/// Classify a position as terminal. Checkmate is a win for the side that
/// just moved; stalemate and insufficient material are draws.
pub fn terminal_outcome(pos: &Chess) -> Option<GameOutcome> {
    if pos.is_checkmate() {
        Some(match pos.turn() {
            Color::White => GameOutcome::BlackWins,
            Color::Black => GameOutcome::WhiteWins,
        })
    } else if pos.is_stalemate() || pos.is_insufficient_material() {
        Some(GameOutcome::Draw)
    } else {
        None
    }
}

/// The legal-move set of a position, as UCI strings.
pub fn legal_uci_moves(pos: &Chess) -> Vec<String> {
    pos.legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .collect()
}
