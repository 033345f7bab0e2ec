//! Generate-and-check move selection.
//!
//! The model is a learned generator, not a constrained decoder, so
//! legality is enforced here: sample text, extract the first UCI-shaped
//! token, accept it only if the position allows it. A bounded number of
//! attempts keeps worst-case latency down; a uniformly random legal move
//! guarantees the caller always gets an answer.

use rand::seq::SliceRandom;
use shakmaty::Chess;
use tracing::{debug, warn};

use crate::{
    error::EngineError,
    game::legal_uci_moves,
    model::{MoveGenerator, SamplingConfig},
};

/// Pick a legal move for `pos` by querying the generator up to
/// `cfg.retries` times, first legal extraction wins. Exhausting the
/// budget degrades to a uniformly random legal move rather than an
/// error; only generator faults and the empty-legal-set contract
/// violation fail.
///
/// `history` must be the validated move sequence that produced `pos`;
/// it becomes the generation prompt (space-joined, empty for a fresh
/// game).
pub fn select_move<G: MoveGenerator + ?Sized>(
    generator: &mut G,
    pos: &Chess,
    history: &[String],
    cfg: &SamplingConfig,
) -> Result<String, EngineError> {
    let legal = legal_uci_moves(pos);
    if legal.is_empty() {
        return Err(EngineError::NoLegalMoves);
    }

    let prompt = history.join(" ");

    for attempt in 0..cfg.retries {
        let continuation = generator.generate(&prompt, cfg)?;
        match extract_move_token(&continuation) {
            Some(token) if legal.contains(&token) => {
                debug!(attempt, token = %token, "model proposed a legal move");
                return Ok(token);
            }
            Some(token) => debug!(attempt, token = %token, "model proposed an illegal move"),
            None => debug!(attempt, "no move token in model output"),
        }
    }

    warn!(
        retries = cfg.retries,
        "generation budget exhausted, picking a random legal move"
    );
    let mut rng = rand::thread_rng();
    // non-empty: checked on entry
    Ok(legal.choose(&mut rng).cloned().unwrap())
}

/// Find the first whole-word UCI move token in generated text,
/// case-insensitively: four board-square characters optionally followed
/// by a promotion letter, with no alphanumeric neighbors. Returns the
/// token lowercased. Later, "better-looking" candidates are never
/// considered.
pub fn extract_move_token(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    for start in 0..bytes.len() {
        if start > 0 && bytes[start - 1].is_ascii_alphanumeric() {
            continue;
        }
        if let Some(len) = match_token_at(bytes, start) {
            return Some(text[start..start + len].to_ascii_lowercase());
        }
    }
    None
}

fn match_token_at(bytes: &[u8], start: usize) -> Option<usize> {
    let file = |b: u8| matches!(b.to_ascii_lowercase(), b'a'..=b'h');
    let rank = |b: u8| matches!(b, b'1'..=b'8');
    let promo = |b: u8| matches!(b.to_ascii_lowercase(), b'q' | b'r' | b'b' | b'n');

    if start + 4 > bytes.len() {
        return None;
    }
    if !(file(bytes[start]) && rank(bytes[start + 1]) && file(bytes[start + 2]) && rank(bytes[start + 3]))
    {
        return None;
    }

    match bytes.get(start + 4) {
        Some(&b) if promo(b) => {
            // the promotion letter must itself end the word
            match bytes.get(start + 5) {
                Some(next) if next.is_ascii_alphanumeric() => None,
                _ => Some(5),
            }
        }
        Some(&b) if b.is_ascii_alphanumeric() => None,
        _ => Some(4),
    }
}
