//! Move-suggestion service backed by a chess language model.
//!
//! This crate wraps an ONNX Runtime session over a causal model trained
//! to emit chess moves in UCI notation, and exposes it through a small
//! HTTP API. A request carries a move history; the history is replayed
//! and validated against the rules of chess (delegated to `shakmaty`),
//! finished games are reported with their outcome, and for ongoing games
//! the model is sampled repeatedly until it produces a legal move, with
//! a uniformly random legal move as the bounded-retry fallback.
//!
//! The principal pieces are [`game::replay`] (history validation),
//! [`sampler::select_move`] (generate-and-check selection), and
//! [`ChessLm`] (the model capability behind the [`MoveGenerator`]
//! trait).
//!
//! The library re-exports `shakmaty` to make position construction easy.

pub mod config;
pub mod error;
pub mod fetch;
pub mod game;
pub mod model;
pub mod sampler;
pub mod server;
pub mod vocab;

/// Error types produced by library operations.
pub use error::{EngineError, ValidationError};

/// History validation and outcome classification.
pub use game::{GameOutcome, GameStage, replay};

/// Model wrapper, generation seam, and sampling parameters.
pub use model::{ChessLm, MoveGenerator, SamplingConfig};

/// Retry-loop move selection.
pub use sampler::select_move;

/// Re-export of `shakmaty` for convenience when building positions.
pub use shakmaty;
