//! Error types for the chess move-suggestion service.
//!
//! This crate uses `thiserror` to split faults into two enumerations:
//! [`ValidationError`] for client mistakes in the submitted move history,
//! and [`EngineError`] for faults in the model capability itself. The
//! variants wrap underlying errors from ONNX Runtime and tensor
//! operations, giving the caller a single error type per concern.

use thiserror::Error;

/// A fault in the submitted move history. Both variants carry the
/// offending token; the first invalid token aborts validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The token does not conform to UCI move syntax.
    #[error("Invalid UCI move: {0}")]
    MalformedMove(String),

    /// The token parses as UCI but is not legal in the position reached
    /// by the preceding moves.
    #[error("Illegal move in history: {0}")]
    IllegalMove(String),
}

/// A fault in the model capability or its surrounding machinery. These
/// are not retried by the sampler; an unavailable backend is fatal for
/// the request.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Wraps an error returned by the underlying ONNX Runtime bindings.
    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),

    /// Occurs when an ndarray has an unexpected shape during tensor
    /// preparation or extraction.
    #[error("Tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// A prompt token has no id in the model's move vocabulary.
    #[error("Move token not in model vocabulary: {0}")]
    OutOfVocabulary(String),

    /// Wraps an HTTP error from the model download.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Wraps a filesystem error while storing the model export.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The model host answered, but not with the export.
    #[error("Model download failed: {0}")]
    Download(String),

    /// The sampler was handed a position with no legal moves. The
    /// validator guarantees non-terminality, so this is a caller bug.
    #[error("No legal moves in a supposedly non-terminal position")]
    NoLegalMoves,
}
