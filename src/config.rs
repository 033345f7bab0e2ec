use clap::Parser;

/// Published ONNX export of the move model, fetched on first start when
/// no local file is present.
pub const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/daavidhauser/chess-bot-3000-250m/resolve/main/onnx/model.onnx";

/// Command-line configuration for the move-suggestion server.
#[derive(Parser, Debug, Clone)]
#[command(name = "chess-model-api")]
#[command(about = "Move-suggestion API backed by a UCI-trained language model")]
pub struct ServerConfig {
    /// Interface to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Path to the ONNX model export
    #[arg(long, default_value = "chess_lm.onnx")]
    pub model_path: String,

    /// URL to fetch the model from when the file is absent
    #[arg(long, default_value = DEFAULT_MODEL_URL)]
    pub model_url: String,

    /// Origins allowed by CORS (comma-separated)
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "http://localhost:5173,http://127.0.0.1:5173"
    )]
    pub allow_origins: Vec<String>,
}
