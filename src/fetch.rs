use std::{fs, io, path::Path};

use tracing::info;

use crate::error::EngineError;

/// Download the model export to `path` unless the file already exists.
///
/// When the `HF_TOKEN` environment variable is set it is sent as a
/// bearer token, which gated model hosts require. A non-success status
/// is an error; there is no retry at this layer.
pub fn ensure_model(path: &str, url: &str) -> Result<(), EngineError> {
    if Path::new(path).exists() {
        info!(path, "found model export");
        return Ok(());
    }

    info!(path, url, "model export missing, downloading");
    let client = reqwest::blocking::Client::new();
    let mut request = client.get(url);
    if let Ok(token) = std::env::var("HF_TOKEN") {
        request = request.bearer_auth(token);
    }

    let mut response = request.send()?;
    if !response.status().is_success() {
        return Err(EngineError::Download(format!(
            "{url} responded {}",
            response.status()
        )));
    }

    let mut dest = fs::File::create(path)?;
    io::copy(&mut response, &mut dest)?;
    info!(path, "download complete");
    Ok(())
}
