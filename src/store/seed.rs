// Seed data loading
// Reads the JSON array of sample products inserted into an empty table at boot

use std::path::Path;
use thiserror::Error;

use super::NewProduct;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid seed file '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Load seed products from a JSON file
pub async fn load_seed_file(path: &Path) -> Result<Vec<NewProduct>, SeedError> {
    let display = path.display().to_string();
    let data = tokio::fs::read(path).await.map_err(|source| SeedError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| SeedError::Json {
        path: display,
        source,
    })
}
