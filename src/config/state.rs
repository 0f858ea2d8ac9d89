// Application state module
// Process-scoped collaborators shared by every request

use std::path::PathBuf;
use std::sync::Arc;

use super::types::Config;
use crate::ingest::Ingestor;
use crate::store::ProductStore;
use crate::template::Templates;

/// Application state, built once at boot and read-only afterwards
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProductStore>,
    pub templates: Templates,
    pub ingestor: Ingestor,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ProductStore>, templates: Templates) -> Self {
        let ingestor = Ingestor::new(
            config.resources.images_dir(),
            config.resources.upload_temp_dir(),
            config.http.max_body_size,
        );

        Self {
            config: config.clone(),
            store,
            templates,
            ingestor,
            public_dir: config.resources.public_dir.clone(),
        }
    }

    pub fn images_dir(&self) -> &std::path::Path {
        self.ingestor.images_dir()
    }
}
