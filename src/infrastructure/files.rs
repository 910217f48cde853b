// Infrastructure: model and metadata files on disk

use crate::application::persistence::ModelMetadata;
use crate::domain::solver_service::Result;
use std::fs;
use std::path::Path;
use tracing::debug;

pub fn write_model(path: &Path, lp_text: &str) -> Result<()> {
    fs::write(path, lp_text)?;
    debug!(path = %path.display(), bytes = lp_text.len(), "model file written");
    Ok(())
}

pub fn read_model(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = text.len(), "model file read");
    Ok(text)
}

pub fn write_metadata(path: &Path, metadata: &ModelMetadata) -> Result<()> {
    fs::write(path, metadata.to_json()?)?;
    debug!(path = %path.display(), columns = metadata.columns.len(), "metadata written");
    Ok(())
}

pub fn read_metadata(path: &Path) -> Result<ModelMetadata> {
    ModelMetadata::from_json(&fs::read_to_string(path)?)
}
