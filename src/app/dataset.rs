use crate::domain::model::Dataset;
use crate::utils::error::Result;
use std::fs;
use std::path::Path;

pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Write the dataset as pretty JSON, creating parent directories as needed.
pub fn write_dataset<P: AsRef<Path>>(path: P, dataset: &Dataset) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec_pretty(dataset)?)?;
    Ok(())
}
