use std::{fs, path::Path};

use eyre::{Context, Result};
use serde::de::DeserializeOwned;

pub fn read_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let data =
        fs::read_to_string(path).wrap_err_with(|| format!("Read {}", path.display()))?;
    serde_yml::from_str(&data).wrap_err_with(|| format!("Parse {}", path.display()))
}

/// Creates the parent directory of `path` if it is missing
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
