use crate::errors::AppError;
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

/// Reads a JSON document. A missing file is an empty document; an unreadable
/// or corrupt one is an error so it never gets overwritten with defaults.
pub async fn load_document<T>(path: &Path) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
            error!("failed to parse data file {}: {err}", path.display());
            AppError::backend(err)
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("no data file at {}, starting empty", path.display());
            Ok(T::default())
        }
        Err(err) => {
            error!("failed to read data file {}: {err}", path.display());
            Err(AppError::backend(err))
        }
    }
}

/// Writes the document next to its final path and renames it into place.
pub async fn persist_document<T: Serialize>(path: &Path, data: &T) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn unique_temp_path(label: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "attendance_{label}_{}_{}.json",
        std::process::id(),
        nanos
    ));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TablesData;

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let path = unique_temp_path("missing");
        let data: TablesData = load_document(&path).await.unwrap();
        assert!(data.personas.is_empty());
        assert_eq!(data.next_record_id, 0);
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let path = unique_temp_path("corrupt");
        fs::write(&path, b"{ not json").await.unwrap();
        let result: Result<TablesData, _> = load_document(&path).await;
        assert!(matches!(result, Err(AppError::Backend(_))));
        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn persisted_document_reloads() {
        let path = unique_temp_path("persist");
        let data = TablesData {
            next_record_id: 42,
            ..TablesData::default()
        };
        persist_document(&path, &data).await.unwrap();
        let loaded: TablesData = load_document(&path).await.unwrap();
        assert_eq!(loaded.next_record_id, 42);
        let _ = fs::remove_file(&path).await;
    }
}
