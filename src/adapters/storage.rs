use crate::utils::error::Result;
use std::path::{Path, PathBuf};

const SCRATCH_DIR: &str = ".scratch";

/// 票券、匯出檔與壓縮檔的輸出目錄
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    pub async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.resolve(path)).await?;
        Ok(data)
    }

    pub async fn write_file(&self, path: &str, data: &[u8]) -> Result<PathBuf> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        Ok(full_path)
    }

    /// 將完成的檔案搬到輸出目錄下的 `path`
    pub async fn commit(&self, from: &Path, path: &str) -> Result<PathBuf> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::rename(from, &full_path).await?;
        Ok(full_path)
    }

    /// 為單一批次建立新的暫存區
    ///
    /// 暫存區放在輸出目錄內，搬移時只需同一檔案系統上的 rename
    pub async fn scratch_area(&self) -> Result<ScratchArea> {
        let path = self
            .base_path
            .join(SCRATCH_DIR)
            .join(format!("batch-{}", uuid::Uuid::new_v4().simple()));
        tokio::fs::create_dir_all(&path).await?;
        tracing::debug!("Opened scratch area {}", path.display());
        Ok(ScratchArea { path })
    }
}

/// 批次暫存目錄，drop 時連同內容一併刪除
#[derive(Debug)]
pub struct ScratchArea {
    path: PathBuf,
}

impl ScratchArea {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 暫存區內不會重複的檔案路徑
    pub fn unique_file(&self, prefix: &str, extension: &str) -> PathBuf {
        self.path.join(format!(
            "{}-{}.{}",
            prefix,
            uuid::Uuid::new_v4().simple(),
            extension
        ))
    }
}

impl Drop for ScratchArea {
    fn drop(&mut self) {
        // Drop 不能 await，這裡只能同步刪除
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!("Removed scratch area {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove scratch area {}: {}",
                self.path.display(),
                e
            ),
        }

        // 其他批次仍在使用時上層目錄非空，保留即可
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::remove_dir(parent) {
                tracing::debug!("Kept scratch root {}: {}", parent.display(), e);
            }
        }
    }
}
