use crate::adapters::storage::LocalStorage;
use crate::domain::model::{Deliverable, GeneratedArtifact, TicketFile};
pub use crate::domain::model::ARCHIVE_CONTENT_TYPE;
use crate::domain::ports::ArchiveWriter;
use crate::utils::error::{Result, TicketError};
use crate::utils::validation::{check_file, check_files};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const ARCHIVE_FILENAME: &str = "tickets.zip";

/// 將產出的票券整理成單一交付檔案
pub struct Packager {
    archive: Arc<dyn ArchiveWriter>,
    storage: LocalStorage,
    allowed_extensions: Vec<String>,
    discard_sources: bool,
}

impl Packager {
    pub fn new(archive: Arc<dyn ArchiveWriter>, storage: LocalStorage) -> Self {
        Self {
            archive,
            storage,
            allowed_extensions: vec!["pdf".to_string()],
            discard_sources: false,
        }
    }

    /// 打包時接受的文件副檔名
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// 送出後一併刪除已打包的個別票券檔
    pub fn discard_sources(mut self, enabled: bool) -> Self {
        self.discard_sources = enabled;
        self
    }

    fn allowed(&self) -> Vec<&str> {
        self.allowed_extensions.iter().map(String::as_str).collect()
    }

    /// 單一檔案直接交付，多個檔案則打包成壓縮檔
    pub async fn package(&self, artifact: &GeneratedArtifact) -> Result<Deliverable> {
        match artifact {
            GeneratedArtifact::Combined { path } => self.package_file(path).await,
            GeneratedArtifact::PerTicket { files } => match files.as_slice() {
                [] => Err(TicketError::NothingToDeliverError),
                [single] => self.package_file(&single.path).await,
                files => self.package_archive(files).await,
            },
        }
    }

    /// 交付既有檔案，先檢查副檔名
    pub async fn package_file(&self, path: &Path) -> Result<Deliverable> {
        check_file(path, &self.allowed())?;
        let len = tokio::fs::metadata(path).await?.len();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        Ok(Deliverable {
            path: path.to_path_buf(),
            content_type: content_type_for(&extension),
            filename: format!("ticket.{}", extension),
            len,
            transient: Vec::new(),
        })
    }

    async fn package_archive(&self, files: &[TicketFile]) -> Result<Deliverable> {
        let paths: Vec<&Path> = files.iter().map(|f| f.path.as_path()).collect();
        check_files(&paths, &self.allowed())?;

        let entries: Vec<(String, &Path)> = files
            .iter()
            .map(|f| (entry_name(&f.path), f.path.as_path()))
            .collect();

        let destination = self.storage.resolve(&format!(
            "tickets-{}.{}",
            uuid::Uuid::new_v4().simple(),
            self.archive.extension()
        ));
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if let Err(e) = self.archive.write_archive(&entries, &destination) {
            remove_quietly(&destination).await;
            return Err(e);
        }

        let len = tokio::fs::metadata(&destination).await?.len();
        tracing::info!(
            "Packaged {} ticket file(s) into {} ({} bytes)",
            files.len(),
            destination.display(),
            len
        );

        let mut transient = vec![destination.clone()];
        if self.discard_sources {
            transient.extend(files.iter().map(|f| f.path.clone()));
        }

        Ok(Deliverable {
            path: destination,
            content_type: ARCHIVE_CONTENT_TYPE,
            filename: ARCHIVE_FILENAME.to_string(),
            len,
            transient,
        })
    }
}

/// 將交付檔案串流寫入 `sink`
///
/// 接收端中途斷線時刪除交付檔案並回傳 `DeliveryAbortedError`；
/// 完整送出後刪除 `transient` 所列的暫存檔
pub async fn deliver<W>(deliverable: &Deliverable, sink: &mut W) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut file = tokio::fs::File::open(&deliverable.path).await?;

    let transfer = async {
        let sent = tokio::io::copy(&mut file, &mut *sink).await?;
        sink.flush().await?;
        Ok::<u64, std::io::Error>(sent)
    };

    match transfer.await {
        Ok(sent) => {
            drop(file);
            tracing::info!(
                "Delivered {} as '{}' ({}, {} bytes)",
                deliverable.path.display(),
                deliverable.filename,
                deliverable.content_type,
                sent
            );
            for path in &deliverable.transient {
                remove_quietly(path).await;
            }
            Ok(sent)
        }
        Err(source) => {
            drop(file);
            tracing::warn!(
                "Delivery of {} aborted: {}",
                deliverable.path.display(),
                source
            );
            remove_quietly(&deliverable.path).await;
            Err(TicketError::DeliveryAbortedError {
                path: deliverable.path.clone(),
                source,
            })
        }
    }
}

pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "pdf" => "application/pdf",
        "txt" => "text/plain; charset=UTF-8",
        "html" => "text/html; charset=UTF-8",
        "zip" => ARCHIVE_CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::archive::ZipArchiveWriter;
    use std::io::Read;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tempfile::TempDir;

    fn packager(dir: &TempDir) -> Packager {
        Packager::new(Arc::new(ZipArchiveWriter), LocalStorage::new(dir.path()))
    }

    fn ticket_file(dir: &TempDir, code: &str) -> TicketFile {
        let path = dir.path().join(format!("{}.pdf", code));
        std::fs::write(&path, format!("%PDF {}", code)).unwrap();
        TicketFile {
            code: code.to_string(),
            path,
        }
    }

    /// 收下幾個位元組後就像連線已關閉
    struct HangUp {
        budget: usize,
    }

    impl AsyncWrite for HangUp {
        fn poll_write(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.budget == 0 {
                return Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()));
            }
            let n = buf.len().min(self.budget);
            self.budget -= n;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_two_artifacts_become_one_archive() {
        let dir = TempDir::new().unwrap();
        let artifact = GeneratedArtifact::PerTicket {
            files: vec![ticket_file(&dir, "A1"), ticket_file(&dir, "A2")],
        };

        let deliverable = packager(&dir).package(&artifact).await.unwrap();
        assert!(deliverable.is_archive());
        assert_eq!(deliverable.filename, "tickets.zip");
        assert_eq!(deliverable.len, std::fs::metadata(&deliverable.path).unwrap().len());

        let mut archive =
            zip::ZipArchive::new(std::fs::File::open(&deliverable.path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        assert_eq!(names, vec!["A1.pdf", "A2.pdf"]);

        let mut content = String::new();
        archive
            .by_name("A1.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "%PDF A1");
    }

    #[tokio::test]
    async fn test_single_artifact_is_delivered_unchanged() {
        let dir = TempDir::new().unwrap();
        let file = ticket_file(&dir, "A1");

        let per_ticket = GeneratedArtifact::PerTicket {
            files: vec![file.clone()],
        };
        let deliverable = packager(&dir).package(&per_ticket).await.unwrap();
        assert_eq!(deliverable.path, file.path);
        assert_eq!(deliverable.content_type, "application/pdf");
        assert!(deliverable.transient.is_empty());

        let combined = GeneratedArtifact::Combined {
            path: file.path.clone(),
        };
        let deliverable = packager(&dir).package(&combined).await.unwrap();
        assert_eq!(deliverable.path, file.path);
        assert_eq!(deliverable.len, 7);
    }

    #[tokio::test]
    async fn test_archive_members_are_guarded() {
        let dir = TempDir::new().unwrap();
        let mut missing = ticket_file(&dir, "A2");
        missing.path = dir.path().join("gone.pdf");
        let artifact = GeneratedArtifact::PerTicket {
            files: vec![ticket_file(&dir, "A1"), missing],
        };
        assert!(matches!(
            packager(&dir).package(&artifact).await,
            Err(TicketError::FileNotFoundError { .. })
        ));

        let txt = dir.path().join("A3.txt");
        std::fs::write(&txt, "A3").unwrap();
        let artifact = GeneratedArtifact::Combined { path: txt.clone() };
        assert!(matches!(
            packager(&dir).package(&artifact).await,
            Err(TicketError::InvalidFileTypeError { .. })
        ));
        let deliverable = packager(&dir)
            .with_allowed_extensions(["txt"])
            .package(&artifact)
            .await
            .unwrap();
        assert_eq!(deliverable.content_type, "text/plain; charset=UTF-8");
    }

    #[tokio::test]
    async fn test_empty_per_ticket_list_has_nothing_to_deliver() {
        let dir = TempDir::new().unwrap();
        let artifact = GeneratedArtifact::PerTicket { files: Vec::new() };
        assert!(matches!(
            packager(&dir).package(&artifact).await,
            Err(TicketError::NothingToDeliverError)
        ));
    }

    #[tokio::test]
    async fn test_complete_delivery_removes_purpose_built_archive() {
        let dir = TempDir::new().unwrap();
        let a1 = ticket_file(&dir, "A1");
        let a2 = ticket_file(&dir, "A2");
        let artifact = GeneratedArtifact::PerTicket {
            files: vec![a1.clone(), a2.clone()],
        };
        let deliverable = packager(&dir).package(&artifact).await.unwrap();

        let mut sink: Vec<u8> = Vec::new();
        let sent = deliver(&deliverable, &mut sink).await.unwrap();

        assert_eq!(sent, deliverable.len);
        assert_eq!(sink.len() as u64, deliverable.len);
        assert!(!deliverable.path.exists());
        // 預設保留原始票券檔
        assert!(a1.path.exists() && a2.path.exists());
    }

    #[tokio::test]
    async fn test_discarded_sources_are_removed_after_delivery() {
        let dir = TempDir::new().unwrap();
        let a1 = ticket_file(&dir, "A1");
        let a2 = ticket_file(&dir, "A2");
        let artifact = GeneratedArtifact::PerTicket {
            files: vec![a1.clone(), a2.clone()],
        };
        let deliverable = packager(&dir)
            .discard_sources(true)
            .package(&artifact)
            .await
            .unwrap();

        deliver(&deliverable, &mut tokio::io::sink()).await.unwrap();
        assert!(!a1.path.exists());
        assert!(!a2.path.exists());
    }

    #[tokio::test]
    async fn test_aborted_delivery_deletes_deliverable() {
        let dir = TempDir::new().unwrap();
        let file = ticket_file(&dir, "A1");
        let deliverable = packager(&dir)
            .package(&GeneratedArtifact::Combined {
                path: file.path.clone(),
            })
            .await
            .unwrap();

        let mut sink = HangUp { budget: 3 };
        let err = deliver(&deliverable, &mut sink).await.unwrap_err();

        assert!(matches!(err, TicketError::DeliveryAbortedError { .. }));
        assert!(!file.path.exists());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("pdf"), "application/pdf");
        assert_eq!(content_type_for("zip"), ARCHIVE_CONTENT_TYPE);
        assert_eq!(content_type_for("bin"), "application/octet-stream");
    }
}
