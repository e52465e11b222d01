use crate::domain::ports::ArchiveWriter;
use crate::utils::error::Result;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveWriter;

impl ArchiveWriter for ZipArchiveWriter {
    fn extension(&self) -> &str {
        "zip"
    }

    fn write_archive(&self, entries: &[(String, &Path)], destination: &Path) -> Result<()> {
        tracing::debug!(
            "Creating ZIP file {} with {} files",
            destination.display(),
            entries.len()
        );

        let mut zip = ZipWriter::new(BufWriter::new(File::create(destination)?));

        for (name, source) in entries {
            zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
            let mut reader = BufReader::new(File::open(source)?);
            std::io::copy(&mut reader, &mut zip)?;
        }

        // 完成並確保寫入磁碟
        let mut writer = zip.finish()?;
        std::io::Write::flush(&mut writer)?;
        Ok(())
    }
}
