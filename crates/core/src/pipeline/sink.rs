//! Archive encoders

use std::io::{Read, Seek, SeekFrom, Write};

use ::zip::write::SimpleFileOptions;
use ::zip::{CompressionMethod, ZipWriter};
use bytes::Bytes;
use tempfile::SpooledTempFile;

use crate::config::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{Error, Result};

/// Compressed output above this size spills from memory to a temp file
const SPOOL_LIMIT: usize = 32 * 1024 * 1024;

/// Streaming encoder fed one named entry at a time
///
/// Entries appear in the archive in the order they are appended. A sink
/// belongs to a single run and cannot be reused after `finish`.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveSink: Send {
    fn append(&mut self, name: &str, data: &[u8]) -> Result<()>;

    /// Finalize the archive and return its bytes
    fn finish(&mut self) -> Result<Bytes>;
}

/// Zip archive spooled through a temp file
///
/// Level 0 stores entries uncompressed; 1 to 9 select the deflate level.
pub struct ZipArchiveSink {
    writer: Option<ZipWriter<SpooledTempFile>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ZipArchiveSink {
    pub fn new(compression_level: i64) -> Self {
        let options = match compression_level {
            0 => SimpleFileOptions::default().compression_method(CompressionMethod::Stored),
            level => SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(level)),
        };

        Self {
            writer: Some(ZipWriter::new(SpooledTempFile::new(SPOOL_LIMIT))),
            options,
            entries: 0,
        }
    }

    /// Number of entries appended so far
    pub fn entries(&self) -> usize {
        self.entries
    }

    fn writer(&mut self) -> Result<&mut ZipWriter<SpooledTempFile>> {
        self.writer
            .as_mut()
            .ok_or_else(|| Error::Archive("archive already finalized".to_string()))
    }
}

impl Default for ZipArchiveSink {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl ArchiveSink for ZipArchiveSink {
    fn append(&mut self, name: &str, data: &[u8]) -> Result<()> {
        let options = self.options;
        let writer = self.writer()?;
        writer.start_file(name, options)?;
        writer.write_all(data)?;
        self.entries += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<Bytes> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| Error::Archive("archive already finalized".to_string()))?;

        let mut file = writer.finish()?;
        file.seek(SeekFrom::Start(0))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        tracing::debug!(entries = self.entries, bytes = buf.len(), "Archive finalized");
        Ok(Bytes::from(buf))
    }
}
