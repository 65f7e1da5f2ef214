// src/source.rs
use crate::cursor::ByteCursor;
use crate::error::{BlackrockError, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// A memory-mapped recording file, exclusively owned by its reader.
///
/// The mapping is opened read-only and never mutated; all access goes through
/// offset-addressed [`ByteCursor`] reads, so concurrent readers over the same
/// source are safe.
pub struct ByteSource {
    path: PathBuf,
    mmap: Mmap,
}

impl ByteSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(BlackrockError::UnsupportedFormat(format!(
                "{} is empty",
                path.display()
            )));
        }
        // Safety: the file is opened read-only and the mapping lives as long
        // as the reader that owns it.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(ByteSource { path, mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.mmap.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn cursor(&self) -> ByteCursor<'_> {
        ByteCursor::new(&self.mmap)
    }
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSource")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}
