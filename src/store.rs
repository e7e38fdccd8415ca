//! Persistent Byte Store
//!
//! A fixed-size, byte-addressable non-volatile array in the manner of an AVR
//! EEPROM. Writes go through [`ByteStore::update`], which only touches a cell
//! when its value changes, so repeated saves of the same preset do not wear
//! the memory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{Result, TonePlayerError};

/// Size of the on-chip EEPROM of the reference board (ATmega328P)
pub const EEPROM_SIZE: usize = 1024;

/// Value of a never-written (erased) cell
pub const ERASED_BYTE: u8 = 0xFF;

/// Byte-addressable persistent storage
pub trait ByteStore {
    /// Number of addressable bytes
    fn capacity(&self) -> usize;

    /// Read the byte at `addr`
    fn read(&self, addr: usize) -> Result<u8>;

    /// Write `value` at `addr` if it differs from the stored byte
    fn update(&mut self, addr: usize, value: u8) -> Result<()>;

    /// Make previous updates durable.
    ///
    /// Default implementation does nothing (updates are durable immediately).
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

fn check_addr(addr: usize, capacity: usize) -> Result<()> {
    if addr < capacity {
        Ok(())
    } else {
        Err(TonePlayerError::Store { addr, capacity })
    }
}

/// Volatile byte store backed by a `Vec<u8>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    cells: Vec<u8>,
    writes: usize,
}

impl MemoryStore {
    /// Create an erased store of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        MemoryStore {
            cells: vec![ERASED_BYTE; capacity],
            writes: 0,
        }
    }

    /// Create an erased store the size of the reference board's EEPROM
    pub fn eeprom() -> Self {
        Self::new(EEPROM_SIZE)
    }

    /// Create a store holding `bytes`
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        MemoryStore {
            cells: bytes,
            writes: 0,
        }
    }

    /// Raw contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.cells
    }

    /// Number of cells actually rewritten by `update`
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::eeprom()
    }
}

impl ByteStore for MemoryStore {
    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn read(&self, addr: usize) -> Result<u8> {
        check_addr(addr, self.cells.len())?;
        Ok(self.cells[addr])
    }

    fn update(&mut self, addr: usize, value: u8) -> Result<()> {
        check_addr(addr, self.cells.len())?;
        if self.cells[addr] != value {
            self.cells[addr] = value;
            self.writes += 1;
        }
        Ok(())
    }
}

impl<S: ByteStore + ?Sized> ByteStore for &mut S {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn read(&self, addr: usize) -> Result<u8> {
        (**self).read(addr)
    }

    fn update(&mut self, addr: usize, value: u8) -> Result<()> {
        (**self).update(addr, value)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Byte store persisted to a file on the host.
///
/// The image is loaded once at open time (short files are padded with erased
/// bytes) and written back on [`flush`](ByteStore::flush) when dirty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    memory: MemoryStore,
    dirty: bool,
}

impl FileStore {
    /// Open (or create on first flush) a store image of `capacity` bytes
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "creating new preset store image");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        bytes.resize(capacity, ERASED_BYTE);

        Ok(FileStore {
            path,
            memory: MemoryStore::from_bytes(bytes),
            dirty: false,
        })
    }

    /// Location of the image file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteStore for FileStore {
    fn capacity(&self) -> usize {
        self.memory.capacity()
    }

    fn read(&self, addr: usize) -> Result<u8> {
        self.memory.read(addr)
    }

    fn update(&mut self, addr: usize, value: u8) -> Result<()> {
        let before = self.memory.write_count();
        self.memory.update(addr, value)?;
        self.dirty |= self.memory.write_count() != before;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.dirty {
            fs::write(&self.path, self.memory.as_bytes())?;
            debug!(path = %self.path.display(), "preset store written");
            self.dirty = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_starts_erased() {
        let store = MemoryStore::new(16);
        assert_eq!(store.capacity(), 16);
        assert!(store.as_bytes().iter().all(|&b| b == ERASED_BYTE));
    }

    #[test]
    fn test_update_skips_unchanged_cells() {
        let mut store = MemoryStore::new(4);
        store.update(1, 7).unwrap();
        store.update(1, 7).unwrap();
        store.update(2, ERASED_BYTE).unwrap();
        assert_eq!(store.read(1).unwrap(), 7);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_out_of_range_access() {
        let mut store = MemoryStore::new(4);
        assert!(matches!(
            store.read(4),
            Err(TonePlayerError::Store { addr: 4, capacity: 4 })
        ));
        assert!(store.update(10, 1).is_err());
    }

    #[test]
    fn test_file_store_persists_on_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("presets.bin");

        let mut store = FileStore::open(&path, 32).unwrap();
        store.update(0, 3).unwrap();
        store.update(1, b'A').unwrap();
        assert!(!path.exists());
        store.flush().unwrap();

        let reopened = FileStore::open(&path, 32).unwrap();
        assert_eq!(reopened.read(0).unwrap(), 3);
        assert_eq!(reopened.read(1).unwrap(), b'A');
        assert_eq!(reopened.read(31).unwrap(), ERASED_BYTE);
    }

    #[test]
    fn test_file_store_pads_short_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        std::fs::write(&path, [1u8, 2]).unwrap();

        let store = FileStore::open(&path, 8).unwrap();
        assert_eq!(store.capacity(), 8);
        assert_eq!(store.read(1).unwrap(), 2);
        assert_eq!(store.read(7).unwrap(), ERASED_BYTE);
    }
}
