//! Preset Slots
//!
//! Ten melody presets live in fixed 50-byte slots at the start of the byte
//! store. Slot `id` (1-10) occupies `[(id-1)*50, id*50)`:
//!
//! ```text
//! +--------+---------------------------------+
//! | len    | melody bytes (len <= 49)        |
//! | 1 byte | 49 bytes                        |
//! +--------+---------------------------------+
//! ```
//!
//! There is no checksum. Reading a never-written slot returns whatever the
//! cells hold, but the length byte is clamped to the slot capacity so a read
//! never walks into the next slot.

use std::fmt;

use tracing::debug;

use crate::store::ByteStore;
use crate::Result;

/// Number of preset slots
pub const PRESET_COUNT: u8 = 10;

/// Bytes per slot (length byte + payload)
pub const SLOT_SIZE: usize = 50;

/// Maximum stored melody length in bytes
pub const MAX_MELODY_LEN: usize = SLOT_SIZE - 1;

/// Bytes of store the preset area needs
pub const PRESET_AREA_SIZE: usize = SLOT_SIZE * PRESET_COUNT as usize;

/// Error for a preset id outside `1..=10`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("preset id {0} outside 1-10")]
pub struct InvalidPresetId(pub i64);

/// Validated preset slot number (1-10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PresetId(u8);

impl PresetId {
    /// Validate a slot number
    pub fn new(id: i64) -> std::result::Result<Self, InvalidPresetId> {
        if (1..=PRESET_COUNT as i64).contains(&id) {
            Ok(PresetId(id as u8))
        } else {
            Err(InvalidPresetId(id))
        }
    }

    /// Slot number (1-10)
    pub fn get(self) -> u8 {
        self.0
    }

    /// Address of the slot's length byte
    pub fn offset(self) -> usize {
        (self.0 as usize - 1) * SLOT_SIZE
    }
}

impl TryFrom<i64> for PresetId {
    type Error = InvalidPresetId;

    fn try_from(id: i64) -> std::result::Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Preset melodies stored in a [`ByteStore`]
#[derive(Debug)]
pub struct PresetStore<S> {
    store: S,
}

impl<S: ByteStore> PresetStore<S> {
    /// Wrap a byte store. It must hold at least [`PRESET_AREA_SIZE`] bytes;
    /// smaller stores fail on access to the missing slots.
    pub fn new(store: S) -> Self {
        PresetStore { store }
    }

    /// Store `melody` in slot `id`, truncated to [`MAX_MELODY_LEN`] bytes.
    ///
    /// Returns the number of melody bytes written.
    pub fn save(&mut self, id: PresetId, melody: &str) -> Result<usize> {
        let bytes = &melody.as_bytes()[..melody.len().min(MAX_MELODY_LEN)];
        let addr = id.offset();

        self.store.update(addr, bytes.len() as u8)?;
        for (i, &byte) in bytes.iter().enumerate() {
            self.store.update(addr + 1 + i, byte)?;
        }
        self.store.flush()?;

        debug!(%id, len = bytes.len(), "preset saved");
        Ok(bytes.len())
    }

    /// Read the melody in slot `id`.
    ///
    /// The stored length is clamped to [`MAX_MELODY_LEN`]; bytes that are not
    /// valid UTF-8 come back as replacement characters.
    pub fn load(&self, id: PresetId) -> Result<String> {
        let addr = id.offset();
        let len = (self.store.read(addr)? as usize).min(MAX_MELODY_LEN);

        let bytes = (0..len)
            .map(|i| self.store.read(addr + 1 + i))
            .collect::<Result<Vec<u8>>>()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Underlying byte store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the underlying byte store
    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ERASED_BYTE};

    fn id(n: i64) -> PresetId {
        PresetId::new(n).unwrap()
    }

    #[test]
    fn test_preset_id_range() {
        assert!(PresetId::new(0).is_err());
        assert!(PresetId::new(11).is_err());
        assert!(PresetId::new(-1).is_err());
        assert_eq!(PresetId::try_from(10i64).map(PresetId::get), Ok(10));
        assert_eq!(id(1).offset(), 0);
        assert_eq!(id(10).offset(), 450);
        assert_eq!(
            InvalidPresetId(11).to_string(),
            "preset id 11 outside 1-10"
        );
    }

    #[test]
    fn test_save_layout() {
        let mut presets = PresetStore::new(MemoryStore::new(PRESET_AREA_SIZE));
        presets.save(id(2), "C4,500").unwrap();

        let raw = presets.store().as_bytes();
        assert_eq!(raw[50], 6);
        assert_eq!(&raw[51..57], b"C4,500");
        // Neighbouring slots untouched
        assert_eq!(raw[0], ERASED_BYTE);
        assert_eq!(raw[100], ERASED_BYTE);
    }

    #[test]
    fn test_round_trip() {
        let mut presets = PresetStore::new(MemoryStore::eeprom());
        presets.save(id(5), "C4,500").unwrap();
        assert_eq!(presets.load(id(5)).unwrap(), "C4,500");
    }

    #[test]
    fn test_long_melody_truncated_to_49() {
        let melody = "C4,100;D4,100;E4,100;F4,100;G4,100;A4,100;B4,100;C5,100";
        assert!(melody.len() > MAX_MELODY_LEN);

        let mut presets = PresetStore::new(MemoryStore::eeprom());
        assert_eq!(presets.save(id(10), melody).unwrap(), MAX_MELODY_LEN);

        let loaded = presets.load(id(10)).unwrap();
        assert_eq!(loaded.len(), MAX_MELODY_LEN);
        assert_eq!(loaded, &melody[..MAX_MELODY_LEN]);
    }

    #[test]
    fn test_borrowed_store_keeps_writes() {
        let mut store = MemoryStore::eeprom();
        PresetStore::new(&mut store).save(id(1), "A4,10").unwrap();

        assert_eq!(store.as_bytes()[0], 5);
        assert_eq!(PresetStore::new(&mut store).load(id(1)).unwrap(), "A4,10");
    }

    #[test]
    fn test_overwrite_shorter() {
        let mut presets = PresetStore::new(MemoryStore::eeprom());
        presets.save(id(3), "A4,1000;B4,1000").unwrap();
        presets.save(id(3), "C5,10").unwrap();
        assert_eq!(presets.load(id(3)).unwrap(), "C5,10");
    }

    #[test]
    fn test_uninitialised_slot_read_is_clamped() {
        let mut raw = vec![ERASED_BYTE; PRESET_AREA_SIZE];
        raw[50] = b'X'; // first payload byte would be slot 2's length
        let presets = PresetStore::new(MemoryStore::from_bytes(raw));

        // Erased length byte reads as 255 but only 49 bytes are consumed
        let loaded = presets.load(id(1)).unwrap();
        assert_eq!(loaded.chars().count(), MAX_MELODY_LEN);
        assert!(!loaded.contains('X'));
    }

    #[test]
    fn test_last_slot_fits_exact_area() {
        let mut raw = vec![0u8; PRESET_AREA_SIZE];
        raw[450] = 200;
        let presets = PresetStore::new(MemoryStore::from_bytes(raw));
        assert_eq!(presets.load(id(10)).unwrap().len(), MAX_MELODY_LEN);
    }
}
