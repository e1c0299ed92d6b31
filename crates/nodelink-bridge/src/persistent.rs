//! Write-through mirror of the persistent configuration area.
//!
//! The area is read from storage at most once, on first access, and every
//! mutation writes the whole area back immediately. If a write fails the
//! cached copy is rolled back to the stored value, so the mirror never
//! claims a state storage does not hold.

use log::warn;
use nodelink_protocol::{MULTICAST_GROUPS, PERSISTENT_AREA_SIZE};

use crate::storage::{PersistentStorage, StorageError};

/// Decoded contents of the persistent configuration area.
///
/// Layout on storage: one autostart byte followed by [`MULTICAST_GROUPS`]
/// little-endian u32 group addresses. A zero slot is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistentArea {
    /// Start the stack automatically on boot.
    pub autostart: bool,
    /// Multicast groups this node belongs to. Zero means the slot is
    /// empty.
    pub multicast_groups: [u32; MULTICAST_GROUPS],
}

impl PersistentArea {
    /// Encode to the storage layout.
    pub fn to_bytes(&self) -> [u8; PERSISTENT_AREA_SIZE] {
        let mut bytes = [0u8; PERSISTENT_AREA_SIZE];
        bytes[0] = u8::from(self.autostart);
        for (i, group) in self.multicast_groups.iter().enumerate() {
            bytes[1 + i * 4..1 + (i + 1) * 4].copy_from_slice(&group.to_le_bytes());
        }
        bytes
    }

    /// Decode from the storage layout.
    pub fn from_bytes(bytes: &[u8; PERSISTENT_AREA_SIZE]) -> PersistentArea {
        let mut multicast_groups = [0u32; MULTICAST_GROUPS];
        for (i, group) in multicast_groups.iter_mut().enumerate() {
            let off = 1 + i * 4;
            *group = u32::from_le_bytes([
                bytes[off],
                bytes[off + 1],
                bytes[off + 2],
                bytes[off + 3],
            ]);
        }
        PersistentArea {
            autostart: bytes[0] & 0x01 != 0,
            multicast_groups,
        }
    }
}

/// Cached, write-through view of the persistent area.
#[derive(Debug)]
pub struct PersistentMirror<S: PersistentStorage> {
    storage: S,
    cache: Option<PersistentArea>,
}

impl<S: PersistentStorage> PersistentMirror<S> {
    /// Create a mirror over a storage backend. Nothing is read until the
    /// first access.
    pub fn new(storage: S) -> Self {
        PersistentMirror {
            storage,
            cache: None,
        }
    }

    fn load(&mut self) -> Result<PersistentArea, StorageError> {
        if let Some(area) = self.cache {
            return Ok(area);
        }
        let area = PersistentArea::from_bytes(&self.storage.read_area()?);
        self.cache = Some(area);
        Ok(area)
    }

    fn store(&mut self, area: PersistentArea) -> Result<(), StorageError> {
        let previous = self.load()?;
        self.cache = Some(area);
        if let Err(err) = self.storage.write_area(&area.to_bytes()) {
            warn!("persistent write failed, rolling back cache: {err}");
            self.cache = Some(previous);
            return Err(err);
        }
        Ok(())
    }

    /// Autostart flag.
    pub fn autostart(&mut self) -> Result<bool, StorageError> {
        Ok(self.load()?.autostart)
    }

    /// Persist the autostart flag.
    pub fn set_autostart(&mut self, autostart: bool) -> Result<(), StorageError> {
        let mut area = self.load()?;
        if area.autostart == autostart {
            return Ok(());
        }
        area.autostart = autostart;
        self.store(area)
    }

    /// Multicast group membership.
    pub fn multicast_groups(&mut self) -> Result<[u32; MULTICAST_GROUPS], StorageError> {
        Ok(self.load()?.multicast_groups)
    }

    /// Persist the multicast group membership.
    pub fn set_multicast_groups(
        &mut self,
        groups: [u32; MULTICAST_GROUPS],
    ) -> Result<(), StorageError> {
        let mut area = self.load()?;
        if area.multicast_groups == groups {
            return Ok(());
        }
        area.multicast_groups = groups;
        self.store(area)
    }

    /// Does this node belong to the group named by a multicast address?
    pub fn is_group_member(&mut self, address: u32) -> Result<bool, StorageError> {
        let groups = self.multicast_groups()?;
        Ok(groups.iter().any(|g| *g == address && *g != 0))
    }

    /// Reset the area to factory defaults.
    pub fn factory_reset(&mut self) -> Result<(), StorageError> {
        // Skip the initial load: defaults overwrite whatever is stored.
        let area = PersistentArea::default();
        self.cache = Some(area);
        if let Err(err) = self.storage.write_area(&area.to_bytes()) {
            self.cache = None;
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MemStorage {
        data: [u8; PERSISTENT_AREA_SIZE],
        reads: usize,
        fail_writes: bool,
    }

    impl MemStorage {
        fn new() -> Self {
            MemStorage {
                data: [0u8; PERSISTENT_AREA_SIZE],
                reads: 0,
                fail_writes: false,
            }
        }
    }

    impl PersistentStorage for MemStorage {
        fn read_area(&mut self) -> Result<[u8; PERSISTENT_AREA_SIZE], StorageError> {
            self.reads += 1;
            Ok(self.data)
        }

        fn write_area(&mut self, data: &[u8; PERSISTENT_AREA_SIZE]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::Write("simulated".into()));
            }
            self.data = *data;
            Ok(())
        }
    }

    #[test]
    fn test_area_byte_layout() {
        let mut area = PersistentArea::default();
        area.autostart = true;
        area.multicast_groups[0] = 0x8000_0001;
        let bytes = area.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..5], &[0x01, 0x00, 0x00, 0x80]);
        assert_eq!(PersistentArea::from_bytes(&bytes), area);
    }

    #[test]
    fn test_reads_storage_only_once() {
        let mut mirror = PersistentMirror::new(MemStorage::new());
        assert!(!mirror.autostart().unwrap());
        assert!(!mirror.is_group_member(0x8000_0001).unwrap());
        mirror.set_autostart(true).unwrap();
        assert!(mirror.autostart().unwrap());
        assert_eq!(mirror.storage.reads, 1);
    }

    #[test]
    fn test_write_through() {
        let mut mirror = PersistentMirror::new(MemStorage::new());
        let mut groups = [0u32; MULTICAST_GROUPS];
        groups[2] = 0x8000_0042;
        mirror.set_multicast_groups(groups).unwrap();

        // A fresh mirror over the same bytes sees the write.
        let storage = MemStorage {
            data: mirror.storage.data,
            reads: 0,
            fail_writes: false,
        };
        let mut reread = PersistentMirror::new(storage);
        assert!(reread.is_group_member(0x8000_0042).unwrap());
        assert!(!reread.is_group_member(0x8000_0043).unwrap());
    }

    #[test]
    fn test_failed_write_rolls_back_cache() {
        let mut mirror = PersistentMirror::new(MemStorage::new());
        assert!(!mirror.autostart().unwrap());

        mirror.storage.fail_writes = true;
        assert!(mirror.set_autostart(true).is_err());
        // The cache still reflects what storage holds.
        assert!(!mirror.autostart().unwrap());
    }

    #[test]
    fn test_factory_reset_clears_area() {
        let mut mirror = PersistentMirror::new(MemStorage::new());
        mirror.set_autostart(true).unwrap();
        let mut groups = [0u32; MULTICAST_GROUPS];
        groups[0] = 0x8000_0001;
        mirror.set_multicast_groups(groups).unwrap();

        mirror.factory_reset().unwrap();
        assert!(!mirror.autostart().unwrap());
        assert_eq!(mirror.multicast_groups().unwrap(), [0u32; MULTICAST_GROUPS]);
        assert_eq!(mirror.storage.data, [0u8; PERSISTENT_AREA_SIZE]);
    }
}
