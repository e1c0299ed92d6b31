//! Persistent storage abstraction.
//!
//! The bridge persists a small configuration area (autostart flag and
//! multicast group membership) across reboots. The backing medium is
//! platform-specific, so it hides behind [`PersistentStorage`].

use nodelink_protocol::PERSISTENT_AREA_SIZE;
use thiserror::Error;

/// Errors from the persistent storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading the configuration area failed.
    #[error("storage read failed: {0}")]
    Read(String),

    /// Writing the configuration area failed.
    #[error("storage write failed: {0}")]
    Write(String),
}

/// Backend holding the persistent configuration area.
///
/// Implementations read and write the whole area at once; partial updates
/// are handled by the mirror on top.
pub trait PersistentStorage: Send {
    /// Read the entire configuration area.
    fn read_area(&mut self) -> Result<[u8; PERSISTENT_AREA_SIZE], StorageError>;

    /// Write the entire configuration area.
    fn write_area(&mut self, data: &[u8; PERSISTENT_AREA_SIZE]) -> Result<(), StorageError>;
}
