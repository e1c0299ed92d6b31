//! Common types and constants used across the protocol.
//!
//! Result enums mirror the result byte of each confirmation. Decoding an
//! unknown result byte is an error ([`ProtocolError::UnknownResultCode`]);
//! encoding is infallible.

use crate::error::ProtocolError;

/// Maximum APDU size accepted on the data plane.
pub const MAX_APDU_SIZE: usize = 102;

/// Maximum raw test packet payload size.
pub const TEST_DATA_MAX_SIZE: usize = 102;

/// Fixed size of the network-wide app config area.
pub const APP_CONFIG_SIZE: usize = 80;

/// Maximum attribute value length on the attribute read/write services.
/// Sized for the largest attribute, the multicast group table.
pub const MAX_ATTR_SIZE: usize = MULTICAST_GROUPS * 4;

/// Number of multicast group slots a node can join.
pub const MULTICAST_GROUPS: usize = 10;

/// Size of the persistent configuration area: one autostart byte followed
/// by [`MULTICAST_GROUPS`] little-endian u32 group addresses.
pub const PERSISTENT_AREA_SIZE: usize = 1 + MULTICAST_GROUPS * 4;

/// Destination address that floods the whole network.
pub const BROADCAST_ADDRESS: u32 = 0xFFFF_FFFF;

/// Base of the multicast address space. Addresses with this bit set name a
/// multicast group; the low 31 bits are the group id.
pub const MULTICAST_ADDRESS_BASE: u32 = 0x8000_0000;

/// Quality of service class for data-plane transmissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Qos {
    /// Normal priority.
    #[default]
    Normal = 0,
    /// High priority, queued ahead of normal traffic.
    High = 1,
}

impl Qos {
    /// Decode a QoS class from its wire value.
    pub fn from_u8(value: u8) -> Option<Qos> {
        match value {
            0 => Some(Qos::Normal),
            1 => Some(Qos::High),
            _ => None,
        }
    }
}

/// Current state of the mesh stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StackState {
    /// Stack is running.
    Started = 0,
    /// Stack is stopped.
    Stopped = 1,
}

impl StackState {
    /// Decode a stack state from its wire value.
    pub fn from_u8(value: u8) -> Result<StackState, ProtocolError> {
        match value {
            0 => Ok(StackState::Started),
            1 => Ok(StackState::Stopped),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a data-plane transmission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataTxResult {
    /// APDU queued for transmission.
    Success = 0,
    /// Stack is not running.
    StackStopped = 1,
    /// Unknown QoS class.
    InvalidQos = 2,
    /// Unknown transmit option bits.
    InvalidOpts = 3,
    /// No buffer space left.
    OutOfMemory = 4,
    /// Destination address is not valid.
    UnknownDst = 5,
    /// APDU exceeds the maximum size.
    InvalidLen = 6,
    /// Tracking pool exhausted, cannot track another APDU.
    IndFull = 7,
    /// Tracked PDU id already in flight.
    InvalidPduId = 8,
    /// Endpoint is reserved for stack-internal use.
    ReservedEp = 9,
    /// Operation not allowed in the current mode.
    AccessDenied = 10,
}

impl DataTxResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<DataTxResult, ProtocolError> {
        match value {
            0 => Ok(DataTxResult::Success),
            1 => Ok(DataTxResult::StackStopped),
            2 => Ok(DataTxResult::InvalidQos),
            3 => Ok(DataTxResult::InvalidOpts),
            4 => Ok(DataTxResult::OutOfMemory),
            5 => Ok(DataTxResult::UnknownDst),
            6 => Ok(DataTxResult::InvalidLen),
            7 => Ok(DataTxResult::IndFull),
            8 => Ok(DataTxResult::InvalidPduId),
            9 => Ok(DataTxResult::ReservedEp),
            10 => Ok(DataTxResult::AccessDenied),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Outcome of a tracked transmission, reported in the sent indication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataSentResult {
    /// APDU left the node.
    Success = 0,
    /// APDU was dropped after its time-to-live expired.
    Timeout = 1,
}

impl DataSentResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<DataSentResult, ProtocolError> {
        match value {
            0 => Ok(DataSentResult::Success),
            1 => Ok(DataSentResult::Timeout),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a stack start/stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StackControlResult {
    /// State change performed.
    Success = 0,
    /// Stack was already in the requested state.
    InvalidState = 1,
    /// Operation not allowed in the current mode.
    AccessDenied = 2,
    /// Persisting the autostart option failed.
    StorageFailure = 3,
}

impl StackControlResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<StackControlResult, ProtocolError> {
        match value {
            0 => Ok(StackControlResult::Success),
            1 => Ok(StackControlResult::InvalidState),
            2 => Ok(StackControlResult::AccessDenied),
            3 => Ok(StackControlResult::StorageFailure),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of an attribute read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttrResult {
    /// Attribute accessed successfully.
    Success = 0,
    /// Attribute id is not supported.
    Unsupported = 1,
    /// Attribute cannot be accessed in the current stack state.
    InvalidStackState = 2,
    /// Supplied value has the wrong length.
    InvalidLength = 3,
    /// Supplied value is out of range.
    InvalidValue = 4,
    /// Attribute is write-only.
    WriteOnly = 5,
    /// Attribute access denied.
    AccessDenied = 6,
    /// Backing storage failed.
    InternalError = 7,
}

impl AttrResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<AttrResult, ProtocolError> {
        match value {
            0 => Ok(AttrResult::Success),
            1 => Ok(AttrResult::Unsupported),
            2 => Ok(AttrResult::InvalidStackState),
            3 => Ok(AttrResult::InvalidLength),
            4 => Ok(AttrResult::InvalidValue),
            5 => Ok(AttrResult::WriteOnly),
            6 => Ok(AttrResult::AccessDenied),
            7 => Ok(AttrResult::InternalError),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of an app config read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AppConfigResult {
    /// App config accessed successfully.
    Success = 0,
    /// Operation not allowed in the current mode.
    AccessDenied = 1,
    /// No app config has been received or written yet.
    NoData = 2,
    /// Supplied data has the wrong length.
    InvalidLength = 3,
}

impl AppConfigResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<AppConfigResult, ProtocolError> {
        match value {
            0 => Ok(AppConfigResult::Success),
            1 => Ok(AppConfigResult::AccessDenied),
            2 => Ok(AppConfigResult::NoData),
            3 => Ok(AppConfigResult::InvalidLength),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test mode entry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestModeEnterResult {
    /// Test mode entered.
    Success = 0,
    /// Supplied test network address is invalid.
    AddressInvalid = 1,
    /// Rejected: stack is running or test mode already active.
    Rejected = 2,
}

impl TestModeEnterResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestModeEnterResult, ProtocolError> {
        match value {
            0 => Ok(TestModeEnterResult::Success),
            1 => Ok(TestModeEnterResult::AddressInvalid),
            2 => Ok(TestModeEnterResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test mode exit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestModeExitResult {
    /// Test mode exited.
    Success = 0,
    /// Rejected: test mode is not active.
    Rejected = 1,
}

impl TestModeExitResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestModeExitResult, ProtocolError> {
        match value {
            0 => Ok(TestModeExitResult::Success),
            1 => Ok(TestModeExitResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test radio channel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestRadioChannelResult {
    /// Channel selected.
    Success = 0,
    /// Channel number out of range.
    Invalid = 1,
    /// Rejected: test mode is not active.
    Rejected = 2,
}

impl TestRadioChannelResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestRadioChannelResult, ProtocolError> {
        match value {
            0 => Ok(TestRadioChannelResult::Success),
            1 => Ok(TestRadioChannelResult::Invalid),
            2 => Ok(TestRadioChannelResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test radio TX power selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestRadioTxPowerResult {
    /// Power level selected.
    Success = 0,
    /// Power level not supported by the radio.
    Invalid = 1,
    /// Rejected: test mode is not active.
    Rejected = 2,
}

impl TestRadioTxPowerResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestRadioTxPowerResult, ProtocolError> {
        match value {
            0 => Ok(TestRadioTxPowerResult::Success),
            1 => Ok(TestRadioTxPowerResult::Invalid),
            2 => Ok(TestRadioTxPowerResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test radio burst transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestRadioSendResult {
    /// All bursts transmitted.
    Success = 0,
    /// Channel was busy, clear channel assessment failed.
    CcaFail = 1,
    /// Radio transmission failed.
    Failed = 2,
    /// Rejected: test mode is not active.
    Rejected = 3,
}

impl TestRadioSendResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestRadioSendResult, ProtocolError> {
        match value {
            0 => Ok(TestRadioSendResult::Success),
            1 => Ok(TestRadioSendResult::CcaFail),
            2 => Ok(TestRadioSendResult::Failed),
            3 => Ok(TestRadioSendResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test radio reception control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestRadioReceptionResult {
    /// Reception state applied.
    Success = 0,
    /// Rejected: test mode is not active.
    Rejected = 1,
}

impl TestRadioReceptionResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestRadioReceptionResult, ProtocolError> {
        match value {
            0 => Ok(TestRadioReceptionResult::Success),
            1 => Ok(TestRadioReceptionResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test radio data read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestRadioReadResult {
    /// A packet snapshot follows.
    Success = 0,
    /// No packet has been received since the last read.
    NoData = 1,
    /// Rejected: test mode is not active.
    Rejected = 2,
}

impl TestRadioReadResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestRadioReadResult, ProtocolError> {
        match value {
            0 => Ok(TestRadioReadResult::Success),
            1 => Ok(TestRadioReadResult::NoData),
            2 => Ok(TestRadioReadResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Result of a test radio maximum data size query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TestRadioMaxDataSizeResult {
    /// Maximum size follows.
    Success = 0,
    /// Rejected: test mode is not active.
    Rejected = 1,
}

impl TestRadioMaxDataSizeResult {
    /// Decode from wire value.
    pub fn from_u8(value: u8) -> Result<TestRadioMaxDataSizeResult, ProtocolError> {
        match value {
            0 => Ok(TestRadioMaxDataSizeResult::Success),
            1 => Ok(TestRadioMaxDataSizeResult::Rejected),
            _ => Err(ProtocolError::UnknownResultCode(value)),
        }
    }
}

/// Snapshot of the most recently received raw test packet along with the
/// reception counters accumulated since reception was enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPacketSnapshot {
    /// RSSI of the captured packet in dBm.
    pub rssi: i8,
    /// Total packets received since reception was enabled.
    pub rx_count: u32,
    /// Duplicates dropped since reception was enabled.
    pub dup_count: u32,
    /// Sequence number carried in the captured packet.
    pub seq: u32,
    /// Captured payload (up to [`TEST_DATA_MAX_SIZE`] bytes).
    pub data: Vec<u8>,
}

/// Network-wide application configuration area.
///
/// Always exactly [`APP_CONFIG_SIZE`] bytes on the wire; shorter writes are
/// zero-padded by the host before transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// Diagnostics transmit interval in seconds.
    pub diag_interval: u16,
    /// Sequence number of this configuration.
    pub seq: u8,
    /// Opaque application bytes.
    pub data: [u8; APP_CONFIG_SIZE],
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            diag_interval: 0,
            seq: 0,
            data: [0u8; APP_CONFIG_SIZE],
        }
    }
}

/// Is this destination address a multicast group address?
pub fn is_multicast_address(address: u32) -> bool {
    address != BROADCAST_ADDRESS && address & MULTICAST_ADDRESS_BASE != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_round_trip() {
        for value in 0..=10 {
            let result = DataTxResult::from_u8(value).unwrap();
            assert_eq!(result as u8, value);
        }
        assert!(DataTxResult::from_u8(11).is_err());

        for value in 0..=7 {
            let result = AttrResult::from_u8(value).unwrap();
            assert_eq!(result as u8, value);
        }
        assert!(AttrResult::from_u8(8).is_err());
    }

    #[test]
    fn test_multicast_address_classification() {
        assert!(is_multicast_address(MULTICAST_ADDRESS_BASE | 1));
        assert!(is_multicast_address(MULTICAST_ADDRESS_BASE));
        assert!(!is_multicast_address(BROADCAST_ADDRESS));
        assert!(!is_multicast_address(0x0000_1234));
    }

    #[test]
    fn test_persistent_area_size() {
        assert_eq!(PERSISTENT_AREA_SIZE, 41);
    }
}
