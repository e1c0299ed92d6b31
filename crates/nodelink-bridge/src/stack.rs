//! Service traits the bridge drives.
//!
//! The bridge itself owns no radio and no routing tables; it translates
//! host frames into calls on a [`StackService`] (the mesh stack proper)
//! and, while in test mode, on a [`TestRadio`] (the raw radio driver).
//! Platform integrations implement these traits.

use nodelink_protocol::{AppConfig, Qos, StackState};
use thiserror::Error;

/// Errors from the mesh stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    /// The operation is not valid in the current stack state.
    #[error("invalid stack state")]
    InvalidState,

    /// A supplied value is out of range for the stack.
    #[error("invalid value")]
    InvalidValue,

    /// The stack failed internally.
    #[error("stack internal error: {0}")]
    Internal(String),
}

/// Errors from queueing an APDU for transmission.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// No transmission buffer available.
    #[error("out of transmission buffers")]
    OutOfMemory,

    /// No route to the destination.
    #[error("unknown destination")]
    UnknownDestination,
}

/// An APDU handed to the stack for transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTx {
    /// Destination node, group or broadcast address.
    pub destination: u32,
    /// Source endpoint.
    pub source_endpoint: u8,
    /// Destination endpoint.
    pub destination_endpoint: u8,
    /// Quality of service class.
    pub qos: Qos,
    /// Application payload.
    pub apdu: Vec<u8>,
}

/// An APDU delivered by the stack to this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedData {
    /// Originating node address.
    pub source: u32,
    /// Destination address the APDU was sent to.
    pub destination: u32,
    /// Source endpoint.
    pub source_endpoint: u8,
    /// Destination endpoint.
    pub destination_endpoint: u8,
    /// Quality of service class the APDU travelled with.
    pub qos: Qos,
    /// Number of hops the APDU took.
    pub hop_count: u8,
    /// Application payload.
    pub apdu: Vec<u8>,
}

/// The mesh stack as seen by the bridge.
pub trait StackService: Send {
    /// Current stack state.
    fn state(&self) -> StackState;

    /// Start the stack.
    fn start(&mut self) -> Result<(), StackError>;

    /// Stop the stack.
    fn stop(&mut self) -> Result<(), StackError>;

    /// Queue an APDU for transmission. The bridge has already validated
    /// length, endpoints and destination format.
    fn send(&mut self, tx: DataTx) -> Result<(), SendError>;

    /// Number of free transmission buffers.
    fn free_buffers(&self) -> u8;

    /// Allow or suspend delivery of received APDUs to the bridge. Used
    /// for backpressure while the indication queue is full.
    fn allow_reception(&mut self, enabled: bool);

    /// This node's unicast address.
    fn node_address(&self) -> u32;

    /// Set this node's unicast address. Only valid while stopped.
    fn set_node_address(&mut self, address: u32) -> Result<(), StackError>;

    /// The network address this node participates in.
    fn network_address(&self) -> u32;

    /// Set the network address. Only valid while stopped.
    fn set_network_address(&mut self, address: u32) -> Result<(), StackError>;

    /// The network channel.
    fn network_channel(&self) -> u8;

    /// Set the network channel. Only valid while stopped.
    fn set_network_channel(&mut self, channel: u8) -> Result<(), StackError>;

    /// The current network-wide app config, if any has been written or
    /// received yet.
    fn app_config(&self) -> Option<AppConfig>;

    /// Write the app config and start propagating it to the network.
    fn set_app_config(&mut self, config: AppConfig) -> Result<(), StackError>;

    /// Erase all stack configuration back to factory defaults.
    fn factory_reset(&mut self) -> Result<(), StackError>;
}

/// Burst parameters for a raw test transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstControl {
    /// Number of packets to transmit.
    pub bursts: u32,
    /// Clear channel assessment duration per packet in microseconds
    /// (0 disables CCA).
    pub cca_duration_us: u32,
    /// Interval between packets in microseconds.
    pub tx_interval_us: u32,
}

/// Why a raw burst transmission stopped early.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxFailure {
    /// Clear channel assessment failed; `sent` packets went out before.
    #[error("channel busy after {sent} packets")]
    CcaBusy {
        /// Packets transmitted before CCA gave up.
        sent: u32,
    },

    /// The radio reported a transmission error.
    #[error("radio transmission failed")]
    Failed,
}

/// Errors from configuring the raw radio.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// The requested channel or power level is not supported.
    #[error("unsupported radio setting")]
    Unsupported,
}

/// The raw radio driver used while in test mode.
pub trait TestRadio: Send {
    /// Select the radio channel.
    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError>;

    /// Select the TX power level in dBm.
    fn set_tx_power(&mut self, power_dbm: i8) -> Result<(), RadioError>;

    /// Transmit `ctl.bursts` packets carrying `seq` and `data`. Returns
    /// the number of packets transmitted.
    fn transmit(&mut self, ctl: BurstControl, seq: u32, data: &[u8]) -> Result<u32, TxFailure>;

    /// Enable or disable the receiver.
    fn set_reception(&mut self, enabled: bool);

    /// Maximum raw payload size the radio supports.
    fn max_data_size(&self) -> u8;
}
