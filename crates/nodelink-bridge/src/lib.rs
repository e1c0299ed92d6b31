//! # nodelink-bridge
//!
//! Core of the dual-MCU host control bridge: the node-side subsystem that
//! exposes an embedded mesh stack to an external host MCU over a serial
//! frame protocol (see `nodelink-protocol`) with a side-band
//! indication-pending line.
//!
//! The bridge is a plain context object with no global state. A platform
//! integration supplies the collaborators and pumps frames through it:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nodelink_bridge::{Bridge, BridgeConfig};
//!
//! let mut bridge = Bridge::new(BridgeConfig::default(), stack, radio, storage, pin);
//! bridge.init()?;
//!
//! // Serial task loop:
//! while let Some(frame) = codec.decode()? {
//!     if let Some(confirmation) = bridge.dispatch(&frame)? {
//!         uart.write(&confirmation.encode())?;
//!     }
//!     while let Some(indication) = bridge.take_indication() {
//!         uart.write(&indication.encode())?;
//!     }
//! }
//! ```

mod dispatcher;
mod error;
mod indication;
mod persistent;
mod sap;
mod stack;
mod storage;
mod testmode;

pub use dispatcher::{Bridge, ReceiveResult};
pub use error::DispatchError;
pub use indication::{indication_channel, IndicationPin, IndicationQueue, IndicationSender};
pub use persistent::{PersistentArea, PersistentMirror};
pub use sap::*;
pub use stack::{
    BurstControl, DataTx, RadioError, ReceivedData, SendError, StackError, StackService,
    TestRadio, TxFailure,
};
pub use storage::{PersistentStorage, StorageError};
pub use testmode::TestModeController;

use serde::{Deserialize, Serialize};

/// Static bridge configuration, typically loaded from a board profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Whether this bridge instance may change configuration-plane
    /// attributes and perform factory resets.
    pub config_writable: bool,
    /// Capacity of the indication queue.
    pub indication_capacity: usize,
    /// Number of simultaneously tracked transmissions.
    pub tracking_pool: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            config_writable: true,
            indication_capacity: 16,
            tracking_pool: 16,
        }
    }
}
