//! Configuration-plane handlers: addressing attributes and factory reset.
//!
//! Writes are double-gated: the bridge instance must be configured as the
//! write-capable role, and the stack must be stopped so the radio never
//! runs with half-applied addressing.

use log::{info, warn};
use nodelink_protocol::{
    is_multicast_address, AttrResult, Confirmation, StackState, BROADCAST_ADDRESS,
};

use crate::dispatcher::Bridge;
use crate::stack::{StackError, StackService, TestRadio};
use crate::storage::PersistentStorage;

/// Read-write attribute: this node's unicast address.
pub const CSAP_ATTR_NODE_ADDRESS: u16 = 1;
/// Read-write attribute: the network address.
pub const CSAP_ATTR_NETWORK_ADDRESS: u16 = 2;
/// Read-write attribute: the network channel.
pub const CSAP_ATTR_NETWORK_CHANNEL: u16 = 3;

fn stack_result(err: StackError) -> AttrResult {
    match err {
        StackError::InvalidValue => AttrResult::InvalidValue,
        StackError::InvalidState => AttrResult::InvalidStackState,
        StackError::Internal(_) => AttrResult::InternalError,
    }
}

impl<S: StackService, R: TestRadio, P: PersistentStorage> Bridge<S, R, P> {
    pub(crate) fn csap_attr_write(&mut self, attr_id: u16, value: &[u8]) -> Confirmation {
        let result = self.csap_attr_write_inner(attr_id, value);
        Confirmation::CsapAttrWrite { result }
    }

    fn csap_attr_write_inner(&mut self, attr_id: u16, value: &[u8]) -> AttrResult {
        if !self.config.config_writable {
            return AttrResult::AccessDenied;
        }
        if self.stack.state() == StackState::Started {
            return AttrResult::InvalidStackState;
        }

        match attr_id {
            CSAP_ATTR_NODE_ADDRESS => {
                let Some(address) = decode_address(value) else {
                    return AttrResult::InvalidLength;
                };
                if address == 0 || address == BROADCAST_ADDRESS || is_multicast_address(address)
                {
                    return AttrResult::InvalidValue;
                }
                self.stack
                    .set_node_address(address)
                    .map_or_else(stack_result, |()| AttrResult::Success)
            }

            CSAP_ATTR_NETWORK_ADDRESS => {
                let Some(address) = decode_address(value) else {
                    return AttrResult::InvalidLength;
                };
                if address == 0 || address == BROADCAST_ADDRESS {
                    return AttrResult::InvalidValue;
                }
                self.stack
                    .set_network_address(address)
                    .map_or_else(stack_result, |()| AttrResult::Success)
            }

            CSAP_ATTR_NETWORK_CHANNEL => {
                let [channel] = value else {
                    return AttrResult::InvalidLength;
                };
                if *channel == 0 {
                    return AttrResult::InvalidValue;
                }
                self.stack
                    .set_network_channel(*channel)
                    .map_or_else(stack_result, |()| AttrResult::Success)
            }

            _ => AttrResult::Unsupported,
        }
    }

    pub(crate) fn csap_attr_read(&mut self, attr_id: u16) -> Confirmation {
        let (result, value) = match attr_id {
            CSAP_ATTR_NODE_ADDRESS => (
                AttrResult::Success,
                self.stack.node_address().to_le_bytes().to_vec(),
            ),
            CSAP_ATTR_NETWORK_ADDRESS => (
                AttrResult::Success,
                self.stack.network_address().to_le_bytes().to_vec(),
            ),
            CSAP_ATTR_NETWORK_CHANNEL => {
                (AttrResult::Success, vec![self.stack.network_channel()])
            }
            _ => (AttrResult::Unsupported, vec![]),
        };
        Confirmation::CsapAttrRead {
            result,
            attr_id,
            value,
        }
    }

    pub(crate) fn factory_reset(&mut self) -> Confirmation {
        let result = self.factory_reset_inner();
        Confirmation::FactoryReset { result }
    }

    fn factory_reset_inner(&mut self) -> AttrResult {
        if !self.config.config_writable {
            return AttrResult::AccessDenied;
        }
        if self.stack.state() == StackState::Started {
            return AttrResult::InvalidStackState;
        }
        self.testmode.force_exit();
        if let Err(err) = self.mirror.factory_reset() {
            warn!("factory reset storage wipe failed: {err}");
            return AttrResult::InternalError;
        }
        if let Err(err) = self.stack.factory_reset() {
            warn!("stack factory reset failed: {err}");
            return AttrResult::InternalError;
        }
        info!("factory reset complete");
        AttrResult::Success
    }
}

fn decode_address(value: &[u8]) -> Option<u32> {
    match value {
        [a, b, c, d] => Some(u32::from_le_bytes([*a, *b, *c, *d])),
        _ => None,
    }
}
