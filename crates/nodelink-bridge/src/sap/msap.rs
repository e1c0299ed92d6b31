//! Management-plane handlers: stack lifecycle, indication polling,
//! management attributes and app config.

use log::{info, warn};
use nodelink_protocol::{
    is_multicast_address, AppConfig, AppConfigResult, AttrResult, Confirmation, Indication,
    StackControlResult, StackState, MAX_ATTR_SIZE, MULTICAST_GROUPS,
};

use crate::dispatcher::Bridge;
use crate::stack::{StackError, StackService, TestRadio};
use crate::storage::PersistentStorage;

/// Read-only attribute: current stack state.
pub const MSAP_ATTR_STACK_STATUS: u16 = 1;
/// Read-write attribute: autostart flag.
pub const MSAP_ATTR_AUTOSTART: u16 = 6;
/// Read-write attribute: multicast group table.
pub const MSAP_ATTR_MULTICAST_GROUPS: u16 = 13;

impl<S: StackService, R: TestRadio, P: PersistentStorage> Bridge<S, R, P> {
    pub(crate) fn indication_poll(&mut self) -> Confirmation {
        Confirmation::IndicationPoll {
            pending: self.pending_indications(),
        }
    }

    pub(crate) fn stack_start(&mut self, autostart: bool) -> Confirmation {
        let result = self.stack_start_inner(autostart);
        Confirmation::StackStart { result }
    }

    fn stack_start_inner(&mut self, autostart: bool) -> StackControlResult {
        if self.stack.state() == StackState::Started {
            return StackControlResult::InvalidState;
        }
        if self.testmode.is_active() {
            // A stack start tears down any test session.
            info!("stack start forcing test mode exit");
            self.testmode.force_exit();
        }
        if self.mirror.set_autostart(autostart).is_err() {
            return StackControlResult::StorageFailure;
        }
        if let Err(err) = self.stack.start() {
            warn!("stack start failed: {err}");
            return StackControlResult::InvalidState;
        }
        self.notify(Indication::StackState {
            state: StackState::Started,
        });
        StackControlResult::Success
    }

    pub(crate) fn stack_stop(&mut self) -> Confirmation {
        let result = self.stack_stop_inner();
        Confirmation::StackStop { result }
    }

    fn stack_stop_inner(&mut self) -> StackControlResult {
        if self.stack.state() == StackState::Stopped {
            return StackControlResult::InvalidState;
        }
        // Stopping on request always clears autostart, so the node stays
        // down across the next boot.
        if self.mirror.set_autostart(false).is_err() {
            return StackControlResult::StorageFailure;
        }
        if let Err(err) = self.stack.stop() {
            warn!("stack stop failed: {err}");
            return StackControlResult::InvalidState;
        }
        self.notify(Indication::StackState {
            state: StackState::Stopped,
        });
        StackControlResult::Success
    }

    pub(crate) fn msap_attr_write(&mut self, attr_id: u16, value: &[u8]) -> Confirmation {
        let result = match attr_id {
            MSAP_ATTR_STACK_STATUS => AttrResult::AccessDenied,
            MSAP_ATTR_AUTOSTART => self.write_autostart(value),
            MSAP_ATTR_MULTICAST_GROUPS => self.write_multicast_groups(value),
            _ => AttrResult::Unsupported,
        };
        Confirmation::MsapAttrWrite { result }
    }

    fn write_autostart(&mut self, value: &[u8]) -> AttrResult {
        let [flag] = value else {
            return AttrResult::InvalidLength;
        };
        if *flag > 1 {
            return AttrResult::InvalidValue;
        }
        match self.mirror.set_autostart(*flag != 0) {
            Ok(()) => AttrResult::Success,
            Err(_) => AttrResult::InternalError,
        }
    }

    fn write_multicast_groups(&mut self, value: &[u8]) -> AttrResult {
        if value.is_empty() || value.len() % 4 != 0 || value.len() > MAX_ATTR_SIZE {
            return AttrResult::InvalidLength;
        }
        let mut groups = [0u32; MULTICAST_GROUPS];
        for (slot, chunk) in groups.iter_mut().zip(value.chunks_exact(4)) {
            let group = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            // Zero clears a slot; anything else must be a group address.
            if group != 0 && !is_multicast_address(group) {
                return AttrResult::InvalidValue;
            }
            *slot = group;
        }
        match self.mirror.set_multicast_groups(groups) {
            Ok(()) => AttrResult::Success,
            Err(_) => AttrResult::InternalError,
        }
    }

    pub(crate) fn msap_attr_read(&mut self, attr_id: u16) -> Confirmation {
        let (result, value) = match attr_id {
            MSAP_ATTR_STACK_STATUS => (AttrResult::Success, vec![self.stack.state() as u8]),
            MSAP_ATTR_AUTOSTART => match self.mirror.autostart() {
                Ok(flag) => (AttrResult::Success, vec![u8::from(flag)]),
                Err(_) => (AttrResult::InternalError, vec![]),
            },
            MSAP_ATTR_MULTICAST_GROUPS => match self.mirror.multicast_groups() {
                Ok(groups) => {
                    let mut value = Vec::with_capacity(MAX_ATTR_SIZE);
                    for group in groups {
                        value.extend_from_slice(&group.to_le_bytes());
                    }
                    (AttrResult::Success, value)
                }
                Err(_) => (AttrResult::InternalError, vec![]),
            },
            _ => (AttrResult::Unsupported, vec![]),
        };
        Confirmation::MsapAttrRead {
            result,
            attr_id,
            value,
        }
    }

    pub(crate) fn app_config_write(&mut self, config: AppConfig) -> Confirmation {
        let result = match self.stack.set_app_config(config) {
            Ok(()) => AppConfigResult::Success,
            Err(StackError::InvalidValue) => AppConfigResult::InvalidLength,
            Err(err) => {
                warn!("app config write failed: {err}");
                AppConfigResult::AccessDenied
            }
        };
        Confirmation::AppConfigWrite { result }
    }

    pub(crate) fn app_config_read(&mut self) -> Confirmation {
        match self.stack.app_config() {
            Some(config) => Confirmation::AppConfigRead {
                result: AppConfigResult::Success,
                config: Some(config),
            },
            None => Confirmation::AppConfigRead {
                result: AppConfigResult::NoData,
                config: None,
            },
        }
    }
}
