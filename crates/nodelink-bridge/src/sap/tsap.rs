//! Radio-test handlers. Thin wrappers over the test controller; all the
//! session gating lives there.

use nodelink_protocol::{Confirmation, StackState};

use crate::dispatcher::Bridge;
use crate::stack::{BurstControl, StackService, TestRadio};
use crate::storage::PersistentStorage;

impl<S: StackService, R: TestRadio, P: PersistentStorage> Bridge<S, R, P> {
    pub(crate) fn test_mode_enter(&mut self, network_address: u32) -> Confirmation {
        let running = self.stack.state() == StackState::Started;
        Confirmation::TestModeEnter {
            result: self.testmode.enter(network_address, running),
        }
    }

    pub(crate) fn test_mode_exit(&mut self) -> Confirmation {
        Confirmation::TestModeExit {
            result: self.testmode.exit(),
        }
    }

    pub(crate) fn test_radio_channel(&mut self, channel: u8) -> Confirmation {
        Confirmation::TestRadioChannel {
            result: self.testmode.set_channel(channel),
        }
    }

    pub(crate) fn test_radio_tx_power(&mut self, power_dbm: i8) -> Confirmation {
        Confirmation::TestRadioTxPower {
            result: self.testmode.set_tx_power(power_dbm),
        }
    }

    pub(crate) fn test_radio_data_tx(
        &mut self,
        bursts: u32,
        cca_duration_us: u32,
        tx_interval_us: u32,
        seq: u32,
        data: &[u8],
    ) -> Confirmation {
        let ctl = BurstControl {
            bursts,
            cca_duration_us,
            tx_interval_us,
        };
        let (result, sent_bursts) = self.testmode.send(ctl, seq, data);
        Confirmation::TestRadioDataTx {
            result,
            sent_bursts,
        }
    }

    pub(crate) fn test_radio_data_rx(
        &mut self,
        rx_enable: bool,
        indication_enable: bool,
    ) -> Confirmation {
        Confirmation::TestRadioDataRx {
            result: self.testmode.control_reception(rx_enable, indication_enable),
        }
    }

    pub(crate) fn test_radio_data_read(&mut self) -> Confirmation {
        let (result, packet) = self.testmode.read_received();
        Confirmation::TestRadioDataRead { result, packet }
    }

    pub(crate) fn test_radio_max_data_size(&mut self) -> Confirmation {
        let (result, size) = self.testmode.max_data_size();
        Confirmation::TestRadioMaxDataSize { result, size }
    }
}
