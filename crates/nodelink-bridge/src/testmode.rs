//! Radio test mode state machine.
//!
//! Test mode gives the host raw access to the radio for production-line
//! measurements. It is mutually exclusive with a running stack: entry is
//! rejected while the stack runs, and the stack refuses to start while a
//! test session is active. Every radio operation outside a session is
//! answered with a rejected result rather than dropped.

use log::{debug, info};
use nodelink_protocol::{
    TestModeEnterResult, TestModeExitResult, TestPacketSnapshot, TestRadioChannelResult,
    TestRadioMaxDataSizeResult, TestRadioReadResult, TestRadioReceptionResult,
    TestRadioSendResult, TestRadioTxPowerResult, BROADCAST_ADDRESS, TEST_DATA_MAX_SIZE,
};

use crate::stack::{BurstControl, TestRadio, TxFailure};

/// State of an active test session.
#[derive(Debug, Default)]
struct TestSession {
    rx_enabled: bool,
    indications_enabled: bool,
    rx_count: u32,
    dup_count: u32,
    last_seq: Option<u32>,
    // Single reception slot: a new packet overwrites an unread one.
    rx_slot: Option<TestPacketSnapshot>,
}

/// Owns the raw radio and gates every test operation on session state.
pub struct TestModeController<R: TestRadio> {
    radio: R,
    session: Option<TestSession>,
}

impl<R: TestRadio> TestModeController<R> {
    /// Create a controller with no active session.
    pub fn new(radio: R) -> Self {
        TestModeController {
            radio,
            session: None,
        }
    }

    /// Is a test session active?
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Enter test mode. `stack_running` is checked by the caller against
    /// the live stack state.
    pub fn enter(&mut self, network_address: u32, stack_running: bool) -> TestModeEnterResult {
        if stack_running || self.session.is_some() {
            return TestModeEnterResult::Rejected;
        }
        if network_address == 0 || network_address == BROADCAST_ADDRESS {
            return TestModeEnterResult::AddressInvalid;
        }
        info!("entering radio test mode, network address 0x{network_address:08X}");
        self.session = Some(TestSession::default());
        TestModeEnterResult::Success
    }

    /// Exit test mode, shutting the receiver down.
    pub fn exit(&mut self) -> TestModeExitResult {
        if self.session.take().is_none() {
            return TestModeExitResult::Rejected;
        }
        self.radio.set_reception(false);
        info!("exited radio test mode");
        TestModeExitResult::Success
    }

    /// Tear down any session unconditionally. Used by factory reset.
    pub fn force_exit(&mut self) {
        if self.session.take().is_some() {
            self.radio.set_reception(false);
        }
    }

    /// Select the radio channel.
    pub fn set_channel(&mut self, channel: u8) -> TestRadioChannelResult {
        if self.session.is_none() {
            return TestRadioChannelResult::Rejected;
        }
        match self.radio.set_channel(channel) {
            Ok(()) => TestRadioChannelResult::Success,
            Err(_) => TestRadioChannelResult::Invalid,
        }
    }

    /// Select the TX power level.
    pub fn set_tx_power(&mut self, power_dbm: i8) -> TestRadioTxPowerResult {
        if self.session.is_none() {
            return TestRadioTxPowerResult::Rejected;
        }
        match self.radio.set_tx_power(power_dbm) {
            Ok(()) => TestRadioTxPowerResult::Success,
            Err(_) => TestRadioTxPowerResult::Invalid,
        }
    }

    /// Transmit a burst. Returns the result and the number of packets
    /// that went out.
    pub fn send(&mut self, ctl: BurstControl, seq: u32, data: &[u8]) -> (TestRadioSendResult, u32) {
        if self.session.is_none() {
            return (TestRadioSendResult::Rejected, 0);
        }
        if data.len() > TEST_DATA_MAX_SIZE {
            return (TestRadioSendResult::Failed, 0);
        }
        match self.radio.transmit(ctl, seq, data) {
            Ok(sent) => (TestRadioSendResult::Success, sent),
            Err(TxFailure::CcaBusy { sent }) => (TestRadioSendResult::CcaFail, sent),
            Err(TxFailure::Failed) => (TestRadioSendResult::Failed, 0),
        }
    }

    /// Enable or disable reception and its indications.
    pub fn control_reception(
        &mut self,
        rx_enable: bool,
        indication_enable: bool,
    ) -> TestRadioReceptionResult {
        let Some(session) = self.session.as_mut() else {
            return TestRadioReceptionResult::Rejected;
        };
        session.rx_enabled = rx_enable;
        session.indications_enabled = rx_enable && indication_enable;
        if !rx_enable {
            session.rx_slot = None;
        }
        self.radio.set_reception(rx_enable);
        debug!("test reception rx={rx_enable} indications={indication_enable}");
        TestRadioReceptionResult::Success
    }

    /// Read and consume the reception slot.
    pub fn read_received(&mut self) -> (TestRadioReadResult, Option<TestPacketSnapshot>) {
        let Some(session) = self.session.as_mut() else {
            return (TestRadioReadResult::Rejected, None);
        };
        match session.rx_slot.take() {
            Some(packet) => (TestRadioReadResult::Success, Some(packet)),
            None => (TestRadioReadResult::NoData, None),
        }
    }

    /// Maximum raw payload size of the radio.
    pub fn max_data_size(&self) -> (TestRadioMaxDataSizeResult, u8) {
        if self.session.is_none() {
            return (TestRadioMaxDataSizeResult::Rejected, 0);
        }
        (
            TestRadioMaxDataSizeResult::Success,
            self.radio.max_data_size(),
        )
    }

    /// Feed a packet from the radio driver.
    ///
    /// Counts it and stores it in the reception slot. A packet repeating
    /// the previous sequence number counts as a duplicate and is not
    /// delivered as an indication, but it still overwrites the slot.
    /// Returns a snapshot to queue as an indication when indications are
    /// enabled.
    pub fn packet_received(
        &mut self,
        rssi: i8,
        seq: u32,
        data: Vec<u8>,
    ) -> Option<TestPacketSnapshot> {
        let session = self.session.as_mut()?;
        if !session.rx_enabled {
            return None;
        }
        let duplicate = session.last_seq == Some(seq);
        if duplicate {
            session.dup_count += 1;
        } else {
            session.last_seq = Some(seq);
        }
        session.rx_count += 1;
        let snapshot = TestPacketSnapshot {
            rssi,
            rx_count: session.rx_count,
            dup_count: session.dup_count,
            seq,
            data,
        };
        session.rx_slot = Some(snapshot.clone());
        (!duplicate && session.indications_enabled).then_some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::RadioError;

    struct MockRadio {
        rx_on: bool,
        fail_cca_after: Option<u32>,
    }

    impl MockRadio {
        fn new() -> Self {
            MockRadio {
                rx_on: false,
                fail_cca_after: None,
            }
        }
    }

    impl TestRadio for MockRadio {
        fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
            if (1..=40).contains(&channel) {
                Ok(())
            } else {
                Err(RadioError::Unsupported)
            }
        }

        fn set_tx_power(&mut self, power_dbm: i8) -> Result<(), RadioError> {
            if (-40..=8).contains(&power_dbm) {
                Ok(())
            } else {
                Err(RadioError::Unsupported)
            }
        }

        fn transmit(
            &mut self,
            ctl: BurstControl,
            _seq: u32,
            _data: &[u8],
        ) -> Result<u32, TxFailure> {
            match self.fail_cca_after {
                Some(sent) if sent < ctl.bursts => Err(TxFailure::CcaBusy { sent }),
                _ => Ok(ctl.bursts),
            }
        }

        fn set_reception(&mut self, enabled: bool) {
            self.rx_on = enabled;
        }

        fn max_data_size(&self) -> u8 {
            TEST_DATA_MAX_SIZE as u8
        }
    }

    fn active_controller() -> TestModeController<MockRadio> {
        let mut ctl = TestModeController::new(MockRadio::new());
        assert_eq!(ctl.enter(0x1234, false), TestModeEnterResult::Success);
        ctl
    }

    const BURST: BurstControl = BurstControl {
        bursts: 10,
        cca_duration_us: 0,
        tx_interval_us: 1_000,
    };

    #[test]
    fn test_operations_rejected_outside_session() {
        let mut ctl = TestModeController::new(MockRadio::new());
        assert_eq!(ctl.set_channel(5), TestRadioChannelResult::Rejected);
        assert_eq!(ctl.set_tx_power(0), TestRadioTxPowerResult::Rejected);
        assert_eq!(ctl.send(BURST, 0, &[]).0, TestRadioSendResult::Rejected);
        assert_eq!(
            ctl.control_reception(true, true),
            TestRadioReceptionResult::Rejected
        );
        assert_eq!(ctl.read_received().0, TestRadioReadResult::Rejected);
        assert_eq!(
            ctl.max_data_size().0,
            TestRadioMaxDataSizeResult::Rejected
        );
        assert_eq!(ctl.exit(), TestModeExitResult::Rejected);
    }

    #[test]
    fn test_entry_rules() {
        let mut ctl = TestModeController::new(MockRadio::new());
        assert_eq!(ctl.enter(0x1234, true), TestModeEnterResult::Rejected);
        assert_eq!(ctl.enter(0, false), TestModeEnterResult::AddressInvalid);
        assert_eq!(
            ctl.enter(BROADCAST_ADDRESS, false),
            TestModeEnterResult::AddressInvalid
        );
        assert_eq!(ctl.enter(0x1234, false), TestModeEnterResult::Success);
        // Re-entry while active is rejected.
        assert_eq!(ctl.enter(0x1234, false), TestModeEnterResult::Rejected);
        assert_eq!(ctl.exit(), TestModeExitResult::Success);
        assert_eq!(ctl.exit(), TestModeExitResult::Rejected);
    }

    #[test]
    fn test_cca_failure_reports_sent_count() {
        let mut ctl = active_controller();
        ctl.radio.fail_cca_after = Some(4);
        assert_eq!(ctl.send(BURST, 1, &[0xAA]), (TestRadioSendResult::CcaFail, 4));
    }

    #[test]
    fn test_duplicate_packets_counted_and_overwrite_slot() {
        let mut ctl = active_controller();
        assert_eq!(
            ctl.control_reception(true, true),
            TestRadioReceptionResult::Success
        );

        let first = ctl.packet_received(-60, 7, vec![1]).unwrap();
        assert_eq!(first.rx_count, 1);
        assert_eq!(first.dup_count, 0);

        // Same sequence number again: counted as a duplicate and not
        // delivered, but the buffered packet is still replaced.
        assert!(ctl.packet_received(-61, 7, vec![9]).is_none());
        let (result, packet) = ctl.read_received();
        assert_eq!(result, TestRadioReadResult::Success);
        let packet = packet.unwrap();
        assert_eq!(packet.data, vec![9]);
        assert_eq!(packet.rx_count, 2);
        assert_eq!(packet.dup_count, 1);

        let second = ctl.packet_received(-62, 8, vec![2]).unwrap();
        assert_eq!(second.rx_count, 3);
        assert_eq!(second.dup_count, 1);

        // Reading consumes the slot.
        assert_eq!(ctl.read_received().1.unwrap().seq, 8);
        assert_eq!(ctl.read_received().0, TestRadioReadResult::NoData);
    }

    #[test]
    fn test_reception_disabled_drops_packets() {
        let mut ctl = active_controller();
        assert!(ctl.packet_received(-60, 1, vec![]).is_none());
        assert_eq!(ctl.read_received().0, TestRadioReadResult::NoData);

        // Enabled reception without indications still fills the slot.
        ctl.control_reception(true, false);
        assert!(ctl.packet_received(-60, 2, vec![]).is_none());
        assert_eq!(ctl.read_received().0, TestRadioReadResult::Success);
    }

    #[test]
    fn test_exit_turns_receiver_off() {
        let mut ctl = active_controller();
        ctl.control_reception(true, true);
        assert!(ctl.radio.rx_on);
        ctl.exit();
        assert!(!ctl.radio.rx_on);
    }
}
