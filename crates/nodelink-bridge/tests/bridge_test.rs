//! End-to-end bridge tests: host-side frames in, confirmation and
//! indication frames out, against mock stack/radio/storage collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nodelink_bridge::{
    Bridge, BridgeConfig, BurstControl, DataTx, DispatchError, IndicationPin, PersistentStorage,
    RadioError, ReceiveResult, ReceivedData, SendError, StackError, StackService, StorageError,
    TestRadio, TxFailure, CSAP_ATTR_NODE_ADDRESS, MSAP_ATTR_AUTOSTART,
};
use nodelink_protocol::{
    AppConfig, AttrResult, Confirmation, DataTxResult, Frame, FunctionCode, Indication,
    ProtocolError, Qos, Request, StackControlResult, StackState, TestModeEnterResult,
    TestModeExitResult, TestRadioSendResult, PERSISTENT_AREA_SIZE,
};

// ---------------------------------------------------------------------
// Mock collaborators

struct MockStack {
    state: StackState,
    node_address: u32,
    network_address: u32,
    network_channel: u8,
    app_config: Option<AppConfig>,
    sent: Vec<DataTx>,
    reception_allowed: bool,
    free_buffers: u8,
}

impl MockStack {
    fn new() -> Self {
        MockStack {
            state: StackState::Stopped,
            node_address: 0x0000_0001,
            network_address: 0x00AB_CDEF,
            network_channel: 7,
            app_config: None,
            sent: Vec::new(),
            reception_allowed: true,
            free_buffers: 8,
        }
    }
}

impl StackService for MockStack {
    fn state(&self) -> StackState {
        self.state
    }

    fn start(&mut self) -> Result<(), StackError> {
        self.state = StackState::Started;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), StackError> {
        self.state = StackState::Stopped;
        Ok(())
    }

    fn send(&mut self, tx: DataTx) -> Result<(), SendError> {
        if self.free_buffers == 0 {
            return Err(SendError::OutOfMemory);
        }
        self.sent.push(tx);
        Ok(())
    }

    fn free_buffers(&self) -> u8 {
        self.free_buffers
    }

    fn allow_reception(&mut self, enabled: bool) {
        self.reception_allowed = enabled;
    }

    fn node_address(&self) -> u32 {
        self.node_address
    }

    fn set_node_address(&mut self, address: u32) -> Result<(), StackError> {
        self.node_address = address;
        Ok(())
    }

    fn network_address(&self) -> u32 {
        self.network_address
    }

    fn set_network_address(&mut self, address: u32) -> Result<(), StackError> {
        self.network_address = address;
        Ok(())
    }

    fn network_channel(&self) -> u8 {
        self.network_channel
    }

    fn set_network_channel(&mut self, channel: u8) -> Result<(), StackError> {
        self.network_channel = channel;
        Ok(())
    }

    fn app_config(&self) -> Option<AppConfig> {
        self.app_config
    }

    fn set_app_config(&mut self, config: AppConfig) -> Result<(), StackError> {
        self.app_config = Some(config);
        Ok(())
    }

    fn factory_reset(&mut self) -> Result<(), StackError> {
        *self = MockStack::new();
        Ok(())
    }
}

struct MockRadio;

impl TestRadio for MockRadio {
    fn set_channel(&mut self, channel: u8) -> Result<(), RadioError> {
        if channel == 0 {
            Err(RadioError::Unsupported)
        } else {
            Ok(())
        }
    }

    fn set_tx_power(&mut self, _power_dbm: i8) -> Result<(), RadioError> {
        Ok(())
    }

    fn transmit(&mut self, ctl: BurstControl, _seq: u32, _data: &[u8]) -> Result<u32, TxFailure> {
        Ok(ctl.bursts)
    }

    fn set_reception(&mut self, _enabled: bool) {}

    fn max_data_size(&self) -> u8 {
        102
    }
}

#[derive(Clone)]
struct SharedStorage {
    data: Arc<std::sync::Mutex<[u8; PERSISTENT_AREA_SIZE]>>,
}

impl SharedStorage {
    fn new() -> Self {
        SharedStorage {
            data: Arc::new(std::sync::Mutex::new([0u8; PERSISTENT_AREA_SIZE])),
        }
    }
}

impl PersistentStorage for SharedStorage {
    fn read_area(&mut self) -> Result<[u8; PERSISTENT_AREA_SIZE], StorageError> {
        Ok(*self.data.lock().unwrap())
    }

    fn write_area(&mut self, data: &[u8; PERSISTENT_AREA_SIZE]) -> Result<(), StorageError> {
        *self.data.lock().unwrap() = *data;
        Ok(())
    }
}

struct MockPin {
    high: AtomicBool,
}

impl MockPin {
    fn new() -> Arc<Self> {
        Arc::new(MockPin {
            high: AtomicBool::new(true),
        })
    }

    fn is_asserted(&self) -> bool {
        !self.high.load(Ordering::SeqCst)
    }
}

impl IndicationPin for MockPin {
    fn set_level(&self, high: bool) {
        self.high.store(high, Ordering::SeqCst);
    }
}

type TestBridge = Bridge<MockStack, MockRadio, SharedStorage>;

fn bridge() -> TestBridge {
    Bridge::new(
        BridgeConfig::default(),
        MockStack::new(),
        MockRadio,
        SharedStorage::new(),
        MockPin::new(),
    )
}

/// Send a request and decode the confirmation, asserting frame id echo.
fn roundtrip(bridge: &mut TestBridge, request: Request, frame_id: u8) -> Confirmation {
    let frame = request.to_frame(frame_id);
    let reply = bridge
        .dispatch(&frame)
        .expect("dispatch failed")
        .expect("request must produce a confirmation");
    assert_eq!(reply.frame_id, frame_id);
    Confirmation::from_frame(&reply).expect("confirmation must decode")
}

fn ack_indication(bridge: &mut TestBridge, ind_frame: &Frame) {
    let code = FunctionCode::from_u8(ind_frame.function).unwrap();
    let response = Frame::new(code as u8 | 0x80, ind_frame.frame_id, vec![]);
    assert_eq!(bridge.dispatch(&response).unwrap(), None);
}

// ---------------------------------------------------------------------
// Dispatcher contract

#[test]
fn test_unknown_function_code_gets_no_confirmation() {
    let mut bridge = bridge();
    let frame = Frame::new(0x7F, 1, vec![]);
    assert_eq!(
        bridge.dispatch(&frame),
        Err(DispatchError::UnsupportedFunction(0x7F))
    );
}

#[test]
fn test_malformed_payload_drops_frame() {
    let mut bridge = bridge();
    // Stack start with a 2-byte payload instead of 1.
    let frame = Frame::new(FunctionCode::StackStartReq as u8, 1, vec![0, 0]);
    assert!(matches!(
        bridge.dispatch(&frame),
        Err(DispatchError::Protocol(ProtocolError::LengthMismatch { .. }))
    ));
}

#[test]
fn test_confirmation_code_from_host_is_rejected() {
    let mut bridge = bridge();
    let frame = Frame::new(FunctionCode::StackStartCnf as u8, 1, vec![0]);
    assert_eq!(
        bridge.dispatch(&frame),
        Err(DispatchError::UnsupportedFunction(
            FunctionCode::StackStartCnf as u8
        ))
    );
}

#[test]
fn test_every_request_gets_exactly_one_confirmation() {
    let mut bridge = bridge();
    let cnf = roundtrip(&mut bridge, Request::IndicationPoll, 0x42);
    assert!(matches!(cnf, Confirmation::IndicationPoll { .. }));
}

// ---------------------------------------------------------------------
// Scenario: test mode session end to end

#[test]
fn test_test_mode_session_lifecycle() {
    let mut bridge = bridge();

    let cnf = roundtrip(
        &mut bridge,
        Request::TestModeEnter {
            network_address: 0x1234_5678,
        },
        1,
    );
    assert_eq!(
        cnf,
        Confirmation::TestModeEnter {
            result: TestModeEnterResult::Success
        }
    );

    let cnf = roundtrip(
        &mut bridge,
        Request::TestRadioDataTx {
            bursts: 3,
            cca_duration_us: 0,
            tx_interval_us: 0,
            seq: 1,
            data: b"AB".to_vec(),
        },
        2,
    );
    assert_eq!(
        cnf,
        Confirmation::TestRadioDataTx {
            result: TestRadioSendResult::Success,
            sent_bursts: 3,
        }
    );

    let cnf = roundtrip(&mut bridge, Request::TestModeExit, 3);
    assert_eq!(
        cnf,
        Confirmation::TestModeExit {
            result: TestModeExitResult::Success
        }
    );

    // After exit, raw sends are rejected.
    let cnf = roundtrip(
        &mut bridge,
        Request::TestRadioDataTx {
            bursts: 1,
            cca_duration_us: 0,
            tx_interval_us: 0,
            seq: 2,
            data: vec![],
        },
        4,
    );
    assert_eq!(
        cnf,
        Confirmation::TestRadioDataTx {
            result: TestRadioSendResult::Rejected,
            sent_bursts: 0,
        }
    );
}

#[test]
fn test_test_mode_rejected_while_stack_running() {
    let mut bridge = bridge();
    roundtrip(&mut bridge, Request::StackStart { autostart: false }, 1);
    let cnf = roundtrip(
        &mut bridge,
        Request::TestModeEnter {
            network_address: 0x1234,
        },
        2,
    );
    assert_eq!(
        cnf,
        Confirmation::TestModeEnter {
            result: TestModeEnterResult::Rejected
        }
    );
}

#[test]
fn test_stack_start_forces_test_mode_exit() {
    let mut bridge = bridge();
    roundtrip(
        &mut bridge,
        Request::TestModeEnter {
            network_address: 0x1234,
        },
        1,
    );
    let cnf = roundtrip(&mut bridge, Request::StackStart { autostart: false }, 2);
    assert_eq!(
        cnf,
        Confirmation::StackStart {
            result: StackControlResult::Success
        }
    );
    // The session is gone.
    let cnf = roundtrip(&mut bridge, Request::TestModeExit, 3);
    assert_eq!(
        cnf,
        Confirmation::TestModeExit {
            result: TestModeExitResult::Rejected
        }
    );
}

// ---------------------------------------------------------------------
// Scenario: autostart persists across restart

#[test]
fn test_autostart_survives_restart() {
    let storage = SharedStorage::new();
    let pin = MockPin::new();

    let mut first = Bridge::new(
        BridgeConfig::default(),
        MockStack::new(),
        MockRadio,
        storage.clone(),
        pin.clone(),
    );
    first.init().unwrap();
    let cnf = roundtrip(&mut first, Request::StackStart { autostart: true }, 1);
    assert_eq!(
        cnf,
        Confirmation::StackStart {
            result: StackControlResult::Success
        }
    );
    drop(first);

    // "Reboot": a fresh bridge over the same storage bytes.
    let mut second = Bridge::new(
        BridgeConfig::default(),
        MockStack::new(),
        MockRadio,
        storage.clone(),
        MockPin::new(),
    );
    second.init().unwrap();

    let cnf = roundtrip(
        &mut second,
        Request::MsapAttrRead {
            attr_id: MSAP_ATTR_AUTOSTART,
        },
        2,
    );
    assert_eq!(
        cnf,
        Confirmation::MsapAttrRead {
            result: AttrResult::Success,
            attr_id: MSAP_ATTR_AUTOSTART,
            value: vec![1],
        }
    );
    // And init actually started the stack.
    let cnf = roundtrip(&mut second, Request::StackStart { autostart: true }, 3);
    assert_eq!(
        cnf,
        Confirmation::StackStart {
            result: StackControlResult::InvalidState
        }
    );
}

#[test]
fn test_stack_stop_clears_autostart() {
    let mut bridge = bridge();
    roundtrip(&mut bridge, Request::StackStart { autostart: true }, 1);
    roundtrip(&mut bridge, Request::StackStop, 2);

    let cnf = roundtrip(
        &mut bridge,
        Request::MsapAttrRead {
            attr_id: MSAP_ATTR_AUTOSTART,
        },
        3,
    );
    assert_eq!(
        cnf,
        Confirmation::MsapAttrRead {
            result: AttrResult::Success,
            attr_id: MSAP_ATTR_AUTOSTART,
            value: vec![0],
        }
    );
}

// ---------------------------------------------------------------------
// Scenario: indication drain with two distinct indications

#[test]
fn test_drain_two_indications_deasserts_line() {
    let pin = MockPin::new();
    let mut bridge = Bridge::new(
        BridgeConfig::default(),
        MockStack::new(),
        MockRadio,
        SharedStorage::new(),
        pin.clone(),
    );
    roundtrip(&mut bridge, Request::StackStart { autostart: false }, 1);
    // Consume the stack state indication the start produced.
    let ind = bridge.take_indication().unwrap();
    ack_indication(&mut bridge, &ind);
    assert!(!pin.is_asserted());

    // One data reception, then a different-typed event.
    let result = bridge.on_data_received(ReceivedData {
        source: 0x42,
        destination: 0x0000_0001,
        source_endpoint: 1,
        destination_endpoint: 1,
        qos: Qos::Normal,
        hop_count: 2,
        apdu: vec![0xAA, 0xBB],
    });
    assert_eq!(result, ReceiveResult::Handled);
    bridge.on_app_config(AppConfig::default());

    assert_eq!(bridge.pending_indications(), 2);
    assert!(pin.is_asserted());

    let first = bridge.take_indication().unwrap();
    let (decoded, queued) = Indication::from_frame(&first).unwrap();
    assert!(matches!(decoded, Indication::DataRx { .. }));
    assert_eq!(queued, 1);

    // Second delivery waits for the host's response.
    assert!(bridge.take_indication().is_none());
    ack_indication(&mut bridge, &first);

    let second = bridge.take_indication().unwrap();
    let (decoded, queued) = Indication::from_frame(&second).unwrap();
    assert!(matches!(decoded, Indication::AppConfigRx { .. }));
    assert_eq!(queued, 0);
    ack_indication(&mut bridge, &second);

    assert_eq!(bridge.pending_indications(), 0);
    assert!(!pin.is_asserted());
}

#[test]
fn test_full_queue_suspends_reception_until_drained() {
    let config = BridgeConfig {
        indication_capacity: 2,
        ..BridgeConfig::default()
    };
    let mut bridge = Bridge::new(
        config,
        MockStack::new(),
        MockRadio,
        SharedStorage::new(),
        MockPin::new(),
    );
    roundtrip(&mut bridge, Request::StackStart { autostart: false }, 1);
    let ind = bridge.take_indication().unwrap();
    ack_indication(&mut bridge, &ind);

    let rx = |n: u8| ReceivedData {
        source: n as u32,
        destination: 0x0000_0001,
        source_endpoint: 1,
        destination_endpoint: 1,
        qos: Qos::Normal,
        hop_count: 1,
        apdu: vec![n],
    };

    assert_eq!(bridge.on_data_received(rx(1)), ReceiveResult::Handled);
    assert_eq!(bridge.on_data_received(rx(2)), ReceiveResult::Handled);
    // Queue full: third reception is refused and reception suspended.
    assert_eq!(bridge.on_data_received(rx(3)), ReceiveResult::NoSpace);

    // Draining one indication re-enables reception.
    let ind = bridge.take_indication().unwrap();
    ack_indication(&mut bridge, &ind);
    assert_eq!(bridge.on_data_received(rx(3)), ReceiveResult::Handled);
}

#[test]
fn test_data_for_other_nodes_is_ignored() {
    let mut bridge = bridge();
    let result = bridge.on_data_received(ReceivedData {
        source: 0x42,
        destination: 0x0000_0099,
        source_endpoint: 1,
        destination_endpoint: 1,
        qos: Qos::Normal,
        hop_count: 1,
        apdu: vec![1],
    });
    assert_eq!(result, ReceiveResult::Ignored);
    assert_eq!(bridge.pending_indications(), 0);
}

// ---------------------------------------------------------------------
// Data plane

#[test]
fn test_data_tx_requires_running_stack() {
    let mut bridge = bridge();
    let request = Request::DataTx {
        pdu_id: 1,
        destination: 0x0000_0042,
        source_endpoint: 10,
        destination_endpoint: 10,
        qos: Qos::Normal as u8,
        tracked: false,
        apdu: vec![1, 2, 3],
    };

    let cnf = roundtrip(&mut bridge, request.clone(), 1);
    assert!(matches!(
        cnf,
        Confirmation::DataTx {
            result: DataTxResult::StackStopped,
            ..
        }
    ));

    roundtrip(&mut bridge, Request::StackStart { autostart: false }, 2);
    let cnf = roundtrip(&mut bridge, request, 3);
    assert!(matches!(
        cnf,
        Confirmation::DataTx {
            result: DataTxResult::Success,
            pdu_id: 1,
            ..
        }
    ));
    assert_eq!(bridge.stack().sent.len(), 1);
}

#[test]
fn test_data_tx_invalid_qos_confirmed_not_dropped() {
    let mut bridge = bridge();
    roundtrip(&mut bridge, Request::StackStart { autostart: false }, 1);

    // Valid frame with an out-of-range qos byte: still answered, with an
    // invalid-qos result.
    let cnf = roundtrip(
        &mut bridge,
        Request::DataTx {
            pdu_id: 5,
            destination: 0x0000_0042,
            source_endpoint: 10,
            destination_endpoint: 10,
            qos: 2,
            tracked: false,
            apdu: vec![1],
        },
        2,
    );
    assert!(matches!(
        cnf,
        Confirmation::DataTx {
            result: DataTxResult::InvalidQos,
            pdu_id: 5,
            ..
        }
    ));
    assert!(bridge.stack().sent.is_empty());
}

#[test]
fn test_tracked_tx_pool_and_sent_indication() {
    let config = BridgeConfig {
        tracking_pool: 1,
        ..BridgeConfig::default()
    };
    let mut bridge = Bridge::new(
        config,
        MockStack::new(),
        MockRadio,
        SharedStorage::new(),
        MockPin::new(),
    );
    roundtrip(&mut bridge, Request::StackStart { autostart: false }, 1);

    let tracked = |pdu_id: u16| Request::DataTx {
        pdu_id,
        destination: 0x0000_0042,
        source_endpoint: 10,
        destination_endpoint: 10,
        qos: Qos::Normal as u8,
        tracked: true,
        apdu: vec![0],
    };

    let cnf = roundtrip(&mut bridge, tracked(7), 2);
    assert!(matches!(
        cnf,
        Confirmation::DataTx {
            result: DataTxResult::Success,
            ..
        }
    ));

    // Same id again is a duplicate, a new id exhausts the pool.
    let cnf = roundtrip(&mut bridge, tracked(7), 3);
    assert!(matches!(
        cnf,
        Confirmation::DataTx {
            result: DataTxResult::InvalidPduId,
            ..
        }
    ));
    let cnf = roundtrip(&mut bridge, tracked(8), 4);
    assert!(matches!(
        cnf,
        Confirmation::DataTx {
            result: DataTxResult::IndFull,
            ..
        }
    ));

    // Completion frees the id and queues a sent indication.
    bridge.on_data_sent(7, 10, 10, 120, nodelink_protocol::DataSentResult::Success);
    let cnf = roundtrip(&mut bridge, tracked(7), 5);
    assert!(matches!(
        cnf,
        Confirmation::DataTx {
            result: DataTxResult::Success,
            ..
        }
    ));
}

// ---------------------------------------------------------------------
// Configuration plane

#[test]
fn test_csap_write_requires_stopped_stack_and_write_role() {
    let mut bridge = bridge();
    let write = Request::CsapAttrWrite {
        attr_id: CSAP_ATTR_NODE_ADDRESS,
        value: 0x0000_0042u32.to_le_bytes().to_vec(),
    };

    roundtrip(&mut bridge, Request::StackStart { autostart: false }, 1);
    let cnf = roundtrip(&mut bridge, write.clone(), 2);
    assert_eq!(
        cnf,
        Confirmation::CsapAttrWrite {
            result: AttrResult::InvalidStackState
        }
    );

    roundtrip(&mut bridge, Request::StackStop, 3);
    let cnf = roundtrip(&mut bridge, write.clone(), 4);
    assert_eq!(
        cnf,
        Confirmation::CsapAttrWrite {
            result: AttrResult::Success
        }
    );
    let cnf = roundtrip(
        &mut bridge,
        Request::CsapAttrRead {
            attr_id: CSAP_ATTR_NODE_ADDRESS,
        },
        5,
    );
    assert_eq!(
        cnf,
        Confirmation::CsapAttrRead {
            result: AttrResult::Success,
            attr_id: CSAP_ATTR_NODE_ADDRESS,
            value: 0x0000_0042u32.to_le_bytes().to_vec(),
        }
    );

    // A read-only bridge refuses writes outright.
    let config = BridgeConfig {
        config_writable: false,
        ..BridgeConfig::default()
    };
    let mut readonly = Bridge::new(
        config,
        MockStack::new(),
        MockRadio,
        SharedStorage::new(),
        MockPin::new(),
    );
    let cnf = roundtrip(&mut readonly, write, 1);
    assert_eq!(
        cnf,
        Confirmation::CsapAttrWrite {
            result: AttrResult::AccessDenied
        }
    );
}
