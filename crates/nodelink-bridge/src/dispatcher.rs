//! Request dispatcher and bridge context.
//!
//! [`Bridge`] owns every piece of bridge state (stack service handle,
//! persistent mirror, test controller, indication queue) so multiple
//! instances can coexist, notably under test. The serial transport feeds
//! decoded frames into [`Bridge::dispatch`] and writes back the returned
//! confirmation; indications are pulled separately with
//! [`Bridge::take_indication`] whenever the transport is idle and the
//! queue is non-empty.

use std::sync::Arc;

use log::{debug, info, warn};
use nodelink_protocol::{
    is_multicast_address, Direction, Frame, FunctionCode, Indication, Request, StackState,
    BROADCAST_ADDRESS,
};

use crate::error::DispatchError;
use crate::indication::{indication_channel, IndicationPin, IndicationQueue, IndicationSender};
use crate::persistent::PersistentMirror;
use crate::stack::{ReceivedData, StackService, TestRadio};
use crate::storage::{PersistentStorage, StorageError};
use crate::testmode::TestModeController;
use crate::BridgeConfig;

/// What happened to a received APDU handed to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveResult {
    /// Queued as an indication for the host.
    Handled,
    /// Not addressed to this node; dropped.
    Ignored,
    /// No indication space; reception has been suspended until the host
    /// drains the queue.
    NoSpace,
}

/// Why a tracking id could not be reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrackingError {
    /// The pool is exhausted.
    Full,
    /// The id is already in flight.
    Duplicate,
}

/// Fixed pool of in-flight tracking ids for tracked transmissions.
#[derive(Debug)]
pub(crate) struct TrackingPool {
    ids: Vec<u16>,
    capacity: usize,
}

impl TrackingPool {
    fn new(capacity: usize) -> Self {
        TrackingPool {
            ids: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn reserve(&mut self, id: u16) -> Result<(), TrackingError> {
        if self.ids.contains(&id) {
            return Err(TrackingError::Duplicate);
        }
        if self.ids.len() >= self.capacity {
            return Err(TrackingError::Full);
        }
        self.ids.push(id);
        Ok(())
    }

    pub(crate) fn release(&mut self, id: u16) -> bool {
        match self.ids.iter().position(|i| *i == id) {
            Some(pos) => {
                self.ids.swap_remove(pos);
                true
            }
            None => false,
        }
    }
}

/// The dual-MCU protocol bridge.
pub struct Bridge<S: StackService, R: TestRadio, P: PersistentStorage> {
    pub(crate) config: BridgeConfig,
    pub(crate) stack: S,
    pub(crate) mirror: PersistentMirror<P>,
    pub(crate) testmode: TestModeController<R>,
    pub(crate) queue: IndicationQueue,
    sender: IndicationSender,
    pub(crate) tracking: TrackingPool,
    reception_suspended: bool,
    ind_frame_id: u8,
}

impl<S: StackService, R: TestRadio, P: PersistentStorage> Bridge<S, R, P> {
    /// Assemble a bridge from its collaborators.
    pub fn new(
        config: BridgeConfig,
        stack: S,
        radio: R,
        storage: P,
        pin: Arc<dyn IndicationPin>,
    ) -> Self {
        let (sender, queue) = indication_channel(config.indication_capacity, pin);
        let tracking = TrackingPool::new(config.tracking_pool);
        Bridge {
            config,
            stack,
            mirror: PersistentMirror::new(storage),
            testmode: TestModeController::new(radio),
            queue,
            sender,
            tracking,
            reception_suspended: false,
            ind_frame_id: 0,
        }
    }

    /// Boot-time initialization: honor the persisted autostart flag and
    /// tell the host what state the stack is in.
    pub fn init(&mut self) -> Result<(), StorageError> {
        if self.mirror.autostart()? && self.stack.state() == StackState::Stopped {
            info!("autostart set, starting stack");
            if let Err(err) = self.stack.start() {
                warn!("autostart failed: {err}");
            }
        }
        self.notify(Indication::StackState {
            state: self.stack.state(),
        });
        Ok(())
    }

    /// Dispatch one decoded frame.
    ///
    /// A request produces exactly one confirmation frame echoing the
    /// request's frame id. A response frame acknowledges the in-flight
    /// indication and produces nothing. Unknown codes and malformed
    /// payloads produce an error; the caller drops the frame without a
    /// confirmation.
    pub fn dispatch(&mut self, frame: &Frame) -> Result<Option<Frame>, DispatchError> {
        let code = FunctionCode::from_u8(frame.function)
            .ok_or(DispatchError::UnsupportedFunction(frame.function))?;

        match code.direction() {
            Direction::Request => {
                let request = Request::decode(code, &frame.payload)?;
                debug!("request {code:?} frame_id={}", frame.frame_id);
                let confirmation = match request {
                    Request::DataTx {
                        pdu_id,
                        destination,
                        source_endpoint,
                        destination_endpoint,
                        qos,
                        tracked,
                        apdu,
                    } => self.data_tx(
                        pdu_id,
                        destination,
                        source_endpoint,
                        destination_endpoint,
                        qos,
                        tracked,
                        apdu,
                    ),
                    Request::IndicationPoll => self.indication_poll(),
                    Request::StackStart { autostart } => self.stack_start(autostart),
                    Request::StackStop => self.stack_stop(),
                    Request::MsapAttrWrite { attr_id, value } => {
                        self.msap_attr_write(attr_id, &value)
                    }
                    Request::MsapAttrRead { attr_id } => self.msap_attr_read(attr_id),
                    Request::AppConfigWrite { config } => self.app_config_write(config),
                    Request::AppConfigRead => self.app_config_read(),
                    Request::CsapAttrWrite { attr_id, value } => {
                        self.csap_attr_write(attr_id, &value)
                    }
                    Request::CsapAttrRead { attr_id } => self.csap_attr_read(attr_id),
                    Request::FactoryReset => self.factory_reset(),
                    Request::TestModeEnter { network_address } => {
                        self.test_mode_enter(network_address)
                    }
                    Request::TestModeExit => self.test_mode_exit(),
                    Request::TestRadioChannel { channel } => self.test_radio_channel(channel),
                    Request::TestRadioTxPower { power_dbm } => {
                        self.test_radio_tx_power(power_dbm)
                    }
                    Request::TestRadioDataTx {
                        bursts,
                        cca_duration_us,
                        tx_interval_us,
                        seq,
                        data,
                    } => self.test_radio_data_tx(bursts, cca_duration_us, tx_interval_us, seq, &data),
                    Request::TestRadioDataRx {
                        rx_enable,
                        indication_enable,
                    } => self.test_radio_data_rx(rx_enable, indication_enable),
                    Request::TestRadioDataRead => self.test_radio_data_read(),
                    Request::TestRadioMaxDataSize => self.test_radio_max_data_size(),
                };
                Ok(Some(confirmation.to_frame(frame.frame_id)))
            }

            Direction::Response => {
                if !self.queue.ack() {
                    debug!("response {code:?} with no indication in flight");
                }
                self.resume_reception_if_room();
                Ok(None)
            }

            // Node-to-host codes arriving from the host are a protocol
            // violation.
            Direction::Confirmation | Direction::Indication => {
                Err(DispatchError::UnsupportedFunction(frame.function))
            }
        }
    }

    /// Deliver the next pending indication as a wire frame, or `None` if
    /// nothing is pending or a delivery awaits its response.
    pub fn take_indication(&mut self) -> Option<Frame> {
        let (ind, queued) = self.queue.take()?;
        self.ind_frame_id = self.ind_frame_id.wrapping_add(1);
        Some(ind.to_frame(self.ind_frame_id, queued))
    }

    /// Number of pending indications, saturated to the wire counter.
    pub fn pending_indications(&mut self) -> u8 {
        self.queue.pump();
        self.queue.pending().min(u8::MAX as usize) as u8
    }

    /// Producer handle for contexts that queue indications directly
    /// (interrupt shims, driver callbacks).
    pub fn indication_sender(&self) -> IndicationSender {
        self.sender.clone()
    }

    /// The wrapped stack service.
    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Queue an indication from within the bridge task.
    pub(crate) fn notify(&mut self, ind: Indication) {
        // The queue consumer lives on this side, so pump to make room
        // before giving up.
        self.queue.pump();
        if let Err(ind) = self.sender.send(ind) {
            warn!("indication channel full, dropping {:?}", ind.kind());
        }
    }

    fn resume_reception_if_room(&mut self) {
        if self.reception_suspended && self.queue.has_room() {
            debug!("indication queue drained, re-enabling reception");
            self.stack.allow_reception(true);
            self.reception_suspended = false;
        }
    }

    fn suspend_reception(&mut self) {
        if !self.reception_suspended {
            warn!("indication queue full, suspending reception");
            self.stack.allow_reception(false);
            self.reception_suspended = true;
        }
    }

    /// Feed an APDU received by the stack.
    ///
    /// Filters by destination (this node, broadcast, or a multicast group
    /// the node belongs to). When the indication queue cannot hold the
    /// data, reception is suspended so the stack buffers it instead; it
    /// is re-enabled once the host drains the queue.
    pub fn on_data_received(&mut self, rx: ReceivedData) -> ReceiveResult {
        let for_us = rx.destination == self.stack.node_address()
            || rx.destination == BROADCAST_ADDRESS
            || (is_multicast_address(rx.destination)
                && self.mirror.is_group_member(rx.destination).unwrap_or_else(|err| {
                    warn!("group lookup failed, dropping multicast: {err}");
                    false
                }));
        if !for_us {
            return ReceiveResult::Ignored;
        }

        self.queue.pump();
        if !self.queue.has_room() {
            self.suspend_reception();
            return ReceiveResult::NoSpace;
        }

        let ind = Indication::DataRx {
            source: rx.source,
            destination: rx.destination,
            source_endpoint: rx.source_endpoint,
            destination_endpoint: rx.destination_endpoint,
            qos: rx.qos,
            hop_count: rx.hop_count,
            apdu: rx.apdu,
        };
        if self.sender.send(ind).is_err() {
            self.suspend_reception();
            return ReceiveResult::NoSpace;
        }
        ReceiveResult::Handled
    }

    /// Feed the completion of a tracked transmission.
    pub fn on_data_sent(
        &mut self,
        pdu_id: u16,
        source_endpoint: u8,
        destination_endpoint: u8,
        queue_time_ms: u32,
        result: nodelink_protocol::DataSentResult,
    ) {
        if !self.tracking.release(pdu_id) {
            debug!("sent event for untracked pdu_id {pdu_id}");
        }
        self.notify(Indication::DataTxSent {
            pdu_id,
            source_endpoint,
            destination_endpoint,
            queue_time_ms,
            result,
        });
    }

    /// Feed an app config received from the network.
    pub fn on_app_config(&mut self, config: nodelink_protocol::AppConfig) {
        self.notify(Indication::AppConfigRx { config });
    }

    /// Feed a stack state change that did not originate from a host
    /// request (e.g. a local watchdog stop).
    pub fn on_stack_state(&mut self, state: StackState) {
        self.notify(Indication::StackState { state });
    }

    /// Feed a raw packet from the test radio driver.
    pub fn on_test_packet(&mut self, rssi: i8, seq: u32, data: Vec<u8>) {
        if let Some(packet) = self.testmode.packet_received(rssi, seq, data) {
            self.notify(Indication::TestDataRx { packet });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_pool_limits() {
        let mut pool = TrackingPool::new(2);
        pool.reserve(1).unwrap();
        assert_eq!(pool.reserve(1), Err(TrackingError::Duplicate));
        pool.reserve(2).unwrap();
        assert_eq!(pool.reserve(3), Err(TrackingError::Full));

        assert!(pool.release(1));
        assert!(!pool.release(1));
        pool.reserve(3).unwrap();
    }
}
