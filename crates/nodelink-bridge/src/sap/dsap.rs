//! Data-plane handlers.

use log::trace;
use nodelink_protocol::{Confirmation, DataTxResult, Qos, StackState, MAX_APDU_SIZE};

use crate::dispatcher::{Bridge, TrackingError};
use crate::stack::{DataTx, SendError, StackService, TestRadio};
use crate::storage::PersistentStorage;

/// First endpoint reserved for stack-internal services.
pub const RESERVED_ENDPOINT_START: u8 = 240;

impl<S: StackService, R: TestRadio, P: PersistentStorage> Bridge<S, R, P> {
    pub(crate) fn data_tx(
        &mut self,
        pdu_id: u16,
        destination: u32,
        source_endpoint: u8,
        destination_endpoint: u8,
        qos: u8,
        tracked: bool,
        apdu: Vec<u8>,
    ) -> Confirmation {
        let result = self.data_tx_inner(
            pdu_id,
            destination,
            source_endpoint,
            destination_endpoint,
            qos,
            tracked,
            apdu,
        );
        trace!("data tx pdu_id={pdu_id} -> {result:?}");
        Confirmation::DataTx {
            result,
            pdu_id,
            buffer_capacity: self.stack.free_buffers(),
        }
    }

    fn data_tx_inner(
        &mut self,
        pdu_id: u16,
        destination: u32,
        source_endpoint: u8,
        destination_endpoint: u8,
        qos: u8,
        tracked: bool,
        apdu: Vec<u8>,
    ) -> DataTxResult {
        if self.testmode.is_active() {
            return DataTxResult::AccessDenied;
        }
        if self.stack.state() == StackState::Stopped {
            return DataTxResult::StackStopped;
        }
        // The wire carries the qos class as a raw byte.
        let Some(qos) = Qos::from_u8(qos) else {
            return DataTxResult::InvalidQos;
        };
        if apdu.is_empty() || apdu.len() > MAX_APDU_SIZE {
            return DataTxResult::InvalidLen;
        }
        if source_endpoint >= RESERVED_ENDPOINT_START
            || destination_endpoint >= RESERVED_ENDPOINT_START
        {
            return DataTxResult::ReservedEp;
        }
        if destination == 0 || destination == self.stack.node_address() {
            return DataTxResult::UnknownDst;
        }
        if tracked {
            match self.tracking.reserve(pdu_id) {
                Ok(()) => {}
                Err(TrackingError::Full) => return DataTxResult::IndFull,
                Err(TrackingError::Duplicate) => return DataTxResult::InvalidPduId,
            }
        }

        let send = self.stack.send(DataTx {
            destination,
            source_endpoint,
            destination_endpoint,
            qos,
            apdu,
        });
        match send {
            Ok(()) => DataTxResult::Success,
            Err(err) => {
                if tracked {
                    self.tracking.release(pdu_id);
                }
                match err {
                    SendError::OutOfMemory => DataTxResult::OutOfMemory,
                    SendError::UnknownDestination => DataTxResult::UnknownDst,
                }
            }
        }
    }
}
