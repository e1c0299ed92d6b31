//! Indications the node queues for the host.
//!
//! Indications are not pushed: the node raises the indication-pending line,
//! the host polls, and each delivered indication is acknowledged with a
//! response frame. The first payload byte of every indication is the number
//! of indications still queued after this one, so the host knows whether to
//! keep draining.

use crate::error::ProtocolError;
use crate::frame::{Frame, MAX_PAYLOAD_SIZE};
use crate::function_codes::FunctionCode;
use crate::types::*;

/// Discriminant of an indication, used for queue bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicationKind {
    /// Received APDU.
    DataRx,
    /// Tracked APDU left the node.
    DataTxSent,
    /// Stack state changed.
    StackState,
    /// New app config arrived from the network.
    AppConfigRx,
    /// Raw test packet received.
    TestDataRx,
}

/// Indications the node queues for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indication {
    /// An APDU addressed to this node arrived.
    DataRx {
        /// Originating node address.
        source: u32,
        /// Destination address the APDU was sent to (this node, a group
        /// this node belongs to, or broadcast).
        destination: u32,
        /// Source endpoint.
        source_endpoint: u8,
        /// Destination endpoint.
        destination_endpoint: u8,
        /// Quality of service class the APDU travelled with.
        qos: Qos,
        /// Number of hops the APDU took.
        hop_count: u8,
        /// Application payload.
        apdu: Vec<u8>,
    },

    /// A tracked APDU left the node, or its time-to-live expired.
    DataTxSent {
        /// Tracking id from the originating request.
        pdu_id: u16,
        /// Source endpoint from the originating request.
        source_endpoint: u8,
        /// Destination endpoint from the originating request.
        destination_endpoint: u8,
        /// Milliseconds the APDU spent queued in the node.
        queue_time_ms: u32,
        /// Whether the APDU was transmitted or timed out.
        result: DataSentResult,
    },

    /// The stack changed state.
    StackState {
        /// New stack state.
        state: StackState,
    },

    /// A new app config arrived from the network.
    AppConfigRx {
        /// The received config.
        config: AppConfig,
    },

    /// A raw test packet was received while test reception indications
    /// are enabled.
    TestDataRx {
        /// Captured packet and reception counters.
        packet: TestPacketSnapshot,
    },
}

/// Fixed prefix of the data RX payload after the queued byte.
const DATA_RX_HEADER: usize = 12;

impl Indication {
    /// Get the kind of this indication.
    pub fn kind(&self) -> IndicationKind {
        match self {
            Indication::DataRx { .. } => IndicationKind::DataRx,
            Indication::DataTxSent { .. } => IndicationKind::DataTxSent,
            Indication::StackState { .. } => IndicationKind::StackState,
            Indication::AppConfigRx { .. } => IndicationKind::AppConfigRx,
            Indication::TestDataRx { .. } => IndicationKind::TestDataRx,
        }
    }

    /// Get the function code for this indication.
    pub fn code(&self) -> FunctionCode {
        match self.kind() {
            IndicationKind::DataRx => FunctionCode::DataRxInd,
            IndicationKind::DataTxSent => FunctionCode::DataTxInd,
            IndicationKind::StackState => FunctionCode::StackStateInd,
            IndicationKind::AppConfigRx => FunctionCode::AppConfigRxInd,
            IndicationKind::TestDataRx => FunctionCode::TestDataRxInd,
        }
    }

    /// Encode the indication payload. `queued` is the number of
    /// indications still pending after this one.
    pub fn encode(&self, queued: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MAX_PAYLOAD_SIZE);
        buf.push(queued);

        match self {
            Indication::DataRx {
                source,
                destination,
                source_endpoint,
                destination_endpoint,
                qos,
                hop_count,
                apdu,
            } => {
                buf.extend_from_slice(&source.to_le_bytes());
                buf.extend_from_slice(&destination.to_le_bytes());
                buf.push(*source_endpoint);
                buf.push(*destination_endpoint);
                buf.push(*qos as u8);
                buf.push(*hop_count);
                buf.extend_from_slice(apdu);
            }

            Indication::DataTxSent {
                pdu_id,
                source_endpoint,
                destination_endpoint,
                queue_time_ms,
                result,
            } => {
                buf.extend_from_slice(&pdu_id.to_le_bytes());
                buf.push(*source_endpoint);
                buf.push(*destination_endpoint);
                buf.extend_from_slice(&queue_time_ms.to_le_bytes());
                buf.push(*result as u8);
            }

            Indication::StackState { state } => {
                buf.push(*state as u8);
            }

            Indication::AppConfigRx { config } => {
                buf.extend_from_slice(&config.diag_interval.to_le_bytes());
                buf.push(config.seq);
                buf.extend_from_slice(&config.data);
            }

            Indication::TestDataRx { packet } => {
                buf.push(packet.rssi as u8);
                buf.extend_from_slice(&packet.rx_count.to_le_bytes());
                buf.extend_from_slice(&packet.dup_count.to_le_bytes());
                buf.extend_from_slice(&packet.seq.to_le_bytes());
                buf.push(packet.data.len() as u8);
                buf.extend_from_slice(&packet.data);
            }
        }

        buf
    }

    /// Build a complete wire frame for this indication.
    pub fn to_frame(&self, frame_id: u8, queued: u8) -> Frame {
        Frame::new(self.code() as u8, frame_id, self.encode(queued))
    }

    /// Decode an indication from a function code and its payload.
    ///
    /// Returns the indication and the queued-indications byte.
    pub fn decode(code: FunctionCode, payload: &[u8]) -> Result<(Indication, u8), ProtocolError> {
        let mismatch = || ProtocolError::LengthMismatch {
            function: code as u8,
            actual: payload.len(),
        };

        let (&queued, body) = payload.split_first().ok_or_else(mismatch)?;

        let ind = match code {
            FunctionCode::DataRxInd => {
                if body.len() < DATA_RX_HEADER || body.len() > DATA_RX_HEADER + MAX_APDU_SIZE {
                    return Err(mismatch());
                }
                let qos_byte = body[10];
                let qos = Qos::from_u8(qos_byte).ok_or_else(|| {
                    ProtocolError::InvalidData(format!("unknown qos class {qos_byte}"))
                })?;
                Indication::DataRx {
                    source: u32::from_le_bytes([body[0], body[1], body[2], body[3]]),
                    destination: u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
                    source_endpoint: body[8],
                    destination_endpoint: body[9],
                    qos,
                    hop_count: body[11],
                    apdu: body[DATA_RX_HEADER..].to_vec(),
                }
            }

            FunctionCode::DataTxInd => match body {
                [lo, hi, src_ep, dst_ep, t0, t1, t2, t3, result] => Indication::DataTxSent {
                    pdu_id: u16::from_le_bytes([*lo, *hi]),
                    source_endpoint: *src_ep,
                    destination_endpoint: *dst_ep,
                    queue_time_ms: u32::from_le_bytes([*t0, *t1, *t2, *t3]),
                    result: DataSentResult::from_u8(*result)?,
                },
                _ => return Err(mismatch()),
            },

            FunctionCode::StackStateInd => match body {
                [state] => Indication::StackState {
                    state: StackState::from_u8(*state)?,
                },
                _ => return Err(mismatch()),
            },

            FunctionCode::AppConfigRxInd => {
                if body.len() != 3 + APP_CONFIG_SIZE {
                    return Err(mismatch());
                }
                let mut data = [0u8; APP_CONFIG_SIZE];
                data.copy_from_slice(&body[3..]);
                Indication::AppConfigRx {
                    config: AppConfig {
                        diag_interval: u16::from_le_bytes([body[0], body[1]]),
                        seq: body[2],
                        data,
                    },
                }
            }

            FunctionCode::TestDataRxInd => {
                if body.len() < 14 {
                    return Err(mismatch());
                }
                let len = body[13] as usize;
                if len > TEST_DATA_MAX_SIZE || body.len() != 14 + len {
                    return Err(mismatch());
                }
                Indication::TestDataRx {
                    packet: TestPacketSnapshot {
                        rssi: body[0] as i8,
                        rx_count: u32::from_le_bytes([body[1], body[2], body[3], body[4]]),
                        dup_count: u32::from_le_bytes([body[5], body[6], body[7], body[8]]),
                        seq: u32::from_le_bytes([body[9], body[10], body[11], body[12]]),
                        data: body[14..].to_vec(),
                    },
                }
            }

            other => return Err(ProtocolError::UnknownFunction(other as u8)),
        };

        Ok((ind, queued))
    }

    /// Decode an indication from a wire frame.
    pub fn from_frame(frame: &Frame) -> Result<(Indication, u8), ProtocolError> {
        let code = FunctionCode::from_u8(frame.function)
            .ok_or(ProtocolError::UnknownFunction(frame.function))?;
        Indication::decode(code, &frame.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_rx_round_trip() {
        let ind = Indication::DataRx {
            source: 0x0000_1234,
            destination: BROADCAST_ADDRESS,
            source_endpoint: 1,
            destination_endpoint: 2,
            qos: Qos::Normal,
            hop_count: 3,
            apdu: vec![0x10, 0x20, 0x30],
        };
        let frame = ind.to_frame(0, 5);
        let (decoded, queued) = Indication::from_frame(&frame).unwrap();
        assert_eq!(decoded, ind);
        assert_eq!(queued, 5);
    }

    #[test]
    fn test_queued_byte_is_first() {
        let ind = Indication::StackState {
            state: StackState::Started,
        };
        let payload = ind.encode(9);
        assert_eq!(payload, vec![9, 0]);
    }

    #[test]
    fn test_sent_indication_round_trip() {
        let ind = Indication::DataTxSent {
            pdu_id: 0x0102,
            source_endpoint: 4,
            destination_endpoint: 5,
            queue_time_ms: 1500,
            result: DataSentResult::Timeout,
        };
        let (decoded, queued) = Indication::decode(ind.code(), &ind.encode(0)).unwrap();
        assert_eq!(decoded, ind);
        assert_eq!(queued, 0);
    }

    #[test]
    fn test_test_data_rx_round_trip() {
        let ind = Indication::TestDataRx {
            packet: TestPacketSnapshot {
                rssi: -88,
                rx_count: 7,
                dup_count: 1,
                seq: 99,
                data: vec![0xAA; 10],
            },
        };
        let (decoded, _) = Indication::decode(ind.code(), &ind.encode(2)).unwrap();
        assert_eq!(decoded, ind);
    }

    #[test]
    fn test_empty_payload_rejected() {
        assert!(Indication::decode(FunctionCode::StackStateInd, &[]).is_err());
    }
}
