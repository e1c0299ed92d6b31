//! Requests a host can issue to the node.
//!
//! Each request encodes to a frame payload and is answered by exactly one
//! [`crate::Confirmation`] carrying the same frame id. Multi-byte fields
//! are little-endian.

use crate::error::ProtocolError;
use crate::frame::{Frame, MAX_PAYLOAD_SIZE};
use crate::function_codes::FunctionCode;
use crate::types::*;

/// Requests a host can issue to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Queue an APDU for transmission on the data plane.
    DataTx {
        /// Host-chosen tracking id, echoed in the sent indication when
        /// tracking is requested. Ignored otherwise.
        pdu_id: u16,
        /// Destination node, group or broadcast address.
        destination: u32,
        /// Source endpoint.
        source_endpoint: u8,
        /// Destination endpoint.
        destination_endpoint: u8,
        /// Quality of service class, as the raw wire byte. Carried
        /// unchecked so an out-of-range value can be answered with an
        /// invalid-parameter confirmation instead of dropping the frame;
        /// see [`Qos::from_u8`].
        qos: u8,
        /// Request a sent indication once the APDU leaves the node.
        tracked: bool,
        /// Application payload (up to [`MAX_APDU_SIZE`] bytes).
        apdu: Vec<u8>,
    },

    /// Query the number of pending indications.
    IndicationPoll,

    /// Start the stack.
    StackStart {
        /// Persist the autostart option so the stack starts on boot.
        autostart: bool,
    },

    /// Stop the stack. Clears the persisted autostart option.
    StackStop,

    /// Write a management attribute.
    MsapAttrWrite {
        /// Attribute id.
        attr_id: u16,
        /// Attribute value (1..=[`MAX_ATTR_SIZE`] bytes).
        value: Vec<u8>,
    },

    /// Read a management attribute.
    MsapAttrRead {
        /// Attribute id.
        attr_id: u16,
    },

    /// Write the network-wide app config area.
    AppConfigWrite {
        /// New app config.
        config: AppConfig,
    },

    /// Read the current app config area.
    AppConfigRead,

    /// Write a configuration attribute.
    CsapAttrWrite {
        /// Attribute id.
        attr_id: u16,
        /// Attribute value (1..=[`MAX_ATTR_SIZE`] bytes).
        value: Vec<u8>,
    },

    /// Read a configuration attribute.
    CsapAttrRead {
        /// Attribute id.
        attr_id: u16,
    },

    /// Reset all configuration to factory defaults.
    FactoryReset,

    /// Enter radio test mode with a dedicated test network address.
    TestModeEnter {
        /// Network address used while in test mode.
        network_address: u32,
    },

    /// Exit radio test mode.
    TestModeExit,

    /// Set the raw radio channel for test transmissions.
    TestRadioChannel {
        /// Channel number.
        channel: u8,
    },

    /// Set the raw radio TX power level.
    TestRadioTxPower {
        /// TX power in dBm.
        power_dbm: i8,
    },

    /// Transmit a burst of raw test packets.
    TestRadioDataTx {
        /// Number of packets to transmit.
        bursts: u32,
        /// Clear channel assessment duration per packet in microseconds
        /// (0 disables CCA).
        cca_duration_us: u32,
        /// Interval between packets in microseconds.
        tx_interval_us: u32,
        /// Sequence number stamped into every packet of the burst.
        seq: u32,
        /// Packet payload (up to [`TEST_DATA_MAX_SIZE`] bytes).
        data: Vec<u8>,
    },

    /// Enable or disable raw radio reception.
    TestRadioDataRx {
        /// Enable the receiver.
        rx_enable: bool,
        /// Queue an indication for every received packet.
        indication_enable: bool,
    },

    /// Read the most recently received test packet.
    TestRadioDataRead,

    /// Query the maximum raw payload size the radio supports.
    TestRadioMaxDataSize,
}

/// Fixed prefix of the data TX payload before the APDU.
const DATA_TX_HEADER: usize = 10;

/// Burst control prefix of the test TX payload before the data bytes.
const TEST_TX_HEADER: usize = 17;

impl Request {
    /// Get the function code for this request.
    pub fn code(&self) -> FunctionCode {
        match self {
            Request::DataTx { .. } => FunctionCode::DataTxReq,
            Request::IndicationPoll => FunctionCode::IndicationPollReq,
            Request::StackStart { .. } => FunctionCode::StackStartReq,
            Request::StackStop => FunctionCode::StackStopReq,
            Request::MsapAttrWrite { .. } => FunctionCode::MsapAttrWriteReq,
            Request::MsapAttrRead { .. } => FunctionCode::MsapAttrReadReq,
            Request::AppConfigWrite { .. } => FunctionCode::AppConfigWriteReq,
            Request::AppConfigRead => FunctionCode::AppConfigReadReq,
            Request::CsapAttrWrite { .. } => FunctionCode::CsapAttrWriteReq,
            Request::CsapAttrRead { .. } => FunctionCode::CsapAttrReadReq,
            Request::FactoryReset => FunctionCode::FactoryResetReq,
            Request::TestModeEnter { .. } => FunctionCode::TestModeEnterReq,
            Request::TestModeExit => FunctionCode::TestModeExitReq,
            Request::TestRadioChannel { .. } => FunctionCode::TestRadioChannelReq,
            Request::TestRadioTxPower { .. } => FunctionCode::TestRadioTxPowerReq,
            Request::TestRadioDataTx { .. } => FunctionCode::TestRadioDataTxReq,
            Request::TestRadioDataRx { .. } => FunctionCode::TestRadioDataRxReq,
            Request::TestRadioDataRead => FunctionCode::TestRadioDataReadReq,
            Request::TestRadioMaxDataSize => FunctionCode::TestRadioMaxDataSizeReq,
        }
    }

    /// Encode the request payload to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MAX_PAYLOAD_SIZE);

        match self {
            Request::DataTx {
                pdu_id,
                destination,
                source_endpoint,
                destination_endpoint,
                qos,
                tracked,
                apdu,
            } => {
                buf.extend_from_slice(&pdu_id.to_le_bytes());
                buf.extend_from_slice(&destination.to_le_bytes());
                buf.push(*source_endpoint);
                buf.push(*destination_endpoint);
                buf.push(*qos);
                buf.push(u8::from(*tracked));
                buf.extend_from_slice(apdu);
            }

            Request::IndicationPoll
            | Request::StackStop
            | Request::AppConfigRead
            | Request::FactoryReset
            | Request::TestModeExit
            | Request::TestRadioDataRead
            | Request::TestRadioMaxDataSize => {}

            Request::StackStart { autostart } => {
                buf.push(u8::from(*autostart));
            }

            Request::MsapAttrWrite { attr_id, value }
            | Request::CsapAttrWrite { attr_id, value } => {
                buf.extend_from_slice(&attr_id.to_le_bytes());
                buf.extend_from_slice(value);
            }

            Request::MsapAttrRead { attr_id } | Request::CsapAttrRead { attr_id } => {
                buf.extend_from_slice(&attr_id.to_le_bytes());
            }

            Request::AppConfigWrite { config } => {
                buf.extend_from_slice(&config.diag_interval.to_le_bytes());
                buf.push(config.seq);
                buf.extend_from_slice(&config.data);
            }

            Request::TestModeEnter { network_address } => {
                buf.extend_from_slice(&network_address.to_le_bytes());
            }

            Request::TestRadioChannel { channel } => {
                buf.push(*channel);
            }

            Request::TestRadioTxPower { power_dbm } => {
                buf.push(*power_dbm as u8);
            }

            Request::TestRadioDataTx {
                bursts,
                cca_duration_us,
                tx_interval_us,
                seq,
                data,
            } => {
                buf.extend_from_slice(&bursts.to_le_bytes());
                buf.extend_from_slice(&cca_duration_us.to_le_bytes());
                buf.extend_from_slice(&tx_interval_us.to_le_bytes());
                buf.extend_from_slice(&seq.to_le_bytes());
                buf.push(data.len() as u8);
                buf.extend_from_slice(data);
            }

            Request::TestRadioDataRx {
                rx_enable,
                indication_enable,
            } => {
                buf.push(u8::from(*rx_enable));
                buf.push(u8::from(*indication_enable));
            }
        }

        buf
    }

    /// Build a complete wire frame for this request.
    pub fn to_frame(&self, frame_id: u8) -> Frame {
        Frame::new(self.code() as u8, frame_id, self.encode())
    }

    /// Decode a request from a function code and its payload.
    ///
    /// The code must be a request code; the payload length is checked
    /// against what the code requires.
    pub fn decode(code: FunctionCode, payload: &[u8]) -> Result<Request, ProtocolError> {
        let mismatch = || ProtocolError::LengthMismatch {
            function: code as u8,
            actual: payload.len(),
        };

        match code {
            FunctionCode::DataTxReq => {
                if payload.len() < DATA_TX_HEADER
                    || payload.len() > DATA_TX_HEADER + MAX_APDU_SIZE
                {
                    return Err(mismatch());
                }
                Ok(Request::DataTx {
                    pdu_id: u16::from_le_bytes([payload[0], payload[1]]),
                    destination: u32::from_le_bytes([
                        payload[2], payload[3], payload[4], payload[5],
                    ]),
                    source_endpoint: payload[6],
                    destination_endpoint: payload[7],
                    qos: payload[8],
                    tracked: payload[9] & 0x01 != 0,
                    apdu: payload[DATA_TX_HEADER..].to_vec(),
                })
            }

            FunctionCode::IndicationPollReq => match payload {
                [] => Ok(Request::IndicationPoll),
                _ => Err(mismatch()),
            },

            FunctionCode::StackStartReq => match payload {
                [options] => Ok(Request::StackStart {
                    autostart: options & 0x01 != 0,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::StackStopReq => match payload {
                [] => Ok(Request::StackStop),
                _ => Err(mismatch()),
            },

            FunctionCode::MsapAttrWriteReq | FunctionCode::CsapAttrWriteReq => {
                if payload.len() < 3 || payload.len() > 2 + MAX_ATTR_SIZE {
                    return Err(mismatch());
                }
                let attr_id = u16::from_le_bytes([payload[0], payload[1]]);
                let value = payload[2..].to_vec();
                Ok(if code == FunctionCode::MsapAttrWriteReq {
                    Request::MsapAttrWrite { attr_id, value }
                } else {
                    Request::CsapAttrWrite { attr_id, value }
                })
            }

            FunctionCode::MsapAttrReadReq | FunctionCode::CsapAttrReadReq => match payload {
                [lo, hi] => {
                    let attr_id = u16::from_le_bytes([*lo, *hi]);
                    Ok(if code == FunctionCode::MsapAttrReadReq {
                        Request::MsapAttrRead { attr_id }
                    } else {
                        Request::CsapAttrRead { attr_id }
                    })
                }
                _ => Err(mismatch()),
            },

            FunctionCode::AppConfigWriteReq => {
                if payload.len() != 3 + APP_CONFIG_SIZE {
                    return Err(mismatch());
                }
                let mut data = [0u8; APP_CONFIG_SIZE];
                data.copy_from_slice(&payload[3..]);
                Ok(Request::AppConfigWrite {
                    config: AppConfig {
                        diag_interval: u16::from_le_bytes([payload[0], payload[1]]),
                        seq: payload[2],
                        data,
                    },
                })
            }

            FunctionCode::AppConfigReadReq => match payload {
                [] => Ok(Request::AppConfigRead),
                _ => Err(mismatch()),
            },

            FunctionCode::FactoryResetReq => match payload {
                [] => Ok(Request::FactoryReset),
                _ => Err(mismatch()),
            },

            FunctionCode::TestModeEnterReq => match payload {
                [a, b, c, d] => Ok(Request::TestModeEnter {
                    network_address: u32::from_le_bytes([*a, *b, *c, *d]),
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestModeExitReq => match payload {
                [] => Ok(Request::TestModeExit),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioChannelReq => match payload {
                [channel] => Ok(Request::TestRadioChannel { channel: *channel }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioTxPowerReq => match payload {
                [power] => Ok(Request::TestRadioTxPower {
                    power_dbm: *power as i8,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioDataTxReq => {
                if payload.len() < TEST_TX_HEADER {
                    return Err(mismatch());
                }
                let len = payload[16] as usize;
                if len > TEST_DATA_MAX_SIZE || payload.len() != TEST_TX_HEADER + len {
                    return Err(mismatch());
                }
                Ok(Request::TestRadioDataTx {
                    bursts: u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]),
                    cca_duration_us: u32::from_le_bytes([
                        payload[4], payload[5], payload[6], payload[7],
                    ]),
                    tx_interval_us: u32::from_le_bytes([
                        payload[8], payload[9], payload[10], payload[11],
                    ]),
                    seq: u32::from_le_bytes([
                        payload[12], payload[13], payload[14], payload[15],
                    ]),
                    data: payload[TEST_TX_HEADER..].to_vec(),
                })
            }

            FunctionCode::TestRadioDataRxReq => match payload {
                [rx, ind] => Ok(Request::TestRadioDataRx {
                    rx_enable: *rx != 0,
                    indication_enable: *ind != 0,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioDataReadReq => match payload {
                [] => Ok(Request::TestRadioDataRead),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioMaxDataSizeReq => match payload {
                [] => Ok(Request::TestRadioMaxDataSize),
                _ => Err(mismatch()),
            },

            other => Err(ProtocolError::UnknownFunction(other as u8)),
        }
    }

    /// Decode a request from a wire frame.
    pub fn from_frame(frame: &Frame) -> Result<Request, ProtocolError> {
        let code = FunctionCode::from_u8(frame.function)
            .ok_or(ProtocolError::UnknownFunction(frame.function))?;
        Request::decode(code, &frame.payload)
    }
}
