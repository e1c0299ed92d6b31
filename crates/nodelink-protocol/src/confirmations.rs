//! Confirmations the node returns for each request.
//!
//! A confirmation's function code is its request code with the high bit
//! set, and its frame id echoes the request's. Multi-byte fields are
//! little-endian.

use crate::error::ProtocolError;
use crate::frame::{Frame, MAX_PAYLOAD_SIZE};
use crate::function_codes::FunctionCode;
use crate::types::*;

/// Confirmations the node returns for each request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Reply to [`crate::Request::DataTx`].
    DataTx {
        /// Outcome of the queueing attempt.
        result: DataTxResult,
        /// Tracking id echoed from the request.
        pdu_id: u16,
        /// Transmission buffers still free after this request.
        buffer_capacity: u8,
    },

    /// Reply to [`crate::Request::IndicationPoll`].
    IndicationPoll {
        /// Number of indications waiting for delivery.
        pending: u8,
    },

    /// Reply to [`crate::Request::StackStart`].
    StackStart {
        /// Outcome of the start attempt.
        result: StackControlResult,
    },

    /// Reply to [`crate::Request::StackStop`].
    StackStop {
        /// Outcome of the stop attempt.
        result: StackControlResult,
    },

    /// Reply to [`crate::Request::MsapAttrWrite`].
    MsapAttrWrite {
        /// Outcome of the write.
        result: AttrResult,
    },

    /// Reply to [`crate::Request::MsapAttrRead`].
    MsapAttrRead {
        /// Outcome of the read.
        result: AttrResult,
        /// Attribute id echoed from the request.
        attr_id: u16,
        /// Attribute value, empty unless the read succeeded.
        value: Vec<u8>,
    },

    /// Reply to [`crate::Request::AppConfigWrite`].
    AppConfigWrite {
        /// Outcome of the write.
        result: AppConfigResult,
    },

    /// Reply to [`crate::Request::AppConfigRead`].
    AppConfigRead {
        /// Outcome of the read.
        result: AppConfigResult,
        /// App config, present only on success.
        config: Option<AppConfig>,
    },

    /// Reply to [`crate::Request::CsapAttrWrite`].
    CsapAttrWrite {
        /// Outcome of the write.
        result: AttrResult,
    },

    /// Reply to [`crate::Request::CsapAttrRead`].
    CsapAttrRead {
        /// Outcome of the read.
        result: AttrResult,
        /// Attribute id echoed from the request.
        attr_id: u16,
        /// Attribute value, empty unless the read succeeded.
        value: Vec<u8>,
    },

    /// Reply to [`crate::Request::FactoryReset`].
    FactoryReset {
        /// Outcome of the reset.
        result: AttrResult,
    },

    /// Reply to [`crate::Request::TestModeEnter`].
    TestModeEnter {
        /// Outcome of the entry attempt.
        result: TestModeEnterResult,
    },

    /// Reply to [`crate::Request::TestModeExit`].
    TestModeExit {
        /// Outcome of the exit attempt.
        result: TestModeExitResult,
    },

    /// Reply to [`crate::Request::TestRadioChannel`].
    TestRadioChannel {
        /// Outcome of the channel selection.
        result: TestRadioChannelResult,
    },

    /// Reply to [`crate::Request::TestRadioTxPower`].
    TestRadioTxPower {
        /// Outcome of the power selection.
        result: TestRadioTxPowerResult,
    },

    /// Reply to [`crate::Request::TestRadioDataTx`].
    TestRadioDataTx {
        /// Outcome of the burst.
        result: TestRadioSendResult,
        /// Packets actually transmitted before the burst ended.
        sent_bursts: u32,
    },

    /// Reply to [`crate::Request::TestRadioDataRx`].
    TestRadioDataRx {
        /// Outcome of the reception control.
        result: TestRadioReceptionResult,
    },

    /// Reply to [`crate::Request::TestRadioDataRead`].
    TestRadioDataRead {
        /// Outcome of the read.
        result: TestRadioReadResult,
        /// Captured packet, present only on success.
        packet: Option<TestPacketSnapshot>,
    },

    /// Reply to [`crate::Request::TestRadioMaxDataSize`].
    TestRadioMaxDataSize {
        /// Outcome of the query.
        result: TestRadioMaxDataSizeResult,
        /// Maximum raw payload size in bytes, 0 when rejected.
        size: u8,
    },
}

impl Confirmation {
    /// Get the function code for this confirmation.
    pub fn code(&self) -> FunctionCode {
        match self {
            Confirmation::DataTx { .. } => FunctionCode::DataTxCnf,
            Confirmation::IndicationPoll { .. } => FunctionCode::IndicationPollCnf,
            Confirmation::StackStart { .. } => FunctionCode::StackStartCnf,
            Confirmation::StackStop { .. } => FunctionCode::StackStopCnf,
            Confirmation::MsapAttrWrite { .. } => FunctionCode::MsapAttrWriteCnf,
            Confirmation::MsapAttrRead { .. } => FunctionCode::MsapAttrReadCnf,
            Confirmation::AppConfigWrite { .. } => FunctionCode::AppConfigWriteCnf,
            Confirmation::AppConfigRead { .. } => FunctionCode::AppConfigReadCnf,
            Confirmation::CsapAttrWrite { .. } => FunctionCode::CsapAttrWriteCnf,
            Confirmation::CsapAttrRead { .. } => FunctionCode::CsapAttrReadCnf,
            Confirmation::FactoryReset { .. } => FunctionCode::FactoryResetCnf,
            Confirmation::TestModeEnter { .. } => FunctionCode::TestModeEnterCnf,
            Confirmation::TestModeExit { .. } => FunctionCode::TestModeExitCnf,
            Confirmation::TestRadioChannel { .. } => FunctionCode::TestRadioChannelCnf,
            Confirmation::TestRadioTxPower { .. } => FunctionCode::TestRadioTxPowerCnf,
            Confirmation::TestRadioDataTx { .. } => FunctionCode::TestRadioDataTxCnf,
            Confirmation::TestRadioDataRx { .. } => FunctionCode::TestRadioDataRxCnf,
            Confirmation::TestRadioDataRead { .. } => FunctionCode::TestRadioDataReadCnf,
            Confirmation::TestRadioMaxDataSize { .. } => FunctionCode::TestRadioMaxDataSizeCnf,
        }
    }

    /// Encode the confirmation payload to bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(MAX_PAYLOAD_SIZE);

        match self {
            Confirmation::DataTx {
                result,
                pdu_id,
                buffer_capacity,
            } => {
                buf.push(*result as u8);
                buf.extend_from_slice(&pdu_id.to_le_bytes());
                buf.push(*buffer_capacity);
            }

            Confirmation::IndicationPoll { pending } => {
                buf.push(*pending);
            }

            Confirmation::StackStart { result } | Confirmation::StackStop { result } => {
                buf.push(*result as u8);
            }

            Confirmation::MsapAttrWrite { result }
            | Confirmation::CsapAttrWrite { result }
            | Confirmation::FactoryReset { result } => {
                buf.push(*result as u8);
            }

            Confirmation::MsapAttrRead {
                result,
                attr_id,
                value,
            }
            | Confirmation::CsapAttrRead {
                result,
                attr_id,
                value,
            } => {
                buf.push(*result as u8);
                buf.extend_from_slice(&attr_id.to_le_bytes());
                buf.extend_from_slice(value);
            }

            Confirmation::AppConfigWrite { result } => {
                buf.push(*result as u8);
            }

            Confirmation::AppConfigRead { result, config } => {
                buf.push(*result as u8);
                if let Some(config) = config {
                    buf.extend_from_slice(&config.diag_interval.to_le_bytes());
                    buf.push(config.seq);
                    buf.extend_from_slice(&config.data);
                }
            }

            Confirmation::TestModeEnter { result } => buf.push(*result as u8),
            Confirmation::TestModeExit { result } => buf.push(*result as u8),
            Confirmation::TestRadioChannel { result } => buf.push(*result as u8),
            Confirmation::TestRadioTxPower { result } => buf.push(*result as u8),

            Confirmation::TestRadioDataTx {
                result,
                sent_bursts,
            } => {
                buf.push(*result as u8);
                buf.extend_from_slice(&sent_bursts.to_le_bytes());
            }

            Confirmation::TestRadioDataRx { result } => buf.push(*result as u8),

            Confirmation::TestRadioDataRead { result, packet } => {
                buf.push(*result as u8);
                if let Some(packet) = packet {
                    buf.push(packet.rssi as u8);
                    buf.extend_from_slice(&packet.rx_count.to_le_bytes());
                    buf.extend_from_slice(&packet.dup_count.to_le_bytes());
                    buf.extend_from_slice(&packet.seq.to_le_bytes());
                    buf.push(packet.data.len() as u8);
                    buf.extend_from_slice(&packet.data);
                }
            }

            Confirmation::TestRadioMaxDataSize { result, size } => {
                buf.push(*result as u8);
                buf.push(*size);
            }
        }

        buf
    }

    /// Build a complete wire frame, echoing the request's frame id.
    pub fn to_frame(&self, frame_id: u8) -> Frame {
        Frame::new(self.code() as u8, frame_id, self.encode())
    }

    /// Decode a confirmation from a function code and its payload.
    pub fn decode(code: FunctionCode, payload: &[u8]) -> Result<Confirmation, ProtocolError> {
        let mismatch = || ProtocolError::LengthMismatch {
            function: code as u8,
            actual: payload.len(),
        };

        match code {
            FunctionCode::DataTxCnf => match payload {
                [result, lo, hi, capacity] => Ok(Confirmation::DataTx {
                    result: DataTxResult::from_u8(*result)?,
                    pdu_id: u16::from_le_bytes([*lo, *hi]),
                    buffer_capacity: *capacity,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::IndicationPollCnf => match payload {
                [pending] => Ok(Confirmation::IndicationPoll { pending: *pending }),
                _ => Err(mismatch()),
            },

            FunctionCode::StackStartCnf => match payload {
                [result] => Ok(Confirmation::StackStart {
                    result: StackControlResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::StackStopCnf => match payload {
                [result] => Ok(Confirmation::StackStop {
                    result: StackControlResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::MsapAttrWriteCnf => match payload {
                [result] => Ok(Confirmation::MsapAttrWrite {
                    result: AttrResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::CsapAttrWriteCnf => match payload {
                [result] => Ok(Confirmation::CsapAttrWrite {
                    result: AttrResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::FactoryResetCnf => match payload {
                [result] => Ok(Confirmation::FactoryReset {
                    result: AttrResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::MsapAttrReadCnf | FunctionCode::CsapAttrReadCnf => {
                if payload.len() < 3 || payload.len() > 3 + MAX_ATTR_SIZE {
                    return Err(mismatch());
                }
                let result = AttrResult::from_u8(payload[0])?;
                let attr_id = u16::from_le_bytes([payload[1], payload[2]]);
                let value = payload[3..].to_vec();
                Ok(if code == FunctionCode::MsapAttrReadCnf {
                    Confirmation::MsapAttrRead {
                        result,
                        attr_id,
                        value,
                    }
                } else {
                    Confirmation::CsapAttrRead {
                        result,
                        attr_id,
                        value,
                    }
                })
            }

            FunctionCode::AppConfigWriteCnf => match payload {
                [result] => Ok(Confirmation::AppConfigWrite {
                    result: AppConfigResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::AppConfigReadCnf => {
                if payload.is_empty() {
                    return Err(mismatch());
                }
                let result = AppConfigResult::from_u8(payload[0])?;
                let config = match payload.len() {
                    1 => None,
                    n if n == 4 + APP_CONFIG_SIZE => {
                        let mut data = [0u8; APP_CONFIG_SIZE];
                        data.copy_from_slice(&payload[4..]);
                        Some(AppConfig {
                            diag_interval: u16::from_le_bytes([payload[1], payload[2]]),
                            seq: payload[3],
                            data,
                        })
                    }
                    _ => return Err(mismatch()),
                };
                Ok(Confirmation::AppConfigRead { result, config })
            }

            FunctionCode::TestModeEnterCnf => match payload {
                [result] => Ok(Confirmation::TestModeEnter {
                    result: TestModeEnterResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestModeExitCnf => match payload {
                [result] => Ok(Confirmation::TestModeExit {
                    result: TestModeExitResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioChannelCnf => match payload {
                [result] => Ok(Confirmation::TestRadioChannel {
                    result: TestRadioChannelResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioTxPowerCnf => match payload {
                [result] => Ok(Confirmation::TestRadioTxPower {
                    result: TestRadioTxPowerResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioDataTxCnf => match payload {
                [result, a, b, c, d] => Ok(Confirmation::TestRadioDataTx {
                    result: TestRadioSendResult::from_u8(*result)?,
                    sent_bursts: u32::from_le_bytes([*a, *b, *c, *d]),
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioDataRxCnf => match payload {
                [result] => Ok(Confirmation::TestRadioDataRx {
                    result: TestRadioReceptionResult::from_u8(*result)?,
                }),
                _ => Err(mismatch()),
            },

            FunctionCode::TestRadioDataReadCnf => {
                if payload.is_empty() {
                    return Err(mismatch());
                }
                let result = TestRadioReadResult::from_u8(payload[0])?;
                let packet = if payload.len() == 1 {
                    None
                } else {
                    if payload.len() < 15 {
                        return Err(mismatch());
                    }
                    let len = payload[14] as usize;
                    if len > TEST_DATA_MAX_SIZE || payload.len() != 15 + len {
                        return Err(mismatch());
                    }
                    Some(TestPacketSnapshot {
                        rssi: payload[1] as i8,
                        rx_count: u32::from_le_bytes([
                            payload[2], payload[3], payload[4], payload[5],
                        ]),
                        dup_count: u32::from_le_bytes([
                            payload[6], payload[7], payload[8], payload[9],
                        ]),
                        seq: u32::from_le_bytes([
                            payload[10],
                            payload[11],
                            payload[12],
                            payload[13],
                        ]),
                        data: payload[15..].to_vec(),
                    })
                };
                Ok(Confirmation::TestRadioDataRead { result, packet })
            }

            FunctionCode::TestRadioMaxDataSizeCnf => match payload {
                [result, size] => Ok(Confirmation::TestRadioMaxDataSize {
                    result: TestRadioMaxDataSizeResult::from_u8(*result)?,
                    size: *size,
                }),
                _ => Err(mismatch()),
            },

            other => Err(ProtocolError::UnknownFunction(other as u8)),
        }
    }

    /// Decode a confirmation from a wire frame.
    pub fn from_frame(frame: &Frame) -> Result<Confirmation, ProtocolError> {
        let code = FunctionCode::from_u8(frame.function)
            .ok_or(ProtocolError::UnknownFunction(frame.function))?;
        Confirmation::decode(code, &frame.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cnf_code_mirrors_request_code() {
        let cnf = Confirmation::StackStart {
            result: StackControlResult::Success,
        };
        assert_eq!(
            cnf.code() as u8,
            FunctionCode::StackStartReq as u8 | 0x80
        );
    }

    #[test]
    fn test_data_tx_cnf_round_trip() {
        let cnf = Confirmation::DataTx {
            result: DataTxResult::Success,
            pdu_id: 0xBEEF,
            buffer_capacity: 12,
        };
        assert_eq!(Confirmation::from_frame(&cnf.to_frame(3)).unwrap(), cnf);
    }

    #[test]
    fn test_attr_read_cnf_carries_value_only_on_success() {
        let ok = Confirmation::CsapAttrRead {
            result: AttrResult::Success,
            attr_id: 1,
            value: vec![0x44, 0x33, 0x22, 0x11],
        };
        assert_eq!(Confirmation::decode(ok.code(), &ok.encode()).unwrap(), ok);

        let failed = Confirmation::CsapAttrRead {
            result: AttrResult::Unsupported,
            attr_id: 99,
            value: vec![],
        };
        assert_eq!(
            Confirmation::decode(failed.code(), &failed.encode()).unwrap(),
            failed
        );
    }

    #[test]
    fn test_radio_read_cnf_with_packet() {
        let cnf = Confirmation::TestRadioDataRead {
            result: TestRadioReadResult::Success,
            packet: Some(TestPacketSnapshot {
                rssi: -70,
                rx_count: 120,
                dup_count: 3,
                seq: 55,
                data: vec![1, 2, 3],
            }),
        };
        assert_eq!(Confirmation::decode(cnf.code(), &cnf.encode()).unwrap(), cnf);

        let empty = Confirmation::TestRadioDataRead {
            result: TestRadioReadResult::NoData,
            packet: None,
        };
        assert_eq!(
            Confirmation::decode(empty.code(), &empty.encode()).unwrap(),
            empty
        );
    }

    #[test]
    fn test_unknown_result_code_rejected() {
        assert!(matches!(
            Confirmation::decode(FunctionCode::StackStartCnf, &[0xEE]),
            Err(ProtocolError::UnknownResultCode(0xEE))
        ));
    }
}
