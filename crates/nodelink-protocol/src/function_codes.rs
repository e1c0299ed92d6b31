//! Function codes and their classification.
//!
//! Every primitive on the link is identified by an 8-bit function code. A
//! code has exactly one direction (request, confirmation, indication or
//! response) and belongs to exactly one service access point. Confirmation
//! codes are always the request code with the high bit set, and likewise
//! response codes mirror indication codes.
//!
//! Classification is a closed mapping over the [`FunctionCode`] enum, so
//! adding a code without direction and category is a compile error. The
//! raw-byte helpers ([`is_request`] and friends) never fail: an unknown
//! byte is simply a member of no set.

/// Direction of a primitive on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host-issued request, answered by exactly one confirmation.
    Request,
    /// Node's synchronous reply to a request.
    Confirmation,
    /// Asynchronous node-to-host event.
    Indication,
    /// Host's acknowledgement of a delivered indication.
    Response,
}

/// Service access point a function code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SapCategory {
    /// Data plane: application payload transport.
    Data,
    /// Management plane: stack lifecycle, indications, app config,
    /// management attributes.
    Management,
    /// Configuration plane: node addressing and radio configuration.
    Configuration,
    /// Radio test plane: raw radio operations, gated by test mode.
    Test,
}

/// All function codes understood by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionCode {
    // Data SAP
    /// Queue an APDU for transmission.
    DataTxReq = 0x01,
    /// Confirmation for [`FunctionCode::DataTxReq`].
    DataTxCnf = 0x81,
    /// A tracked APDU left the node (sent or timed out).
    DataTxInd = 0x02,
    /// Host acknowledgement of [`FunctionCode::DataTxInd`].
    DataTxRsp = 0x82,
    /// An APDU addressed to this node was received.
    DataRxInd = 0x03,
    /// Host acknowledgement of [`FunctionCode::DataRxInd`].
    DataRxRsp = 0x83,

    // Management SAP
    /// Query the number of pending indications.
    IndicationPollReq = 0x04,
    /// Confirmation for [`FunctionCode::IndicationPollReq`].
    IndicationPollCnf = 0x84,
    /// Start the stack (and persist the autostart option).
    StackStartReq = 0x05,
    /// Confirmation for [`FunctionCode::StackStartReq`].
    StackStartCnf = 0x85,
    /// Stop the stack (and clear the autostart option).
    StackStopReq = 0x06,
    /// Confirmation for [`FunctionCode::StackStopReq`].
    StackStopCnf = 0x86,
    /// Stack state changed.
    StackStateInd = 0x07,
    /// Host acknowledgement of [`FunctionCode::StackStateInd`].
    StackStateRsp = 0x87,
    /// Write a management attribute.
    MsapAttrWriteReq = 0x0B,
    /// Confirmation for [`FunctionCode::MsapAttrWriteReq`].
    MsapAttrWriteCnf = 0x8B,
    /// Read a management attribute.
    MsapAttrReadReq = 0x0C,
    /// Confirmation for [`FunctionCode::MsapAttrReadReq`].
    MsapAttrReadCnf = 0x8C,
    /// Write the network-wide app config area.
    AppConfigWriteReq = 0x3A,
    /// Confirmation for [`FunctionCode::AppConfigWriteReq`].
    AppConfigWriteCnf = 0xBA,
    /// Read the network-wide app config area.
    AppConfigReadReq = 0x3B,
    /// Confirmation for [`FunctionCode::AppConfigReadReq`].
    AppConfigReadCnf = 0xBB,
    /// New app config received from the network.
    AppConfigRxInd = 0x3F,
    /// Host acknowledgement of [`FunctionCode::AppConfigRxInd`].
    AppConfigRxRsp = 0xBF,

    // Configuration SAP
    /// Write a configuration attribute.
    CsapAttrWriteReq = 0x0D,
    /// Confirmation for [`FunctionCode::CsapAttrWriteReq`].
    CsapAttrWriteCnf = 0x8D,
    /// Read a configuration attribute.
    CsapAttrReadReq = 0x0E,
    /// Confirmation for [`FunctionCode::CsapAttrReadReq`].
    CsapAttrReadCnf = 0x8E,
    /// Reset all configuration to factory defaults.
    FactoryResetReq = 0x16,
    /// Confirmation for [`FunctionCode::FactoryResetReq`].
    FactoryResetCnf = 0x96,

    // Test SAP
    /// Enter radio test mode with a dedicated network address.
    TestModeEnterReq = 0x50,
    /// Confirmation for [`FunctionCode::TestModeEnterReq`].
    TestModeEnterCnf = 0xD0,
    /// Exit radio test mode.
    TestModeExitReq = 0x51,
    /// Confirmation for [`FunctionCode::TestModeExitReq`].
    TestModeExitCnf = 0xD1,
    /// Set the raw radio channel.
    TestRadioChannelReq = 0x52,
    /// Confirmation for [`FunctionCode::TestRadioChannelReq`].
    TestRadioChannelCnf = 0xD2,
    /// Set the raw radio TX power level.
    TestRadioTxPowerReq = 0x53,
    /// Confirmation for [`FunctionCode::TestRadioTxPowerReq`].
    TestRadioTxPowerCnf = 0xD3,
    /// Transmit a burst of raw test packets.
    TestRadioDataTxReq = 0x54,
    /// Confirmation for [`FunctionCode::TestRadioDataTxReq`].
    TestRadioDataTxCnf = 0xD4,
    /// Enable/disable raw radio reception and its indications.
    TestRadioDataRxReq = 0x55,
    /// Confirmation for [`FunctionCode::TestRadioDataRxReq`].
    TestRadioDataRxCnf = 0xD5,
    /// Read the most recently received test packet.
    TestRadioDataReadReq = 0x56,
    /// Confirmation for [`FunctionCode::TestRadioDataReadReq`].
    TestRadioDataReadCnf = 0xD6,
    /// Query the maximum raw payload size the radio supports.
    TestRadioMaxDataSizeReq = 0x57,
    /// Confirmation for [`FunctionCode::TestRadioMaxDataSizeReq`].
    TestRadioMaxDataSizeCnf = 0xD7,
    /// A raw test packet was received.
    TestDataRxInd = 0x58,
    /// Host acknowledgement of [`FunctionCode::TestDataRxInd`].
    TestDataRxRsp = 0xD8,
}

impl FunctionCode {
    /// Every function code, in wire-value order per SAP.
    pub const ALL: &'static [FunctionCode] = &[
        FunctionCode::DataTxReq,
        FunctionCode::DataTxCnf,
        FunctionCode::DataTxInd,
        FunctionCode::DataTxRsp,
        FunctionCode::DataRxInd,
        FunctionCode::DataRxRsp,
        FunctionCode::IndicationPollReq,
        FunctionCode::IndicationPollCnf,
        FunctionCode::StackStartReq,
        FunctionCode::StackStartCnf,
        FunctionCode::StackStopReq,
        FunctionCode::StackStopCnf,
        FunctionCode::StackStateInd,
        FunctionCode::StackStateRsp,
        FunctionCode::MsapAttrWriteReq,
        FunctionCode::MsapAttrWriteCnf,
        FunctionCode::MsapAttrReadReq,
        FunctionCode::MsapAttrReadCnf,
        FunctionCode::AppConfigWriteReq,
        FunctionCode::AppConfigWriteCnf,
        FunctionCode::AppConfigReadReq,
        FunctionCode::AppConfigReadCnf,
        FunctionCode::AppConfigRxInd,
        FunctionCode::AppConfigRxRsp,
        FunctionCode::CsapAttrWriteReq,
        FunctionCode::CsapAttrWriteCnf,
        FunctionCode::CsapAttrReadReq,
        FunctionCode::CsapAttrReadCnf,
        FunctionCode::FactoryResetReq,
        FunctionCode::FactoryResetCnf,
        FunctionCode::TestModeEnterReq,
        FunctionCode::TestModeEnterCnf,
        FunctionCode::TestModeExitReq,
        FunctionCode::TestModeExitCnf,
        FunctionCode::TestRadioChannelReq,
        FunctionCode::TestRadioChannelCnf,
        FunctionCode::TestRadioTxPowerReq,
        FunctionCode::TestRadioTxPowerCnf,
        FunctionCode::TestRadioDataTxReq,
        FunctionCode::TestRadioDataTxCnf,
        FunctionCode::TestRadioDataRxReq,
        FunctionCode::TestRadioDataRxCnf,
        FunctionCode::TestRadioDataReadReq,
        FunctionCode::TestRadioDataReadCnf,
        FunctionCode::TestRadioMaxDataSizeReq,
        FunctionCode::TestRadioMaxDataSizeCnf,
        FunctionCode::TestDataRxInd,
        FunctionCode::TestDataRxRsp,
    ];

    /// Look up a function code from its wire value.
    pub fn from_u8(value: u8) -> Option<FunctionCode> {
        FunctionCode::ALL
            .iter()
            .copied()
            .find(|code| *code as u8 == value)
    }

    /// Direction of this code.
    pub fn direction(self) -> Direction {
        use FunctionCode::*;
        match self {
            DataTxReq | IndicationPollReq | StackStartReq | StackStopReq | MsapAttrWriteReq
            | MsapAttrReadReq | AppConfigWriteReq | AppConfigReadReq | CsapAttrWriteReq
            | CsapAttrReadReq | FactoryResetReq | TestModeEnterReq | TestModeExitReq
            | TestRadioChannelReq | TestRadioTxPowerReq | TestRadioDataTxReq
            | TestRadioDataRxReq | TestRadioDataReadReq | TestRadioMaxDataSizeReq => {
                Direction::Request
            }

            DataTxCnf | IndicationPollCnf | StackStartCnf | StackStopCnf | MsapAttrWriteCnf
            | MsapAttrReadCnf | AppConfigWriteCnf | AppConfigReadCnf | CsapAttrWriteCnf
            | CsapAttrReadCnf | FactoryResetCnf | TestModeEnterCnf | TestModeExitCnf
            | TestRadioChannelCnf | TestRadioTxPowerCnf | TestRadioDataTxCnf
            | TestRadioDataRxCnf | TestRadioDataReadCnf | TestRadioMaxDataSizeCnf => {
                Direction::Confirmation
            }

            DataTxInd | DataRxInd | StackStateInd | AppConfigRxInd | TestDataRxInd => {
                Direction::Indication
            }

            DataTxRsp | DataRxRsp | StackStateRsp | AppConfigRxRsp | TestDataRxRsp => {
                Direction::Response
            }
        }
    }

    /// Service access point of this code.
    pub fn category(self) -> SapCategory {
        use FunctionCode::*;
        match self {
            DataTxReq | DataTxCnf | DataTxInd | DataTxRsp | DataRxInd | DataRxRsp => {
                SapCategory::Data
            }

            IndicationPollReq | IndicationPollCnf | StackStartReq | StackStartCnf
            | StackStopReq | StackStopCnf | StackStateInd | StackStateRsp | MsapAttrWriteReq
            | MsapAttrWriteCnf | MsapAttrReadReq | MsapAttrReadCnf | AppConfigWriteReq
            | AppConfigWriteCnf | AppConfigReadReq | AppConfigReadCnf | AppConfigRxInd
            | AppConfigRxRsp => SapCategory::Management,

            CsapAttrWriteReq | CsapAttrWriteCnf | CsapAttrReadReq | CsapAttrReadCnf
            | FactoryResetReq | FactoryResetCnf => SapCategory::Configuration,

            TestModeEnterReq | TestModeEnterCnf | TestModeExitReq | TestModeExitCnf
            | TestRadioChannelReq | TestRadioChannelCnf | TestRadioTxPowerReq
            | TestRadioTxPowerCnf | TestRadioDataTxReq | TestRadioDataTxCnf
            | TestRadioDataRxReq | TestRadioDataRxCnf | TestRadioDataReadReq
            | TestRadioDataReadCnf | TestRadioMaxDataSizeReq | TestRadioMaxDataSizeCnf
            | TestDataRxInd | TestDataRxRsp => SapCategory::Test,
        }
    }
}

/// Is this byte a request code?
pub fn is_request(code: u8) -> bool {
    matches!(
        FunctionCode::from_u8(code).map(FunctionCode::direction),
        Some(Direction::Request)
    )
}

/// Is this byte a confirmation code?
pub fn is_confirmation(code: u8) -> bool {
    matches!(
        FunctionCode::from_u8(code).map(FunctionCode::direction),
        Some(Direction::Confirmation)
    )
}

/// Is this byte an indication code?
pub fn is_indication(code: u8) -> bool {
    matches!(
        FunctionCode::from_u8(code).map(FunctionCode::direction),
        Some(Direction::Indication)
    )
}

/// Is this byte a response code?
pub fn is_response(code: u8) -> bool {
    matches!(
        FunctionCode::from_u8(code).map(FunctionCode::direction),
        Some(Direction::Response)
    )
}

fn is_category_request(code: u8, category: SapCategory) -> bool {
    match FunctionCode::from_u8(code) {
        Some(func) => func.direction() == Direction::Request && func.category() == category,
        None => false,
    }
}

/// Is this byte a data-plane request code?
pub fn is_data_request(code: u8) -> bool {
    is_category_request(code, SapCategory::Data)
}

/// Is this byte a management-plane request code?
pub fn is_management_request(code: u8) -> bool {
    is_category_request(code, SapCategory::Management)
}

/// Is this byte a configuration-plane request code?
pub fn is_configuration_request(code: u8) -> bool {
    is_category_request(code, SapCategory::Configuration)
}

/// Is this byte a radio-test request code?
pub fn is_test_request(code: u8) -> bool {
    is_category_request(code, SapCategory::Test)
}
