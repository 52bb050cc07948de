// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use packed_struct::prelude::*;

pub use crate::messages::TxMessageId;

#[derive(PrimitiveEnum_u8, Clone, Copy, Debug, PartialEq)]
pub enum MessageCode {
    ResponseNoError = 0x00,
    EventRxSearchTimeout = 0x01,
    EventRxFail = 0x02,
    EventTx = 0x03,
    EventTransferRxFailed = 0x04,
    EventTransferTxCompleted = 0x05,
    EventTransferTxFailed = 0x06,
    EventChannelClosed = 0x07,
    EventRxFailGoToSearch = 0x08,
    EventChannelCollision = 0x09,
    EventTransferTxStart = 0x0A,
    EventTransferNextDataBlock = 0x11,
    ChannelInWrongState = 0x15,
    ChannelNotOpened = 0x16,
    ChannelIdNotSet = 0x18,
    CloseAllChannels = 0x19,
    TransferInProgress = 0x1F,
    TransferSequenceNumberError = 0x20,
    TransferInError = 0x21,
    MessageSizeExceedsLimit = 0x27,
    InvalidMessage = 0x28,
    InvalidNetworkNumber = 0x29,
    InvalidListId = 0x30,
    InvalidScanTxChannel = 0x31,
    InvalidParameterProvided = 0x32,
    EventSerialQueOverflow = 0x34,
    EventQueOverflow = 0x35,
    NvmFullError = 0x40,
    NvmWriteError = 0x41,
}

/// Unsolicited channel event, carried by id 0x40 with the event marker in place of a message id
#[derive(PackedStruct, Copy, Clone, Debug, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "3")]
pub struct ChannelEvent {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    #[packed_field(bits = "8:14")]
    _reserved0: ReservedZeroes<packed_bits::Bits<7>>,
    #[packed_field(bits = "15")]
    _reserved1: ReservedOnes<packed_bits::Bits<1>>,
    #[packed_field(bytes = "2")]
    pub code: u8,
}

impl ChannelEvent {
    pub(crate) const MSG_ID: u8 = 1;
    pub(crate) const MSG_ID_INDEX: usize = 1;

    pub fn new(channel_number: u8, code: MessageCode) -> Self {
        Self {
            channel_number,
            _reserved0: Default::default(),
            _reserved1: Default::default(),
            code: code.to_primitive(),
        }
    }

    /// `None` if the radio reported a code this crate does not know
    pub fn message_code(&self) -> Option<MessageCode> {
        MessageCode::from_primitive(self.code)
    }
}

/// Response to a command, the id and code are kept raw so unknown values still parse
#[derive(PackedStruct, Copy, Clone, Debug, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "3")]
pub struct ChannelResponse {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    #[packed_field(bytes = "1")]
    pub message_id: u8,
    #[packed_field(bytes = "2")]
    pub code: u8,
}

impl ChannelResponse {
    pub fn new(channel_number: u8, message_id: TxMessageId, code: MessageCode) -> Self {
        Self {
            channel_number,
            message_id: message_id.to_primitive(),
            code: code.to_primitive(),
        }
    }

    pub fn responded_to(&self) -> Option<TxMessageId> {
        TxMessageId::from_primitive(self.message_id)
    }

    pub fn message_code(&self) -> Option<MessageCode> {
        MessageCode::from_primitive(self.code)
    }

    /// The command was accepted by the radio
    pub fn is_ok(&self) -> bool {
        self.message_code() == Some(MessageCode::ResponseNoError)
    }
}
