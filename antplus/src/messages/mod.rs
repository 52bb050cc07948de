// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use channel::{ChannelEvent, ChannelResponse};
use config::{
    AssignChannel, ChannelId, ChannelPeriod, ChannelRfFrequency, SearchTimeout, SearchWaveform,
    SetNetworkKey, UnAssignChannel,
};
use control::{CloseChannel, OpenChannel, RequestMessage, ResetSystem};
use data::{
    AcknowledgedData, BroadcastData, BurstTransferData, ExtendedAcknowledgedData,
    ExtendedBroadcastData, ExtendedBurstData,
};
use notifications::{SerialErrorMessage, StartUpMessage};
use packed_struct::prelude::*;
use requested_response::{AntVersion, Capabilities, ChannelStatus};

pub mod channel;
pub mod config;
pub mod control;
pub mod data;
pub mod notifications;
pub mod requested_response;

/// Largest frame, header and checksum included, the radio accepts in a single transfer
pub const MAX_MESSAGE_SIZE: usize = 64;
pub(crate) const HEADER_SIZE: usize = 3;
pub(crate) const CHECKSUM_SIZE: usize = 1;
/// Largest payload a single frame can carry
pub const MAX_MESSAGE_DATA_SIZE: usize = MAX_MESSAGE_SIZE - HEADER_SIZE - CHECKSUM_SIZE;

/// All supported RX messages
#[derive(Clone, PartialEq, Debug)]
pub enum RxMessage {
    // Notification Messages
    StartUpMessage(StartUpMessage),
    SerialErrorMessage(SerialErrorMessage),
    // Data Messages
    BroadcastData(BroadcastData),
    AcknowledgedData(AcknowledgedData),
    BurstTransferData(BurstTransferData),
    // Channel Messages
    ChannelEvent(ChannelEvent),
    ChannelResponse(ChannelResponse),
    // Requested Response Messages
    ChannelStatus(ChannelStatus),
    ChannelId(ChannelId),
    AntVersion(AntVersion),
    Capabilities(Capabilities),
}

/// All supported TX messages
#[derive(Clone, Debug, PartialEq)]
pub enum TxMessage {
    UnAssignChannel(UnAssignChannel),
    AssignChannel(AssignChannel),
    ChannelId(ChannelId),
    ChannelPeriod(ChannelPeriod),
    SearchTimeout(SearchTimeout),
    ChannelRfFrequency(ChannelRfFrequency),
    SetNetworkKey(SetNetworkKey),
    SearchWaveform(SearchWaveform),
    ResetSystem(ResetSystem),
    OpenChannel(OpenChannel),
    CloseChannel(CloseChannel),
    RequestMessage(RequestMessage),
    BroadcastData(BroadcastData),
    AcknowledgedData(AcknowledgedData),
    BurstTransferData(BurstTransferData),
    ExtendedBroadcastData(ExtendedBroadcastData),
    ExtendedAcknowledgedData(ExtendedAcknowledgedData),
    ExtendedBurstData(ExtendedBurstData),
}

impl TxMessage {
    fn as_transmitable(&self) -> &dyn TransmitableMessage {
        match self {
            TxMessage::UnAssignChannel(uc) => uc,
            TxMessage::AssignChannel(ac) => ac,
            TxMessage::ChannelId(id) => id,
            TxMessage::ChannelPeriod(cp) => cp,
            TxMessage::SearchTimeout(st) => st,
            TxMessage::ChannelRfFrequency(cr) => cr,
            TxMessage::SetNetworkKey(nk) => nk,
            TxMessage::SearchWaveform(sw) => sw,
            TxMessage::ResetSystem(rs) => rs,
            TxMessage::OpenChannel(oc) => oc,
            TxMessage::CloseChannel(cc) => cc,
            TxMessage::RequestMessage(rm) => rm,
            TxMessage::BroadcastData(bd) => bd,
            TxMessage::AcknowledgedData(ad) => ad,
            TxMessage::BurstTransferData(bt) => bt,
            TxMessage::ExtendedBroadcastData(eb) => eb,
            TxMessage::ExtendedAcknowledgedData(ea) => ea,
            TxMessage::ExtendedBurstData(et) => et,
        }
    }
}

impl TransmitableMessage for TxMessage {
    fn serialize_message(&self, buf: &mut [u8]) -> Result<usize, PackingError> {
        self.as_transmitable().serialize_message(buf)
    }

    fn get_tx_msg_id(&self) -> TxMessageId {
        self.as_transmitable().get_tx_msg_id()
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Represents a generic ANT radio message
pub struct AntMessage {
    pub header: RxMessageHeader,
    pub message: RxMessage,
    /// XOR of all prior bytes should match this
    pub checksum: u8,
}

/// Trait for any TX message type
pub trait TransmitableMessage {
    /// Pack the message body (no header or checksum) into `buf`, returns bytes written
    fn serialize_message(&self, buf: &mut [u8]) -> Result<usize, PackingError>;
    fn get_tx_msg_id(&self) -> TxMessageId;
}

#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Debug)]
pub enum SyncByte {
    Value = 0xA4,
}

#[derive(PackedStruct, Debug, PartialEq, Clone, Copy)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "3")]
pub struct RxMessageHeader {
    #[packed_field(bytes = "0", ty = "enum")]
    pub sync: SyncByte,
    #[packed_field(bytes = "1")]
    pub msg_length: u8,
    #[packed_field(bytes = "2", ty = "enum")]
    pub msg_id: RxMessageId,
}

#[derive(PackedStruct, Debug, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "3")]
pub struct TxMessageHeader {
    #[packed_field(bytes = "0", ty = "enum")]
    pub sync: SyncByte,
    #[packed_field(bytes = "1")]
    pub msg_length: u8,
    #[packed_field(bytes = "2", ty = "enum")]
    pub msg_id: TxMessageId,
}

#[derive(PrimitiveEnum_u8, Clone, Copy, Debug, PartialEq)]
pub enum RxMessageId {
    // Notification Messages
    StartUpMessage = 0x6F,
    SerialErrorMessage = 0xAE,
    // Data Messages
    BroadcastData = 0x4E,
    AcknowledgedData = 0x4F,
    BurstTransferData = 0x50,
    // Channel Messages, responses share the id
    ChannelEvent = 0x40,
    // Requested Response Messages
    ChannelStatus = 0x52,
    ChannelId = 0x51,
    AntVersion = 0x3E,
    Capabilities = 0x54,
}

#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Debug)]
pub enum TxMessageId {
    // Config Messages
    UnAssignChannel = 0x41,
    AssignChannel = 0x42,
    ChannelId = 0x51,
    ChannelPeriod = 0x43,
    SearchTimeout = 0x44,
    ChannelRfFrequency = 0x45,
    NetworkKey = 0x46,
    SearchWaveform = 0x49,
    // Control Messages
    SystemReset = 0x4A,
    OpenChannel = 0x4B,
    CloseChannel = 0x4C,
    RequestMessage = 0x4D,
    // Data Messages
    BroadcastData = 0x4E,
    AcknowledgedData = 0x4F,
    BurstTransferData = 0x50,
    // Extended Data Messages (Legacy)
    ExtendedBroadcastData = 0x5D,
    ExtendedAcknowledgedData = 0x5E,
    ExtendedBurstData = 0x5F,
}
