// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use antplus_derive::AntTx;
use derive_new::new;
use packed_struct::prelude::*;

pub use crate::messages::config::{DeviceType, TransmissionType};

/// Bytes of user data carried by a single data message
pub const DATA_PAYLOAD_SIZE: usize = 8;

/// Sequence bit marking the final packet of a burst
pub const BURST_LAST_PACKET: u8 = 0x04;
const BURST_SEQUENCE_CYCLE: usize = 4;

/// Device number, type and transmission type prefix used by the legacy extended data messages
#[derive(PackedStruct, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "4")]
pub struct ChannelIdOutput {
    #[packed_field(bytes = "0:1")]
    pub device_number: u16,
    #[packed_field(bytes = "2")]
    pub device_type: DeviceType,
    #[packed_field(bytes = "3")]
    pub transmission_type: TransmissionType,
}

/// Represents a Broadcast Data message (0x4E)
///
/// On RX any flagged extended bytes after the payload are ignored.
#[derive(PackedStruct, AntTx, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct BroadcastData {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    #[packed_field(bytes = "1:8")]
    pub data: [u8; 8],
}

impl BroadcastData {
    const PACKING_SIZE: usize = 9;

    pub(crate) fn unpack_rx(data: &[u8]) -> Result<Self, PackingError> {
        Self::unpack_from_slice(payload_slice(data, Self::PACKING_SIZE)?)
    }
}

/// Represents an Acknowledged Data message (0x4F)
#[derive(PackedStruct, AntTx, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct AcknowledgedData {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    #[packed_field(bytes = "1:8")]
    pub data: [u8; 8],
}

impl AcknowledgedData {
    const PACKING_SIZE: usize = 9;

    pub(crate) fn unpack_rx(data: &[u8]) -> Result<Self, PackingError> {
        Self::unpack_from_slice(payload_slice(data, Self::PACKING_SIZE)?)
    }
}

#[derive(PackedStruct, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "1")]
pub struct ChannelSequence {
    #[packed_field(bits = "5:7")]
    pub sequence_number: Integer<u8, packed_bits::Bits<3>>,
    #[packed_field(bits = "0:4")]
    pub channel_number: Integer<u8, packed_bits::Bits<5>>,
}

impl ChannelSequence {
    /// Sequence for packet `index` of a burst, counting 0, 1, 2, 3 and flagging the last packet
    pub fn for_packet(channel: u8, index: usize, last: bool) -> Self {
        let mut sequence = (index % BURST_SEQUENCE_CYCLE) as u8;
        if last {
            sequence |= BURST_LAST_PACKET;
        }
        Self::new(sequence.into(), (channel & 0x1F).into())
    }
}

/// Represents a Burst Transfer Data message (0x50)
#[derive(PackedStruct, AntTx, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "9")]
pub struct BurstTransferData {
    #[packed_field(bytes = "0")]
    pub channel_sequence: ChannelSequence,
    #[packed_field(bytes = "1:8")]
    pub data: [u8; 8],
}

impl BurstTransferData {
    const PACKING_SIZE: usize = 9;

    pub(crate) fn unpack_rx(data: &[u8]) -> Result<Self, PackingError> {
        Self::unpack_from_slice(payload_slice(data, Self::PACKING_SIZE)?)
    }
}

/// Represents an Extended Broadcast Data message (0x5D)
#[derive(PackedStruct, AntTx, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "13")]
pub struct ExtendedBroadcastData {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    #[packed_field(bytes = "1:4")]
    pub channel_id: ChannelIdOutput,
    #[packed_field(bytes = "5:12")]
    pub data: [u8; 8],
}

/// Represents an Extended Acknowledged Data message (0x5E)
#[derive(PackedStruct, AntTx, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "13")]
pub struct ExtendedAcknowledgedData {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    #[packed_field(bytes = "1:4")]
    pub channel_id: ChannelIdOutput,
    #[packed_field(bytes = "5:12")]
    pub data: [u8; 8],
}

/// Represents an Extended Burst Data message (0x5F)
#[derive(PackedStruct, AntTx, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "13")]
pub struct ExtendedBurstData {
    #[packed_field(bytes = "0")]
    pub channel_sequence: ChannelSequence,
    #[packed_field(bytes = "1:4")]
    pub channel_id: ChannelIdOutput,
    #[packed_field(bytes = "5:12")]
    pub data: [u8; 8],
}

fn payload_slice(data: &[u8], size: usize) -> Result<&[u8], PackingError> {
    data.get(..size).ok_or(PackingError::BufferSizeMismatch {
        expected: size,
        actual: data.len(),
    })
}

fn pad_chunk(chunk: &[u8]) -> [u8; DATA_PAYLOAD_SIZE] {
    let mut data = [0; DATA_PAYLOAD_SIZE];
    data[..chunk.len()].copy_from_slice(chunk);
    data
}

/// Split `data` into burst packets, the final packet is zero padded
pub fn burst_packets(channel: u8, data: &[u8]) -> impl Iterator<Item = BurstTransferData> + '_ {
    let count = data.chunks(DATA_PAYLOAD_SIZE).len();
    data.chunks(DATA_PAYLOAD_SIZE)
        .enumerate()
        .map(move |(i, chunk)| {
            BurstTransferData::new(
                ChannelSequence::for_packet(channel, i, i + 1 == count),
                pad_chunk(chunk),
            )
        })
}

/// Same as [burst_packets] but every packet carries the channel id prefix
pub fn extended_burst_packets(
    channel: u8,
    channel_id: ChannelIdOutput,
    data: &[u8],
) -> impl Iterator<Item = ExtendedBurstData> + '_ {
    let count = data.chunks(DATA_PAYLOAD_SIZE).len();
    data.chunks(DATA_PAYLOAD_SIZE)
        .enumerate()
        .map(move |(i, chunk)| {
            ExtendedBurstData::new(
                ChannelSequence::for_packet(channel, i, i + 1 == count),
                channel_id,
                pad_chunk(chunk),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{TransmitableMessage, TxMessageId};

    #[test]
    fn broadcast_data() {
        let unpacked =
            BroadcastData::unpack_rx(&[1, 0, 1, 2, 3, 4, 5, 6, 7, 0x80, 1, 2, 3, 4]).unwrap();
        assert_eq!(unpacked.channel_number, 1);
        assert_eq!(unpacked.data, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert!(BroadcastData::unpack_rx(&[1, 2, 3]).is_err());

        let packed = BroadcastData::new(2, [7; 8]);
        assert_eq!(packed.pack().unwrap(), [2, 7, 7, 7, 7, 7, 7, 7, 7]);
    }

    #[test]
    fn acknowledged_data() {
        let packed = AcknowledgedData::new(5, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(packed.pack().unwrap(), [5, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(packed.get_tx_msg_id(), TxMessageId::AcknowledgedData);
    }

    #[test]
    fn channel_sequence() {
        assert_eq!(ChannelSequence::for_packet(1, 0, false).pack().unwrap(), [0x01]);
        assert_eq!(ChannelSequence::for_packet(1, 3, false).pack().unwrap(), [0x61]);
        assert_eq!(ChannelSequence::for_packet(1, 4, false).pack().unwrap(), [0x01]);
        assert_eq!(ChannelSequence::for_packet(1, 2, true).pack().unwrap(), [0xC1]);
        // channel is masked to 5 bits
        assert_eq!(ChannelSequence::for_packet(0x25, 0, false).pack().unwrap(), [0x05]);
    }

    #[test]
    fn burst_sequence_numbering() {
        let data: Vec<u8> = (0..41).collect();
        let packets: Vec<BurstTransferData> = burst_packets(2, &data).collect();
        assert_eq!(packets.len(), 6);
        let sequences: Vec<u8> = packets
            .iter()
            .map(|p| p.channel_sequence.pack().unwrap()[0] >> 5)
            .collect();
        assert_eq!(sequences, [0, 1, 2, 3, 0, 1 | BURST_LAST_PACKET]);
        assert_eq!(packets[0].data, [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(packets[5].data, [40, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(burst_packets(2, &[]).count(), 0);
    }

    #[test]
    fn single_packet_burst_is_last() {
        let packets: Vec<BurstTransferData> = burst_packets(0, &[9; 8]).collect();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].pack().unwrap()[0], 0x80);
    }

    #[test]
    fn extended_burst() {
        let id = ChannelIdOutput::new(
            0x1234,
            DeviceType::from_id(120),
            TransmissionType::new_wildcard(),
        );
        let packets: Vec<ExtendedBurstData> = extended_burst_packets(1, id, &[0xAA; 12]).collect();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[1].get_tx_msg_id(), TxMessageId::ExtendedBurstData);
        assert_eq!(
            packets[1].pack().unwrap(),
            [0xA1, 0x34, 0x12, 120, 0, 0xAA, 0xAA, 0xAA, 0xAA, 0, 0, 0, 0]
        );
    }

    #[test]
    fn extended_broadcast() {
        let id = ChannelIdOutput::new(7, DeviceType::from_id(11), TransmissionType::new_wildcard());
        let packed = ExtendedBroadcastData::new(3, id, [1; 8]);
        let mut buf = [0u8; 16];
        assert_eq!(packed.serialize_message(&mut buf).unwrap(), 13);
        assert_eq!(&buf[..5], &[3, 7, 0, 11, 0]);
        assert_eq!(packed.get_tx_msg_id(), TxMessageId::ExtendedBroadcastData);
    }
}
