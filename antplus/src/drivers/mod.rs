// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Byte level plumbing between the radio and the [Router](crate::router::Router).
//!
//! The codec functions here split a received byte buffer into frames and validate them, and
//! serialize outbound messages into frames. [TxQueue] and [RxSlot] are the two handoff points a
//! transport works against, [SerialDriver] is a ready made transport for UART attached radios.

#[cfg(feature = "std")]
mod rx_slot;
#[cfg(feature = "std")]
mod serial;
#[cfg(feature = "std")]
mod tx_queue;

#[cfg(feature = "std")]
pub use rx_slot::*;
#[cfg(feature = "std")]
pub use serial::*;
#[cfg(feature = "std")]
pub use tx_queue::*;

use crate::messages::channel::{ChannelEvent, ChannelResponse};
use crate::messages::config::ChannelId;
use crate::messages::data::{AcknowledgedData, BroadcastData, BurstTransferData};
use crate::messages::notifications::{SerialErrorMessage, StartUpMessage};
use crate::messages::requested_response::{AntVersion, Capabilities, ChannelStatus};
use crate::messages::{
    AntMessage, RxMessage, RxMessageHeader, RxMessageId, SyncByte, TransmitableMessage,
    TxMessageHeader, CHECKSUM_SIZE, HEADER_SIZE, MAX_MESSAGE_SIZE,
};

use arrayvec::ArrayVec;
use embedded_hal_nb::serial::ErrorKind;
use packed_struct::prelude::{PackedStructSlice, PackingError, PrimitiveEnum};
use thiserror::Error;
use tracing::debug;

/// Sync, length, id and checksum, the smallest possible frame
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE + 1;
const SYNC: u8 = SyncByte::Value as u8;

/// A fully encoded frame ready for the wire
pub type EncodedMessage = ArrayVec<u8, MAX_MESSAGE_SIZE>;

/// A transport moves bytes between the radio and the engine's handoff points
#[cfg(feature = "std")]
pub trait Driver {
    /// Move whatever is available in either direction without blocking
    fn poll<const N: usize>(&mut self, rx: &RxSlot, tx: &TxQueue<N>) -> Result<(), DriverError>;
}

#[derive(Debug, Error, PartialEq)]
pub enum DriverError {
    #[error("no sync byte in buffer")]
    Framing,
    #[error("checksum mismatch, expected {expected:#04x} found {found:#04x}")]
    Integrity { expected: u8, found: u8 },
    #[error("frame needs {expected} bytes but only {actual} are present")]
    BadLength { expected: usize, actual: usize },
    #[error("message does not fit in {0} bytes")]
    Oversize(usize),
    #[error("failed to pack or unpack message: {0:?}")]
    Packing(PackingError),
    #[error("serial read failed: {0:?}")]
    Read(ErrorKind),
    #[error("serial write failed: {0:?}")]
    Write(ErrorKind),
    #[error("unable to drive sleep pin")]
    Pin,
}

impl From<PackingError> for DriverError {
    fn from(err: PackingError) -> Self {
        DriverError::Packing(err)
    }
}

/// One validated frame borrowed from a receive buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame<'a> {
    pub message_id: u8,
    pub payload: &'a [u8],
    pub checksum: u8,
}

impl<'a> Frame<'a> {
    /// By convention the first payload byte is the channel (or network) number
    pub fn channel(&self) -> Option<u8> {
        self.payload.first().copied()
    }
}

pub fn calculate_checksum(buf: &[u8]) -> u8 {
    buf.iter().fold(0, |acc, x| acc ^ x)
}

/// Offset of the first sync byte, only the first [MAX_MESSAGE_SIZE] bytes are searched
pub fn find_sync(buf: &[u8]) -> Option<usize> {
    buf.iter().take(MAX_MESSAGE_SIZE).position(|&x| x == SYNC)
}

/// Total size of the frame starting at `buf[0]`, `None` if the length byte is missing
pub fn frame_length(buf: &[u8]) -> Option<usize> {
    buf.get(1)
        .map(|&len| len as usize + HEADER_SIZE + CHECKSUM_SIZE)
}

/// True if `buf` starts with a complete frame whose trailing byte is the XOR of everything before
pub fn check_integrity(buf: &[u8]) -> bool {
    validate_frame(buf).is_ok()
}

fn validate_frame(buf: &[u8]) -> Result<usize, DriverError> {
    let len = match frame_length(buf) {
        Some(len) if buf.len() >= MIN_FRAME_SIZE => len,
        _ => {
            return Err(DriverError::BadLength {
                expected: MIN_FRAME_SIZE,
                actual: buf.len(),
            })
        }
    };
    if buf.len() < len {
        return Err(DriverError::BadLength {
            expected: len,
            actual: buf.len(),
        });
    }
    let expected = calculate_checksum(&buf[..len - CHECKSUM_SIZE]);
    let found = buf[len - CHECKSUM_SIZE];
    if expected != found {
        return Err(DriverError::Integrity { expected, found });
    }
    Ok(len)
}

fn next_frame(buf: &[u8]) -> Result<(Frame<'_>, &[u8]), DriverError> {
    let start = find_sync(buf).ok_or(DriverError::Framing)?;
    let buf = &buf[start..];
    let len = validate_frame(buf)?;
    let frame = Frame {
        message_id: buf[2],
        payload: &buf[HEADER_SIZE..len - CHECKSUM_SIZE],
        checksum: buf[len - CHECKSUM_SIZE],
    };
    Ok((frame, &buf[len..]))
}

/// Iterator over the frames of one receive buffer, see [decode_stream]
pub struct DecodeStream<'a> {
    buf: &'a [u8],
}

impl<'a> Iterator for DecodeStream<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Frame<'a>> {
        if self.buf.is_empty() {
            return None;
        }
        match next_frame(self.buf) {
            Ok((frame, rest)) => {
                self.buf = rest;
                Some(frame)
            }
            Err(err) => {
                debug!(%err, remaining = self.buf.len(), "dropping rest of receive buffer");
                self.buf = &[];
                None
            }
        }
    }
}

/// Split a receive buffer into frames.
///
/// Decoding stops at the first missing sync byte, bad checksum or truncated frame and the rest of
/// the buffer is discarded. Nothing is carried over between calls.
pub fn decode_stream(buf: &[u8]) -> DecodeStream<'_> {
    DecodeStream { buf }
}

/// Serialize `msg` with header and checksum into `buf`, returns the used part of `buf`
pub fn create_packed_message<'a>(
    buf: &'a mut [u8],
    msg: &dyn TransmitableMessage,
) -> Result<&'a [u8], DriverError> {
    let limit = buf.len().min(MAX_MESSAGE_SIZE);
    if limit < MIN_FRAME_SIZE {
        return Err(DriverError::BadLength {
            expected: MIN_FRAME_SIZE,
            actual: limit,
        });
    }
    let msg_len = msg
        .serialize_message(&mut buf[HEADER_SIZE..limit - CHECKSUM_SIZE])
        .map_err(|err| match err {
            PackingError::BufferTooSmall => DriverError::Oversize(limit),
            err => DriverError::Packing(err),
        })?;
    let header = TxMessageHeader {
        sync: SyncByte::Value,
        msg_length: msg_len as u8,
        msg_id: msg.get_tx_msg_id(),
    };

    let padded_len = msg_len + HEADER_SIZE;
    header.pack_to_slice(&mut buf[..HEADER_SIZE])?;
    buf[padded_len] = calculate_checksum(&buf[..padded_len]);

    Ok(&buf[..padded_len + CHECKSUM_SIZE])
}

/// Encode `msg` into an owned frame
pub fn encode_message(msg: &dyn TransmitableMessage) -> Result<EncodedMessage, DriverError> {
    let mut buf = [0u8; MAX_MESSAGE_SIZE];
    let packed = create_packed_message(&mut buf, msg)?;
    let mut out = EncodedMessage::new();
    out.try_extend_from_slice(packed)
        .map_err(|_| DriverError::Oversize(packed.len()))?;
    Ok(out)
}

fn leading(data: &[u8], size: usize) -> Result<&[u8], PackingError> {
    data.get(..size).ok_or(PackingError::BufferSizeMismatch {
        expected: size,
        actual: data.len(),
    })
}

/// Decode a frame into a typed message, `Ok(None)` for ids this crate does not handle
pub fn parse_frame(frame: &Frame) -> Result<Option<AntMessage>, DriverError> {
    let msg_id = match RxMessageId::from_primitive(frame.message_id) {
        Some(id) => id,
        None => return Ok(None),
    };
    let data = frame.payload;

    let body = match msg_id {
        RxMessageId::StartUpMessage => {
            RxMessage::StartUpMessage(StartUpMessage::unpack_from_slice(leading(data, 1)?)?)
        }
        RxMessageId::SerialErrorMessage => RxMessage::SerialErrorMessage(
            SerialErrorMessage::unpack_from_slice(leading(data, 1)?)?,
        ),
        RxMessageId::BroadcastData => RxMessage::BroadcastData(BroadcastData::unpack_rx(data)?),
        RxMessageId::AcknowledgedData => {
            RxMessage::AcknowledgedData(AcknowledgedData::unpack_rx(data)?)
        }
        RxMessageId::BurstTransferData => {
            RxMessage::BurstTransferData(BurstTransferData::unpack_rx(data)?)
        }
        RxMessageId::ChannelEvent => {
            if data.get(ChannelEvent::MSG_ID_INDEX) == Some(&ChannelEvent::MSG_ID) {
                RxMessage::ChannelEvent(ChannelEvent::unpack_from_slice(leading(data, 3)?)?)
            } else {
                RxMessage::ChannelResponse(ChannelResponse::unpack_from_slice(leading(data, 3)?)?)
            }
        }
        RxMessageId::ChannelStatus => {
            RxMessage::ChannelStatus(ChannelStatus::unpack_from_slice(leading(data, 2)?)?)
        }
        RxMessageId::ChannelId => {
            RxMessage::ChannelId(ChannelId::unpack_from_slice(leading(data, 5)?)?)
        }
        RxMessageId::AntVersion => RxMessage::AntVersion(AntVersion::unpack_from_slice(data)?),
        RxMessageId::Capabilities => RxMessage::Capabilities(Capabilities::unpack_rx(data)?),
    };

    Ok(Some(AntMessage {
        header: RxMessageHeader {
            sync: SyncByte::Value,
            msg_length: data.len() as u8,
            msg_id,
        },
        message: body,
        checksum: frame.checksum,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::config::{
        ChannelPeriod, DeviceType, SetNetworkKey, TransmissionChannelType,
        TransmissionGlobalDataPages, TransmissionType,
    };
    use crate::messages::control::ResetSystem;
    use crate::messages::data::burst_packets;
    use crate::messages::requested_response::ChannelState;
    use inner::inner;

    const RESET_FRAME: [u8; 5] = [0xA4, 0x01, 0x4A, 0x00, 0xEF];

    #[test]
    fn checksum() {
        let data = [0xA4, 6, 0x59, 2, 0x44, 0x33, 120, 34, 2];
        assert_eq!(calculate_checksum(&data), 214);
        assert_eq!(calculate_checksum(&RESET_FRAME[..4]), 0xEF);
    }

    #[test]
    fn reset_round_trip() {
        let encoded = encode_message(&ResetSystem::new()).unwrap();
        assert_eq!(encoded.as_slice(), RESET_FRAME);

        let frames: Vec<Frame> = decode_stream(&RESET_FRAME).collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].message_id, 0x4A);
        assert_eq!(frames[0].payload, &[0x00]);
        assert_eq!(frames[0].channel(), Some(0));
    }

    /// Encode `msg`, decode the frame again and parse it as if the radio had sent it
    fn echo(msg: &dyn TransmitableMessage) -> RxMessage {
        let encoded = encode_message(msg).unwrap();
        let mut frames = decode_stream(&encoded);
        let frame = frames.next().unwrap();
        assert!(frames.next().is_none());
        assert_eq!(frame.message_id, msg.get_tx_msg_id() as u8);
        assert_eq!(frame.payload.len() + 4, encoded.len());
        parse_frame(&frame).unwrap().unwrap().message
    }

    #[test]
    fn data_messages_round_trip() {
        let broadcast = BroadcastData::new(3, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(echo(&broadcast), RxMessage::BroadcastData(broadcast));

        let acknowledged = AcknowledgedData::new(5, [0xFF, 0, 0x10, 0x20, 0x30, 0x40, 0x50, 0xA4]);
        assert_eq!(echo(&acknowledged), RxMessage::AcknowledgedData(acknowledged));

        let packets: Vec<BurstTransferData> = burst_packets(1, &[0xAA; 20]).collect();
        for packet in packets {
            assert_eq!(echo(&packet), RxMessage::BurstTransferData(packet));
        }
    }

    #[test]
    fn channel_id_round_trip() {
        let id = ChannelId::new(
            4,
            0xBEEF,
            DeviceType::new(123.into(), true),
            TransmissionType::new(
                TransmissionChannelType::IndependentChannel,
                TransmissionGlobalDataPages::GlobalDataPagesUsed,
                3.into(),
            ),
        );
        assert_eq!(echo(&id), RxMessage::ChannelId(id));
    }

    #[test]
    fn message_packing() {
        let mut buf: [u8; 12] = [0; 12];
        let packed = create_packed_message(&mut buf, &ChannelPeriod::new(1, 8070)).unwrap();
        let expected_checksum = 0xA4 ^ 3 ^ 0x43 ^ 1 ^ 0x86 ^ 0x1F;
        assert_eq!(packed, [0xA4, 3, 0x43, 1, 0x86, 0x1F, expected_checksum]);
        assert_eq!(frame_length(packed), Some(7));
    }

    #[test]
    fn frame_length_matches_length_byte() {
        for len in [0u8, 1, 9, 60] {
            assert_eq!(frame_length(&[0xA4, len]), Some(len as usize + 4));
        }
        assert_eq!(frame_length(&[0xA4]), None);
    }

    #[test]
    fn integrity_detects_any_single_byte_change() {
        let frame = encode_message(&SetNetworkKey::new(0, [0xB9, 0xA5, 0x21, 0xFB, 0xBD, 0x72, 0xC3, 0x45]))
            .unwrap();
        assert!(check_integrity(&frame));
        // the length byte is skipped since changing it changes which byte is the checksum
        for i in (0..frame.len()).filter(|&i| i != 1) {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[i] ^= 1 << bit;
                assert!(!check_integrity(&corrupted), "byte {} bit {}", i, bit);
            }
        }
    }

    #[test]
    fn integrity_needs_whole_frame() {
        assert!(!check_integrity(&[0xA4, 0x01, 0x4A, 0x00]));
        assert!(!check_integrity(&[0xA4, 0x05, 0x4A, 0x00, 0xEB]));
        assert!(!check_integrity(&[]));
    }

    #[test]
    fn find_sync_offsets() {
        assert_eq!(find_sync(&[1, 2, 0xA4, 3]), Some(2));
        assert_eq!(find_sync(&[1, 2, 3]), None);
        let mut late = [0u8; 80];
        late[70] = 0xA4;
        assert_eq!(find_sync(&late), None);
    }

    #[test]
    fn decode_multiple_frames_with_leading_noise() {
        let mut buf = vec![0x00, 0x13];
        buf.extend_from_slice(&RESET_FRAME);
        buf.extend_from_slice(&encode_message(&ChannelPeriod::new(2, 8086)).unwrap());
        let frames: Vec<Frame> = decode_stream(&buf).collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].message_id, 0x43);
        assert_eq!(frames[1].channel(), Some(2));
    }

    #[test]
    fn decode_stops_at_bad_frame() {
        let mut buf = RESET_FRAME.to_vec();
        buf.extend_from_slice(&[0xA4, 0x01, 0x4A, 0x00, 0x00]);
        buf.extend_from_slice(&RESET_FRAME);
        assert_eq!(decode_stream(&buf).count(), 1);
    }

    #[test]
    fn decode_ignores_partial_trailing_frame() {
        let mut buf = RESET_FRAME.to_vec();
        buf.extend_from_slice(&RESET_FRAME[..3]);
        assert_eq!(decode_stream(&buf).count(), 1);
        assert_eq!(decode_stream(&[0x11, 0x22]).count(), 0);
    }

    #[test]
    fn parse_channel_status() {
        let data = [0xA4, 2, 0x52, 1, 0x03];
        let mut buf = data.to_vec();
        buf.push(calculate_checksum(&data));
        let frame = decode_stream(&buf).next().unwrap();
        let msg = parse_frame(&frame).unwrap().unwrap();
        let status = inner!(msg.message, if RxMessage::ChannelStatus);
        assert_eq!(status.channel_number, 1);
        assert_eq!(status.channel_state, ChannelState::Tracking);
    }

    #[test]
    fn parse_channel_event_and_response() {
        let event = Frame {
            message_id: 0x40,
            payload: &[0, 1, 0x07],
            checksum: 0,
        };
        let msg = parse_frame(&event).unwrap().unwrap();
        assert!(matches!(msg.message, RxMessage::ChannelEvent(_)));

        let response = Frame {
            message_id: 0x40,
            payload: &[0, 0x46, 0x00],
            checksum: 0,
        };
        let msg = parse_frame(&response).unwrap().unwrap();
        let response = inner!(msg.message, if RxMessage::ChannelResponse);
        assert!(response.is_ok());
    }

    #[test]
    fn parse_unknown_and_short() {
        let unknown = Frame {
            message_id: 0xE0,
            payload: &[0],
            checksum: 0,
        };
        assert_eq!(parse_frame(&unknown), Ok(None));

        let short = Frame {
            message_id: 0x4E,
            payload: &[0, 1, 2],
            checksum: 0,
        };
        assert!(matches!(parse_frame(&short), Err(DriverError::Packing(_))));
    }

    #[test]
    fn oversize_buffer_rejected() {
        let mut buf = [0u8; 3];
        assert!(create_packed_message(&mut buf, &ResetSystem::new()).is_err());
    }
}
