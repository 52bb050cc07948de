// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::messages::MAX_MESSAGE_DATA_SIZE;
use arrayvec::ArrayVec;
use packed_struct::prelude::*;

// Re-export types used in multiple scopes based on the datasheet
pub use crate::messages::config::{ChannelId, ChannelType};

#[derive(PrimitiveEnum_u8, Clone, Copy, Debug, PartialEq, Default)]
pub enum ChannelState {
    #[default]
    UnAssigned = 0,
    Assigned = 1,
    Searching = 2,
    Tracking = 3,
}

#[derive(PackedStruct, Debug, Clone, Copy, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "2")]
pub struct ChannelStatus {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    /// Radios may report types this crate does not know, the raw value is kept
    #[packed_field(bits = "8:11", ty = "enum")]
    pub channel_type: EnumCatchAll<ChannelType>,
    #[packed_field(bits = "12:13")]
    pub network_number: Integer<u8, packed_bits::Bits<2>>,
    #[packed_field(bits = "14:15", ty = "enum")]
    pub channel_state: ChannelState,
}

/// Version string reported by the radio, NUL terminated on the wire
#[derive(Clone, Debug, PartialEq)]
pub struct AntVersion {
    version: ArrayVec<u8, MAX_MESSAGE_DATA_SIZE>,
}

impl AntVersion {
    pub(crate) fn unpack_from_slice(data: &[u8]) -> Result<Self, PackingError> {
        let version = data.try_into().map_err(|_| PackingError::SliceIndexingError {
            slice_len: data.len(),
        })?;
        Ok(Self { version })
    }

    /// Printable part of the version, `None` if the radio sent something other than ASCII
    pub fn as_str(&self) -> Option<&str> {
        let end = self
            .version
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.version.len());
        core::str::from_utf8(&self.version[..end]).ok()
    }
}

/// Fixed leading block of a Capabilities message (0x54)
///
/// Newer radios append more option bytes which are not needed by this crate and are dropped.
#[derive(PackedStruct, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "4")]
pub struct Capabilities {
    #[packed_field(bytes = "0")]
    pub max_ant_channels: u8,
    #[packed_field(bytes = "1")]
    pub max_networks: u8,
    #[packed_field(bytes = "2")]
    pub standard_options: u8,
    #[packed_field(bytes = "3")]
    pub advanced_options: u8,
}

impl Capabilities {
    const PACKING_SIZE: usize = 4;

    pub(crate) fn unpack_rx(data: &[u8]) -> Result<Self, PackingError> {
        let base = data
            .get(..Self::PACKING_SIZE)
            .ok_or(PackingError::BufferSizeMismatch {
                expected: Self::PACKING_SIZE,
                actual: data.len(),
            })?;
        Self::unpack_from_slice(base)
    }
}
