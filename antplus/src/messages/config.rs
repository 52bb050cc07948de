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

/// Represents a UnAssign Channel Message (0x41)
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "1")]
pub struct UnAssignChannel {
    /// Channel to be unassigned
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
}

// Note, this is bit shifted 4 bits relative to the offical doc because the field would overlap in
// the channel status message. The result is the same just a minor mismatch compared to official
// docs
#[derive(PrimitiveEnum_u8, Clone, Copy, Debug, PartialEq, Default)]
pub enum ChannelType {
    #[default]
    BidirectionalSlave = 0,
    BidirectionalMaster = 1,
    SharedBidirectionalSlave = 2,
    SharedBidirectionalMaster = 3,
    SharedReceiveOnly = 4,
    MasterTransmitOnly = 5,
}

impl ChannelType {
    /// True for any channel type that transmits as a master
    pub fn is_master(&self) -> bool {
        matches!(
            self,
            ChannelType::BidirectionalMaster
                | ChannelType::SharedBidirectionalMaster
                | ChannelType::MasterTransmitOnly
        )
    }
}

/// Represents a Assign Channel message (0x42)
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "3")]
pub struct AssignChannel {
    /// Channel to be initialized
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    #[new(default)]
    #[packed_field(bits = "12:15")]
    _reserved: ReservedZeroes<packed_bits::Bits<4>>,
    /// Channel type to be configured
    #[packed_field(bits = "8:11", ty = "enum")]
    pub channel_type: ChannelType,
    /// Which network key to use, set keys via [SetNetworkKey]
    #[packed_field(bytes = "2")]
    pub network_number: u8,
}

#[derive(PrimitiveEnum_u8, PartialEq, Copy, Clone, Debug, Default)]
pub enum TransmissionChannelType {
    Reserved = 0b00,
    #[default]
    IndependentChannel = 0b01,
    SharedChannel1ByteAddress = 0b10,
    SharedChannel2ByteAddress = 0b11,
}

#[derive(PrimitiveEnum_u8, Clone, Copy, PartialEq, Debug, Default)]
pub enum TransmissionGlobalDataPages {
    #[default]
    GlobalDataPagesNotUsed = 0,
    GlobalDataPagesUsed = 1,
}

#[derive(PackedStruct, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "1")]
pub struct TransmissionType {
    #[packed_field(bits = "0:1", ty = "enum")]
    pub transmission_channel_type: TransmissionChannelType,
    #[packed_field(bits = "2", ty = "enum")]
    pub global_datapages_used: TransmissionGlobalDataPages,
    #[new(default)]
    #[packed_field(bits = "3")]
    _reserved: ReservedZeroes<packed_bits::Bits<1>>,
    #[packed_field(bits = "4:7")]
    pub device_number_extension: Integer<u8, packed_bits::Bits<4>>,
}

impl TransmissionType {
    /// Constructs a new `TransmissionType` with wildcarded values, slaves use this to pair with
    /// any master.
    pub fn new_wildcard() -> Self {
        Self {
            transmission_channel_type: TransmissionChannelType::Reserved,
            global_datapages_used: TransmissionGlobalDataPages::GlobalDataPagesNotUsed,
            device_number_extension: 0.into(),
            ..TransmissionType::default()
        }
    }
}

#[derive(PackedStruct, new, Copy, Clone, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "lsb0", size_bytes = "1")]
pub struct DeviceType {
    #[packed_field(bits = "0:6")]
    pub device_type_id: Integer<u8, packed_bits::Bits<7>>,
    #[packed_field(bits = "7")]
    pub pairing_request: bool,
}

impl DeviceType {
    /// Plain device type without a pairing request
    pub fn from_id(id: u8) -> Self {
        Self::new(id.into(), false)
    }
}

/// Represents a Channel Id message (0x51)
///
/// This message is both RX and TX capable
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "5")]
pub struct ChannelId {
    /// Channel number to configure or from request
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    /// Device ID of channel
    ///
    /// if this is a slave channel and was wildcarded initiallially this will contain the master's
    /// ID once a connection is formed
    #[packed_field(bytes = "1:2")]
    pub device_number: u16,
    #[packed_field(bytes = "3")]
    pub device_type: DeviceType,
    #[packed_field(bytes = "4")]
    pub transmission_type: TransmissionType,
}

/// Represents a Channel Period message (0x43)
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "3")]
pub struct ChannelPeriod {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    /// 32768 / message frequency = period
    #[packed_field(bytes = "1:2")]
    pub channel_period: u16,
}

/// Represents a Search Timeout message (0x44)
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "2")]
pub struct SearchTimeout {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    /// 2.5s * search_timeout = time searching
    /// 0 - no search
    /// 255 - infinite search
    #[packed_field(bytes = "1")]
    pub search_timeout: u8,
}

/// Represents a Channel RF Frequency (0x45)
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, Default, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "2")]
pub struct ChannelRfFrequency {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    /// 2400 MHz + rf_frequency = operating frequency
    #[packed_field(bytes = "1")]
    pub rf_frequency: u8,
}

/// Represents a Set Network Key message (0x46)
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, Default, PartialEq)]
#[ant_tx(id = "NetworkKey")]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "9")]
pub struct SetNetworkKey {
    /// Max value is device dependent
    #[packed_field(bytes = "0")]
    pub network_number: u8,
    #[packed_field(bytes = "1:8")]
    pub network_key: [u8; 8], // AKA NETWORK_KEY_SIZE but PackedStruct doens't like const
}

impl SetNetworkKey {
    /// Size of a default network key
    pub const NETWORK_KEY_SIZE: usize = 8;
}

#[derive(PrimitiveEnum_u16, Clone, Copy, PartialEq, Debug, Default)]
pub enum SearchWaveformValue {
    #[default]
    Standard = 316,
    Fast = 97,
}

/// Represents a Search Waveform message (0x49)
#[derive(PackedStruct, AntTx, new, Clone, Copy, Debug, PartialEq)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "3")]
pub struct SearchWaveform {
    #[packed_field(bytes = "0")]
    pub channel_number: u8,
    /// Recommend values are in [SearchWaveformValue], anything else goes through the catch all
    #[packed_field(bytes = "1:2", ty = "enum")]
    pub waveform: EnumCatchAll<SearchWaveformValue>,
}
