// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use derive_new::new;
use packed_struct::prelude::*;

/// The last 4 bytes in every message in the heart rate profile are the same, this maps out those
/// fields
#[derive(PackedStruct, new, PartialEq, Copy, Clone, Debug)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "4")]
pub struct CommonData {
    #[packed_field(bytes = "0:1")]
    pub heart_beat_event_time: u16,
    #[packed_field(bytes = "2")]
    pub heart_beat_count: u8,
    #[packed_field(bytes = "3")]
    pub computed_heart_rate: u8,
}

/// Every heart rate page, whatever its number, is laid out this way
#[derive(PackedStruct, new, PartialEq, Copy, Clone, Debug)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8")]
pub struct HeartRatePage {
    #[packed_field(bits = "0")]
    pub page_change_toggle: bool,
    #[packed_field(bits = "1:7")]
    pub data_page_number: Integer<u8, packed_bits::Bits<7>>,
    /// Content depends on the page number
    #[packed_field(bytes = "1:3")]
    pub page_specific: [u8; 3],
    #[packed_field(bytes = "4:7")]
    pub common: CommonData,
}
