// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Page layouts shared by more than one profile

use crate::plus::common::helpers::{EventSample, Payload};
use derive_new::new;
use packed_struct::prelude::*;

pub const DATA_PAGE_NUMBER_MASK: u8 = 0x7F;

/// Page number of a broadcast, ignoring the page change toggle
pub fn page_number(data: &Payload) -> u8 {
    data[0] & DATA_PAGE_NUMBER_MASK
}

/// Layout used by the standalone bike speed and bike cadence sensors. Every page carries the
/// event time and revolution count in its last four bytes.
#[derive(PackedStruct, new, PartialEq, Copy, Clone, Debug)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "8")]
pub struct SingleSensorPage {
    #[packed_field(bits = "0")]
    pub page_change_toggle: bool,
    #[packed_field(bits = "1:7")]
    pub data_page_number: Integer<u8, packed_bits::Bits<7>>,
    #[packed_field(bytes = "1:3")]
    pub page_specific: [u8; 3],
    /// 1/1024 s
    #[packed_field(bytes = "4:5")]
    pub event_time: u16,
    #[packed_field(bytes = "6:7")]
    pub revolution_count: u16,
}

impl SingleSensorPage {
    pub fn sample(&self) -> EventSample {
        EventSample {
            time: self.event_time,
            count: self.revolution_count,
        }
    }
}
