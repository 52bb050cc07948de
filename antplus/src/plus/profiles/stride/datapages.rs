// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use derive_new::new;
use packed_struct::prelude::*;

#[derive(PrimitiveEnum_u8, PartialEq, Copy, Clone, Debug)]
pub enum DataPageNumbers {
    StrideCount = 0,
    SpeedAndCadence = 1,
}

#[derive(PackedStruct, new, PartialEq, Copy, Clone, Debug)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8")]
pub struct StrideCount {
    #[new(value = "DataPageNumbers::StrideCount.to_primitive()")]
    #[packed_field(bytes = "0")]
    data_page_number: u8,
    #[new(value = "[0xFF; 5]")]
    #[packed_field(bytes = "1:5")]
    _reserved: [u8; 5],
    /// Rolls over at 256
    #[packed_field(bytes = "6")]
    pub stride_count: u8,
    #[packed_field(bytes = "7")]
    pub latency: u8,
}

#[derive(PackedStruct, new, PartialEq, Copy, Clone, Debug)]
#[packed_struct(bit_numbering = "msb0", size_bytes = "8")]
pub struct SpeedAndCadence {
    #[new(value = "DataPageNumbers::SpeedAndCadence.to_primitive()")]
    #[packed_field(bytes = "0")]
    data_page_number: u8,
    #[packed_field(bytes = "1")]
    pub time_fractional: u8,
    /// Strides/min
    #[packed_field(bytes = "2")]
    pub cadence_integer: u8,
    /// 1/16 strides/min
    #[packed_field(bits = "24:27")]
    pub cadence_fractional: Integer<u8, packed_bits::Bits<4>>,
    /// m/s
    #[packed_field(bits = "28:31")]
    pub speed_integer: Integer<u8, packed_bits::Bits<4>>,
    /// 1/256 m/s
    #[packed_field(bytes = "4")]
    pub speed_fractional: u8,
    #[new(value = "[0xFF; 3]")]
    #[packed_field(bytes = "5:7")]
    _reserved: [u8; 3],
}

impl SpeedAndCadence {
    /// Speed in 1/256 m/s
    pub fn speed(&self) -> u16 {
        (u8::from(self.speed_integer) as u16) << 8 | self.speed_fractional as u16
    }

    /// Cadence in 1/16 strides/min
    pub fn cadence(&self) -> u16 {
        (self.cadence_integer as u16) << 4 | u8::from(self.cadence_fractional) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_count() {
        let page = StrideCount::unpack(&[0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 42, 3]).unwrap();
        assert_eq!(page.stride_count, 42);
        assert_eq!(page.latency, 3);
    }

    #[test]
    fn speed_and_cadence() {
        // 90.5 strides/min, 3.5 m/s
        let page = SpeedAndCadence::unpack(&[0x01, 0, 90, 0x83, 0x80, 0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(page.cadence_integer, 90);
        assert_eq!(u8::from(page.cadence_fractional), 8);
        assert_eq!(u8::from(page.speed_integer), 3);
        assert_eq!(page.speed(), 3 * 256 + 128);
        assert_eq!(page.cadence(), 90 * 16 + 8);
    }
}
