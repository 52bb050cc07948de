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
    StandardPowerOnly = 0x10,
}

/// Pedal power byte when the sensor does not measure the left/right split
pub const PEDAL_POWER_NOT_USED: u8 = 0xFF;
/// Instantaneous cadence byte when the sensor has no cadence
pub const CADENCE_INVALID: u8 = 0xFF;

#[derive(PackedStruct, new, PartialEq, Copy, Clone, Debug)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "8")]
pub struct StandardPowerOnly {
    #[new(value = "DataPageNumbers::StandardPowerOnly.to_primitive()")]
    #[packed_field(bytes = "0")]
    data_page_number: u8,
    #[packed_field(bytes = "1")]
    pub update_event_count: u8,
    /// Bit 7 set means the percentage is the right pedal's contribution
    #[packed_field(bytes = "2")]
    pub pedal_power: u8,
    /// RPM
    #[packed_field(bytes = "3")]
    pub instantaneous_cadence: u8,
    /// Watts, rolls over at 65536
    #[packed_field(bytes = "4:5")]
    pub accumulated_power: u16,
    /// Watts
    #[packed_field(bytes = "6:7")]
    pub instantaneous_power: u16,
}

impl StandardPowerOnly {
    /// Percentage of the total power contributed by the right pedal, when known
    pub fn right_pedal_percent(&self) -> Option<u8> {
        if self.pedal_power == PEDAL_POWER_NOT_USED || self.pedal_power & 0x80 == 0 {
            return None;
        }
        Some(self.pedal_power & 0x7F)
    }

    pub fn cadence(&self) -> Option<u8> {
        match self.instantaneous_cadence {
            CADENCE_INVALID => None,
            cadence => Some(cadence),
        }
    }
}
