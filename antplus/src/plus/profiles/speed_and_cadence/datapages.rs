// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::plus::common::helpers::EventSample;
use derive_new::new;
use packed_struct::prelude::*;

/// The combined sensor only has one page and no page number
#[derive(PackedStruct, new, PartialEq, Copy, Clone, Debug)]
#[packed_struct(bit_numbering = "msb0", endian = "lsb", size_bytes = "8")]
pub struct SpeedAndCadence {
    /// Time of the last valid bike cadence event (1/1024 sec)
    #[packed_field(bytes = "0:1")]
    pub cadence_event_time: u16,
    /// Total number of pedal revolutions
    #[packed_field(bytes = "2:3")]
    pub cadence_revolution_count: u16,
    /// Time of the last valid bike speed event (1/1024 sec)
    #[packed_field(bytes = "4:5")]
    pub speed_event_time: u16,
    /// Total number of wheel revolutions
    #[packed_field(bytes = "6:7")]
    pub speed_revolution_count: u16,
}

impl SpeedAndCadence {
    pub fn cadence_sample(&self) -> EventSample {
        EventSample {
            time: self.cadence_event_time,
            count: self.cadence_revolution_count,
        }
    }

    pub fn speed_sample(&self) -> EventSample {
        EventSample {
            time: self.speed_event_time,
            count: self.speed_revolution_count,
        }
    }
}
