// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::plus::common::datapages::page_number;
use crate::plus::common::helpers::Payload;
use crate::plus::profiles::stride::{DataPageNumbers, SpeedAndCadence, StrideCount, StrideReading};

use packed_struct::prelude::{PackedStruct, PrimitiveEnum};
use tracing::debug;

#[derive(Default)]
pub struct Display {
    reading: StrideReading,
    reported: bool,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_state(&mut self) {
        self.reading = StrideReading::default();
        self.reported = false;
    }

    /// Emits when a stride count or speed page changes a value, other pages are ignored
    pub fn decode(&mut self, data: &Payload) -> Option<StrideReading> {
        let page = page_number(data);
        let previous = self.reading;
        match DataPageNumbers::from_primitive(page)? {
            DataPageNumbers::StrideCount => {
                let parsed = StrideCount::unpack(data).ok()?;
                self.reading.strides = parsed.stride_count;
            }
            DataPageNumbers::SpeedAndCadence => {
                let parsed = match SpeedAndCadence::unpack(data) {
                    Ok(parsed) => parsed,
                    Err(err) => {
                        debug!(?err, "malformed stride speed page");
                        return None;
                    }
                };
                self.reading.speed = parsed.speed();
                self.reading.cadence = parsed.cadence();
            }
        }
        if self.reported
            && previous.strides == self.reading.strides
            && previous.speed == self.reading.speed
            && previous.cadence == self.reading.cadence
        {
            return None;
        }
        self.reported = true;
        self.reading.page = page;
        Some(self.reading)
    }
}
