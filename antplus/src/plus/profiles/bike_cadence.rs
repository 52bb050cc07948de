// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Standalone bike cadence sensor, device type 122

use crate::plus::common::datapages::SingleSensorPage;
use crate::plus::common::helpers::{cadence_rpm, EventCounter, Payload};

use packed_struct::PackedStruct;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CadenceReading {
    pub cadence_rpm: u16,
}

#[derive(Default)]
pub struct Display {
    counter: EventCounter,
    reading: CadenceReading,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_state(&mut self) {
        self.counter.reset();
        self.reading = CadenceReading::default();
    }

    pub fn decode(&mut self, data: &Payload) -> Option<CadenceReading> {
        let page = match SingleSensorPage::unpack(data) {
            Ok(page) => page,
            Err(err) => {
                debug!(?err, "malformed bike cadence page");
                return None;
            }
        };
        let delta = self.counter.update(page.sample())?;
        if let Some(rpm) = cadence_rpm(delta) {
            self.reading.cadence_rpm = rpm;
        }
        Some(self.reading)
    }
}
