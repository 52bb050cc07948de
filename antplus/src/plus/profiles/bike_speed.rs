// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Standalone bike speed sensor, device type 123

use crate::plus::common::datapages::SingleSensorPage;
use crate::plus::common::helpers::{distance_mm, speed_centi_kph, EventCounter, Payload};

use packed_struct::PackedStruct;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpeedReading {
    /// 0.01 km/h
    pub speed_centi_kph: u16,
    pub distance_mm: u64,
}

pub struct Display {
    wheel_circumference_mm: u16,
    counter: EventCounter,
    reading: SpeedReading,
}

impl Display {
    pub fn new(wheel_circumference_mm: u16) -> Self {
        Self {
            wheel_circumference_mm,
            counter: EventCounter::default(),
            reading: SpeedReading::default(),
        }
    }

    pub fn set_wheel_circumference(&mut self, wheel_circumference_mm: u16) {
        self.wheel_circumference_mm = wheel_circumference_mm;
    }

    pub fn reset_state(&mut self) {
        self.counter.reset();
        self.reading = SpeedReading::default();
    }

    pub fn decode(&mut self, data: &Payload) -> Option<SpeedReading> {
        let page = match SingleSensorPage::unpack(data) {
            Ok(page) => page,
            Err(err) => {
                debug!(?err, "malformed bike speed page");
                return None;
            }
        };
        let delta = self.counter.update(page.sample())?;
        self.reading.distance_mm += distance_mm(delta, self.wheel_circumference_mm);
        if let Some(speed) = speed_centi_kph(delta, self.wheel_circumference_mm) {
            self.reading.speed_centi_kph = speed;
        }
        Some(self.reading)
    }
}
