// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::plus::common::helpers::{
    cadence_rpm, distance_mm, speed_centi_kph, EventCounter, Payload,
};
use crate::plus::profiles::speed_and_cadence::{SpeedAndCadence, SpeedAndCadenceReading};

use packed_struct::PackedStruct;
use tracing::debug;

pub struct Display {
    wheel_circumference_mm: u16,
    cadence: EventCounter,
    speed: EventCounter,
    reading: SpeedAndCadenceReading,
}

impl Display {
    pub fn new(wheel_circumference_mm: u16) -> Self {
        Self {
            wheel_circumference_mm,
            cadence: EventCounter::default(),
            speed: EventCounter::default(),
            reading: SpeedAndCadenceReading::default(),
        }
    }

    pub fn set_wheel_circumference(&mut self, wheel_circumference_mm: u16) {
        self.wheel_circumference_mm = wheel_circumference_mm;
    }

    pub fn reset_state(&mut self) {
        self.cadence.reset();
        self.speed.reset();
        self.reading = SpeedAndCadenceReading::default();
    }

    /// The first page only seeds the counters. Afterwards a reading is emitted whenever either
    /// sensor moved, a side whose time did not advance keeps its previous value.
    pub fn decode(&mut self, data: &Payload) -> Option<SpeedAndCadenceReading> {
        let page = match SpeedAndCadence::unpack(data) {
            Ok(page) => page,
            Err(err) => {
                debug!(?err, "malformed speed and cadence page");
                return None;
            }
        };
        let cadence = self.cadence.update(page.cadence_sample());
        let speed = self.speed.update(page.speed_sample());
        if cadence.is_none() && speed.is_none() {
            return None;
        }

        if let Some(rpm) = cadence.and_then(cadence_rpm) {
            self.reading.cadence_rpm = rpm;
        }
        if let Some(delta) = speed {
            self.reading.distance_mm += distance_mm(delta, self.wheel_circumference_mm);
            if let Some(speed) = speed_centi_kph(delta, self.wheel_circumference_mm) {
                self.reading.speed_centi_kph = speed;
            }
        }
        Some(self.reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(cad_time: u16, cad_count: u16, spd_time: u16, spd_count: u16) -> Payload {
        let mut data = [0; 8];
        data[0..2].copy_from_slice(&cad_time.to_le_bytes());
        data[2..4].copy_from_slice(&cad_count.to_le_bytes());
        data[4..6].copy_from_slice(&spd_time.to_le_bytes());
        data[6..8].copy_from_slice(&spd_count.to_le_bytes());
        data
    }

    #[test]
    fn first_page_seeds() {
        let mut display = Display::new(2122);
        assert_eq!(display.decode(&page(100, 1, 100, 1)), None);
    }

    #[test]
    fn identical_counters_produce_nothing() {
        let mut display = Display::new(2122);
        display.decode(&page(100, 1, 100, 1));
        assert!(display.decode(&page(1124, 2, 1124, 2)).is_some());
        assert_eq!(display.decode(&page(1124, 2, 1124, 2)), None);
    }

    #[test]
    fn cadence_speed_and_distance() {
        let mut display = Display::new(2122);
        display.decode(&page(0, 0, 0, 0));
        let reading = display.decode(&page(1024, 1, 1024, 1)).unwrap();
        assert_eq!(reading.cadence_rpm, 60);
        assert_eq!(reading.speed_centi_kph, 763);
        assert_eq!(reading.distance_mm, 2122);

        let reading = display.decode(&page(2048, 2, 2048, 2)).unwrap();
        assert_eq!(reading.distance_mm, 4244);
    }

    #[test]
    fn stalled_cadence_keeps_previous_value() {
        let mut display = Display::new(2122);
        display.decode(&page(0, 0, 0, 0));
        display.decode(&page(1024, 1, 1024, 1));
        // only the wheel moved
        let reading = display.decode(&page(1024, 1, 1536, 2)).unwrap();
        assert_eq!(reading.cadence_rpm, 60);
        assert_eq!(reading.speed_centi_kph, 1527);
    }

    #[test]
    fn counters_roll_over() {
        let mut display = Display::new(2000);
        display.decode(&page(0xFC00, 0xFFFF, 0xFC00, 0xFFFF));
        let reading = display.decode(&page(0x0400, 0x0001, 0x0400, 0x0001)).unwrap();
        assert_eq!(reading.cadence_rpm, 60);
        assert_eq!(reading.distance_mm, 4000);
    }

    #[test]
    fn reset_clears_distance() {
        let mut display = Display::new(2122);
        display.decode(&page(0, 0, 0, 0));
        display.decode(&page(1024, 1, 1024, 1));
        display.reset_state();
        assert_eq!(display.decode(&page(2048, 2, 2048, 2)), None);
        let reading = display.decode(&page(3072, 3, 3072, 3)).unwrap();
        assert_eq!(reading.distance_mm, 2122);
    }
}
