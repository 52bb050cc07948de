// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rollover safe arithmetic shared by the profile decoders.
//!
//! Sensors report free running counters and event times in 1/1024 s. All deltas assume the counter
//! wrapped at most once between two samples.

use crate::messages::data::DATA_PAYLOAD_SIZE;

/// Event time resolution, ticks per second
pub const EVENT_TIME_TICKS: u32 = 1024;

pub type Payload = [u8; DATA_PAYLOAD_SIZE];

pub fn read_u16(data: &Payload, offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

pub fn saturate_u16(value: u64) -> u16 {
    value.min(u16::MAX as u64) as u16
}

/// One (event time, event count) pair as reported by a sensor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventSample {
    pub time: u16,
    pub count: u16,
}

impl EventSample {
    /// Time at `offset`, count right after it
    pub fn read(data: &Payload, offset: usize) -> Self {
        Self {
            time: read_u16(data, offset),
            count: read_u16(data, offset + 2),
        }
    }
}

/// Change between two consecutive samples
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventDelta {
    pub time: u16,
    pub count: u16,
}

/// Tracks the previous sample of an event counter
#[derive(Clone, Copy, Debug, Default)]
pub struct EventCounter {
    last: Option<EventSample>,
}

impl EventCounter {
    /// Record `sample`, returns the delta if this is not the first sample and something moved
    pub fn update(&mut self, sample: EventSample) -> Option<EventDelta> {
        let previous = self.last.replace(sample)?;
        if previous == sample {
            return None;
        }
        Some(EventDelta {
            time: sample.time.wrapping_sub(previous.time),
            count: sample.count.wrapping_sub(previous.count),
        })
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Revolutions per minute, `None` when no time passed
pub fn cadence_rpm(delta: EventDelta) -> Option<u16> {
    if delta.time == 0 {
        return None;
    }
    let rpm = 60 * delta.count as u64 * EVENT_TIME_TICKS as u64 / delta.time as u64;
    Some(saturate_u16(rpm))
}

/// Speed in 0.01 km/h, `None` when no time passed
///
/// 36864 folds the 1024 tick rate, the mm to km/h conversion (3.6 / 1000) and the x100 scale into
/// a single integer ratio with the 100 in the divisor.
pub fn speed_centi_kph(delta: EventDelta, circumference_mm: u16) -> Option<u16> {
    if delta.time == 0 {
        return None;
    }
    let speed = delta.count as u64 * circumference_mm as u64 * 36864 / (100 * delta.time as u64);
    Some(saturate_u16(speed))
}

/// Distance covered in mm
pub fn distance_mm(delta: EventDelta, circumference_mm: u16) -> u64 {
    delta.count as u64 * circumference_mm as u64
}

/// Convert 1/1024 s ticks to milliseconds
pub fn ticks_to_ms(ticks: u16) -> u16 {
    (ticks as u32 * 1000 / EVENT_TIME_TICKS) as u16
}
