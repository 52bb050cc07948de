// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Based off V2.5 of the Heart Rate specification

mod datapages;
mod display;

pub use datapages::*;
pub use display::*;

/// Measurement derived from one heart rate broadcast
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HeartRateReading {
    pub computed_heart_rate: u8,
    pub heart_beat_count: u8,
    /// 1/1024 s
    pub heart_beat_event_time: u16,
    /// Time since the previous beat, unknown for the first beat seen
    pub rr_interval_ms: Option<u16>,
}
