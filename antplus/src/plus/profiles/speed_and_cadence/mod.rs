// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Combined bike speed and cadence sensor, device type 121

mod datapages;
mod display;

pub use datapages::*;
pub use display::*;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SpeedAndCadenceReading {
    pub cadence_rpm: u16,
    /// 0.01 km/h
    pub speed_centi_kph: u16,
    /// Accumulated since the decoder was last reset
    pub distance_mm: u64,
}
