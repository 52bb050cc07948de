// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Stride based speed and distance monitor, device type 124

mod datapages;
mod display;

pub use datapages::*;
pub use display::*;

/// Latest values seen, fields a page does not carry keep their previous value
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StrideReading {
    /// Page the reading was updated from
    pub page: u8,
    pub strides: u8,
    /// 1/256 m/s
    pub speed: u16,
    /// 1/16 strides/min
    pub cadence: u16,
}
