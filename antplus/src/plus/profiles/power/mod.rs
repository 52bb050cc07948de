// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bicycle power meter, device type 11

mod datapages;
mod display;

pub use datapages::*;
pub use display::*;

use crate::plus::common::helpers::Payload;

/// Raw page as broadcast, with the power-only page broken out when that is what arrived
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerReading {
    pub page: u8,
    pub data: Payload,
    pub standard: Option<StandardPowerOnly>,
}
