// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::plus::common::datapages::page_number;
use crate::plus::common::helpers::Payload;
use crate::plus::profiles::power::{DataPageNumbers, PowerReading, StandardPowerOnly};

use packed_struct::prelude::{PackedStruct, PrimitiveEnum};

/// Power pages are passed on as they arrive, there is no state to track
#[derive(Default)]
pub struct Display {}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_state(&mut self) {}

    pub fn decode(&mut self, data: &Payload) -> Option<PowerReading> {
        let page = page_number(data);
        let standard = match DataPageNumbers::from_primitive(page) {
            Some(DataPageNumbers::StandardPowerOnly) => StandardPowerOnly::unpack(data).ok(),
            None => None,
        };
        Some(PowerReading {
            page,
            data: *data,
            standard,
        })
    }
}
