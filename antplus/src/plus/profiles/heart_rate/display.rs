// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::plus::common::helpers::{ticks_to_ms, Payload};
use crate::plus::profiles::heart_rate::{CommonData, HeartRatePage, HeartRateReading};

use packed_struct::PackedStruct;
use tracing::debug;

/// Receiving side of the heart rate profile
#[derive(Default)]
pub struct Display {
    last: Option<CommonData>,
}

impl Display {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_state(&mut self) {
        self.last = None;
    }

    /// A reading is produced when the beat count or rate moved and the rate is valid
    pub fn decode(&mut self, data: &Payload) -> Option<HeartRateReading> {
        let page = match HeartRatePage::unpack(data) {
            Ok(page) => page,
            Err(err) => {
                debug!(?err, "malformed heart rate page");
                return None;
            }
        };
        let common = page.common;
        let previous = self.last;

        if let Some(previous) = previous {
            if previous.heart_beat_count == common.heart_beat_count
                && previous.computed_heart_rate == common.computed_heart_rate
            {
                return None;
            }
        }
        // a suppressed sample never becomes the reference for the next interval
        if common.computed_heart_rate == 0 {
            return None;
        }
        self.last = Some(common);

        let rr_interval_ms = previous
            .filter(|p| p.heart_beat_count != common.heart_beat_count)
            .map(|p| {
                ticks_to_ms(
                    common
                        .heart_beat_event_time
                        .wrapping_sub(p.heart_beat_event_time),
                )
            });

        Some(HeartRateReading {
            computed_heart_rate: common.computed_heart_rate,
            heart_beat_count: common.heart_beat_count,
            heart_beat_event_time: common.heart_beat_event_time,
            rr_interval_ms,
        })
    }
}
