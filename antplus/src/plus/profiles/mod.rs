// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

pub mod bike_cadence;
pub mod bike_speed;
pub mod heart_rate;
pub mod power;
pub mod speed_and_cadence;
pub mod stride;

use crate::plus::common::helpers::Payload;
use crate::plus::Profile;

/// Wheel circumference used when none is configured, a 700x23C road tire
pub const DEFAULT_WHEEL_CIRCUMFERENCE_MM: u16 = 2122;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProfileReading {
    HeartRate(heart_rate::HeartRateReading),
    SpeedAndCadence(speed_and_cadence::SpeedAndCadenceReading),
    Power(power::PowerReading),
    Stride(stride::StrideReading),
    BikeSpeed(bike_speed::SpeedReading),
    BikeCadence(bike_cadence::CadenceReading),
}

/// Decoder state for whichever profile a channel runs
pub enum ProfileDecoder {
    HeartRate(heart_rate::Display),
    SpeedAndCadence(speed_and_cadence::Display),
    Power(power::Display),
    Stride(stride::Display),
    BikeSpeed(bike_speed::Display),
    BikeCadence(bike_cadence::Display),
}

impl ProfileDecoder {
    pub fn new(profile: Profile, wheel_circumference_mm: u16) -> Self {
        match profile {
            Profile::HeartRate => ProfileDecoder::HeartRate(heart_rate::Display::new()),
            Profile::SpeedAndCadence => ProfileDecoder::SpeedAndCadence(
                speed_and_cadence::Display::new(wheel_circumference_mm),
            ),
            Profile::Power => ProfileDecoder::Power(power::Display::new()),
            Profile::Stride => ProfileDecoder::Stride(stride::Display::new()),
            Profile::BikeSpeed => {
                ProfileDecoder::BikeSpeed(bike_speed::Display::new(wheel_circumference_mm))
            }
            Profile::BikeCadence => ProfileDecoder::BikeCadence(bike_cadence::Display::new()),
        }
    }

    pub fn profile(&self) -> Profile {
        match self {
            ProfileDecoder::HeartRate(_) => Profile::HeartRate,
            ProfileDecoder::SpeedAndCadence(_) => Profile::SpeedAndCadence,
            ProfileDecoder::Power(_) => Profile::Power,
            ProfileDecoder::Stride(_) => Profile::Stride,
            ProfileDecoder::BikeSpeed(_) => Profile::BikeSpeed,
            ProfileDecoder::BikeCadence(_) => Profile::BikeCadence,
        }
    }

    /// Feed one broadcast payload, returns a reading when something new was measured
    pub fn decode(&mut self, data: &Payload) -> Option<ProfileReading> {
        match self {
            ProfileDecoder::HeartRate(d) => d.decode(data).map(ProfileReading::HeartRate),
            ProfileDecoder::SpeedAndCadence(d) => {
                d.decode(data).map(ProfileReading::SpeedAndCadence)
            }
            ProfileDecoder::Power(d) => d.decode(data).map(ProfileReading::Power),
            ProfileDecoder::Stride(d) => d.decode(data).map(ProfileReading::Stride),
            ProfileDecoder::BikeSpeed(d) => d.decode(data).map(ProfileReading::BikeSpeed),
            ProfileDecoder::BikeCadence(d) => d.decode(data).map(ProfileReading::BikeCadence),
        }
    }

    /// Only the wheel based decoders use the circumference, the rest ignore it
    pub fn set_wheel_circumference(&mut self, wheel_circumference_mm: u16) {
        match self {
            ProfileDecoder::SpeedAndCadence(d) => d.set_wheel_circumference(wheel_circumference_mm),
            ProfileDecoder::BikeSpeed(d) => d.set_wheel_circumference(wheel_circumference_mm),
            _ => (),
        }
    }

    /// Forget previous samples, e.g. after the channel was re-opened
    pub fn reset(&mut self) {
        match self {
            ProfileDecoder::HeartRate(d) => d.reset_state(),
            ProfileDecoder::SpeedAndCadence(d) => d.reset_state(),
            ProfileDecoder::Power(d) => d.reset_state(),
            ProfileDecoder::Stride(d) => d.reset_state(),
            ProfileDecoder::BikeSpeed(d) => d.reset_state(),
            ProfileDecoder::BikeCadence(d) => d.reset_state(),
        }
    }
}
