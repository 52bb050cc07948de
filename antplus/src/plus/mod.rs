// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! ANT+ device profiles and the per channel logic that brings them up.

use crate::messages::config::{DeviceType, SetNetworkKey, TransmissionType};
use crate::messages::requested_response::ChannelState;
use crate::plus::profiles::ProfileReading;

pub mod common;
pub mod profiles;

pub const NETWORK_RF_FREQUENCY: u8 = 57;

/// Number of profiles, each one owns the channel matching its index
pub const PROFILE_COUNT: usize = 6;

/// Network keys the engine knows about
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NetworkKey {
    /// Public ANT+ sport key
    #[default]
    AntSport,
    Suunto,
    Garmin,
    /// Placeholder for the licensed ANT+ key, all zeroes until one is supplied with [NetworkKey::Custom]
    AntPlus,
    Custom([u8; SetNetworkKey::NETWORK_KEY_SIZE]),
}

impl NetworkKey {
    const ANT_SPORT: [u8; 8] = [0xB9, 0xA5, 0x21, 0xFB, 0xBD, 0x72, 0xC3, 0x45];
    const SUUNTO: [u8; 8] = [0xB9, 0xAD, 0x32, 0x28, 0x75, 0x7E, 0xC7, 0x4D];
    const GARMIN: [u8; 8] = [0xA8, 0xA4, 0x23, 0xB9, 0xF5, 0x5E, 0x63, 0xC1];
    const ANT_PLUS: [u8; 8] = [0; 8];

    /// Index into the key table, unknown indexes fall back to the default key
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => NetworkKey::Suunto,
            2 => NetworkKey::Garmin,
            3 => NetworkKey::AntPlus,
            _ => NetworkKey::AntSport,
        }
    }

    pub fn key_bytes(&self) -> [u8; SetNetworkKey::NETWORK_KEY_SIZE] {
        match self {
            NetworkKey::AntSport => Self::ANT_SPORT,
            NetworkKey::Suunto => Self::SUUNTO,
            NetworkKey::Garmin => Self::GARMIN,
            NetworkKey::AntPlus => Self::ANT_PLUS,
            NetworkKey::Custom(key) => *key,
        }
    }
}

/// Supported device profiles, the discriminant doubles as the channel number
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Profile {
    #[default]
    HeartRate = 0,
    SpeedAndCadence = 1,
    Power = 2,
    Stride = 3,
    BikeSpeed = 4,
    BikeCadence = 5,
}

impl Profile {
    pub const ALL: [Profile; PROFILE_COUNT] = [
        Profile::HeartRate,
        Profile::SpeedAndCadence,
        Profile::Power,
        Profile::Stride,
        Profile::BikeSpeed,
        Profile::BikeCadence,
    ];

    pub fn channel(self) -> u8 {
        self as u8
    }

    pub fn from_channel(channel: u8) -> Option<Self> {
        Self::ALL.get(channel as usize).copied()
    }

    pub fn device_type(self) -> u8 {
        match self {
            Profile::HeartRate => 120,
            Profile::SpeedAndCadence => 121,
            Profile::Power => 11,
            Profile::Stride => 124,
            Profile::BikeSpeed => 123,
            Profile::BikeCadence => 122,
        }
    }

    /// Channel period in 1/32768 s
    pub fn channel_period(self) -> u16 {
        match self {
            Profile::HeartRate => 8070,
            Profile::SpeedAndCadence => 8086,
            Profile::Power => 8182,
            Profile::Stride => 8134,
            Profile::BikeSpeed => 8118,
            Profile::BikeCadence => 8102,
        }
    }
}

/// Identity of the master a channel paired with
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeviceIdentity {
    pub device_number: u16,
    pub device_type: DeviceType,
    pub transmission_type: TransmissionType,
}

/// Everything the engine reports to the application
#[derive(Clone, Debug, PartialEq)]
pub enum Notification {
    ChannelStatus { channel: u8, status: ChannelState },
    DeviceId { channel: u8, identity: DeviceIdentity },
    Reading {
        channel: u8,
        profile: Profile,
        reading: ProfileReading,
    },
}

// Hack to allow channels to recycle memory, not for actual use
impl Default for Notification {
    fn default() -> Notification {
        Notification::ChannelStatus {
            channel: 0,
            status: ChannelState::UnAssigned,
        }
    }
}

impl Notification {
    pub fn channel(&self) -> u8 {
        match self {
            Notification::ChannelStatus { channel, .. }
            | Notification::DeviceId { channel, .. }
            | Notification::Reading { channel, .. } => *channel,
        }
    }

    /// Status in the low nibble and channel in the high nibble, `None` for other notifications
    pub fn packed_status(&self) -> Option<u8> {
        match self {
            Notification::ChannelStatus { channel, status } => {
                Some((*status as u8 & 0x0F) | ((channel & 0x0F) << 4))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_key_table() {
        assert_eq!(
            NetworkKey::from_index(0).key_bytes(),
            [0xB9, 0xA5, 0x21, 0xFB, 0xBD, 0x72, 0xC3, 0x45]
        );
        assert_eq!(NetworkKey::from_index(1), NetworkKey::Suunto);
        assert_eq!(NetworkKey::from_index(2).key_bytes()[0], 0xA8);
        assert_eq!(NetworkKey::from_index(3).key_bytes(), [0; 8]);
        assert_eq!(NetworkKey::from_index(9), NetworkKey::AntSport);
        assert_eq!(NetworkKey::Custom([1; 8]).key_bytes(), [1; 8]);
    }

    #[test]
    fn profile_defaults() {
        let types: Vec<u8> = Profile::ALL.iter().map(|p| p.device_type()).collect();
        assert_eq!(types, [120, 121, 11, 124, 123, 122]);
        let periods: Vec<u16> = Profile::ALL.iter().map(|p| p.channel_period()).collect();
        assert_eq!(periods, [8070, 8086, 8182, 8134, 8118, 8102]);
        for (i, profile) in Profile::ALL.iter().enumerate() {
            assert_eq!(profile.channel() as usize, i);
            assert_eq!(Profile::from_channel(i as u8), Some(*profile));
        }
        assert_eq!(Profile::from_channel(6), None);
    }

    #[test]
    fn packed_status() {
        let status = Notification::ChannelStatus {
            channel: 2,
            status: ChannelState::Tracking,
        };
        assert_eq!(status.packed_status(), Some(0x23));
        assert_eq!(status.channel(), 2);
        assert_eq!(Notification::default().packed_status(), Some(0));
    }
}
