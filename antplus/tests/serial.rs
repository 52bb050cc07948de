// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use antplus::drivers::{calculate_checksum, decode_stream, Driver, SerialDriver, StubPin};
use antplus::messages::config::UnAssignChannel;
use antplus::messages::requested_response::ChannelState;
use antplus::plus::common::msg_handler::ConfigureState;
use antplus::plus::profiles::ProfileReading;
use antplus::plus::{Notification, Profile};
use antplus::router::{Router, RouterConfig};

use embedded_hal_nb::serial::{ErrorKind, ErrorType, Read, Write};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Default)]
struct Radio {
    incoming: VecDeque<u8>,
    outgoing: Vec<u8>,
    /// Channels that reported closed and may be unassigned
    closed: Vec<u8>,
}

impl Radio {
    fn push(&mut self, id: u8, data: &[u8]) {
        let mut frame = vec![0xA4, data.len() as u8, id];
        frame.extend_from_slice(data);
        frame.push(calculate_checksum(&frame));
        self.incoming.extend(frame);
    }

    /// Acknowledge every command written since the last call the way a radio would
    fn answer(&mut self) {
        let written = std::mem::take(&mut self.outgoing);
        for frame in decode_stream(&written) {
            let data = frame.payload;
            match frame.message_id {
                0x4A => self.push(0x6F, &[0x20]),
                0x4D => match data[1] {
                    0x52 => self.push(0x52, &[data[0], 0x03]),
                    0x51 => self.push(0x51, &[data[0], 0x34, 0x12, 120, 1]),
                    0x54 => self.push(0x54, &[8, 3, 0, 0]),
                    0x3E => self.push(0x3E, b"AP2USB1.05\0"),
                    other => panic!("unexpected request for {other:#04x}"),
                },
                0x4C => {
                    self.push(0x40, &[data[0], 0x4C, 0]);
                    self.push(0x40, &[data[0], 0x01, 0x07]);
                    self.closed.push(data[0]);
                }
                0x41 if !self.closed.contains(&data[0]) => {
                    // channel in wrong state
                    self.push(0x40, &[data[0], 0x41, 0x15]);
                }
                0x41 => {
                    self.closed.retain(|&c| c != data[0]);
                    self.push(0x40, &[data[0], 0x41, 0]);
                }
                id => self.push(0x40, &[data[0], id, 0]),
            }
        }
    }
}

#[derive(Clone, Default)]
struct MockSerial(Rc<RefCell<Radio>>);

impl ErrorType for MockSerial {
    type Error = ErrorKind;
}

impl Read<u8> for MockSerial {
    fn read(&mut self) -> nb::Result<u8, ErrorKind> {
        self.0
            .borrow_mut()
            .incoming
            .pop_front()
            .ok_or(nb::Error::WouldBlock)
    }
}

impl Write<u8> for MockSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), ErrorKind> {
        self.0.borrow_mut().outgoing.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), ErrorKind> {
        Ok(())
    }
}

type Sink = RefCell<Vec<Notification>>;

fn setup(profiles: &[Profile]) -> (Router<Sink>, SerialDriver<MockSerial, StubPin>, MockSerial) {
    let config = RouterConfig {
        profiles: profiles.to_vec(),
        ..RouterConfig::default()
    };
    let router = Router::new(config, RefCell::new(Vec::new()));
    let serial = MockSerial::default();
    let driver = SerialDriver::new(serial.clone(), None);
    (router, driver, serial)
}

fn run(
    router: &mut Router<Sink>,
    driver: &mut SerialDriver<MockSerial, StubPin>,
    serial: &MockSerial,
    rounds: usize,
) {
    let rx = router.rx_slot();
    let tx = router.tx_queue();
    for _ in 0..rounds {
        driver.poll(&rx, &tx).unwrap();
        serial.0.borrow_mut().answer();
        router.process();
    }
}

fn power_up(router: &mut Router<Sink>) {
    let t0 = Instant::now();
    router.start(t0);
    assert!(router.on_timer(t0 + Duration::from_millis(500)));
}

#[test]
fn heart_rate_end_to_end() {
    let (mut router, mut driver, serial) = setup(&[Profile::HeartRate]);
    power_up(&mut router);
    run(&mut router, &mut driver, &serial, 30);

    let channel = router.channel(0).unwrap();
    assert_eq!(channel.state(), ConfigureState::Tracking);
    assert_eq!(router.capabilities().map(|c| c.max_networks), Some(3));

    for (time, count) in [(0x0400u16, 1u8), (0x0800, 2), (0x0800, 2), (0x0C00, 3)] {
        let time = time.to_le_bytes();
        serial
            .0
            .borrow_mut()
            .push(0x4E, &[0, 0x04, 0xFF, 0xFF, 0xFF, time[0], time[1], count, 60]);
        run(&mut router, &mut driver, &serial, 2);
    }

    let notifications = router.sink().borrow();
    assert_eq!(
        notifications[0],
        Notification::ChannelStatus {
            channel: 0,
            status: ChannelState::Tracking
        }
    );
    let intervals: Vec<Option<u16>> = notifications
        .iter()
        .filter_map(|n| match n {
            Notification::Reading {
                profile: Profile::HeartRate,
                reading: ProfileReading::HeartRate(reading),
                ..
            } => Some(reading.rr_interval_ms),
            _ => None,
        })
        .collect();
    // the repeated page is not reported
    assert_eq!(intervals, [None, Some(1000), Some(1000)]);
    assert!(notifications.iter().any(|n| matches!(
        n,
        Notification::DeviceId { channel: 0, identity } if identity.device_number == 0x1234
    )));
}

#[test]
fn every_profile_comes_up() {
    let (mut router, mut driver, serial) = setup(&Profile::ALL);
    power_up(&mut router);
    run(&mut router, &mut driver, &serial, 200);

    for profile in Profile::ALL {
        let channel = router.channel(profile.channel()).unwrap();
        assert_eq!(channel.state(), ConfigureState::Tracking, "{profile:?}");
    }
    let statuses = router
        .sink()
        .borrow()
        .iter()
        .filter_map(Notification::packed_status)
        .collect::<Vec<u8>>();
    assert_eq!(statuses, [0x03, 0x13, 0x23, 0x33, 0x43, 0x53]);
    assert!(router.tx_queue().is_empty());
    assert!(serial.0.borrow().incoming.is_empty());
}

#[test]
fn closing_a_channel() {
    let (mut router, mut driver, serial) = setup(&[Profile::BikeCadence]);
    power_up(&mut router);
    run(&mut router, &mut driver, &serial, 30);
    assert!(router.channel(5).unwrap().is_tracking());

    assert_eq!(router.close_channel(5), Ok(5));
    run(&mut router, &mut driver, &serial, 5);

    assert_eq!(router.channel(5).unwrap().state(), ConfigureState::Unassigned);
    assert_eq!(
        router.sink().borrow().last(),
        Some(&Notification::ChannelStatus {
            channel: 5,
            status: ChannelState::UnAssigned
        })
    );

    assert_eq!(router.open_channel(5), Ok(13));
    run(&mut router, &mut driver, &serial, 30);
    assert!(router.channel(5).unwrap().is_tracking());
    let statuses = router
        .sink()
        .borrow()
        .iter()
        .filter_map(Notification::packed_status)
        .collect::<Vec<u8>>();
    assert_eq!(statuses, [0x53, 0x50, 0x53]);
}

#[test]
fn early_unassign_is_refused() {
    let (mut router, mut driver, serial) = setup(&[Profile::BikeCadence]);
    power_up(&mut router);
    run(&mut router, &mut driver, &serial, 30);

    router.send(&UnAssignChannel::new(5));
    run(&mut router, &mut driver, &serial, 3);
    assert!(router.channel(5).unwrap().is_tracking());
}
