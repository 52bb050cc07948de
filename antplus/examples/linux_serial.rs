// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bring up every supported profile on a radio attached to a serial port and print what the
//! sensors report.
//!
//! Usage: linux_serial <TTY> [BAUD]
//!
//! Set RUST_LOG=antplus=debug to follow the channel bring up.

use antplus::drivers::{Driver, SerialDriver, StubPin};
use antplus::plus::{NetworkKey, Notification};
use antplus::router::{Router, RouterConfig};

use dialoguer::Select;
use linux_embedded_hal::Serial;
use thingbuf::mpsc::channel;
use tracing_subscriber::EnvFilter;

use std::env;
use std::thread;
use std::time::{Duration, Instant};

const KEYS: [&str; 4] = ["ANT+ sport", "Suunto", "Garmin", "ANT+ (licensed)"];

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || args.len() > 2 {
        panic!("Expected TTY and optional baud rate");
    }
    let baud = args
        .get(1)
        .map(|b| b.parse().expect("Invalid baud rate"))
        .unwrap_or(115200);
    let serial = Serial::open(args[0].clone(), baud).expect("Serial failed to open");

    let key = Select::new()
        .with_prompt("Network key")
        .items(&KEYS)
        .default(0)
        .interact()
        .expect("Selection failed");

    let (sink, notifications) = channel::<Notification>(32);
    let config = RouterConfig {
        network_key: NetworkKey::from_index(key),
        ..RouterConfig::default()
    };
    let mut router = Router::new(config, sink);

    let rx = router.rx_slot();
    let tx = router.tx_queue();
    thread::spawn(move || {
        let mut driver = SerialDriver::<_, StubPin>::new(serial, None);
        loop {
            if let Err(e) = driver.poll(&rx, &tx) {
                eprintln!("Serial error: {e}");
            }
            thread::sleep(Duration::from_millis(1));
        }
    });

    router.start(Instant::now());
    loop {
        router.on_timer(Instant::now());
        router.process();
        while let Ok(notification) = notifications.try_recv() {
            match notification {
                Notification::ChannelStatus { .. } => {
                    println!("{:#04x}", notification.packed_status().unwrap_or_default())
                }
                notification => println!("{notification:?}"),
            }
        }
        thread::sleep(Duration::from_millis(5));
    }
}
