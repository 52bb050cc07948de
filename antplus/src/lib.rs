// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Host side ANT+ engine for Rust
//!
//! ## Introduction
//!
//! This crate talks to an ANT radio over a byte transport and turns what ANT+ sensors broadcast
//! into readings. It frames and validates messages, brings up one channel per supported profile by
//! walking the radio through its configuration handshake, and decodes heart rate, bike speed and
//! cadence, power and stride monitor pages with rollover safe arithmetic.
//!
//! For documentation of the actual implementation of the ANT stack and what each of these
//! individual messages do please visit the ant website at [thisisant.com](https://www.thisisant.com/)
//!
//! ## Layout
//!  * [messages]: typed ANT messages and burst helpers
//!  * [drivers]: frame codec, receive slot, transmit queue and a serial transport
//!  * [plus]: channel state machine and profile decoders
//!  * [router]: the task loop tying them together
//!  * [channel]: notification sinks
//!
//! ## Usage
//!
//! ```no_run
//! use antplus::plus::Notification;
//! use antplus::router::{Router, RouterConfig};
//! use std::time::Instant;
//!
//! let (tx, rx) = thingbuf::mpsc::channel::<Notification>(32);
//! let mut router = Router::new(RouterConfig::default(), tx);
//! let (rx_slot, tx_queue) = (router.rx_slot(), router.tx_queue());
//! // hand rx_slot and tx_queue to the transport, e.g. drivers::SerialDriver
//! router.start(Instant::now());
//! loop {
//!     router.on_timer(Instant::now());
//!     router.process();
//!     while let Ok(notification) = rx.try_recv() {
//!         println!("{notification:?}");
//!     }
//! #   break;
//! }
//! # drop((rx_slot, tx_queue));
//! ```
//!
//! ## Configuration
//!
//! The transmit queue size is fixed at compile time through `ANTPLUS_TX_BUFFER_SIZE`, default 512
//! bytes.
//!
//! The `std` feature, on by default, enables the [router] and the transport handoff types in
//! [drivers] since they need threads and clocks. Without it the messages, the codec, the channel
//! state machine and the profile decoders remain.

pub mod channel;
pub mod drivers;
pub mod messages;
pub mod plus;
#[cfg(feature = "std")]
pub mod router;
