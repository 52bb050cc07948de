// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::drivers::EncodedMessage;
use crate::messages::MAX_MESSAGE_SIZE;
use const_utils::{max, min};
use konst::{option::unwrap_or, primitive::parse_usize, unwrap_ctx};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::trace;

/// Bytes of outbound storage, override at build time with `ANTPLUS_TX_BUFFER_SIZE`
///
/// Values are clamped so at least two maximum sized frames always fit.
pub const TX_BUFFER_SIZE: usize = min(
    max(
        unwrap_ctx!(parse_usize(unwrap_or!(
            option_env!("ANTPLUS_TX_BUFFER_SIZE"),
            "512"
        ))),
        130,
    ),
    4096,
);

// Written where the next entry would have started when the writer wraps early. Size bytes never
// exceed MAX_MESSAGE_SIZE so this cannot be mistaken for an entry.
const WRAP_MARKER: u8 = 0xFF;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum TxQueueError {
    #[error("frame of {0} bytes is larger than a frame can be")]
    Oversize(usize),
    #[error("no room for frame")]
    Full,
}

struct TxRing<const N: usize> {
    buf: [u8; N],
    /// Where the next entry is written
    head: usize,
    /// Size byte of the oldest entry
    tail: usize,
    entries: usize,
    in_flight: bool,
}

impl<const N: usize> TxRing<N> {
    const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
            entries: 0,
            in_flight: false,
        }
    }

    /// Offset the next entry of `need` bytes (size byte included) would start at.
    ///
    /// head never catches up to tail while entries are stored, so head == tail means empty.
    fn reserve(&mut self, need: usize) -> Option<usize> {
        if self.entries == 0 {
            self.head = 0;
            self.tail = 0;
            return (need <= N).then_some(0);
        }
        if self.head >= self.tail {
            if N - self.head >= need {
                return Some(self.head);
            }
            if need < self.tail {
                if self.head < N {
                    self.buf[self.head] = WRAP_MARKER;
                }
                return Some(0);
            }
            return None;
        }
        (self.tail - self.head > need).then_some(self.head)
    }

    fn push(&mut self, data: &[u8]) -> Result<usize, TxQueueError> {
        let start = self.reserve(data.len() + 1).ok_or(TxQueueError::Full)?;
        self.buf[start] = data.len() as u8;
        self.buf[start + 1..start + 1 + data.len()].copy_from_slice(data);
        self.head = start + 1 + data.len();
        self.entries += 1;
        Ok(data.len())
    }

    fn front(&self) -> Option<EncodedMessage> {
        if self.entries == 0 {
            return None;
        }
        let size = self.buf[self.tail] as usize;
        let mut frame = EncodedMessage::new();
        frame
            .try_extend_from_slice(&self.buf[self.tail + 1..self.tail + 1 + size])
            .ok()?;
        Some(frame)
    }

    fn pop(&mut self) {
        if self.entries == 0 {
            return;
        }
        self.tail += 1 + self.buf[self.tail] as usize;
        self.entries -= 1;
        if self.entries == 0 {
            self.head = 0;
            self.tail = 0;
        } else if self.tail == N || self.buf[self.tail] == WRAP_MARKER {
            self.tail = 0;
        }
    }
}

/// Bounded FIFO of encoded frames shared between the engine and a transport.
///
/// Every entry is stored as a size byte followed by the frame. Producers block in [TxQueue::enqueue]
/// until the transport frees space with [TxQueue::complete], so something must be draining the
/// queue while a producer is waiting.
pub struct TxQueue<const N: usize = TX_BUFFER_SIZE> {
    ring: Mutex<TxRing<N>>,
    space: Condvar,
}

impl<const N: usize> Default for TxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TxQueue<N> {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(TxRing::new()),
            space: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TxRing<N>> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue `data`, waiting for space if needed. Returns bytes queued, 0 if `data` can never fit.
    pub fn enqueue(&self, data: &[u8]) -> usize {
        if data.len() > MAX_MESSAGE_SIZE {
            return 0;
        }
        let mut ring = self.lock();
        loop {
            match ring.push(data) {
                Ok(len) => {
                    trace!(len, entries = ring.entries, "frame queued");
                    return len;
                }
                Err(_) => {
                    ring = self
                        .space
                        .wait(ring)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Queue `data` only if there is room right now
    pub fn try_enqueue(&self, data: &[u8]) -> Result<usize, TxQueueError> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(TxQueueError::Oversize(data.len()));
        }
        self.lock().push(data)
    }

    /// Something is queued and the transport is not already sending
    pub fn can_send(&self) -> bool {
        let ring = self.lock();
        ring.entries > 0 && !ring.in_flight
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries == 0
    }

    pub fn len(&self) -> usize {
        self.lock().entries
    }

    /// Copy of the oldest frame, which stays queued until [TxQueue::complete]
    pub fn next_in_flight(&self) -> Option<EncodedMessage> {
        let mut ring = self.lock();
        let frame = ring.front();
        ring.in_flight = frame.is_some();
        frame
    }

    /// Drop the in flight frame and hand out the next one, if any
    pub fn complete(&self) -> Option<EncodedMessage> {
        let mut ring = self.lock();
        if ring.in_flight {
            ring.pop();
            self.space.notify_all();
        }
        let frame = ring.front();
        ring.in_flight = frame.is_some();
        frame
    }
}
