// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::messages::MAX_MESSAGE_SIZE;
use arrayvec::ArrayVec;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::warn;

pub type RxBuffer = ArrayVec<u8, MAX_MESSAGE_SIZE>;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum RxSlotError {
    #[error("delivery of {0} bytes is larger than the receive buffer")]
    Oversize(usize),
}

/// Single buffer handoff from a transport to the engine.
///
/// A newer delivery replaces an undrained one, the engine is expected to keep up with the radio.
#[derive(Default)]
pub struct RxSlot {
    pending: Mutex<Option<RxBuffer>>,
}

impl RxSlot {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    /// Store `data` for the engine, at most [MAX_MESSAGE_SIZE] bytes are accepted
    pub fn deliver(&self, data: &[u8]) -> Result<(), RxSlotError> {
        let mut buf = RxBuffer::new();
        if buf.try_extend_from_slice(data).is_err() {
            warn!(len = data.len(), "receive delivery too large, dropped");
            return Err(RxSlotError::Oversize(data.len()));
        }

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = pending.replace(buf) {
            warn!(dropped = old.len(), "receive buffer overwritten before it was processed");
        }
        Ok(())
    }

    pub fn take(&self) -> Option<RxBuffer> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deliver_and_take() {
        let slot = RxSlot::new();
        assert_eq!(slot.take(), None);
        assert_eq!(slot.deliver(&[0xA4, 1, 0x6F, 0x20, 0xEA]), Ok(()));
        assert!(slot.is_pending());
        assert_eq!(slot.take().unwrap().as_slice(), [0xA4, 1, 0x6F, 0x20, 0xEA]);
        assert!(!slot.is_pending());
    }

    #[test]
    fn newest_delivery_wins() {
        let slot = RxSlot::new();
        slot.deliver(&[1]).unwrap();
        slot.deliver(&[2, 3]).unwrap();
        assert_eq!(slot.take().unwrap().as_slice(), [2, 3]);
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn long_delivery_rejected() {
        let slot = RxSlot::new();
        assert_eq!(slot.deliver(&[7; 80]), Err(RxSlotError::Oversize(80)));
        assert!(!slot.is_pending());

        slot.deliver(&[1]).unwrap();
        assert_eq!(slot.deliver(&[7; 65]), Err(RxSlotError::Oversize(65)));
        // the earlier delivery is kept
        assert_eq!(slot.take().unwrap().as_slice(), [1]);
        assert_eq!(slot.deliver(&[7; MAX_MESSAGE_SIZE]), Ok(()));
    }
}
