// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use const_utils::u64::min;
use core::time::Duration;
use core::cell::RefCell;
use thingbuf::mpsc::errors::TrySendError;
use thingbuf::mpsc::Sender;
use thiserror::Error;

/// Helper to convert durations to search timeouts.
/// Anything greater than or equal to 637.5s will default to inifinite timeout per ANT spec.
pub const fn duration_to_search_timeout(t: Duration) -> u8 {
    // Scale up by 10 to avoid floating point math as ratio is 2.5s to 1 count
    min((t.as_secs() * 10) / (25), 255) as u8
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum TxError {
    #[error("receiver is full")]
    Full,
    #[error("receiver has been dropped")]
    Closed,
    #[error("unknown send failure")]
    UnknownError,
}

/// Where the engine pushes its notifications
///
/// Sends must not block, a sink that cannot take a value right away returns [TxError::Full] and the
/// value is dropped.
pub trait TxHandler<T> {
    fn try_send(&self, msg: T) -> Result<(), TxError>;
}

impl<T: Default + Clone> TxHandler<T> for Sender<T> {
    fn try_send(&self, msg: T) -> Result<(), TxError> {
        match Sender::try_send(self, msg) {
            Ok(_) => Ok(()),
            Err(TrySendError::Full(_)) => Err(TxError::Full),
            Err(TrySendError::Closed(_)) => Err(TxError::Closed),
            Err(_) => Err(TxError::UnknownError),
        }
    }
}

/// Collects everything, handy for tests and single threaded polling loops
impl<T> TxHandler<T> for RefCell<Vec<T>> {
    fn try_send(&self, msg: T) -> Result<(), TxError> {
        self.try_borrow_mut()
            .map_err(|_| TxError::UnknownError)?
            .push(msg);
        Ok(())
    }
}

/// Fan out to two sinks, the first failure is reported after both have been tried
impl<T: Clone, A: TxHandler<T>, B: TxHandler<T>> TxHandler<T> for (A, B) {
    fn try_send(&self, msg: T) -> Result<(), TxError> {
        let first = self.0.try_send(msg.clone());
        let second = self.1.try_send(msg);
        first.and(second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thingbuf::mpsc::channel;

    #[test]
    fn search_timeout_conversion() {
        assert_eq!(duration_to_search_timeout(Duration::from_secs(0)), 0);
        assert_eq!(duration_to_search_timeout(Duration::from_secs(30)), 12);
        assert_eq!(duration_to_search_timeout(Duration::from_secs(640)), 255);
        assert_eq!(duration_to_search_timeout(Duration::from_secs(5000)), 255);
    }

    #[test]
    fn thingbuf_sender() {
        let (tx, rx) = channel::<u32>(1);
        assert_eq!(TxHandler::try_send(&tx, 1), Ok(()));
        assert_eq!(TxHandler::try_send(&tx, 2), Err(TxError::Full));
        assert_eq!(rx.try_recv().ok(), Some(1));
        drop(rx);
        assert_eq!(TxHandler::try_send(&tx, 3), Err(TxError::Closed));
    }

    #[test]
    fn fan_out() {
        let sinks = (RefCell::new(Vec::new()), RefCell::new(Vec::new()));
        sinks.try_send(7u8).unwrap();
        assert_eq!(*sinks.0.borrow(), [7]);
        assert_eq!(*sinks.1.borrow(), [7]);
    }
}
