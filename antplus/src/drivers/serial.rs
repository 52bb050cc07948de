// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::drivers::{frame_length, Driver, DriverError, RxBuffer, RxSlot, TxQueue, SYNC};
use core::convert::Infallible;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal_nb::serial::{Error, Read, Write};
use tracing::{debug, trace, warn};

/// Transport for radios attached over a UART.
///
/// Only whole frames are handed to the [RxSlot], a frame split across reads is held back until the
/// rest arrives. The optional sleep pin is driven low while writing and high afterwards.
pub struct SerialDriver<SERIAL, PIN> {
    serial: SERIAL,
    sleep: Option<PIN>,
    buffer: RxBuffer,
}

impl<SERIAL, SLEEP> SerialDriver<SERIAL, SLEEP>
where
    SERIAL: Read<u8> + Write<u8>,
    SLEEP: OutputPin,
{
    pub fn new(serial: SERIAL, sleep: Option<SLEEP>) -> SerialDriver<SERIAL, SLEEP> {
        SerialDriver {
            serial,
            sleep,
            buffer: RxBuffer::new(),
        }
    }

    pub fn release(self) -> (SERIAL, Option<SLEEP>) {
        (self.serial, self.sleep)
    }

    fn set_awake(&mut self, awake: bool) -> Result<(), DriverError> {
        if let Some(pin) = &mut self.sleep {
            let res = if awake { pin.set_low() } else { pin.set_high() };
            res.map_err(|_| DriverError::Pin)?;
        }
        Ok(())
    }

    /// Pull available bytes and deliver every complete frame, returns bytes delivered
    pub fn receive(&mut self, rx: &RxSlot) -> Result<usize, DriverError> {
        let mut drained = false;
        loop {
            while !self.buffer.is_full() {
                match self.serial.read() {
                    Ok(byte) => self.buffer.push(byte),
                    Err(nb::Error::WouldBlock) => {
                        drained = true;
                        break;
                    }
                    Err(nb::Error::Other(e)) => return Err(DriverError::Read(e.kind())),
                }
            }

            let skip = self
                .buffer
                .iter()
                .position(|&b| b == SYNC)
                .unwrap_or(self.buffer.len());
            if skip > 0 {
                debug!(skip, "discarding bytes ahead of sync");
                self.buffer.drain(..skip);
            }

            let complete = complete_frames(&self.buffer);
            if complete > 0 {
                trace!(bytes = complete, "delivering frames");
                if let Err(err) = rx.deliver(&self.buffer[..complete]) {
                    warn!(%err, "frames lost");
                }
                self.buffer.drain(..complete);
                return Ok(complete);
            }
            if self.buffer.is_full() {
                // A corrupt length byte can claim more than fits, resync past it
                self.buffer.remove(0);
            }
            if drained {
                return Ok(0);
            }
        }
    }

    /// Write everything queued, returns the number of frames written
    pub fn transmit<const N: usize>(&mut self, tx: &TxQueue<N>) -> Result<usize, DriverError> {
        let mut next = tx.next_in_flight();
        if next.is_none() {
            return Ok(0);
        }

        self.set_awake(true)?;
        let mut sent = 0;
        while let Some(frame) = next {
            for byte in frame.iter() {
                nb::block!(self.serial.write(*byte)).map_err(|e| DriverError::Write(e.kind()))?;
            }
            sent += 1;
            next = tx.complete();
        }
        nb::block!(self.serial.flush()).map_err(|e| DriverError::Write(e.kind()))?;
        self.set_awake(false)?;

        Ok(sent)
    }
}

impl<SERIAL, SLEEP> Driver for SerialDriver<SERIAL, SLEEP>
where
    SERIAL: Read<u8> + Write<u8>,
    SLEEP: OutputPin,
{
    fn poll<const N: usize>(&mut self, rx: &RxSlot, tx: &TxQueue<N>) -> Result<(), DriverError> {
        self.receive(rx)?;
        self.transmit(tx)?;
        Ok(())
    }
}

/// Length of the leading run of complete frames in `buf`
fn complete_frames(buf: &[u8]) -> usize {
    let mut end = 0;
    loop {
        let rest = &buf[end..];
        match frame_length(rest) {
            Some(len) if rest[0] == SYNC && len <= rest.len() => end += len,
            _ => return end,
        }
    }
}

/// Pin for setups without a sleep line, e.g. USB sticks
pub struct StubPin;

impl PinErrorType for StubPin {
    type Error = Infallible;
}

impl OutputPin for StubPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{decode_stream, encode_message};
    use crate::messages::control::{OpenChannel, ResetSystem};
    use embedded_hal_nb::serial::{ErrorKind, ErrorType};
    use std::cell::RefCell;
    use std::rc::Rc;

    enum TestData {
        Data(Vec<u8>),
        Error(nb::Error<SerialError>),
    }

    #[derive(Debug, PartialEq, Clone, Copy)]
    enum SerialError {
        A,
    }

    impl Error for SerialError {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Overrun
        }
    }

    struct ValidationContext {
        in_bytes: Vec<TestData>,
        out_bytes: Vec<TestData>,
    }

    impl ValidationContext {
        fn validate(&self) {
            assert!(self.in_bytes.is_empty());
            assert!(self.out_bytes.is_empty());
        }
    }

    impl ErrorType for ValidationContext {
        type Error = SerialError;
    }

    impl Read<u8> for ValidationContext {
        fn read(&mut self) -> nb::Result<u8, SerialError> {
            let first = match self.in_bytes.get_mut(0) {
                Some(x) => x,
                None => return Err(nb::Error::WouldBlock),
            };
            let data = match first {
                TestData::Data(d) => Ok(d.remove(0)),
                TestData::Error(e) => Err(*e),
            };
            match first {
                TestData::Data(d) => {
                    if d.is_empty() {
                        self.in_bytes.remove(0);
                    }
                }
                TestData::Error(_) => {
                    self.in_bytes.remove(0);
                }
            }
            data
        }
    }

    impl Write<u8> for ValidationContext {
        fn write(&mut self, word: u8) -> nb::Result<(), SerialError> {
            let first = self.out_bytes.get_mut(0).unwrap();
            match first {
                TestData::Data(d) => {
                    assert_eq!(d.remove(0), word);
                    if d.is_empty() {
                        self.out_bytes.remove(0);
                    }
                }
                TestData::Error(e) => {
                    let val = Err(*e);
                    self.out_bytes.remove(0);
                    return val;
                }
            }
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), SerialError> {
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingPin {
        states: Rc<RefCell<Vec<bool>>>,
    }

    impl PinErrorType for RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.states.borrow_mut().push(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.states.borrow_mut().push(true);
            Ok(())
        }
    }

    const CHANNEL_ID: [u8; 9] = [0xA4, 5, 0x51, 1, 0x44, 0x33, 120, 34, 220];

    fn driver(in_bytes: Vec<TestData>, out_bytes: Vec<TestData>) -> SerialDriver<ValidationContext, StubPin> {
        SerialDriver::new(ValidationContext { in_bytes, out_bytes }, None)
    }

    #[test]
    fn serial_read() {
        let mut driver = driver(
            vec![
                TestData::Data(CHANNEL_ID[..4].to_vec()),
                TestData::Data(CHANNEL_ID[4..].to_vec()),
                TestData::Error(nb::Error::WouldBlock),
            ],
            vec![],
        );
        let rx = RxSlot::new();
        assert_eq!(driver.receive(&rx), Ok(9));
        assert_eq!(rx.take().unwrap().as_slice(), CHANNEL_ID);
        assert!(driver.buffer.is_empty());
        driver.serial.validate();
    }

    #[test]
    fn split_frame_held_back() {
        let mut driver = driver(
            vec![
                TestData::Data(CHANNEL_ID[..4].to_vec()),
                TestData::Error(nb::Error::WouldBlock),
                TestData::Data(CHANNEL_ID[4..].to_vec()),
            ],
            vec![],
        );
        let rx = RxSlot::new();
        assert_eq!(driver.receive(&rx), Ok(0));
        assert!(!rx.is_pending());
        assert_eq!(driver.receive(&rx), Ok(9));
        assert_eq!(rx.take().unwrap().as_slice(), CHANNEL_ID);
        driver.serial.validate();
    }

    #[test]
    fn serial_two_messages_bulk() {
        let mut bytes = vec![0x00, 0x13];
        bytes.extend_from_slice(&CHANNEL_ID);
        bytes.extend_from_slice(&CHANNEL_ID);
        let mut driver = driver(vec![TestData::Data(bytes)], vec![]);
        let rx = RxSlot::new();
        assert_eq!(driver.receive(&rx), Ok(18));
        let delivered = rx.take().unwrap();
        assert_eq!(decode_stream(&delivered).count(), 2);
        driver.serial.validate();
    }

    #[test]
    fn corrupt_length_does_not_lock_buffer() {
        let mut bytes = vec![0xA4, 0xF0];
        bytes.extend_from_slice(&[0u8; 62]);
        bytes.extend_from_slice(&CHANNEL_ID);
        let mut driver = driver(vec![TestData::Data(bytes)], vec![]);
        let rx = RxSlot::new();
        assert_eq!(driver.receive(&rx), Ok(9));
        assert_eq!(rx.take().unwrap().as_slice(), CHANNEL_ID);
        driver.serial.validate();
    }

    #[test]
    fn serial_write_out() {
        let tx = TxQueue::<130>::new();
        tx.enqueue(&encode_message(&ResetSystem::new()).unwrap());
        tx.enqueue(&encode_message(&OpenChannel::new(1)).unwrap());
        let mut driver = driver(
            vec![],
            vec![
                TestData::Data(vec![0xA4, 0x01, 0x4A, 0x00, 0xEF]),
                TestData::Data(vec![0xA4, 0x01, 0x4B, 0x01, 0xEF]),
            ],
        );
        assert_eq!(driver.transmit(&tx), Ok(2));
        assert!(tx.is_empty());
        driver.serial.validate();
    }

    #[test]
    fn serial_error() {
        let tx = TxQueue::<130>::new();
        tx.enqueue(&encode_message(&ResetSystem::new()).unwrap());
        let mut driver = driver(
            vec![TestData::Error(nb::Error::Other(SerialError::A))],
            vec![TestData::Error(nb::Error::Other(SerialError::A))],
        );
        let rx = RxSlot::new();
        assert_eq!(
            driver.receive(&rx),
            Err(DriverError::Read(ErrorKind::Overrun))
        );
        assert_eq!(
            driver.transmit(&tx),
            Err(DriverError::Write(ErrorKind::Overrun))
        );
        // frame stays queued for a retry
        assert_eq!(tx.len(), 1);
        driver.serial.validate();
    }

    #[test]
    fn sleep_pin() {
        let pin = RecordingPin::default();
        let tx = TxQueue::<130>::new();
        tx.enqueue(&encode_message(&ResetSystem::new()).unwrap());
        let context = ValidationContext {
            in_bytes: vec![],
            out_bytes: vec![TestData::Data(vec![0xA4, 0x01, 0x4A, 0x00, 0xEF])],
        };
        let mut driver = SerialDriver::new(context, Some(pin.clone()));
        let rx = RxSlot::new();
        driver.poll(&rx, &tx).unwrap();
        assert_eq!(*pin.states.borrow(), [false, true]);

        // nothing queued, pin untouched
        driver.poll(&rx, &tx).unwrap();
        assert_eq!(pin.states.borrow().len(), 2);
        let (serial, _) = driver.release();
        serial.validate();
    }
}
