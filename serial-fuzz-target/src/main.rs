#[macro_use]
extern crate afl;
extern crate antplus;
use antplus::drivers::{decode_stream, parse_frame, Driver, SerialDriver, StubPin};
use antplus::plus::Notification;
use antplus::router::{Router, RouterConfig};
use embedded_hal_nb::serial::{ErrorKind, ErrorType, Read, Write};
use std::cell::RefCell;

struct SerialMock {
    data: Vec<u8>,
}

impl ErrorType for SerialMock {
    type Error = ErrorKind;
}

impl Write<u8> for SerialMock {
    fn write(&mut self, _word: u8) -> nb::Result<(), Self::Error> {
        Ok(())
    }
    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

impl Read<u8> for SerialMock {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if !self.data.is_empty() {
            Ok(self.data.remove(0))
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

fn main() {
    fuzz!(|data: &[u8]| {
        for frame in decode_stream(data) {
            let _ = parse_frame(&frame);
        }

        let mock = SerialMock {
            data: data.to_vec(),
        };
        let mut driver: SerialDriver<SerialMock, StubPin> = SerialDriver::new(mock, None);
        let sink = RefCell::new(Vec::<Notification>::new());
        let mut router = Router::new(RouterConfig::default(), sink);
        let rx = router.rx_slot();
        let tx = router.tx_queue();
        // every poll delivers a frame, drops a byte or drains the mock
        for _ in 0..=data.len() {
            if driver.poll(&rx, &tx).is_err() {
                break;
            }
            router.process();
        }
    });
}
