//! `Transport` backed by the FTDI D2XX driver, for C232HM-style cables.
use libftd2xx::{BitMode, Ftdi, FtdiCommon, TimeoutError};

use crate::mpsse::{self, ScanBuffer};
use crate::transport::{Transport, TransportError};

/// An open FTDI device in MPSSE mode with the JTAG pins configured.
pub struct Ftd2xxTransport {
    ft: Ftdi,
}

impl Ftd2xxTransport {
    /// Open the cable with the given serial number and put it into MPSSE
    /// mode: reset, enable MPSSE, set the TCK divisor for `tck_hz`, and
    /// drive TMS high with TCK/TDI/TMS as outputs.
    pub fn open(serial: &str, tck_hz: u32) -> Result<Self, TransportError> {
        let mut ft = Ftdi::with_serial_number(serial).map_err(|e| TransportError::Io(e.to_string()))?;
        ft.reset().map_err(|e| TransportError::Io(e.to_string()))?;
        ft.set_bit_mode(0, BitMode::Mpsse)
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let mut buf = ScanBuffer::new();
        buf.append_set_clock_divisor(mpsse::clock_divisor(tck_hz));
        buf.append_set_bits_low(mpsse::PIN_TMS, mpsse::PIN_TCK | mpsse::PIN_TDI | mpsse::PIN_TMS);

        let mut transport = Self { ft };
        transport.write(buf.as_bytes())?;
        Ok(transport)
    }

    /// Close the underlying device handle.
    pub fn close(mut self) -> Result<(), TransportError> {
        self.ft.close().map_err(|e| TransportError::Io(e.to_string()))
    }
}

impl Transport for Ftd2xxTransport {
    fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        log::trace!("ftd2xx write, {} bytes", data.len());
        self.ft.write_all(data).map_err(|e| TransportError::Io(e.to_string()))
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = vec![0; len];
        match self.ft.read_all(&mut buf) {
            Ok(()) => {
                log::trace!("ftd2xx read, {len} bytes");
                Ok(buf)
            }
            Err(TimeoutError::Timeout { expected, actual }) => {
                Err(TransportError::ShortRead { want: expected, got: actual })
            }
            Err(e) => Err(TransportError::Io(e.to_string())),
        }
    }
}
