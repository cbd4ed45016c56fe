//! MPSSE command encoding.  The FTDI Multi-Protocol Synchronous Serial Engine
//! takes a stream of command bytes (FTDI AN-108); this module builds those
//! streams.  `ScanBuffer` accumulates one batched transaction of TMS moves and
//! TDI/TDO shifts, which the caller then hands to a `Transport` in a single
//! write.  Encoding is pure; nothing here touches the device.

/// Clock TMS bits out, no clock edge inversion.  TDI is held at bit 7 of the
/// pattern byte for the duration of the command.
pub const WRITE_BITS_TMS_NVE: u8 = 0x4b;
/// Clock up to 8 bits out on TDI, LSB first, no clock edge inversion.
pub const WRITE_BITS_NVE_LSB: u8 = 0x1b;
/// Clock whole bytes out on TDI, LSB first, no clock edge inversion.
pub const WRITE_BYTES_NVE_LSB: u8 = 0x19;
/// Clock whole bytes in from TDO, LSB first, no clock edge inversion.
pub const READ_BYTES_NVE_LSB: u8 = 0x2c;
/// Set the value and direction of the low GPIO byte.
pub const SET_BITS_LOW: u8 = 0x80;
/// Set the TCK divisor from the 12 MHz base clock.
pub const SET_TCK_DIVISOR: u8 = 0x86;

// C232HM-style cable pinout: the JTAG signals live on the low GPIO byte.
pub const PIN_TCK: u8 = 0x01;
pub const PIN_TDI: u8 = 0x02;
pub const PIN_TDO: u8 = 0x04;
pub const PIN_TMS: u8 = 0x08;

/// TMS walks between TAP states, LSB shifted first.  Five ones reach
/// Test-Logic-Reset from any state; the other patterns are fixed paths out of
/// reset or out of a shift state (through Exit1 and Update, which is what
/// latches the register just shifted).
pub const TMS_RESET: (u8, u8) = (5, 0b1_1111);
pub const TMS_RESET_TO_SHIFT_IR: (u8, u8) = (5, 0b0_0110);
pub const TMS_RESET_TO_SHIFT_DR: (u8, u8) = (4, 0b0010);
pub const TMS_SHIFT_TO_SHIFT_DR: (u8, u8) = (5, 0b0_0111);

/// Compute the `SET_TCK_DIVISOR` value for a desired TCK frequency
/// (AN-108 §3.8.2): `TCK = 12 MHz / ((1 + divisor) * 2)`.  The 16-bit
/// divisor reaches from 6 MHz (divisor 0) down to 92 Hz (divisor 0xfec0);
/// frequencies outside that range are not encodable.
pub fn clock_divisor(hz: u32) -> u16 {
    assert!(hz >= 92 && hz <= 6_000_000);
    (12_000_000 / (2 * hz) - 1) as u16
}

/// One batched MPSSE transaction under construction.  Owned by a single
/// operation and consumed when sent; buffers are never reused, every
/// operation rebuilds TAP state from an explicit reset.
#[derive(Default)]
pub struct ScanBuffer {
    buf: Vec<u8>,
}

impl ScanBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Clock the low `bits` bits of `pattern` onto TMS, LSB first.  A single
    /// command moves at most 7 bits; longer walks must be split.  Bit 7 of
    /// `pattern` sets the TDI level held during the walk, which is how the
    /// final bit of an instruction rides out on the Exit1 clock.
    pub fn append_tms_sequence(&mut self, bits: u8, pattern: u8) {
        assert!(bits >= 1 && bits <= 7);
        self.buf.extend_from_slice(&[WRITE_BITS_TMS_NVE, bits - 1, pattern]);
    }

    /// Clock the low `bits` bits of `value` out on TDI, LSB first.
    pub fn append_bit_write(&mut self, bits: u8, value: u8) {
        assert!(bits >= 1 && bits <= 8);
        self.buf.extend_from_slice(&[WRITE_BITS_NVE_LSB, bits - 1, value]);
    }

    /// Clock `payload` out on TDI, LSB first within each byte.  The two-byte
    /// length field encodes `len - 1`.
    pub fn append_byte_write(&mut self, payload: &[u8]) {
        assert!(!payload.is_empty());
        let n = payload.len() - 1;
        self.buf.extend_from_slice(&[WRITE_BYTES_NVE_LSB, n as u8, (n >> 8) as u8]);
        self.buf.extend_from_slice(payload);
    }

    /// Clock `count` bytes in from TDO.  The caller must follow the send with
    /// a transport read of exactly `count` bytes.
    pub fn append_byte_read(&mut self, count: usize) {
        assert!(count >= 1);
        let n = count - 1;
        self.buf.extend_from_slice(&[READ_BYTES_NVE_LSB, n as u8, (n >> 8) as u8]);
    }

    /// Drive the low GPIO byte: `value` for pin levels, `direction` with a 1
    /// for each output pin.
    pub fn append_set_bits_low(&mut self, value: u8, direction: u8) {
        self.buf.extend_from_slice(&[SET_BITS_LOW, value, direction]);
    }

    /// Set the TCK divisor, low byte first.
    pub fn append_set_clock_divisor(&mut self, divisor: u16) {
        self.buf
            .extend_from_slice(&[SET_TCK_DIVISOR, divisor as u8, (divisor >> 8) as u8]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tms_sequence_encoding() {
        for bits in 1..=7u8 {
            let pattern = 0x55 & ((1u8 << bits) - 1);
            let mut buf = ScanBuffer::new();
            buf.append_tms_sequence(bits, pattern);
            assert_eq!(buf.as_bytes(), &[WRITE_BITS_TMS_NVE, bits - 1, pattern]);
        }
    }

    #[test]
    fn bit_write_encoding() {
        let mut buf = ScanBuffer::new();
        buf.append_bit_write(7, 0b0101_1010);
        assert_eq!(buf.as_bytes(), &[WRITE_BITS_NVE_LSB, 6, 0b0101_1010]);
    }

    #[test]
    fn byte_write_length_field_and_payload() {
        let payload = [0x11, 0x22, 0x33, 0x44];
        let mut buf = ScanBuffer::new();
        buf.append_byte_write(&payload);
        assert_eq!(&buf.as_bytes()[..3], &[WRITE_BYTES_NVE_LSB, 3, 0]);
        assert_eq!(&buf.as_bytes()[3..], &payload);
    }

    #[test]
    fn byte_write_long_payload_splits_length_field() {
        let payload = vec![0xa5; 0x1234];
        let mut buf = ScanBuffer::new();
        buf.append_byte_write(&payload);
        assert_eq!(&buf.as_bytes()[..3], &[WRITE_BYTES_NVE_LSB, 0x33, 0x12]);
    }

    #[test]
    fn byte_read_encoding() {
        let mut buf = ScanBuffer::new();
        buf.append_byte_read(4);
        assert_eq!(buf.as_bytes(), &[READ_BYTES_NVE_LSB, 3, 0]);
    }

    #[test]
    fn divisor_for_3mhz() {
        assert_eq!(clock_divisor(3_000_000), 1);
        let mut buf = ScanBuffer::new();
        buf.append_set_clock_divisor(clock_divisor(3_000_000));
        assert_eq!(buf.as_bytes(), &[SET_TCK_DIVISOR, 0x01, 0x00]);
    }

    #[test]
    fn divisor_for_1mhz() {
        assert_eq!(clock_divisor(1_000_000), 5);
    }

    #[test]
    fn divisor_at_the_range_limits() {
        assert_eq!(clock_divisor(6_000_000), 0);
        assert_eq!(clock_divisor(92), 0xfec0);
    }

    #[test]
    #[should_panic]
    fn divisor_rejects_unreachable_frequency() {
        clock_divisor(12_000_000);
    }

    #[test]
    fn set_bits_low_encoding() {
        let mut buf = ScanBuffer::new();
        buf.append_set_bits_low(PIN_TMS, PIN_TCK | PIN_TDI | PIN_TMS);
        assert_eq!(buf.as_bytes(), &[SET_BITS_LOW, 0x08, 0x0b]);
    }
}
