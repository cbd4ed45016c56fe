//! TAP protocol driver.  Sequences `ScanBuffer` primitives into complete
//! operations and pushes each one at the transport as a single batched
//! buffer, so one operation costs one USB round-trip (plus one read when TDO
//! data comes back).
//!
//! No TAP state is persisted between operations: `shift_instruction` and
//! `read_idcode_at_reset` open with five TMS ones, which reach
//! Test-Logic-Reset from any state, so every operation is idempotent with
//! respect to whatever came before it.  `shift_data_out_in` and
//! `shift_data_in` rely on a prior `shift_instruction` having left the TAP
//! in Shift-DR.
//!
//! Transport failures propagate unchanged and nothing is retried: a shift
//! that failed partway leaves the TAP in an unknown state, and the only safe
//! recovery is a fresh reset-prefixed operation.
use crate::mpsse::{
    ScanBuffer, TMS_RESET, TMS_RESET_TO_SHIFT_DR, TMS_RESET_TO_SHIFT_IR, TMS_SHIFT_TO_SHIFT_DR,
};
use crate::transport::{Transport, TransportError};

/// Drives a single TAP through an exclusively-owned transport.
pub struct TapDriver<T> {
    transport: T,
}

impl<T: Transport> TapDriver<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Give the transport back, e.g. to close it at the end of a session.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Reset, walk to Shift-IR, shift in the low `bits` bits of `opcode`,
    /// and walk on to Shift-DR.  The last opcode bit rides on TDI during the
    /// Exit1-IR clock, and passing Update-IR on the way to Shift-DR is what
    /// latches the new instruction.  Only single-byte instruction registers
    /// are supported (`bits` from 1 to 8).
    pub fn shift_instruction(&mut self, opcode: u8, bits: u8) -> Result<(), TransportError> {
        assert!(bits >= 1 && bits <= 8);
        log::debug!("shift IR opcode {opcode:#04x} ({bits} bits)");

        let mut buf = ScanBuffer::new();
        buf.append_tms_sequence(TMS_RESET.0, TMS_RESET.1);
        buf.append_tms_sequence(TMS_RESET_TO_SHIFT_IR.0, TMS_RESET_TO_SHIFT_IR.1);
        if bits > 1 {
            buf.append_bit_write(bits - 1, opcode);
        }
        let last = (opcode >> (bits - 1)) & 1;
        buf.append_tms_sequence(TMS_SHIFT_TO_SHIFT_DR.0, TMS_SHIFT_TO_SHIFT_DR.1 | last << 7);
        self.transport.write(buf.as_bytes())
    }

    /// From Shift-DR, shift out and return the current `byte_count` bytes of
    /// the selected data register.
    pub fn shift_data_out_in(&mut self, byte_count: usize) -> Result<Vec<u8>, TransportError> {
        let mut buf = ScanBuffer::new();
        buf.append_byte_read(byte_count);
        self.transport.write(buf.as_bytes())?;
        self.transport.read(byte_count)
    }

    /// From Shift-DR, shift `payload` into the selected data register, then
    /// walk back to Shift-DR through Update-DR so the register takes effect
    /// (for EXTEST, this is what drives the pins).
    pub fn shift_data_in(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        log::debug!("shift DR in, {} bytes", payload.len());
        let mut buf = ScanBuffer::new();
        buf.append_byte_write(payload);
        buf.append_tms_sequence(TMS_SHIFT_TO_SHIFT_DR.0, TMS_SHIFT_TO_SHIFT_DR.1);
        self.transport.write(buf.as_bytes())
    }

    /// Read the 32-bit IDCODE the TAP presents straight out of reset, when
    /// the IDCODE register is selected by default.  The register shifts out
    /// least-significant byte first.  Kept separate from the opcode-shifted
    /// read in `verify_idcode`; the two do not present bytes the same way.
    pub fn read_idcode_at_reset(&mut self) -> Result<u32, TransportError> {
        let mut buf = ScanBuffer::new();
        buf.append_tms_sequence(TMS_RESET.0, TMS_RESET.1);
        buf.append_tms_sequence(TMS_RESET_TO_SHIFT_DR.0, TMS_RESET_TO_SHIFT_DR.1);
        buf.append_byte_read(4);
        self.transport.write(buf.as_bytes())?;
        let raw = self.transport.read(4)?;
        let raw: [u8; 4] = raw
            .try_into()
            .map_err(|raw: Vec<u8>| TransportError::ShortRead { want: 4, got: raw.len() })?;
        Ok(u32::from_le_bytes(raw))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mpsse::{
        READ_BYTES_NVE_LSB, WRITE_BITS_NVE_LSB, WRITE_BITS_TMS_NVE, WRITE_BYTES_NVE_LSB,
    };

    /// Records writes and plays back scripted reads.
    pub(crate) struct MockTransport {
        pub writes: Vec<Vec<u8>>,
        pub reads: Vec<Vec<u8>>,
    }

    impl MockTransport {
        pub fn new(reads: Vec<Vec<u8>>) -> Self {
            Self { writes: Vec::new(), reads }
        }
    }

    impl Transport for MockTransport {
        fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
            self.writes.push(data.to_vec());
            Ok(())
        }

        fn read(&mut self, len: usize) -> Result<Vec<u8>, TransportError> {
            let buf = self.reads.remove(0);
            if buf.len() != len {
                return Err(TransportError::ShortRead { want: len, got: buf.len() });
            }
            Ok(buf)
        }
    }

    #[test]
    fn shift_instruction_buffer_layout() {
        let mut tap = TapDriver::new(MockTransport::new(vec![]));
        tap.shift_instruction(0b0000_0001, 8).unwrap();

        let transport = tap.into_transport();
        assert_eq!(transport.writes.len(), 1);
        assert_eq!(
            transport.writes[0],
            vec![
                WRITE_BITS_TMS_NVE, 4, 0b1_1111, // reset
                WRITE_BITS_TMS_NVE, 4, 0b0_0110, // reset -> Shift-IR
                WRITE_BITS_NVE_LSB, 6, 0b0000_0001, // low 7 opcode bits
                WRITE_BITS_TMS_NVE, 4, 0b0_0111, // -> Shift-DR, MSB 0 on TDI
            ]
        );
    }

    #[test]
    fn shift_instruction_carries_high_final_bit_on_tdi() {
        let mut tap = TapDriver::new(MockTransport::new(vec![]));
        tap.shift_instruction(0b10_0000, 6).unwrap();

        let transport = tap.into_transport();
        let buf = &transport.writes[0];
        // Final TMS command: Shift-IR -> Shift-DR with TDI held high.
        assert_eq!(&buf[buf.len() - 3..], &[WRITE_BITS_TMS_NVE, 4, 0b0_0111 | 0x80]);
        // Only 5 of the 6 bits go out through the bit-write command.
        assert_eq!(&buf[6..9], &[WRITE_BITS_NVE_LSB, 4, 0b10_0000]);
    }

    #[test]
    fn single_bit_instruction_skips_bit_write() {
        let mut tap = TapDriver::new(MockTransport::new(vec![]));
        tap.shift_instruction(1, 1).unwrap();

        let transport = tap.into_transport();
        let buf = &transport.writes[0];
        assert!(!buf.contains(&WRITE_BITS_NVE_LSB));
        assert_eq!(&buf[buf.len() - 3..], &[WRITE_BITS_TMS_NVE, 4, 0b0_0111 | 0x80]);
    }

    #[test]
    fn shift_data_out_in_reads_exact_count() {
        let mut tap = TapDriver::new(MockTransport::new(vec![vec![0xd7, 0x00, 0x21, 0x01]]));
        let data = tap.shift_data_out_in(4).unwrap();
        assert_eq!(data, vec![0xd7, 0x00, 0x21, 0x01]);

        let transport = tap.into_transport();
        assert_eq!(transport.writes[0], vec![READ_BYTES_NVE_LSB, 3, 0]);
    }

    #[test]
    fn shift_data_in_payload_roundtrip() {
        let payload: Vec<u8> = (0..24).collect();
        let mut tap = TapDriver::new(MockTransport::new(vec![]));
        tap.shift_data_in(&payload).unwrap();

        let transport = tap.into_transport();
        let buf = &transport.writes[0];
        assert_eq!(&buf[..3], &[WRITE_BYTES_NVE_LSB, 23, 0]);
        assert_eq!(&buf[3..3 + payload.len()], &payload[..]);
        // Followed by the walk through Update-DR back to Shift-DR.
        assert_eq!(&buf[3 + payload.len()..], &[WRITE_BITS_TMS_NVE, 4, 0b0_0111]);
    }

    #[test]
    fn idcode_at_reset_is_little_endian() {
        let mut tap = TapDriver::new(MockTransport::new(vec![vec![0xd7, 0x00, 0x21, 0x01]]));
        assert_eq!(tap.read_idcode_at_reset().unwrap(), 0x012100d7);

        let transport = tap.into_transport();
        assert_eq!(
            transport.writes[0],
            vec![
                WRITE_BITS_TMS_NVE, 4, 0b1_1111, // reset
                WRITE_BITS_TMS_NVE, 3, 0b0010,   // reset -> Shift-DR
                READ_BYTES_NVE_LSB, 3, 0,
            ]
        );
    }

    #[test]
    fn transport_error_propagates() {
        // Scripted read returns 3 bytes where 4 were promised.
        let mut tap = TapDriver::new(MockTransport::new(vec![vec![0, 0, 0]]));
        match tap.shift_data_out_in(4) {
            Err(TransportError::ShortRead { want: 4, got: 3 }) => {}
            other => panic!("expected short read, got {other:?}"),
        }
    }
}
