//! IDCODE verification against the reference pattern a BSDL file declares.
use crate::tap::TapDriver;
use crate::transport::{Transport, TransportError};

/// Shift in the IDCODE opcode, read back the 32-bit IDCODE register, and
/// compare it to `reference_idcode` (MSB first, `X` for don't-care bits).
///
/// A mismatch is an expected possible outcome, not a fault: it comes back as
/// `Ok(false)` with the offending bit position logged.  Only transport
/// failures are errors.
pub fn verify_idcode<T: Transport>(
    tap: &mut TapDriver<T>,
    reference_idcode: &str,
    idcode_opcode: u8,
    instruction_length: u8,
) -> Result<bool, TransportError> {
    tap.shift_instruction(idcode_opcode, instruction_length)?;
    let mut raw = tap.shift_data_out_in(4)?;

    // The register shifts out least-significant byte first; flip it around
    // to compare against the MSB-first reference string.
    raw.reverse();
    let read: String = raw.iter().map(|byte| format!("{byte:08b}")).collect();

    match mismatch_position(&read, reference_idcode) {
        None => Ok(true),
        Some(i) => {
            log::warn!("IDCODE mismatch at bit {i}: read {read}, reference {reference_idcode}");
            Ok(false)
        }
    }
}

/// First position where `read` differs from `reference` at a non-wildcard
/// bit, or `None` if the strings match everywhere the reference specifies a
/// literal bit.  Both strings must be the same length.
pub fn mismatch_position(read: &str, reference: &str) -> Option<usize> {
    assert_eq!(read.len(), reference.len());
    read.chars()
        .zip(reference.chars())
        .position(|(r, e)| e != 'X' && r != e)
}
