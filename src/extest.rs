//! Boundary-scan actuation: drive output pins through EXTEST.
//!
//! The blink loop samples the boundary register once, derives the two images
//! it alternates between, and never reads the register again, so the two
//! selected cells are the only bits that ever change; every other pin keeps
//! the value sampled at the start of the session.
use std::thread;
use std::time::Duration;

use crate::tap::TapDriver;
use crate::transport::{Transport, TransportError};

/// EXTEST opcode for the validated chip.  Chip configuration, not a JTAG
/// constant; the opcode *length* always comes from the BSDL instruction
/// length.
pub const EXTEST_OPCODE: u8 = 0;

/// Alternate the output cells `cell_a` and `cell_b` (one high, one low,
/// then swapped) for `cycles` full periods at `frequency` Hz.
pub fn blink<T: Transport>(
    tap: &mut TapDriver<T>,
    instruction_length: u8,
    boundary_length: usize,
    cell_a: usize,
    cell_b: usize,
    cycles: u32,
    frequency: f64,
) -> Result<(), TransportError> {
    assert_eq!(boundary_length % 8, 0);
    assert!(cell_a < boundary_length && cell_b < boundary_length);

    tap.shift_instruction(EXTEST_OPCODE, instruction_length)?;
    let base = tap.shift_data_out_in(boundary_length / 8)?;

    let (image_a, image_b) = derive_images(&base, cell_a, cell_b);

    let half_period = Duration::from_secs_f64(1.0 / (2.0 * frequency));
    for _ in 0..cycles {
        tap.shift_data_in(&image_a)?;
        thread::sleep(half_period);
        tap.shift_data_in(&image_b)?;
        thread::sleep(half_period);
    }
    Ok(())
}

/// The two images the loop alternates between: `cell_a` low with `cell_b`
/// high, and the swap.  Everything else stays as sampled.
fn derive_images(base: &[u8], cell_a: usize, cell_b: usize) -> (Vec<u8>, Vec<u8>) {
    let mut image_a = base.to_vec();
    clear_cell(&mut image_a, cell_a);
    set_cell(&mut image_a, cell_b);

    let mut image_b = base.to_vec();
    set_cell(&mut image_b, cell_a);
    clear_cell(&mut image_b, cell_b);

    (image_a, image_b)
}

/// Cells pack LSB first within each byte, matching device shift order.
pub fn set_cell(image: &mut [u8], cell: usize) {
    image[cell / 8] |= 1 << (cell % 8);
}

pub fn clear_cell(image: &mut [u8], cell: usize) {
    image[cell / 8] &= !(1 << (cell % 8));
}
