//! Verify the IDCODE of an XC2C64A on a CoolRunner-II board, then alternate
//! its two LEDs through EXTEST.
//!
//! Takes a pre-parsed BSDL document as JSON; produce one from the chip's
//! `.bsd` file with any BSDL-to-JSON parser.
//!
//! Usage: blink <bsdl.json> <cable-serial> [pin_a pin_b]
use std::process::exit;

use jtag_bscan::bsdl::BsdlFacts;
use jtag_bscan::extest::blink;
use jtag_bscan::idcode::verify_idcode;
use jtag_bscan::tap::TapDriver;
use jtag_bscan::transport::ftd2xx::Ftd2xxTransport;

// CoolRunner-II board LEDs D1 and D2.
const LED_D1_PIN: u32 = 39;
const LED_D2_PIN: u32 = 38;

const CYCLES: u32 = 3;
const FREQUENCY: f64 = 0.5;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let bsdl_path = args.next().expect("usage: blink <bsdl.json> <cable-serial> [pin_a pin_b]");
    let serial = args.next().expect("usage: blink <bsdl.json> <cable-serial> [pin_a pin_b]");
    let pin_a = args.next().map_or(LED_D1_PIN, |p| p.parse().expect("pin_a"));
    let pin_b = args.next().map_or(LED_D2_PIN, |p| p.parse().expect("pin_b"));

    let text = std::fs::read_to_string(&bsdl_path).expect("read BSDL document");
    let doc = serde_json::from_str(&text).expect("BSDL document is not valid JSON");
    let facts = BsdlFacts::from_document(doc).expect("extract BSDL facts");

    let cell_a = facts.boundary_cell_index(pin_a).expect("pin_a boundary cell");
    let cell_b = facts.boundary_cell_index(pin_b).expect("pin_b boundary cell");

    let transport = Ftd2xxTransport::open(&serial, 3_000_000).expect("open cable");
    let mut tap = TapDriver::new(transport);

    println!("Verifying IDCODE...");
    let ok = verify_idcode(
        &mut tap,
        &facts.reference_idcode,
        facts.idcode_opcode,
        facts.instruction_length,
    )
    .expect("read IDCODE");
    if !ok {
        eprintln!("IDCODE read does not match the reference IDCODE from the BSDL file");
        exit(1);
    }
    println!("\tIDCODE matches {}", facts.reference_idcode);

    println!("Blinking pins {pin_a} and {pin_b} at {FREQUENCY} Hz for {CYCLES} cycles...");
    blink(
        &mut tap,
        facts.instruction_length,
        facts.boundary_length,
        cell_a,
        cell_b,
        CYCLES,
        FREQUENCY,
    )
    .expect("blink");
    println!("Done!");

    tap.into_transport().close().expect("close cable");
}
