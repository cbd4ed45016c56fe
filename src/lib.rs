//! Control a boundary-scan-capable chip through a single JTAG TAP driven
//! over an FTDI MPSSE cable.
//!
//! At the lowest level, the `mpsse` module encodes TAP state walks and
//! instruction/data register shifts as MPSSE command bytes, batched into a
//! `ScanBuffer`.  The `transport` module is the seam to the USB bridge: two
//! primitives, write a buffer and read back an exact number of TDO bytes,
//! with an FTDI D2XX implementation behind the `ftd2xx` feature.
//!
//! On top of those, `tap::TapDriver` sequences complete operations (reset,
//! instruction load, data register shifts), each sent as one batched buffer
//! and each starting from an explicit Test-Logic-Reset.  The `bsdl` module
//! extracts the chip facts that parameterize the shifts (instruction length,
//! IDCODE opcode and reference pattern, boundary register layout) from a
//! parsed BSDL document, and `idcode` and `extest` put it all together to
//! verify the chip's identity and drive its output pins.
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "ftd2xx")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use jtag_bscan::bsdl::BsdlFacts;
//! use jtag_bscan::tap::TapDriver;
//! use jtag_bscan::transport::ftd2xx::Ftd2xxTransport;
//!
//! let doc = serde_json::from_str(&std::fs::read_to_string("xc2c64a_vq44.json")?)?;
//! let facts = BsdlFacts::from_document(doc)?;
//!
//! let transport = Ftd2xxTransport::open("FTXQNTSO", 3_000_000)?;
//! let mut tap = TapDriver::new(transport);
//! let ok = jtag_bscan::idcode::verify_idcode(
//!     &mut tap,
//!     &facts.reference_idcode,
//!     facts.idcode_opcode,
//!     facts.instruction_length,
//! )?;
//! assert!(ok);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "ftd2xx"))]
//! # fn main() {}
//! ```
//!
//! Errors stay with the seam they come from: device failures are
//! `transport::TransportError`, missing chip facts are `bsdl::BsdlError`.
//! Both propagate to the caller unmodified; nothing in this crate retries
//! or swallows them.

pub mod bsdl;
pub mod extest;
pub mod idcode;
pub mod mpsse;
pub mod tap;
pub mod transport;
