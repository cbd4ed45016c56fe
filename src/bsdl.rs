//! Chip facts extracted from a parsed BSDL document.
//!
//! BSDL parsing itself happens upstream; this module consumes the parser's
//! output as a nested read-only [`serde_json::Value`] and pulls out the
//! handful of fields the protocol layer needs.  All lookups are first-match
//! linear scans over the document's small declarative lists, with a
//! fail-if-absent contract; a missing field means a malformed or mismatched
//! BSDL file, surfaced with the field or pin that failed.
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BsdlError {
    #[error("missing or malformed BSDL field `{0}`")]
    Field(&'static str),
    #[error("no instruction named `{0}` in the instruction opcode list")]
    MissingInstruction(&'static str),
    #[error("instruction opcode `{0}` is not a binary string of at most 8 bits")]
    BadOpcode(String),
    #[error("pin {0} is not present in the device pin map")]
    UnknownPin(u32),
    #[error("no OUTPUT3 boundary cell drives port `{0}`")]
    NoOutputCell(String),
    #[error("boundary register length {0} is not a multiple of 8")]
    UnsupportedBoundaryLength(usize),
    #[error("instruction register length {0} is not between 1 and 8")]
    UnsupportedInstructionLength(u64),
}

/// Everything the protocol layer needs to know about the chip, extracted
/// once per session and immutable after that.
pub struct BsdlFacts {
    /// Instruction register length in bits.  At most 8 in this design.
    pub instruction_length: u8,
    /// Opcode selecting the IDCODE register, parsed from the BSDL binary
    /// opcode string.
    pub idcode_opcode: u8,
    /// The chip's declared 32-bit IDCODE pattern, MSB first.  Positions may
    /// be `X` for bits the vendor leaves unspecified.
    pub reference_idcode: String,
    /// Boundary-scan register length in bits, always a multiple of 8.
    pub boundary_length: usize,
    doc: Value,
}

impl BsdlFacts {
    pub fn from_document(doc: Value) -> Result<Self, BsdlError> {
        let ir = doc
            .get("instruction_register_description")
            .ok_or(BsdlError::Field("instruction_register_description"))?;
        let instruction_length = field_number(ir, "instruction_length")?;
        if !(1..=8).contains(&instruction_length) {
            // Longer instruction registers would need multi-byte IR shifts,
            // which this design does not implement.
            return Err(BsdlError::UnsupportedInstructionLength(instruction_length));
        }
        let instruction_length = instruction_length as u8;

        let opcodes = ir
            .get("instruction_opcodes")
            .and_then(Value::as_array)
            .ok_or(BsdlError::Field("instruction_opcodes"))?;
        let idcode = opcodes
            .iter()
            .find(|op| op.get("instruction_name").and_then(Value::as_str) == Some("IDCODE"))
            .ok_or(BsdlError::MissingInstruction("IDCODE"))?;
        let opcode_str = idcode
            .get("opcode_list")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
            .and_then(Value::as_str)
            .ok_or(BsdlError::Field("opcode_list"))?;
        let idcode_opcode = u8::from_str_radix(opcode_str, 2)
            .map_err(|_| BsdlError::BadOpcode(opcode_str.to_string()))?;

        let optional = doc
            .get("optional_register_description")
            .and_then(Value::as_array)
            .ok_or(BsdlError::Field("optional_register_description"))?;
        let reference_idcode = optional
            .iter()
            .find_map(|reg| bit_pattern(reg.get("idcode_register")?))
            .ok_or(BsdlError::Field("idcode_register"))?;
        if reference_idcode.len() != 32 {
            return Err(BsdlError::Field("idcode_register"));
        }

        let fixed = doc
            .pointer("/boundary_scan_register_description/fixed_boundary_stmts")
            .ok_or(BsdlError::Field("fixed_boundary_stmts"))?;
        let boundary_length = field_number(fixed, "boundary_length")? as usize;
        if boundary_length % 8 != 0 {
            // Sub-byte tails would need bit-mode DR shifts, which this
            // design does not implement.
            return Err(BsdlError::UnsupportedBoundaryLength(boundary_length));
        }

        Ok(Self {
            instruction_length,
            idcode_opcode,
            reference_idcode,
            boundary_length,
            doc,
        })
    }

    /// Resolve a package pin number to the zero-based boundary-register
    /// index of the OUTPUT3 cell driving that pin: pin -> port name through
    /// the package pin map, then port name -> cell through the boundary
    /// register list.  Selecting a pin with no output-capable cell is a
    /// configuration error, not a silent success.
    pub fn boundary_cell_index(&self, pin: u32) -> Result<usize, BsdlError> {
        let mappings = self
            .doc
            .get("device_package_pin_mappings")
            .and_then(Value::as_array)
            .ok_or(BsdlError::Field("device_package_pin_mappings"))?;
        let pin_map = mappings
            .iter()
            .find_map(|m| m.get("pin_map").and_then(Value::as_array).filter(|a| !a.is_empty()))
            .ok_or(BsdlError::Field("pin_map"))?;

        let pin_str = pin.to_string();
        let port = pin_map
            .iter()
            .find(|entry| {
                entry
                    .get("pin_list")
                    .is_some_and(|list| string_or_list_contains(list, &pin_str))
            })
            .and_then(|entry| entry.get("port_name").and_then(Value::as_str))
            .ok_or(BsdlError::UnknownPin(pin))?;

        let cells = self
            .doc
            .pointer("/boundary_scan_register_description/fixed_boundary_stmts/boundary_register")
            .and_then(Value::as_array)
            .ok_or(BsdlError::Field("boundary_register"))?;
        let cell = cells
            .iter()
            .find(|cell| {
                let Some(spec) = cell.pointer("/cell_info/cell_spec") else {
                    return false;
                };
                spec.get("function").and_then(Value::as_str) == Some("OUTPUT3")
                    && spec
                        .get("port_id")
                        .is_some_and(|id| string_or_list_contains(id, port))
            })
            .ok_or_else(|| BsdlError::NoOutputCell(port.to_string()))?;

        Ok(field_number(cell, "cell_number")? as usize)
    }
}

/// Numeric field that the upstream parser may emit as a JSON number or as a
/// digit string.
fn field_number(parent: &Value, field: &'static str) -> Result<u64, BsdlError> {
    match parent.get(field) {
        Some(Value::Number(n)) => n.as_u64().ok_or(BsdlError::Field(field)),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| BsdlError::Field(field)),
        _ => Err(BsdlError::Field(field)),
    }
}

/// A bit pattern the parser may emit whole or split at the BSDL string
/// concatenation operators.
fn bit_pattern(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => parts.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

/// BSDL port identifiers and pin lists appear both as a lone string and as a
/// list of strings; either way, match exactly.
fn string_or_list_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(s) => s == needle,
        Value::Array(items) => items.iter().any(|i| i.as_str() == Some(needle)),
        _ => false,
    }
}
