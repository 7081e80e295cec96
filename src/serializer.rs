use serde_json::{json, Value};

use crate::disassemble::DisassemblyOutput;
use crate::results::Symbol;

/// Serialize an annotated listing into a compact JSON message.
/// Format:
/// {
///   "t": "disasm_view",
///   "symbol": { "name": "main", "rel_addr": ..., ... },
///   "source_file": "/path/to/file.c",
///   "events": ["cycles", ...],
///   "lines": [ [addr_hex, text, source_line, [costs...]], ... ]
/// }
/// Addresses go out as hex strings for JS-safe handling.
pub fn serialize_listing(output: &DisassemblyOutput, symbol: &Symbol, events: &[String]) -> Value {
    let mut lines: Vec<Value> = Vec::with_capacity(output.lines.len());
    for line in &output.lines {
        let addr_hex = format!("0x{:x}", line.address);
        lines.push(json!([
            addr_hex,
            line.raw,
            line.source_code_line,
            line.costs,
        ]));
    }

    json!({
        "t": "disasm_view",
        "symbol": symbol,
        "source_file": output.source_file_name,
        "events": events,
        "lines": Value::Array(lines),
    })
}
