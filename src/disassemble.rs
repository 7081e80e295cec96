use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;

use crate::results::Symbol;

/// We use objdump to disassemble one symbol's address range: -l interleaves
/// file:line markers into the listing and -C demangles call targets. This
/// module streams that output and parses it into a linear list of
/// DisassemblyLine records, insertion order = program order. The table models
/// consume the list as-is; nothing here is re-scanned later.

#[derive(Debug, Clone, Default, Serialize)]
pub struct DisassemblyLine {
    pub address: u64,
    /// Mnemonic plus operands, as displayed in the primary column.
    pub raw: String,
    pub mnemonic: String,
    pub operands: String,
    /// Call target extracted from the operands, empty when the instruction
    /// does not reference another symbol.
    pub linked_function_name: String,
    pub linked_function_offset: u64,
    /// 1-based line in the main source file, 0 when the disassembler emitted
    /// no correlation for this instruction.
    pub source_code_line: u32,
    /// Per-event sample costs attributed to this address, one slot per cost
    /// event; empty when no samples hit it.
    pub costs: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DisassemblyOutput {
    /// Main source file of the disassembled symbol, empty when the listing
    /// carried no line markers.
    pub source_file_name: String,
    pub lines: Vec<DisassemblyLine>,
    pub error_message: String,
}

impl DisassemblyOutput {
    pub fn is_valid(&self) -> bool {
        self.error_message.is_empty()
    }

    pub fn from_error(message: String) -> Self {
        Self {
            error_message: message,
            ..Default::default()
        }
    }
}

/// Pick the objdump binary for a target architecture. An explicit non-empty
/// override always wins; otherwise the architecture prefix selects the cross
/// toolchain.
pub fn objdump_for_arch(objdump: Option<&str>, arch: &str) -> String {
    if let Some(tool) = objdump {
        if !tool.is_empty() {
            return tool.to_string();
        }
    }
    if arch.starts_with("armv8") || arch.starts_with("aarch64") {
        return "aarch64-linux-gnu-objdump".to_string();
    }
    if arch.starts_with("arm") {
        return "arm-linux-gnueabi-objdump".to_string();
    }
    "objdump".to_string()
}

/// Disassemble one symbol. Failures never escape as errors: a spawn failure,
/// a non-zero exit or an empty listing all come back as a DisassemblyOutput
/// with a non-empty error_message, which the pane surfaces verbatim.
pub fn disassemble(objdump: &str, arch: &str, symbol: &Symbol) -> DisassemblyOutput {
    let start = symbol.rel_addr;
    let stop = symbol.rel_addr + symbol.size;
    debug!(
        "disassembling {} [0x{:x}-0x{:x}] of {} with {} (arch {})",
        symbol.name, start, stop, symbol.binary, objdump, arch
    );

    let mut child = match Command::new(objdump)
        .arg("-d")
        .arg("-l")
        .arg("-C")
        .arg("--no-show-raw-insn")
        .arg(format!("--start-address=0x{start:x}"))
        .arg(format!("--stop-address=0x{stop:x}"))
        .arg(&symbol.binary)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return DisassemblyOutput::from_error(format!("Failed to run {objdump}: {e}"));
        }
    };

    let mut output = match child.stdout.take() {
        Some(stdout) => parse_objdump_output(BufReader::with_capacity(64 * 1024, stdout)),
        None => DisassemblyOutput::from_error(format!("Failed to capture {objdump} output")),
    };

    let mut stderr_text = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        stderr.read_to_string(&mut stderr_text).ok();
    }

    match child.wait() {
        Ok(status) if !status.success() => {
            return DisassemblyOutput::from_error(format!(
                "{} failed for {}: {}",
                objdump,
                symbol.name,
                stderr_text.trim()
            ));
        }
        Err(e) => {
            return DisassemblyOutput::from_error(format!("Failed to wait for {objdump}: {e}"));
        }
        Ok(_) => {}
    }

    if output.is_valid() && output.lines.is_empty() {
        output = DisassemblyOutput::from_error(format!(
            "Empty output of command {} for {}",
            objdump, symbol.name
        ));
    }
    output
}

/// Parse a -d -l -C listing. Three line shapes matter:
///   `  4011d6:\tmov %rsp,%rbp`  is an instruction,
///   `/path/to/file.c:42`        is a line marker, sticky for following instructions,
///   `0000000000401126 <main>:`  is a block header, skipped.
/// Everything else (section banners, `main():` name lines, blanks) is noise.
pub fn parse_objdump_output(reader: impl BufRead) -> DisassemblyOutput {
    let re_instruction = Regex::new(r"^([0-9a-fA-F]+):\s*(.+)$").unwrap();
    let re_source_marker = Regex::new(r"^(.+):(\d+)(?: \(discriminator \d+\))?$").unwrap();
    let re_linked_function = Regex::new(r"<(.+?)(?:\+0x([0-9a-fA-F]+))?>$").unwrap();

    let mut output = DisassemblyOutput::default();
    let mut current_source_line: u32 = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                return DisassemblyOutput::from_error(format!("Failed to read objdump output: {e}"));
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("Disassembly of section") {
            continue;
        }
        // block headers like `0000000000401126 <main>:`
        if trimmed.ends_with(">:") {
            continue;
        }

        if let Some(caps) = re_instruction.captures(trimmed) {
            let address = match u64::from_str_radix(&caps[1], 16) {
                Ok(address) => address,
                Err(_) => {
                    warn!("unparsable address in listing line: {trimmed}");
                    continue;
                }
            };
            let text = caps[2].trim();
            let (mnemonic, operands) = match text.split_once(char::is_whitespace) {
                Some((mnemonic, operands)) => (mnemonic.to_string(), operands.trim().to_string()),
                None => (text.to_string(), String::new()),
            };

            let mut linked_function_name = String::new();
            let mut linked_function_offset = 0;
            if let Some(caps) = re_linked_function.captures(&operands) {
                linked_function_name = caps[1].to_string();
                if let Some(offset) = caps.get(2) {
                    linked_function_offset =
                        u64::from_str_radix(offset.as_str(), 16).unwrap_or(0);
                }
            }

            output.lines.push(DisassemblyLine {
                address,
                raw: text.to_string(),
                mnemonic,
                operands,
                linked_function_name,
                linked_function_offset,
                source_code_line: current_source_line,
                costs: Vec::new(),
            });
            continue;
        }

        handle_source_marker(
            &re_source_marker,
            trimmed,
            &mut output,
            &mut current_source_line,
        );
    }

    output
}

/// A marker binds all following instructions to its line until the next
/// marker. The first file seen becomes the pane's source file; markers for
/// other files (inlined code) leave those instructions unmapped so the
/// excerpt never mixes line numbers from different files.
fn handle_source_marker(
    re_source_marker: &Regex,
    trimmed: &str,
    output: &mut DisassemblyOutput,
    current_source_line: &mut u32,
) {
    let Some(caps) = re_source_marker.captures(trimmed) else {
        return;
    };
    let file = &caps[1];
    let Ok(line) = caps[2].parse::<u32>() else {
        warn!("unparsable line number in marker: {trimmed}");
        return;
    };
    if output.source_file_name.is_empty() {
        output.source_file_name = file.to_string();
    }
    *current_source_line = if output.source_file_name == file {
        line
    } else {
        0
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
/tmp/demo:     file format elf64-x86-64


Disassembly of section .text:

0000000000001119 <main>:
main():
/home/user/demo.c:1
    1119:\tendbr64
    111d:\tpush   %rbp
/home/user/demo.c:2
    111e:\tmov    %rsp,%rbp
    1121:\tcall   1060 <puts@plt>
    1126:\tcall   1119 <main+0xd>
/home/user/demo.c:3 (discriminator 2)
    112b:\tpop    %rbp
    112c:\tret
";

    fn parsed() -> DisassemblyOutput {
        parse_objdump_output(LISTING.as_bytes())
    }

    #[test]
    fn objdump_selection_by_arch_prefix() {
        assert_eq!(objdump_for_arch(None, "armv8-a"), "aarch64-linux-gnu-objdump");
        assert_eq!(objdump_for_arch(None, "aarch64"), "aarch64-linux-gnu-objdump");
        assert_eq!(objdump_for_arch(None, "armv7l"), "arm-linux-gnueabi-objdump");
        assert_eq!(objdump_for_arch(None, "x86_64"), "objdump");
        assert_eq!(objdump_for_arch(Some(""), "aarch64"), "aarch64-linux-gnu-objdump");
        assert_eq!(objdump_for_arch(Some("/opt/bin/objdump"), "aarch64"), "/opt/bin/objdump");
    }

    #[test]
    fn parses_instructions_in_program_order() {
        let output = parsed();
        assert!(output.is_valid());
        assert_eq!(output.lines.len(), 7);
        let addresses: Vec<u64> = output.lines.iter().map(|l| l.address).collect();
        assert_eq!(addresses, vec![0x1119, 0x111d, 0x111e, 0x1121, 0x1126, 0x112b, 0x112c]);
    }

    #[test]
    fn source_markers_are_sticky() {
        let output = parsed();
        assert_eq!(output.source_file_name, "/home/user/demo.c");
        let lines: Vec<u32> = output.lines.iter().map(|l| l.source_code_line).collect();
        assert_eq!(lines, vec![1, 1, 2, 2, 2, 3, 3]);
    }

    #[test]
    fn splits_mnemonic_and_operands() {
        let output = parsed();
        assert_eq!(output.lines[2].mnemonic, "mov");
        assert_eq!(output.lines[2].operands, "%rsp,%rbp");
        assert_eq!(output.lines[0].mnemonic, "endbr64");
        assert_eq!(output.lines[0].operands, "");
    }

    #[test]
    fn extracts_linked_functions() {
        let output = parsed();
        assert_eq!(output.lines[3].linked_function_name, "puts@plt");
        assert_eq!(output.lines[3].linked_function_offset, 0);
        assert_eq!(output.lines[4].linked_function_name, "main");
        assert_eq!(output.lines[4].linked_function_offset, 0xd);
        assert_eq!(output.lines[0].linked_function_name, "");
    }

    #[test]
    fn markers_from_other_files_unmap_their_instructions() {
        let listing = "\
/a.c:10
    1000:\tnop
/b.h:99
    1001:\tnop
/a.c:11
    1002:\tnop
";
        let output = parse_objdump_output(listing.as_bytes());
        assert_eq!(output.source_file_name, "/a.c");
        let lines: Vec<u32> = output.lines.iter().map(|l| l.source_code_line).collect();
        assert_eq!(lines, vec![10, 0, 11]);
    }

    #[test]
    fn listing_without_markers_has_no_source_file() {
        let listing = "    1000:\tnop\n    1001:\tret\n";
        let output = parse_objdump_output(listing.as_bytes());
        assert!(output.is_valid());
        assert_eq!(output.source_file_name, "");
        assert_eq!(output.lines.len(), 2);
        assert_eq!(output.lines[0].source_code_line, 0);
    }

    #[test]
    fn error_output_is_invalid() {
        let output = DisassemblyOutput::from_error("boom".into());
        assert!(!output.is_valid());
        assert!(output.lines.is_empty());
    }
}
