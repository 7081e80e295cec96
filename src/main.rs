use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use memmap2::Mmap;
use object::{Object, ObjectSymbol};

use disasm_view::disassemble::{disassemble, objdump_for_arch};
use disasm_view::model::TableModel;
use disasm_view::pane::DisassemblyPane;
use disasm_view::results::Symbol;
use disasm_view::serializer::serialize_listing;
use disasm_view::source_model::SOURCE_CODE_LINE_NUMBER_COLUMN;

/// Disassemble one symbol of a binary and align it with its source.
#[derive(Parser, Debug)]
#[command(name = "disasm-view", version)]
struct Args {
    /// Path to the binary to inspect
    binary: String,

    /// Symbol to disassemble, by demangled or raw name
    symbol: String,

    /// objdump binary to use; picked from --arch when unset
    #[arg(long)]
    objdump: Option<String>,

    /// Target architecture string (e.g. aarch64, armv7l, x86_64)
    #[arg(long, default_value = "")]
    arch: String,

    /// Emit the annotated listing as compact JSON instead of text
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _logger = flexi_logger::Logger::try_with_env_or_str(if args.verbose {
        "debug"
    } else {
        "warn"
    })?
    .start()?;

    let file = fs::File::open(&args.binary).with_context(|| format!("open {}", args.binary))?;
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", args.binary))?;
    let obj_file = object::File::parse(&*mmap).context("parse object file")?;

    let symbol = find_symbol(&obj_file, &args.binary, &args.symbol)
        .with_context(|| format!("symbol '{}' not found in {}", args.symbol, args.binary))?;

    let arch = args.arch.trim().to_lowercase();
    let tool = objdump_for_arch(args.objdump.as_deref(), &arch);
    let output = disassemble(&tool, &arch, &symbol);
    if !output.is_valid() {
        bail!("{}", output.error_message);
    }

    if args.json {
        println!("{}", serialize_listing(&output, &symbol, &[]));
        return Ok(());
    }

    let mut pane = DisassemblyPane::new();
    pane.set_symbol(symbol.clone());
    pane.show_disassembly_output(output);

    println!("Disassembly for symbol: {}", symbol.name);
    let disassembly = pane.disassembly_model();
    for (row, line) in disassembly.lines().iter().enumerate() {
        let source_line = disassembly.line_for_index(row);
        if source_line > 0 {
            println!("  {:>10x}:  {:<50} [line {}]", line.address, line.raw, source_line);
        } else {
            println!("  {:>10x}:  {}", line.address, line.raw);
        }
    }

    let source = pane.source_code_model();
    if source.row_count() > 0 {
        println!();
        println!("Source excerpt:");
        for row in 0..source.row_count() {
            let line_number = source.line_for_index(row);
            let correlated = source.cell(row, SOURCE_CODE_LINE_NUMBER_COLUMN).as_number() > 0;
            let marker = if correlated { '*' } else { ' ' };
            println!(
                "  {line_number:>5}{marker} {}",
                source.cell(row, disasm_view::source_model::SOURCE_CODE_COLUMN).as_text()
            );
        }
    }

    Ok(())
}

/// Locate a symbol by name in the binary's symbol tables, matching either
/// the demangled display name or the raw mangled one.
fn find_symbol(obj_file: &object::File, binary: &str, wanted: &str) -> Option<Symbol> {
    find_in_table(obj_file.symbols(), binary, wanted)
        .or_else(|| find_in_table(obj_file.dynamic_symbols(), binary, wanted))
}

fn find_in_table<'data: 'file, 'file>(
    symbols: object::read::SymbolIterator<'data, 'file>,
    binary: &str,
    wanted: &str,
) -> Option<Symbol> {
    for sym in symbols {
        let raw = match sym.name() {
            Ok(name) if !name.is_empty() => name,
            _ => continue,
        };
        let candidate = Symbol::new(raw, sym.address(), sym.size(), binary);
        if candidate.name == wanted || candidate.mangled == wanted {
            return Some(candidate);
        }
    }
    None
}
