// Copyright (c) 2026 Disasm-View Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashSet;
use std::fs;

use log::warn;

use crate::disassemble::DisassemblyOutput;
use crate::utils::canonicalize_path;

/// The contiguous slice of the source file that covers every line the
/// disassembly references, plus the bookkeeping both table models need:
/// the 1-based number of the first excerpt line and the set of lines some
/// instruction actually maps to.
#[derive(Debug, Clone, Default)]
pub struct SourceExcerpt {
    pub lines: Vec<String>,
    /// 1-based source line number of lines[0]. Row r of the excerpt is
    /// source line r + line_offset.
    pub line_offset: u32,
    pub valid_lines: HashSet<u32>,
}

impl SourceExcerpt {
    /// Build the excerpt for one disassembly run. None is the degraded
    /// no-source state, not an error: the output names no source file, the
    /// file is unreadable, or no instruction carries a line correlation.
    pub fn build(output: &DisassemblyOutput) -> Option<SourceExcerpt> {
        if output.source_file_name.is_empty() {
            return None;
        }
        let path = canonicalize_path(&output.source_file_name);
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) => {
                warn!("cannot read source file {path}: {e}");
                return None;
            }
        };
        Self::build_from_source(output, &source)
    }

    /// The scan itself, split from `build` so it can run against in-memory
    /// source text.
    pub fn build_from_source(output: &DisassemblyOutput, source: &str) -> Option<SourceExcerpt> {
        let source_lines: Vec<&str> = source.split('\n').map(|l| l.trim_end_matches('\r')).collect();

        let mut valid_lines = HashSet::new();
        let mut min_index = u32::MAX;
        let mut max_index = 0;
        for line in &output.lines {
            if line.source_code_line == 0 {
                continue;
            }
            min_index = min_index.min(line.source_code_line);
            max_index = max_index.max(line.source_code_line);
            valid_lines.insert(line.source_code_line);
        }
        if valid_lines.is_empty() {
            return None;
        }

        // stale debug info can reference lines past the end of the file
        if min_index as usize > source_lines.len() {
            return None;
        }
        max_index = max_index.min(source_lines.len() as u32);

        let text_of = |line: u32| source_lines[line as usize - 1];

        // the body of a function starts at {; scan up a few lines for the (
        // of the signature so the excerpt shows what is being disassembled
        if !text_of(min_index).contains('(') {
            for _ in 0..5 {
                if min_index <= 1 {
                    break;
                }
                min_index -= 1;
                if text_of(min_index).contains('(') {
                    break;
                }
            }
        }

        let lines = (min_index..=max_index)
            .map(|line| text_of(line).to_string())
            .collect();

        Some(SourceExcerpt {
            lines,
            line_offset: min_index,
            valid_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disassemble::DisassemblyLine;
    use std::io::Write;

    fn output_with_lines(source_lines: &[u32]) -> DisassemblyOutput {
        let lines = source_lines
            .iter()
            .enumerate()
            .map(|(i, &source_code_line)| DisassemblyLine {
                address: 0x1000 + 4 * i as u64,
                source_code_line,
                ..Default::default()
            })
            .collect();
        DisassemblyOutput {
            source_file_name: "ignored.c".to_string(),
            lines,
            error_message: String::new(),
        }
    }

    #[test]
    fn back_scan_finds_signature_line() {
        let output = output_with_lines(&[2]);
        let source = "int foo(\n  x\n}";
        let excerpt = SourceExcerpt::build_from_source(&output, source).unwrap();
        assert_eq!(excerpt.line_offset, 1);
        assert_eq!(excerpt.lines, vec!["int foo(", "  x"]);
        assert_eq!(excerpt.valid_lines, HashSet::from([2]));
    }

    #[test]
    fn back_scan_stops_at_paren_within_window() {
        // lines [0, 5, 7] over a 10-line file: line 5 has no (, line 3 does
        let output = output_with_lines(&[0, 5, 7]);
        let source = "l1\nl2\nvoid bar(int n)\n{\nl5\nl6\nl7\nl8\nl9\nl10";
        let excerpt = SourceExcerpt::build_from_source(&output, source).unwrap();
        assert_eq!(excerpt.line_offset, 3);
        assert_eq!(excerpt.lines.len(), 5); // lines 3..=7
        assert_eq!(excerpt.lines[0], "void bar(int n)");
        assert_eq!(excerpt.valid_lines, HashSet::from([5, 7]));
    }

    #[test]
    fn back_scan_gives_up_after_five_lines() {
        let output = output_with_lines(&[8]);
        let source = "l1\nl2\nl3\nl4\nl5\nl6\nl7\nl8\nl9";
        let excerpt = SourceExcerpt::build_from_source(&output, source).unwrap();
        assert_eq!(excerpt.line_offset, 3);
    }

    #[test]
    fn back_scan_never_goes_below_first_line() {
        let output = output_with_lines(&[2]);
        let source = "l1\nl2\nl3";
        let excerpt = SourceExcerpt::build_from_source(&output, source).unwrap();
        assert_eq!(excerpt.line_offset, 1);
    }

    #[test]
    fn no_back_scan_when_min_line_has_paren() {
        let output = output_with_lines(&[2, 4]);
        let source = "l1\nint main()\n{\nreturn 0;\n}";
        let excerpt = SourceExcerpt::build_from_source(&output, source).unwrap();
        assert_eq!(excerpt.line_offset, 2);
        assert_eq!(excerpt.lines.len(), 3);
    }

    #[test]
    fn no_source_file_name_is_empty() {
        let mut output = output_with_lines(&[1]);
        output.source_file_name.clear();
        assert!(SourceExcerpt::build(&output).is_none());
    }

    #[test]
    fn unreadable_file_is_empty() {
        let mut output = output_with_lines(&[1]);
        output.source_file_name = "/nonexistent/path/to/source.c".to_string();
        assert!(SourceExcerpt::build(&output).is_none());
    }

    #[test]
    fn no_line_correlations_is_empty() {
        let output = output_with_lines(&[0, 0]);
        assert!(SourceExcerpt::build_from_source(&output, "l1\nl2").is_none());
    }

    #[test]
    fn lines_past_eof_are_clamped() {
        let output = output_with_lines(&[2, 12]);
        let source = "fn qux(\n  a\n  b\n  c\n  d";
        let excerpt = SourceExcerpt::build_from_source(&output, source).unwrap();
        assert_eq!(excerpt.line_offset, 1);
        assert_eq!(excerpt.lines.len(), 5);

        let all_past_eof = output_with_lines(&[12]);
        assert!(SourceExcerpt::build_from_source(&all_past_eof, source).is_none());
    }

    #[test]
    fn build_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "static int add(int a, int b)\n{{\n    return a + b;\n}}\n").unwrap();

        let mut output = output_with_lines(&[3]);
        output.source_file_name = file.path().to_string_lossy().into_owned();
        let excerpt = SourceExcerpt::build(&output).unwrap();
        assert_eq!(excerpt.line_offset, 1);
        assert_eq!(excerpt.lines[2], "    return a + b;");
        assert!(excerpt.valid_lines.contains(&3));
    }
}
