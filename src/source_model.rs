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
use std::rc::Rc;

use crate::disassemble::DisassemblyOutput;
use crate::excerpt::SourceExcerpt;
use crate::highlight::HighlightState;
use crate::model::{CellValue, ModelUpdate, TableModel};

/// Source text column.
pub const SOURCE_CODE_COLUMN: usize = 0;
/// Real line number when the line is referenced by the disassembly, else 0.
pub const SOURCE_CODE_LINE_NUMBER_COLUMN: usize = 1;
/// Whether the row is the currently highlighted line.
pub const HIGHLIGHT_COLUMN: usize = 2;

const COLUMN_COUNT: usize = 3;

/// Table model over the source excerpt. Row r shows source line
/// r + line_offset; the line-number and highlight columns are hidden by the
/// view and drive the delegate's background painting.
pub struct SourceCodeModel {
    source_code: Vec<String>,
    line_offset: u32,
    valid_line_numbers: HashSet<u32>,
    highlight: Rc<HighlightState>,
    updates: Vec<ModelUpdate>,
}

impl SourceCodeModel {
    pub fn new(highlight: Rc<HighlightState>) -> Self {
        Self {
            source_code: Vec::new(),
            line_offset: 0,
            valid_line_numbers: HashSet::new(),
            highlight,
            updates: Vec::new(),
        }
    }

    /// Rebuild the excerpt for a fresh disassembly run. An empty build
    /// result (no source, unreadable file, no correlations) leaves the model
    /// empty; either way the rebuild is structural and emits a reset.
    pub fn set_disassembly(&mut self, output: &DisassemblyOutput) {
        match SourceExcerpt::build(output) {
            Some(excerpt) => {
                self.source_code = excerpt.lines;
                self.line_offset = excerpt.line_offset;
                self.valid_line_numbers = excerpt.valid_lines;
            }
            None => {
                self.source_code.clear();
                self.line_offset = 0;
                self.valid_line_numbers.clear();
            }
        }
        self.updates.push(ModelUpdate::Reset);
    }

    pub fn clear(&mut self) {
        self.source_code.clear();
        self.line_offset = 0;
        self.valid_line_numbers.clear();
        self.updates.push(ModelUpdate::Reset);
    }

    pub fn update_highlighting(&mut self, line: u32) {
        self.highlight.set(line);
        self.updates.push(ModelUpdate::DataChanged {
            column: SOURCE_CODE_COLUMN,
        });
    }

    /// Real source line number of a row, whether or not any instruction maps
    /// to it.
    pub fn line_for_index(&self, row: usize) -> u32 {
        row as u32 + self.line_offset
    }

    pub fn line_offset(&self) -> u32 {
        self.line_offset
    }

    /// Drain the notifications accumulated since the last call.
    pub fn take_updates(&mut self) -> Vec<ModelUpdate> {
        std::mem::take(&mut self.updates)
    }
}

impl TableModel for SourceCodeModel {
    fn row_count(&self) -> usize {
        self.source_code.len()
    }

    fn column_count(&self) -> usize {
        COLUMN_COUNT
    }

    fn header(&self, column: usize) -> CellValue {
        match column {
            SOURCE_CODE_COLUMN => CellValue::Text("Source Code".to_string()),
            SOURCE_CODE_LINE_NUMBER_COLUMN => {
                CellValue::Text("Source Code Line Number".to_string())
            }
            HIGHLIGHT_COLUMN => CellValue::Text("Highlight".to_string()),
            _ => CellValue::Empty,
        }
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        let Some(text) = self.source_code.get(row) else {
            return CellValue::Empty;
        };
        match column {
            SOURCE_CODE_COLUMN => CellValue::Text(text.clone()),
            SOURCE_CODE_LINE_NUMBER_COLUMN => {
                let line = row as u32 + self.line_offset;
                if self.valid_line_numbers.contains(&line) {
                    CellValue::Number(line as u64)
                } else {
                    CellValue::Number(0)
                }
            }
            HIGHLIGHT_COLUMN => {
                CellValue::Flag(row as u32 + self.line_offset == self.highlight.get())
            }
            _ => CellValue::Empty,
        }
    }
}
