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

/// The tabular surface shared by the disassembly and source-code models.
///
/// Views render whatever `cell` returns and never reach into model internals.
/// Out-of-range access yields `CellValue::Empty` rather than an error, so a
/// view racing a rebuild can only ever paint a blank cell.
pub trait TableModel {
    fn row_count(&self) -> usize;
    fn column_count(&self) -> usize;
    /// Header for a column, `Empty` when out of range.
    fn header(&self, column: usize) -> CellValue;
    /// Cell payload at (row, column), `Empty` when out of range.
    fn cell(&self, row: usize, column: usize) -> CellValue;
}

/// A single cell payload. The coercing accessors mirror how the view layer
/// consumes cells: a missing value reads as zero/false/"".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(u64),
    Flag(bool),
}

impl CellValue {
    pub fn as_text(&self) -> &str {
        match self {
            CellValue::Text(s) => s,
            _ => "",
        }
    }

    pub fn as_number(&self) -> u64 {
        match self {
            CellValue::Number(n) => *n,
            _ => 0,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, CellValue::Flag(true))
    }
}

/// Change notification emitted by a model for its view.
///
/// `Reset` accompanies every structural rebuild (`set_disassembly`, `clear`)
/// and tells the view to drop and refetch all rows. `DataChanged` covers
/// highlight-only updates and is scoped to one column across all rows, so a
/// hover costs a repaint, not a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelUpdate {
    Reset,
    DataChanged { column: usize },
}
