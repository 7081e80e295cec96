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

use std::rc::Rc;

use crate::disassemble::{DisassemblyLine, DisassemblyOutput};
use crate::highlight::HighlightState;
use crate::model::{CellValue, ModelUpdate, TableModel};
use crate::results::CostRegistry;

/// Table model over the disassembly rows. Column 0 is the instruction text,
/// followed by one column per cost event; the four trailing columns
/// (linked-function name/offset, source line, highlight flag) are hidden by
/// the view but stay queryable, the delegates key off them.
pub struct DisassemblyModel {
    lines: Vec<DisassemblyLine>,
    highlight: Rc<HighlightState>,
    results: Rc<CostRegistry>,
    updates: Vec<ModelUpdate>,
}

/// Instruction text column, the only visible text column.
pub const DISASSEMBLY_COLUMN: usize = 0;
/// Hidden trailing columns, in order after the cost columns.
const HIDDEN_COLUMN_COUNT: usize = 4;

impl DisassemblyModel {
    pub fn new(highlight: Rc<HighlightState>) -> Self {
        Self {
            lines: Vec::new(),
            highlight,
            results: Rc::new(CostRegistry::default()),
            updates: Vec::new(),
        }
    }

    /// Atomically replace all rows from a fresh disassembly run.
    pub fn set_disassembly(&mut self, output: &DisassemblyOutput) {
        self.lines = output.lines.clone();
        self.updates.push(ModelUpdate::Reset);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.updates.push(ModelUpdate::Reset);
    }

    /// Move the shared highlight to `line`. Structurally nothing changes, so
    /// the notification is scoped to the text column.
    pub fn update_highlighting(&mut self, line: u32) {
        self.highlight.set(line);
        self.updates.push(ModelUpdate::DataChanged {
            column: DISASSEMBLY_COLUMN,
        });
    }

    /// Row whose address is `offset` past the first instruction, i.e. the
    /// target of a same-symbol call. None when no row matches.
    pub fn find_index_with_offset(&self, offset: u64) -> Option<usize> {
        let base = self.lines.first()?.address;
        let address = base.checked_add(offset)?;
        self.lines.iter().position(|line| line.address == address)
    }

    /// Source line of a row, 0 when unmapped or out of range.
    pub fn line_for_index(&self, row: usize) -> u32 {
        self.lines
            .get(row)
            .map(|line| line.source_code_line)
            .unwrap_or(0)
    }

    pub fn line(&self, row: usize) -> Option<&DisassemblyLine> {
        self.lines.get(row)
    }

    pub fn lines(&self) -> &[DisassemblyLine] {
        &self.lines
    }

    /// Attach the cost lookup table used to resolve displayed cost values.
    /// Row identity is unaffected; only the cost columns change meaning.
    pub fn set_results(&mut self, results: Rc<CostRegistry>) {
        self.results = results;
    }

    pub fn num_event_types(&self) -> usize {
        self.results.num_event_types()
    }

    /// Cost of a row for one event as a fraction of that event's total,
    /// 0.0 when the row carries no samples or the total is unknown.
    pub fn cost_fraction(&self, row: usize, event: usize) -> f64 {
        let total = self.results.costs().total(event);
        if total == 0 {
            return 0.0;
        }
        let cost = self
            .lines
            .get(row)
            .and_then(|line| line.costs.get(event))
            .copied()
            .unwrap_or(0);
        cost as f64 / total as f64
    }

    pub fn linked_function_name_column(&self) -> usize {
        1 + self.num_event_types()
    }

    pub fn linked_function_offset_column(&self) -> usize {
        2 + self.num_event_types()
    }

    pub fn source_code_line_column(&self) -> usize {
        3 + self.num_event_types()
    }

    pub fn highlight_column(&self) -> usize {
        4 + self.num_event_types()
    }

    /// Drain the notifications accumulated since the last call.
    pub fn take_updates(&mut self) -> Vec<ModelUpdate> {
        std::mem::take(&mut self.updates)
    }
}

impl TableModel for DisassemblyModel {
    fn row_count(&self) -> usize {
        self.lines.len()
    }

    fn column_count(&self) -> usize {
        1 + self.num_event_types() + HIDDEN_COLUMN_COUNT
    }

    fn header(&self, column: usize) -> CellValue {
        if column == DISASSEMBLY_COLUMN {
            return CellValue::Text("Disassembly".to_string());
        }
        if let Some(event) = column.checked_sub(1) {
            if let Some(name) = self.results.costs().event_name(event) {
                return CellValue::Text(name.to_string());
            }
        }
        match column {
            c if c == self.linked_function_name_column() => {
                CellValue::Text("Linked Function Name".to_string())
            }
            c if c == self.linked_function_offset_column() => {
                CellValue::Text("Linked Function Offset".to_string())
            }
            c if c == self.source_code_line_column() => {
                CellValue::Text("Source Code Line".to_string())
            }
            c if c == self.highlight_column() => CellValue::Text("Highlight".to_string()),
            _ => CellValue::Empty,
        }
    }

    fn cell(&self, row: usize, column: usize) -> CellValue {
        let Some(line) = self.lines.get(row) else {
            return CellValue::Empty;
        };

        if column == DISASSEMBLY_COLUMN {
            return CellValue::Text(line.raw.clone());
        }
        if let Some(event) = column.checked_sub(1) {
            if event < self.num_event_types() {
                return match line.costs.get(event).copied() {
                    Some(cost) if cost > 0 => CellValue::Number(cost),
                    _ => CellValue::Empty,
                };
            }
        }
        match column {
            c if c == self.linked_function_name_column() => {
                CellValue::Text(line.linked_function_name.clone())
            }
            c if c == self.linked_function_offset_column() => {
                CellValue::Number(line.linked_function_offset)
            }
            c if c == self.source_code_line_column() => {
                CellValue::Number(line.source_code_line as u64)
            }
            c if c == self.highlight_column() => {
                CellValue::Flag(line.source_code_line == self.highlight.get())
            }
            _ => CellValue::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{CostEntry, Symbol};

    fn output_with_addresses(addresses: &[u64]) -> DisassemblyOutput {
        let lines = addresses
            .iter()
            .map(|&address| DisassemblyLine {
                address,
                raw: format!("insn at {address:#x}"),
                ..Default::default()
            })
            .collect();
        DisassemblyOutput {
            lines,
            ..Default::default()
        }
    }

    fn model_with_addresses(addresses: &[u64]) -> DisassemblyModel {
        let mut model = DisassemblyModel::new(HighlightState::new());
        model.set_disassembly(&output_with_addresses(addresses));
        model
    }

    #[test]
    fn set_and_clear_emit_reset() {
        let mut model = model_with_addresses(&[0x1000, 0x1002]);
        assert_eq!(model.row_count(), 2);
        assert_eq!(model.take_updates(), vec![ModelUpdate::Reset]);

        model.clear();
        assert_eq!(model.row_count(), 0);
        assert_eq!(model.take_updates(), vec![ModelUpdate::Reset]);
    }

    #[test]
    fn highlight_update_is_column_scoped() {
        let mut model = model_with_addresses(&[0x1000]);
        model.take_updates();
        model.update_highlighting(5);
        assert_eq!(
            model.take_updates(),
            vec![ModelUpdate::DataChanged {
                column: DISASSEMBLY_COLUMN
            }]
        );
    }

    #[test]
    fn find_index_with_offset_matches_addresses() {
        let model = model_with_addresses(&[0x1000, 0x1002, 0x1008]);
        assert_eq!(model.find_index_with_offset(0), Some(0));
        assert_eq!(model.find_index_with_offset(2), Some(1));
        assert_eq!(model.find_index_with_offset(8), Some(2));
        assert_eq!(model.find_index_with_offset(3), None);

        let empty = DisassemblyModel::new(HighlightState::new());
        assert_eq!(empty.find_index_with_offset(0), None);
    }

    #[test]
    fn line_for_index_out_of_range_is_zero() {
        let mut model = model_with_addresses(&[0x1000]);
        let mut output = output_with_addresses(&[0x1000]);
        output.lines[0].source_code_line = 7;
        model.set_disassembly(&output);
        assert_eq!(model.line_for_index(0), 7);
        assert_eq!(model.line_for_index(99), 0);
    }

    #[test]
    fn column_layout_follows_event_count() {
        let mut model = model_with_addresses(&[0x1000]);
        assert_eq!(model.column_count(), 5);
        assert_eq!(model.linked_function_name_column(), 1);

        let mut registry = CostRegistry::new(vec!["cycles".into(), "branches".into()]);
        registry.add_entry(CostEntry {
            symbol: Symbol::new("main", 0x1000, 8, "/bin/demo"),
            self_costs: vec![10, 20],
            ..Default::default()
        });
        model.set_results(Rc::new(registry));
        assert_eq!(model.column_count(), 7);
        assert_eq!(model.linked_function_name_column(), 3);
        assert_eq!(model.highlight_column(), 6);
        assert_eq!(model.header(1).as_text(), "cycles");
        assert_eq!(model.header(2).as_text(), "branches");
    }

    #[test]
    fn cost_cells_blank_without_samples() {
        let mut output = output_with_addresses(&[0x1000, 0x1004]);
        output.lines[0].costs = vec![10, 0];

        let mut model = DisassemblyModel::new(HighlightState::new());
        let mut registry = CostRegistry::new(vec!["cycles".into(), "branches".into()]);
        registry.add_entry(CostEntry {
            symbol: Symbol::new("main", 0x1000, 8, "/bin/demo"),
            self_costs: vec![40, 0],
            ..Default::default()
        });
        model.set_results(Rc::new(registry));
        model.set_disassembly(&output);

        assert_eq!(model.cell(0, 1), CellValue::Number(10));
        assert_eq!(model.cell(0, 2), CellValue::Empty);
        assert_eq!(model.cell(1, 1), CellValue::Empty);
        assert!((model.cost_fraction(0, 0) - 0.25).abs() < 1e-9);
        assert_eq!(model.cost_fraction(0, 1), 0.0);
    }

    #[test]
    fn out_of_range_access_is_empty() {
        let model = model_with_addresses(&[0x1000]);
        assert_eq!(model.cell(5, 0), CellValue::Empty);
        assert_eq!(model.cell(0, 42), CellValue::Empty);
        assert_eq!(model.header(42), CellValue::Empty);
    }

    #[test]
    fn highlight_flag_tracks_shared_state() {
        let highlight = HighlightState::new();
        let mut model = DisassemblyModel::new(Rc::clone(&highlight));
        let mut output = output_with_addresses(&[0x1000, 0x1004]);
        output.lines[0].source_code_line = 5;
        output.lines[1].source_code_line = 6;
        model.set_disassembly(&output);

        model.update_highlighting(5);
        assert!(model.cell(0, model.highlight_column()).as_flag());
        assert!(!model.cell(1, model.highlight_column()).as_flag());

        // same line again: no observable change
        model.update_highlighting(5);
        assert!(model.cell(0, model.highlight_column()).as_flag());
        assert_eq!(highlight.get(), 5);
    }
}
