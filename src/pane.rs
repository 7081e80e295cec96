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

use log::{debug, info};

use crate::disassemble::{disassemble, objdump_for_arch, DisassemblyOutput};
use crate::disassembly_model::DisassemblyModel;
use crate::highlight::HighlightState;
use crate::results::{CostRegistry, Symbol};
use crate::source_model::SourceCodeModel;

/// What a row activation (goto linked function) resolved to. Unresolved
/// lookups are `Ignored`, never an error the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GotoOutcome {
    /// The link targets the displayed symbol; scroll the disassembly view to
    /// this row.
    ScrollToRow(usize),
    /// The link targets another known symbol; the pane switched to it and
    /// re-ran the disassembly pipeline.
    SymbolChanged,
    Ignored,
}

/// One open disassembly pane: both table models, the highlight state they
/// share, and the hover/goto coordination between them.
///
/// All mutation happens on the caller's thread; a rebuild fully discards the
/// previous output before the new one commits, so the views never observe a
/// half-populated table.
pub struct DisassemblyPane {
    disassembly_model: DisassemblyModel,
    source_code_model: SourceCodeModel,
    highlight: Rc<HighlightState>,
    results: Rc<CostRegistry>,
    cur_symbol: Symbol,
    objdump: String,
    arch: String,
    error_message: Option<String>,
}

impl Default for DisassemblyPane {
    fn default() -> Self {
        Self::new()
    }
}

impl DisassemblyPane {
    pub fn new() -> Self {
        let highlight = HighlightState::new();
        Self {
            disassembly_model: DisassemblyModel::new(Rc::clone(&highlight)),
            source_code_model: SourceCodeModel::new(Rc::clone(&highlight)),
            highlight,
            results: Rc::new(CostRegistry::default()),
            cur_symbol: Symbol::default(),
            objdump: String::new(),
            arch: String::new(),
            error_message: None,
        }
    }

    pub fn disassembly_model(&self) -> &DisassemblyModel {
        &self.disassembly_model
    }

    pub fn disassembly_model_mut(&mut self) -> &mut DisassemblyModel {
        &mut self.disassembly_model
    }

    pub fn source_code_model(&self) -> &SourceCodeModel {
        &self.source_code_model
    }

    pub fn source_code_model_mut(&mut self) -> &mut SourceCodeModel {
        &mut self.source_code_model
    }

    pub fn current_symbol(&self) -> &Symbol {
        &self.cur_symbol
    }

    /// Error of the last disassembly run, verbatim from the disassembler.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn set_symbol(&mut self, symbol: Symbol) {
        self.cur_symbol = symbol;
    }

    pub fn set_results(&mut self, results: Rc<CostRegistry>) {
        self.results = Rc::clone(&results);
        self.disassembly_model.set_results(results);
    }

    pub fn set_objdump(&mut self, objdump: &str) {
        self.objdump = objdump.to_string();
    }

    pub fn set_arch(&mut self, arch: &str) {
        self.arch = arch.trim().to_lowercase();
    }

    pub fn clear(&mut self) {
        self.disassembly_model.clear();
        self.source_code_model.clear();
        self.highlight.clear();
        self.error_message = None;
    }

    /// Disassemble the current symbol and commit the result into both
    /// models.
    pub fn show_disassembly(&mut self) {
        if !self.cur_symbol.is_valid() {
            self.clear();
            return;
        }
        let tool = objdump_for_arch(Some(self.objdump.as_str()), &self.arch);
        info!("showing disassembly for {} via {}", self.cur_symbol.name, tool);
        let mut output = disassemble(&tool, &self.arch, &self.cur_symbol);
        self.attach_costs(&mut output);
        self.show_disassembly_output(output);
    }

    /// Commit a finished disassembly run: all-or-nothing relative to row
    /// visibility. An invalid output keeps both panes empty and records the
    /// error for the surrounding UI to surface.
    pub fn show_disassembly_output(&mut self, output: DisassemblyOutput) {
        self.clear();
        if !output.is_valid() {
            self.error_message = Some(output.error_message);
            return;
        }
        self.disassembly_model.set_disassembly(&output);
        self.source_code_model.set_disassembly(&output);
    }

    /// Hover over disassembly row `row`: resolve it to a source line and
    /// push the highlight into both models.
    pub fn hover_disassembly(&mut self, row: usize) {
        let line = self.disassembly_model.line_for_index(row);
        self.update_highlighting(line);
    }

    /// Hover over source row `row`: same propagation, source-first.
    pub fn hover_source(&mut self, row: usize) {
        let line = self.source_code_model.line_for_index(row);
        self.update_highlighting(line);
    }

    fn update_highlighting(&mut self, line: u32) {
        self.disassembly_model.update_highlighting(line);
        self.source_code_model.update_highlighting(line);
    }

    /// Activate (click) disassembly row `row`. Rows referencing another
    /// function either scroll within the displayed symbol or switch the pane
    /// to the referenced symbol; everything else is a no-op.
    pub fn activate_row(&mut self, row: usize) -> GotoOutcome {
        let Some(line) = self.disassembly_model.line(row) else {
            return GotoOutcome::Ignored;
        };
        if line.linked_function_name.is_empty() {
            return GotoOutcome::Ignored;
        }
        let function_name = line.linked_function_name.clone();
        let function_offset = line.linked_function_offset;

        if function_name == self.cur_symbol.name {
            return match self.disassembly_model.find_index_with_offset(function_offset) {
                Some(target_row) => GotoOutcome::ScrollToRow(target_row),
                None => GotoOutcome::Ignored,
            };
        }

        match self.results.find_symbol(&function_name).cloned() {
            Some(symbol) => {
                self.set_symbol(symbol);
                self.show_disassembly();
                GotoOutcome::SymbolChanged
            }
            None => {
                debug!("goto target {function_name} is not a known symbol");
                GotoOutcome::Ignored
            }
        }
    }

    fn attach_costs(&self, output: &mut DisassemblyOutput) {
        for line in &mut output.lines {
            if let Some(costs) = self.results.costs_for_address(&self.cur_symbol, line.address) {
                line.costs = costs.to_vec();
            }
        }
    }
}
