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

use std::collections::HashMap;

use serde::Serialize;

/// One profiled symbol. `name` is the demangled display name the rest of the
/// pane keys on; `mangled` keeps the raw symbol-table spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Symbol {
    pub name: String,
    pub mangled: String,
    /// Address of the symbol relative to the mapped binary.
    pub rel_addr: u64,
    pub size: u64,
    /// Path of the binary the symbol lives in.
    pub binary: String,
}

impl Symbol {
    pub fn new(raw_name: &str, rel_addr: u64, size: u64, binary: &str) -> Self {
        Self {
            name: demangle(raw_name),
            mangled: raw_name.to_string(),
            rel_addr,
            size,
            binary: binary.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Demangle a raw symbol-table name for display. Rust mangling first (it
/// covers both the legacy _ZN and the v0 _R schemes), then Itanium C++;
/// anything else passes through unchanged.
pub fn demangle(raw: &str) -> String {
    if let Ok(demangled) = rustc_demangle::try_demangle(raw) {
        return format!("{:#}", demangled);
    }
    if let Ok(sym) = cpp_demangle::Symbol::new(raw) {
        return sym.demangle().unwrap_or_else(|_| raw.to_string());
    }
    raw.to_string()
}

/// The cost events a profile recorded, plus the per-event grand totals used
/// to turn raw sample counts into fractions.
#[derive(Debug, Clone, Default)]
pub struct Costs {
    event_names: Vec<String>,
    totals: Vec<u64>,
}

impl Costs {
    pub fn new(event_names: Vec<String>) -> Self {
        let totals = vec![0; event_names.len()];
        Self {
            event_names,
            totals,
        }
    }

    pub fn num_types(&self) -> usize {
        self.event_names.len()
    }

    pub fn event_name(&self, event: usize) -> Option<&str> {
        self.event_names.get(event).map(String::as_str)
    }

    pub fn total(&self, event: usize) -> u64 {
        self.totals.get(event).copied().unwrap_or(0)
    }

    fn add_to_totals(&mut self, costs: &[u64]) {
        for (event, cost) in costs.iter().enumerate() {
            if let Some(total) = self.totals.get_mut(event) {
                *total += cost;
            }
        }
    }
}

/// Costs attributed to one symbol: aggregate self/inclusive vectors plus the
/// per-address breakdown the disassembly rows are annotated from.
#[derive(Debug, Clone, Default)]
pub struct CostEntry {
    pub symbol: Symbol,
    pub self_costs: Vec<u64>,
    pub inclusive_costs: Vec<u64>,
    /// Sample costs keyed by absolute instruction address within the symbol.
    pub offset_costs: HashMap<u64, Vec<u64>>,
}

/// The symbol/cost lookup service the pane consults: enumerate known symbols
/// by display name, resolve a symbol's cost entry, answer per-address cost
/// queries. Populated from profile data by the surrounding application.
#[derive(Debug, Clone, Default)]
pub struct CostRegistry {
    costs: Costs,
    entries: HashMap<String, CostEntry>,
}

impl CostRegistry {
    pub fn new(event_names: Vec<String>) -> Self {
        Self {
            costs: Costs::new(event_names),
            entries: HashMap::new(),
        }
    }

    pub fn costs(&self) -> &Costs {
        &self.costs
    }

    pub fn num_event_types(&self) -> usize {
        self.costs.num_types()
    }

    /// Register a symbol's cost entry, folding its self costs into the
    /// per-event totals. An entry with the same display name replaces the
    /// previous one without un-counting it; callers feed each symbol once.
    pub fn add_entry(&mut self, entry: CostEntry) {
        self.costs.add_to_totals(&entry.self_costs);
        self.entries.insert(entry.symbol.name.clone(), entry);
    }

    pub fn entry(&self, symbol: &Symbol) -> Option<&CostEntry> {
        self.entries.get(&symbol.name)
    }

    pub fn find_symbol(&self, name: &str) -> Option<&Symbol> {
        self.entries.get(name).map(|entry| &entry.symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.values().map(|entry| &entry.symbol)
    }

    pub fn costs_for_address(&self, symbol: &Symbol, address: u64) -> Option<&[u64]> {
        self.entry(symbol)
            .and_then(|entry| entry.offset_costs.get(&address))
            .map(Vec::as_slice)
    }
}
