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

use std::cell::Cell;
use std::rc::Rc;

/// The currently highlighted source line, shared by both table models of one
/// pane. 0 means no line is highlighted.
///
/// The pane owns the single instance and hands an Rc to each model; the
/// models re-derive their "is this row current" predicate from it on every
/// read. Cell gives us interior mutability so a hover can update the line
/// through the shared handle without threading &mut through both models.
#[derive(Debug, Default)]
pub struct HighlightState {
    line: Cell<u32>,
}

impl HighlightState {
    pub fn new() -> Rc<Self> {
        Rc::new(Self { line: Cell::new(0) })
    }

    pub fn set(&self, line: u32) {
        self.line.set(line);
    }

    pub fn get(&self) -> u32 {
        self.line.get()
    }

    pub fn clear(&self) {
        self.line.set(0);
    }
}

/// HSV color with alpha, as handed to the view's delegate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColor {
    pub hue: u16,
    pub saturation: u8,
    pub value: u8,
    pub alpha: u8,
}

/// Background color for a correlated source line.
///
/// The hue walks the color wheel in 139-degree steps so neighboring lines get
/// clearly distinct colors; the highlighted line only differs in alpha. The
/// result is a pure function of (line, is_current), which is the whole
/// contract the rendering layer depends on.
pub fn line_color(line: u32, is_current: bool) -> LineColor {
    let degrees = ((line as u64 * 139) % 360) as u16;
    LineColor {
        hue: degrees,
        saturation: 255,
        value: 255,
        alpha: if is_current { 120 } else { 40 },
    }
}
