// Crate root: declare modules and control visibility
pub mod disassemble;
pub mod disassembly_model;
pub mod excerpt;
pub mod highlight;
pub mod model;
pub mod pane;
pub mod results;
pub mod serializer;
pub mod source_model;
pub mod utils;

// Re-export commonly used API from the library for binaries/tests
pub use disassemble::{objdump_for_arch, DisassemblyLine, DisassemblyOutput};
pub use disassembly_model::{DisassemblyModel, DISASSEMBLY_COLUMN};
pub use excerpt::SourceExcerpt;
pub use highlight::{line_color, HighlightState, LineColor};
pub use model::{CellValue, ModelUpdate, TableModel};
pub use pane::{DisassemblyPane, GotoOutcome};
pub use results::{CostEntry, CostRegistry, Costs, Symbol};
pub use serializer::serialize_listing;
pub use source_model::SourceCodeModel;
