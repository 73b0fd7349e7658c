pub mod engine;
pub mod error;
pub mod report;
pub mod table;

pub use engine::BlockWorld;
pub use error::{ArmError, DiagnosticError};
pub use report::Report;
pub use table::Table;

use blockworld::Script;

/// Load a parsed script into a fresh engine, run it, and report the table.
///
/// Returns the report together with warnings for commands that named blocks
/// not on the table. Fails only if the table invariants break.
pub fn run_script(script: &Script) -> Result<(Report, Vec<DiagnosticError>), DiagnosticError> {
    let mut world = BlockWorld::new();
    let warnings = world.load(script);
    world.execute();
    world.table().check_invariant()?;
    Ok((world.report(), warnings))
}
