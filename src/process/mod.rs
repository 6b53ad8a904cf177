/*!
 * Process Module
 * Process records, lifecycle and the process table
 */

pub mod record;
pub mod table;
pub mod types;

// Re-export for convenience
pub use record::Process;
pub use table::ProcessTable;
pub use types::{ProcessInfo, ProcessState};
