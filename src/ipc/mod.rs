/*!
 * IPC Module
 * Mailbox-based message passing between green processes
 */

pub mod mailbox;
pub mod types;

// Re-export for convenience
pub use mailbox::Mailbox;
pub use types::Message;
