/*!
 * Execution Contexts
 * Stacks and continuations: capture the current point, jump to another,
 * come back later
 */

mod continuation;
mod stack;
pub mod traits;

pub use continuation::Continuation;
pub use stack::Stack;
pub use traits::ExecutionContext;
