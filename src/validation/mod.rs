/*!
 * Validation of model responses.
 *
 * # Architecture
 *
 * - `response`: Strips wrapping and parses a completion into numbered lines
 * - `structure`: Checks numbered lines against the source batch
 */

pub mod response;
pub mod structure;

// Re-export main types
pub use response::{NumberedLines, parse_response};
pub use structure::{StructureReport, check_translation};
