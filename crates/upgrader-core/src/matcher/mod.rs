//! Matchers: pure extractors that decide whether a node is a match and which
//! bytes an edit may touch.
//!
//! Every matcher returns byte ranges of the original text. None of them
//! queue edits; that is left to the rules.

mod class_name;
mod literal;
mod method_call;
mod signature;

pub use class_name::{ClassNameMatcher, ClassOccurrence};
pub use literal::{Quote, StringLiteral};
pub use method_call::{MethodCallMatcher, MethodMatch};
pub use signature::{ApiChangeSpec, SignatureTarget};
