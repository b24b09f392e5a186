//! Read contexts: the local sequence around a candidate allele used to
//! decide whether two reads support the same variant.

mod builder;
mod read_context;

pub use builder::{ContextSeed, CoreSpan, ReadContextBuilder};
pub use read_context::{MatchType, ReadContext, RepeatContext};
