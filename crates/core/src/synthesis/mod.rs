//! Query synthesizer
//!
//! Produces query text at a requested complexity tier from static topic
//! models, keeping each session on a single topic. Independent of timing;
//! the pacer decides when, this module decides what.

mod service;
mod topics;

pub use service::QuerySynthesizer;
pub use topics::TopicModel;
