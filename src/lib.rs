pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod timecode;
pub mod types;
pub mod unifier;
pub mod validate;
