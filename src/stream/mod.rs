//! Assembly of streamed assistant replies.

pub mod assembler;

pub use assembler::StreamAssembler;
