//! Persistence Adapters - Storage Backends and Codecs
//!
//! Implements the storage and codec ports:
//! - `FileBackend`: one file per key with atomic tmp+rename writes
//! - `MemoryBackend`: in-process map with operation counters
//! - `JsonCodec`: JSON envelopes, compact or pretty

pub mod file;
pub mod json_codec;
pub mod memory;

pub use file::FileBackend;
pub use json_codec::JsonCodec;
pub use memory::MemoryBackend;
