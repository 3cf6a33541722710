//! Encoding & Record Tests
//!
//! Byte-level primitives and the KeyValue record built on top of them.
