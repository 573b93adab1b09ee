//! Configuration of the manager and edge binaries.
//!
//! Each binary parses its [Env] with envy over the serde defaults,
//! then applies CLI argument overrides. All knobs are exposed as a
//! config object, never read ad hoc.

pub mod edge;
pub mod manager;

pub fn default_max_message_size_bytes() -> usize {
  4 * 1024 * 1024
}
