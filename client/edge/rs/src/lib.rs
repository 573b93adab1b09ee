//! Types shared between the Navigator edge agent and the manager:
//! the framed wire protocol of the persistent edge stream.

pub mod transport;

/// Default cap on a single wire message (4 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE_BYTES: usize = 4 * 1024 * 1024;
