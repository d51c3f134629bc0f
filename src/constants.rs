//! Global constants used throughout the sledge codebase
//!
//! Reserved path tokens, id-generation defaults and limits shared by the
//! identity, storage and channel modules.

/// Base62 character set used for random document ids
///
/// 62 possible characters (0-9, a-z, A-Z) keep ids URL-safe without escaping.
pub const BASE62_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Path token requesting a random id
pub const AUTO_TOKEN: &str = "_auto";

/// Path token requesting a time-ordered id
pub const AUTO_TIME_TOKEN: &str = "_auto_time";

/// Path token selecting every document of a database
pub const ALL_TOKEN: &str = "_all";

/// Name of the implicit id field added to read responses
pub const ID_FIELD: &str = "id";

/// Database holding named channels for `?channel=` reads
pub const CHANNEL_KEYSPACE: &str = "_channel";

/// Name of the request body field holding a channel definition
pub const CHANNEL_FIELD: &str = "channel";

/// Default length of a random id in base62 characters
///
/// 16 characters give ~95 bits of entropy, so a collision inside one
/// database is not expected before ~10^14 ids.
pub const DEFAULT_RANDOM_ID_LENGTH: usize = 16;

/// Minimum accepted random id length
pub const MIN_RANDOM_ID_LENGTH: usize = 8;

/// Default number of attempts before random id generation gives up
pub const DEFAULT_MAX_RANDOM_RETRIES: u32 = 8;

/// Default prefix for `_auto_time` ids
pub const DEFAULT_TIME_ID_PREFIX: &str = "doc";

/// Separator between a time-ordered prefix and its sequence number
pub const TIME_ID_SEPARATOR: char = '_';

/// Batch size from which bulk transforms fan out across threads
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;
