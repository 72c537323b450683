//! Crate-wide constants.

/// Length of the truncated hex digest used for [`crate::util::hash::ObjectHash`].
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Configuration key that assigns an identifier to a component node.
pub const ID_KEY: &str = "id";

/// Configuration key that selects the implementation within a domain.
pub const PLATFORM_KEY: &str = "platform";

/// First counter value used for generated identifiers (`remote_receiver_1`).
pub const AUTO_ID_START: usize = 1;

/// Banner written at the top of generated C++ sources.
pub const GENERATED_BANNER: &str = "// Auto generated by devgen. Do not edit.";
