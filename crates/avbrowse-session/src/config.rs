/// Default cap on commands waiting behind the pending one.
pub const DEFAULT_MAX_QUEUED_COMMANDS: usize = 10;

/// What to do with a response whose strings are not UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CharsetPolicy {
    /// Deliver the response; callers check `character_set_mismatch()`.
    #[default]
    Flag,
    /// Fail the response with `PduError::CharacterSetMismatch`.
    Reject,
}

/// Configuration for a [`BrowseSession`](crate::BrowseSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Commands held while one is outstanding. Default: 10.
    pub max_queued_commands: usize,
    /// Handling of non UTF-8 responses. Default: [`CharsetPolicy::Flag`].
    pub charset_policy: CharsetPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_queued_commands: DEFAULT_MAX_QUEUED_COMMANDS,
            charset_policy: CharsetPolicy::default(),
        }
    }
}
