/// Version of the identity and inbox string grammar. Any change to the
/// delimiters or ordering rules below is a wire-format break and bumps this.
pub const NAME_GRAMMAR_VERSION: u8 = 1;

/// Prefix every node name starts with.
pub const NODE_PREFIX: &str = "@@";
/// Separator between node, profile and sub-identity segments.
pub const IDENTITY_DELIMITER: char = '/';
/// Separator between the parts of an inbox identifier.
pub const INBOX_DELIMITER: &str = "::";
/// Leading tag of a regular (participant based) inbox.
pub const REGULAR_INBOX_PREFIX: &str = "inbox";
/// Leading tag of a job inbox.
pub const JOB_INBOX_PREFIX: &str = "job_inbox";
/// Prefix of generated job identifiers.
pub const JOB_ID_PREFIX: &str = "jobid_";

/// Maximum length of a single name segment (label, profile, sub-identity name).
pub const MAX_NAME_SEGMENT_LENGTH: usize = 64;
/// Maximum length of a node name, including the `@@` prefix.
pub const MAX_NODE_NAME_LENGTH: usize = 128;
/// Maximum length of a job inbox unique id.
pub const MAX_JOB_ID_LENGTH: usize = 256;
