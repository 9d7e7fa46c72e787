//! Compiled-in prompt text.

/// System instruction sent with every deliberation unless configured otherwise
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("prompts/deliberate.md");

/// Prefix placed in front of a successful deliberation
pub const DEFAULT_PREFIX: &str = "Hmmm, let me think for a second... ";

/// Name under which the deliberation tool is exposed
pub const TOOL_NAME: &str = "chain_of_thought";

/// Tool description shown to host processes
pub const TOOL_DESCRIPTION: &str = "Think through a problem step by step with a reasoning model \
and return the full deliberation. Use it before making non-trivial decisions.";
