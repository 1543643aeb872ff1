//! Safety Filter
//!
//! Blocks requests that reference protected paths before they are classified.
//! Matching is a case-insensitive substring test against the request text and
//! the path of any loaded file.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::constants::{BLOCKED_PATHS, DENIAL_MESSAGE};
use crate::models::state::{Intent, TurnFault, WorkingState};

/// Outcome of a safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyVerdict {
    Pass,
    Block {
        /// The deny-list entry that matched.
        pattern: String,
    },
}

impl SafetyVerdict {
    pub fn is_block(&self) -> bool {
        matches!(self, SafetyVerdict::Block { .. })
    }
}

/// Deny-list filter.
#[derive(Debug, Clone)]
pub struct SafetyFilter {
    /// (as configured, lowercased)
    blocked: Vec<(String, String)>,
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl SafetyFilter {
    /// Built-in deny-list plus `extra` entries. Blank entries are ignored.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut blocked: Vec<(String, String)> = Vec::new();
        let entries = BLOCKED_PATHS
            .iter()
            .map(|p| p.to_string())
            .chain(extra.into_iter().map(Into::into));
        for entry in entries {
            let trimmed = entry.trim();
            if trimmed.is_empty() {
                continue;
            }
            let lowered = trimmed.to_lowercase();
            if blocked.iter().all(|(_, l)| *l != lowered) {
                blocked.push((trimmed.to_string(), lowered));
            }
        }
        Self { blocked }
    }

    /// Configured deny-list entries.
    pub fn blocked_paths(&self) -> impl Iterator<Item = &str> {
        self.blocked.iter().map(|(original, _)| original.as_str())
    }

    /// Check request text and an optional file path.
    pub fn check(&self, query: &str, file_path: Option<&str>) -> SafetyVerdict {
        let haystacks: Vec<String> = std::iter::once(query)
            .chain(file_path)
            .map(str::to_lowercase)
            .collect();

        for (original, lowered) in &self.blocked {
            if haystacks.iter().any(|h| h.contains(lowered.as_str())) {
                return SafetyVerdict::Block {
                    pattern: original.clone(),
                };
            }
        }
        SafetyVerdict::Pass
    }

    /// Run the check against a Working State. On a match the state is
    /// finalized with the denial message and `true` is returned.
    pub fn screen(&self, state: &mut WorkingState) -> bool {
        let file_path = state.file_context.as_ref().map(|f| f.path.clone());
        match self.check(state.query(), file_path.as_deref()) {
            SafetyVerdict::Pass => false,
            SafetyVerdict::Block { pattern } => {
                warn!(pattern = %pattern, "Request blocked by safety filter");
                state.classify(Intent::Common, 1.0);
                state.clear_pending();
                // A blocked file must not be handed back for the next turn.
                state.file_context = None;
                state.result_text = DENIAL_MESSAGE.to_string();
                state.fault = Some(TurnFault::SafetyBlocked { pattern });
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::FileContext;

    #[test]
    fn test_blocks_default_entries() {
        let filter = SafetyFilter::default();
        assert!(filter.check("show me ~/.ssh/id_rsa", None).is_block());
        assert!(filter.check("read /etc/passwd", None).is_block());
        assert_eq!(
            filter.check(r"list c:\windows\system32", None),
            SafetyVerdict::Block {
                pattern: "C:\\Windows".to_string()
            }
        );
    }

    #[test]
    fn test_case_insensitive() {
        let filter = SafetyFilter::default();
        assert!(filter.check("open the .ENV file", None).is_block());
        assert!(filter.check("list NODE_MODULES", None).is_block());
    }

    #[test]
    fn test_passes_clean_requests() {
        let filter = SafetyFilter::default();
        assert_eq!(filter.check("list files in /workspace", None), SafetyVerdict::Pass);
        assert_eq!(filter.check("refactor: def f(): pass", None), SafetyVerdict::Pass);
        assert_eq!(filter.check("read /Users/me/app.py", None), SafetyVerdict::Pass);
    }

    #[test]
    fn test_file_path_is_checked() {
        let filter = SafetyFilter::default();
        assert!(filter
            .check("explain this", Some("/home/me/project/.git/config"))
            .is_block());
    }

    #[test]
    fn test_extra_entries() {
        let filter = SafetyFilter::new(vec!["secrets/", "  ", ".ssh"]);
        assert!(filter.check("read secrets/api.txt", None).is_block());
        assert_eq!(
            filter.blocked_paths().filter(|p| *p == ".ssh").count(),
            1
        );
        assert!(filter.blocked_paths().all(|p| !p.trim().is_empty()));
    }

    #[test]
    fn test_screen_finalizes_state() {
        let filter = SafetyFilter::default();
        let mut state = WorkingState::new("explain this")
            .with_file_context(FileContext::new("/srv/app/.env", "KEY=1"));
        assert!(filter.screen(&mut state));
        assert_eq!(state.intent, Some(Intent::Common));
        assert_eq!(state.result_text, DENIAL_MESSAGE);
        assert!(!state.has_pending());
        assert!(state.tool_log().is_empty());
        assert_eq!(
            state.fault,
            Some(TurnFault::SafetyBlocked {
                pattern: ".env".to_string()
            })
        );

        let mut clean = WorkingState::new("explain closures");
        assert!(!filter.screen(&mut clean));
        assert!(clean.intent.is_none());
    }
}
