//! Alternate-account name aliasing.

use serde::{Deserialize, Serialize};

use super::TournamentRecord;

/// How an alias is matched against a username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasMode {
    /// Replace only usernames equal to the alias.
    #[default]
    Exact,

    /// Replace the alias wherever it occurs inside a username.
    /// Reproduces historical tables; may rewrite unrelated names.
    Substring,
}

/// Maps an alternate account name to its canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub from: String,
    pub to: String,
}

impl AliasEntry {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Ordered alias table applied before aggregation.
///
/// Entries apply in declaration order, each one to the output of the previous.
#[derive(Debug, Clone, Default)]
pub struct NameAliasMap {
    entries: Vec<AliasEntry>,
    mode: AliasMode,
}

impl NameAliasMap {
    pub fn new(entries: Vec<AliasEntry>, mode: AliasMode) -> Self {
        Self { entries, mode }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical form of a username.
    pub fn resolve(&self, username: &str) -> String {
        let mut name = username.to_string();
        for entry in &self.entries {
            match self.mode {
                AliasMode::Exact => {
                    if name == entry.from {
                        name = entry.to.clone();
                    }
                }
                AliasMode::Substring => {
                    if !entry.from.is_empty() && name.contains(&entry.from) {
                        name = name.replace(&entry.from, &entry.to);
                    }
                }
            }
        }
        name
    }

    /// Rewrite every result's username in place. Returns how many were changed.
    pub fn apply(&self, records: &mut [TournamentRecord]) -> usize {
        if self.is_empty() {
            return 0;
        }

        let mut changed = 0;
        for record in records.iter_mut() {
            for result in record.results.iter_mut() {
                let resolved = self.resolve(&result.username);
                if resolved != result.username {
                    result.username = resolved;
                    changed += 1;
                }
            }
        }
        changed
    }
}
