//! Statement inspection used by strategies that cannot execute SQL.
//!
//! These are pattern heuristics, not a parser. A statement mentioning several mutation words
//! (for example in a literal or comment) is classified by the first word in the fixed
//! insert/update/delete order, regardless of statement structure.

use once_cell::sync::Lazy;
use regex::Regex;

static COLLECTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:from|into|update)\s+([A-Za-z0-9_]+)").expect("valid collection regex")
});

/// Extracts the target collection name from a textual statement.
///
/// Returns the first identifier following `from`, `into`, or `update` (case-insensitive).
pub fn collection_name(statement: &str) -> Option<&str> {
    COLLECTION_RE
        .captures(statement)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str())
}

/// Mutation inferred from a statement's wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Add a new record; fails when the key already exists.
    Insert,
    /// Upsert a record by key.
    Update,
    /// Remove a record by key.
    Delete,
}

impl MutationKind {
    /// Classifies a statement by substring match: `insert`, then `update`, then `delete`.
    pub fn classify(statement: &str) -> Option<Self> {
        let lowered = statement.to_lowercase();
        if lowered.contains("insert") {
            Some(Self::Insert)
        } else if lowered.contains("update") {
            Some(Self::Update)
        } else if lowered.contains("delete") {
            Some(Self::Delete)
        } else {
            None
        }
    }

    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_name_follows_from_into_update() {
        let cases = [
            ("SELECT * FROM apps WHERE id = ?", Some("apps")),
            ("insert into chats (id) values (?)", Some("chats")),
            ("UPDATE messages SET body = ?", Some("messages")),
            ("select *\n  from\tsettings", Some("settings")),
            ("DELETE FROM apps WHERE id = ?", Some("apps")),
            ("PRAGMA user_version", None),
            ("", None),
        ];
        for (statement, expected) in cases {
            assert_eq!(collection_name(statement), expected, "statement={statement:?}");
        }
    }

    #[test]
    fn insert_word_anywhere_wins_over_real_statement_kind() {
        assert_eq!(
            MutationKind::classify("update x set y where note='insert'"),
            Some(MutationKind::Insert)
        );
        assert_eq!(
            MutationKind::classify("UPDATE apps SET name = ? -- never delete"),
            Some(MutationKind::Update)
        );
        assert_eq!(
            MutationKind::classify("DELETE FROM chats WHERE id = ?"),
            Some(MutationKind::Delete)
        );
        assert_eq!(MutationKind::classify("SELECT * FROM apps"), None);
    }
}
