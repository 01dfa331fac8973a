//! Fixed collection schema shared by every structured storage backend.

/// Database name used by the browser object store.
pub const DATABASE_NAME: &str = "host-db";
/// Schema version of [`DEFAULT_SCHEMA`].
pub const DATABASE_VERSION: u32 = 1;

/// Secondary, non-unique index declared on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSchema {
    /// Index name.
    pub name: &'static str,
    /// Record field the index is built over.
    pub key_path: &'static str,
}

/// One named collection and its identifying key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionSchema {
    /// Collection name as it appears in statements.
    pub name: &'static str,
    /// Record field holding the identifying key.
    pub key_path: &'static str,
    /// Secondary indexes.
    pub indexes: &'static [IndexSchema],
}

/// Full set of collections created once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSchema {
    /// Collections in creation order.
    pub collections: &'static [CollectionSchema],
}

impl StoreSchema {
    /// Looks up a collection by name.
    pub fn collection(&self, name: &str) -> Option<&'static CollectionSchema> {
        self.collections
            .iter()
            .find(|collection| collection.name == name)
    }
}

/// Applications, conversations, messages, and settings.
pub const DEFAULT_SCHEMA: StoreSchema = StoreSchema {
    collections: &[
        CollectionSchema {
            name: "apps",
            key_path: "id",
            indexes: &[IndexSchema {
                name: "name",
                key_path: "name",
            }],
        },
        CollectionSchema {
            name: "chats",
            key_path: "id",
            indexes: &[IndexSchema {
                name: "appId",
                key_path: "appId",
            }],
        },
        CollectionSchema {
            name: "messages",
            key_path: "id",
            indexes: &[IndexSchema {
                name: "chatId",
                key_path: "chatId",
            }],
        },
        CollectionSchema {
            name: "settings",
            key_path: "key",
            indexes: &[],
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schema_declares_four_keyed_collections() {
        let names: Vec<_> = DEFAULT_SCHEMA.collections.iter().map(|c| c.name).collect();
        assert_eq!(names, ["apps", "chats", "messages", "settings"]);
        assert_eq!(
            DEFAULT_SCHEMA.collection("settings").map(|c| c.key_path),
            Some("key")
        );
        assert_eq!(
            DEFAULT_SCHEMA
                .collection("messages")
                .map(|c| c.indexes[0].key_path),
            Some("chatId")
        );
        assert!(DEFAULT_SCHEMA.collection("users").is_none());
    }
}
