//! Table names and schema DDL.
//!
//! The schema is the five-table set of the data model: TOC, words, fulltext
//! positions, metadata and snippet sources. Table names are prefixable with
//! a caller-supplied string; defaults are the bare names.

/// Resolved table names for one storage instance.
#[derive(Debug, Clone)]
pub struct TableNames {
    /// Per-document registry.
    pub toc: String,

    /// Append-only word dictionary.
    pub word: String,

    /// Packed position rows, one per `(word, document)` pair.
    pub fulltext: String,

    /// Word count + image collection per document.
    pub metadata: String,

    /// Snippet sources per document.
    pub snippet: String,
}

impl TableNames {
    /// Build the table set with the given name prefix.
    pub fn with_prefix(prefix: &str) -> Self {
        TableNames {
            toc: format!("{prefix}toc"),
            word: format!("{prefix}word"),
            fulltext: format!("{prefix}fulltext_index"),
            metadata: format!("{prefix}metadata"),
            snippet: format!("{prefix}snippet"),
        }
    }

    /// The SQLite DDL creating the schema.
    pub fn sqlite_create_ddl(&self) -> String {
        format!(
            "
            CREATE TABLE IF NOT EXISTS {toc} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                external_id TEXT NOT NULL,
                instance_id INTEGER NOT NULL DEFAULT 0,
                title TEXT NOT NULL DEFAULT '',
                url TEXT NOT NULL DEFAULT '',
                hash TEXT NOT NULL DEFAULT '',
                relevance_ratio REAL NOT NULL DEFAULT 1.0,
                indexed_date TEXT,
                metadata TEXT,
                UNIQUE (external_id, instance_id)
            );

            CREATE TABLE IF NOT EXISTS {word} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS {fulltext} (
                word_id INTEGER NOT NULL,
                toc_id INTEGER NOT NULL,
                positions TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS {fulltext}_word_toc_idx
                ON {fulltext} (word_id, toc_id);
            CREATE INDEX IF NOT EXISTS {fulltext}_toc_idx
                ON {fulltext} (toc_id);

            CREATE TABLE IF NOT EXISTS {metadata} (
                toc_id INTEGER PRIMARY KEY,
                word_count INTEGER NOT NULL,
                images TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS {snippet} (
                toc_id INTEGER NOT NULL,
                min_word_pos INTEGER NOT NULL,
                max_word_pos INTEGER NOT NULL,
                snippet TEXT NOT NULL,
                format_id INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS {snippet}_toc_idx
                ON {snippet} (toc_id, max_word_pos);
            ",
            toc = self.toc,
            word = self.word,
            fulltext = self.fulltext,
            metadata = self.metadata,
            snippet = self.snippet,
        )
    }

    /// The SQLite DDL dropping the schema.
    pub fn sqlite_drop_ddl(&self) -> String {
        format!(
            "
            DROP TABLE IF EXISTS {fulltext};
            DROP TABLE IF EXISTS {metadata};
            DROP TABLE IF EXISTS {snippet};
            DROP TABLE IF EXISTS {word};
            DROP TABLE IF EXISTS {toc};
            ",
            toc = self.toc,
            word = self.word,
            fulltext = self.fulltext,
            metadata = self.metadata,
            snippet = self.snippet,
        )
    }
}
