//! SQLite storage backend.
//!
//! Persists the five-table schema through `rusqlite`. Missing-schema
//! conditions ("no such table" / "no such column") are classified as
//! [`SedgeError::EmptyIndex`]; every other driver error surfaces as
//! [`SedgeError::Unknown`]. Transactions nest through a counter so only the
//! outermost pair reaches SQLite.

use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, SedgeError};
use crate::extract::sentence_map::{SentenceFormat, SnippetSource};
use crate::extract::ImgCollection;
use crate::id::ExternalId;
use crate::position::{pack_positions, unpack_positions, PositionKey};
use crate::storage::schema::TableNames;
use crate::storage::{
    truncate_word_key, FulltextIndexContent, IndexStorage, PositionBag, SnippetQuery, SnippetRow,
    StorageConfig, TocEntry, TocRecord, WordHits,
};

/// Classify a driver error into the engine taxonomy.
fn classify(err: rusqlite::Error) -> SedgeError {
    let msg = err.to_string();
    if msg.contains("no such table") || msg.contains("no such column") {
        SedgeError::empty_index(msg)
    } else {
        SedgeError::Unknown(anyhow::Error::new(err))
    }
}

/// SQLite-backed [`IndexStorage`].
///
/// Opening does not create the schema; [`erase`](IndexStorage::erase) does
/// (the indexer's auto-erase path calls it on the first *EmptyIndex*).
#[derive(Debug)]
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    tables: TableNames,
    excluded: RwLock<AHashSet<String>>,
    excluded_threshold: u64,
    tx_depth: Mutex<u32>,
}

impl SqliteStorage {
    /// Open a storage instance per the configuration. A `path` of `None`
    /// opens an in-memory database.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => {
                let conn = Connection::open(path).map_err(classify)?;
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(classify)?;
                conn
            }
            None => Connection::open_in_memory().map_err(classify)?,
        };
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(classify)?;

        let tables = TableNames::with_prefix(&config.table_prefix);
        let storage = SqliteStorage {
            conn: Mutex::new(conn),
            tables,
            excluded: RwLock::new(AHashSet::new()),
            excluded_threshold: config.excluded_word_threshold,
            tx_depth: Mutex::new(0),
        };
        storage.refresh_excluded_words();
        Ok(storage)
    }

    /// Reload the excluded-word set; an absent schema yields an empty set.
    fn refresh_excluded_words(&self) {
        let loaded = {
            let conn = self.conn.lock();
            self.load_excluded(&conn)
        };
        match loaded {
            Ok(set) => *self.excluded.write() = set,
            Err(err) if err.is_empty_index() => self.excluded.write().clear(),
            Err(err) => {
                log::warn!("excluded-word refresh failed: {err}");
                self.excluded.write().clear();
            }
        }
    }

    fn load_excluded(&self, conn: &Connection) -> Result<AHashSet<String>> {
        let sql = format!(
            "SELECT w.name FROM {word} w JOIN {fulltext} f ON f.word_id = w.id \
             GROUP BY w.id, w.name HAVING COUNT(*) > ?1",
            word = self.tables.word,
            fulltext = self.tables.fulltext,
        );
        let mut stmt = conn.prepare(&sql).map_err(classify)?;
        let rows = stmt
            .query_map(params![self.excluded_threshold as i64], |row| {
                row.get::<_, String>(0)
            })
            .map_err(classify)?;
        let mut set = AHashSet::new();
        for row in rows {
            set.insert(row.map_err(classify)?);
        }
        Ok(set)
    }

    fn select_internal_id(
        &self,
        conn: &Connection,
        external_id: &ExternalId,
    ) -> Result<Option<i64>> {
        let sql = format!(
            "SELECT id FROM {toc} WHERE external_id = ?1 AND instance_id = ?2",
            toc = self.tables.toc,
        );
        conn.query_row(
            &sql,
            params![external_id.id, external_id.instance_or_zero()],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map_err(classify)
    }

    fn require_internal_id(&self, conn: &Connection, external_id: &ExternalId) -> Result<i64> {
        self.select_internal_id(conn, external_id)?
            .ok_or_else(|| SedgeError::unknown_id(external_id.to_string()))
    }

    fn word_id(&self, conn: &Connection, word: &str) -> Result<i64> {
        let insert = format!(
            "INSERT OR IGNORE INTO {word} (name) VALUES (?1)",
            word = self.tables.word,
        );
        conn.execute(&insert, params![word]).map_err(classify)?;
        let select = format!(
            "SELECT id FROM {word} WHERE name = ?1",
            word = self.tables.word,
        );
        conn.query_row(&select, params![word], |row| row.get::<_, i64>(0))
            .map_err(classify)
    }

    fn delete_index_rows(&self, conn: &Connection, toc_id: i64) -> Result<()> {
        for table in [
            &self.tables.fulltext,
            &self.tables.metadata,
            &self.tables.snippet,
        ] {
            let sql = format!("DELETE FROM {table} WHERE toc_id = ?1");
            conn.execute(&sql, params![toc_id]).map_err(classify)?;
        }
        Ok(())
    }

    fn row_to_toc_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<TocEntry> {
        let date: Option<String> = row.get("indexed_date")?;
        let metadata: Option<String> = row.get("metadata")?;
        Ok(TocEntry {
            title: row.get("title")?,
            url: row.get("url")?,
            hash: row.get("hash")?,
            relevance_ratio: row.get("relevance_ratio")?,
            date: date.and_then(|d| d.parse().ok()),
            metadata: metadata.and_then(|m| serde_json::from_str(&m).ok()),
        })
    }
}

impl IndexStorage for SqliteStorage {
    fn add_entry_to_toc(&self, entry: &TocEntry, external_id: &ExternalId) -> Result<()> {
        let conn = self.conn.lock();
        let sql = format!(
            "INSERT INTO {toc} \
                 (external_id, instance_id, title, url, hash, relevance_ratio, indexed_date, metadata) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT (external_id, instance_id) DO UPDATE SET \
                 title = excluded.title, url = excluded.url, hash = excluded.hash, \
                 relevance_ratio = excluded.relevance_ratio, \
                 indexed_date = excluded.indexed_date, metadata = excluded.metadata",
            toc = self.tables.toc,
        );
        conn.execute(
            &sql,
            params![
                external_id.id,
                external_id.instance_or_zero(),
                entry.title,
                entry.url,
                entry.hash,
                entry.relevance_ratio,
                entry.date.map(|d| d.to_string()),
                entry
                    .metadata
                    .as_ref()
                    .map(|m| serde_json::to_string(m))
                    .transpose()?,
            ],
        )
        .map_err(classify)?;
        Ok(())
    }

    fn get_toc_by_external_id(&self, external_id: &ExternalId) -> Result<Option<TocEntry>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT title, url, hash, relevance_ratio, indexed_date, metadata \
             FROM {toc} WHERE external_id = ?1 AND instance_id = ?2",
            toc = self.tables.toc,
        );
        conn.query_row(
            &sql,
            params![external_id.id, external_id.instance_or_zero()],
            Self::row_to_toc_entry,
        )
        .optional()
        .map_err(classify)
    }

    fn get_toc_by_external_ids(&self, external_ids: &[ExternalId]) -> Result<Vec<TocRecord>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT t.title, t.url, t.hash, t.relevance_ratio, t.indexed_date, t.metadata, \
                    m.word_count, m.images \
             FROM {toc} t LEFT JOIN {metadata} m ON m.toc_id = t.id \
             WHERE t.external_id = ?1 AND t.instance_id = ?2",
            toc = self.tables.toc,
            metadata = self.tables.metadata,
        );
        let mut stmt = conn.prepare(&sql).map_err(classify)?;
        let mut records = Vec::with_capacity(external_ids.len());
        for external_id in external_ids {
            let record = stmt
                .query_row(
                    params![external_id.id, external_id.instance_or_zero()],
                    |row| {
                        let entry = Self::row_to_toc_entry(row)?;
                        let word_count: Option<i64> = row.get("word_count")?;
                        let images: Option<String> = row.get("images")?;
                        Ok((entry, word_count, images))
                    },
                )
                .optional()
                .map_err(classify)?;
            if let Some((entry, word_count, images)) = record {
                records.push(TocRecord {
                    external_id: external_id.clone(),
                    entry,
                    word_count,
                    images: images
                        .and_then(|json| serde_json::from_str::<ImgCollection>(&json).ok())
                        .unwrap_or_default(),
                });
            }
        }
        Ok(records)
    }

    fn remove_from_index(&self, external_id: &ExternalId) -> Result<()> {
        let conn = self.conn.lock();
        if let Some(toc_id) = self.select_internal_id(&conn, external_id)? {
            self.delete_index_rows(&conn, toc_id)?;
        }
        Ok(())
    }

    fn remove_from_toc(&self, external_id: &ExternalId) -> Result<()> {
        let conn = self.conn.lock();
        let sql = format!(
            "DELETE FROM {toc} WHERE external_id = ?1 AND instance_id = ?2",
            toc = self.tables.toc,
        );
        conn.execute(&sql, params![external_id.id, external_id.instance_or_zero()])
            .map_err(classify)?;
        Ok(())
    }

    fn add_to_fulltext_index(
        &self,
        title_words: &[(PositionKey, String)],
        keywords: &[(PositionKey, String)],
        content_words: &[(PositionKey, String)],
        external_id: &ExternalId,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let toc_id = self.require_internal_id(&conn, external_id)?;

        // All positions of one stem, across the three fields, share one
        // packed row.
        let mut by_stem: AHashMap<&str, [Vec<PositionKey>; 3]> = AHashMap::new();
        for (field, words) in [(0, title_words), (1, keywords), (2, content_words)] {
            for (key, stem) in words {
                by_stem.entry(truncate_word_key(stem)).or_default()[field].push(*key);
            }
        }

        let mut stems: Vec<&str> = by_stem.keys().copied().collect();
        stems.sort_unstable();

        let insert = format!(
            "INSERT INTO {fulltext} (word_id, toc_id, positions) VALUES (?1, ?2, ?3)",
            fulltext = self.tables.fulltext,
        );
        for stem in stems {
            let [title, keyword, content] = &by_stem[stem];
            let word_id = self.word_id(&conn, stem)?;
            let packed = pack_positions(title, keyword, content);
            conn.execute(&insert, params![word_id, toc_id, packed])
                .map_err(classify)?;
        }
        Ok(())
    }

    fn add_metadata(
        &self,
        external_id: &ExternalId,
        word_count: i64,
        images: &ImgCollection,
    ) -> Result<()> {
        let conn = self.conn.lock();
        let toc_id = self.require_internal_id(&conn, external_id)?;
        let sql = format!(
            "INSERT INTO {metadata} (toc_id, word_count, images) VALUES (?1, ?2, ?3) \
             ON CONFLICT (toc_id) DO UPDATE SET \
                 word_count = excluded.word_count, images = excluded.images",
            metadata = self.tables.metadata,
        );
        conn.execute(
            &sql,
            params![toc_id, word_count, serde_json::to_string(images)?],
        )
        .map_err(classify)?;
        Ok(())
    }

    fn add_snippets(&self, external_id: &ExternalId, sources: &[SnippetSource]) -> Result<()> {
        let conn = self.conn.lock();
        let toc_id = self.require_internal_id(&conn, external_id)?;
        let sql = format!(
            "INSERT INTO {snippet} (toc_id, min_word_pos, max_word_pos, snippet, format_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            snippet = self.tables.snippet,
        );
        let mut stmt = conn.prepare(&sql).map_err(classify)?;
        for source in sources {
            stmt.execute(params![
                toc_id,
                source.min_word_pos,
                source.max_word_pos,
                source.text,
                source.format.format_id(),
            ])
            .map_err(classify)?;
        }
        Ok(())
    }

    fn fulltext_result_by_words(
        &self,
        words: &[String],
        instance_id: Option<u32>,
    ) -> Result<FulltextIndexContent> {
        let conn = self.conn.lock();
        let mut sql = format!(
            "SELECT t.external_id, t.instance_id, f.positions, \
                    COALESCE(m.word_count, 0), t.relevance_ratio \
             FROM {word} w \
             JOIN {fulltext} f ON f.word_id = w.id \
             JOIN {toc} t ON t.id = f.toc_id \
             LEFT JOIN {metadata} m ON m.toc_id = t.id \
             WHERE w.name = ?1",
            word = self.tables.word,
            fulltext = self.tables.fulltext,
            toc = self.tables.toc,
            metadata = self.tables.metadata,
        );
        if instance_id.is_some() {
            sql.push_str(" AND t.instance_id = ?2");
        }
        let mut stmt = conn.prepare(&sql).map_err(classify)?;

        let mut content = FulltextIndexContent::default();
        for word in words {
            let key = truncate_word_key(word);
            let mut run = |stmt: &mut rusqlite::Statement<'_>| -> rusqlite::Result<Vec<PositionBag>> {
                let mapper = |row: &rusqlite::Row<'_>| {
                    let id: String = row.get(0)?;
                    let instance: u32 = row.get(1)?;
                    let packed: String = row.get(2)?;
                    let word_count: i64 = row.get(3)?;
                    let relevance_ratio: f64 = row.get(4)?;
                    Ok((id, instance, packed, word_count, relevance_ratio))
                };
                let rows = match instance_id {
                    Some(instance) => stmt.query_map(params![key, instance], mapper)?,
                    None => stmt.query_map(params![key], mapper)?,
                };
                let mut bags = Vec::new();
                for row in rows {
                    let (id, instance, packed, word_count, relevance_ratio) = row?;
                    bags.push(PositionBag {
                        external_id: ExternalId::from_columns(id, instance),
                        positions: unpack_positions(&packed).unwrap_or_default(),
                        word_count,
                        relevance_ratio,
                    });
                }
                Ok(bags)
            };
            let bags = run(&mut stmt).map_err(classify)?;
            content.words.push(WordHits {
                word: key.to_string(),
                bags,
            });
        }
        Ok(content)
    }

    fn get_snippets(&self, query: &SnippetQuery) -> Result<Vec<SnippetRow>> {
        if query.requests.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn.lock();

        let mut by_toc_id: AHashMap<i64, ExternalId> = AHashMap::new();
        let mut parts = Vec::new();
        let columns = "toc_id, min_word_pos, max_word_pos, snippet, format_id";
        for request in &query.requests {
            let Some(toc_id) = self.select_internal_id(&conn, &request.external_id)? else {
                continue;
            };
            by_toc_id.insert(toc_id, request.external_id.clone());

            if !request.positions.is_empty() {
                let matched: Vec<String> = request
                    .positions
                    .iter()
                    .map(|p| format!("(min_word_pos <= {p} AND max_word_pos >= {p})"))
                    .collect();
                parts.push(format!(
                    "SELECT {columns} FROM {snippet} WHERE toc_id = {toc_id} AND ({clauses})",
                    snippet = self.tables.snippet,
                    clauses = matched.join(" OR "),
                ));
            }

            // Fallback rows anchor short intro text and guarantee a snippet
            // for title- or keyword-only matches.
            parts.push(format!(
                "SELECT * FROM (SELECT {columns} FROM {snippet} \
                     WHERE toc_id = {toc_id} ORDER BY max_word_pos LIMIT 2)",
                snippet = self.tables.snippet,
            ));
        }

        if parts.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "{} ORDER BY toc_id, max_word_pos",
            parts.join(" UNION ")
        );

        let mut stmt = conn.prepare(&sql).map_err(classify)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })
            .map_err(classify)?;

        let mut snippets = Vec::new();
        for row in rows {
            let (toc_id, min_word_pos, max_word_pos, text, format_id) = row.map_err(classify)?;
            let Some(external_id) = by_toc_id.get(&toc_id) else {
                continue;
            };
            snippets.push(SnippetRow {
                external_id: external_id.clone(),
                min_word_pos,
                max_word_pos,
                text,
                format: SentenceFormat::from_format_id(format_id),
            });
        }
        Ok(snippets)
    }

    fn get_toc_size(&self, instance_id: Option<u32>) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 = match instance_id {
            Some(instance) => {
                let sql = format!(
                    "SELECT COUNT(*) FROM {toc} WHERE instance_id = ?1",
                    toc = self.tables.toc,
                );
                conn.query_row(&sql, params![instance], |row| row.get(0))
                    .map_err(classify)?
            }
            None => {
                let sql = format!("SELECT COUNT(*) FROM {toc}", toc = self.tables.toc);
                conn.query_row(&sql, [], |row| row.get(0))
                    .map_err(classify)?
            }
        };
        Ok(count as u64)
    }

    fn is_excluded_word(&self, word: &str) -> bool {
        self.excluded.read().contains(truncate_word_key(word))
    }

    fn erase(&self) -> Result<()> {
        {
            let conn = self.conn.lock();
            conn.execute_batch(&self.tables.sqlite_drop_ddl())
                .map_err(classify)?;
            conn.execute_batch(&self.tables.sqlite_create_ddl())
                .map_err(classify)?;
        }
        self.refresh_excluded_words();
        Ok(())
    }

    fn drop_schema(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(&self.tables.sqlite_drop_ddl())
            .map_err(classify)
    }

    fn start_transaction(&self) -> Result<()> {
        let mut depth = self.tx_depth.lock();
        if *depth == 0 {
            let conn = self.conn.lock();
            conn.execute_batch("BEGIN IMMEDIATE").map_err(classify)?;
        }
        *depth += 1;
        Ok(())
    }

    fn commit_transaction(&self) -> Result<()> {
        let mut depth = self.tx_depth.lock();
        match *depth {
            0 => Err(SedgeError::logic("commit without open transaction")),
            1 => {
                let conn = self.conn.lock();
                conn.execute_batch("COMMIT").map_err(classify)?;
                *depth = 0;
                Ok(())
            }
            _ => {
                *depth -= 1;
                Ok(())
            }
        }
    }

    fn rollback_transaction(&self) -> Result<()> {
        let mut depth = self.tx_depth.lock();
        match *depth {
            0 => Err(SedgeError::logic("rollback without open transaction")),
            1 => {
                let conn = self.conn.lock();
                conn.execute_batch("ROLLBACK").map_err(classify)?;
                *depth = 0;
                Ok(())
            }
            _ => {
                *depth -= 1;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::PositionKey;
    use crate::storage::SnippetRequest;

    fn fresh_storage() -> SqliteStorage {
        let storage = SqliteStorage::open(StorageConfig::in_memory()).unwrap();
        storage.erase().unwrap();
        storage
    }

    fn whole(entries: &[(i32, &str)]) -> Vec<(PositionKey, String)> {
        entries
            .iter()
            .map(|(p, w)| (PositionKey::Whole(*p), w.to_string()))
            .collect()
    }

    #[test]
    fn test_missing_schema_is_empty_index() {
        let storage = SqliteStorage::open(StorageConfig::in_memory()).unwrap();
        let err = storage
            .get_toc_by_external_id(&ExternalId::new("x"))
            .unwrap_err();
        assert!(err.is_empty_index());
    }

    #[test]
    fn test_toc_upsert_and_lookup() {
        let storage = fresh_storage();
        let id = ExternalId::new("doc1");

        storage
            .add_entry_to_toc(&TocEntry::new("First", "http://a", "h1"), &id)
            .unwrap();
        let entry = storage.get_toc_by_external_id(&id).unwrap().unwrap();
        assert_eq!(entry.title, "First");
        assert_eq!(entry.hash, "h1");

        // Upsert replaces in place; the unique (external_id, instance_id)
        // key keeps a single row.
        storage
            .add_entry_to_toc(&TocEntry::new("Second", "http://a", "h2"), &id)
            .unwrap();
        let entry = storage.get_toc_by_external_id(&id).unwrap().unwrap();
        assert_eq!(entry.title, "Second");
        assert_eq!(storage.get_toc_size(None).unwrap(), 1);
    }

    #[test]
    fn test_instances_are_distinct() {
        let storage = fresh_storage();
        let global = ExternalId::new("doc");
        let scoped = ExternalId::with_instance("doc", 2);

        storage
            .add_entry_to_toc(&TocEntry::new("Global", "", "h"), &global)
            .unwrap();
        storage
            .add_entry_to_toc(&TocEntry::new("Scoped", "", "h"), &scoped)
            .unwrap();

        assert_eq!(storage.get_toc_size(None).unwrap(), 2);
        assert_eq!(storage.get_toc_size(Some(2)).unwrap(), 1);
        assert_eq!(
            storage.get_toc_by_external_id(&scoped).unwrap().unwrap().title,
            "Scoped"
        );
    }

    #[test]
    fn test_fulltext_round_trip() {
        let storage = fresh_storage();
        let id = ExternalId::new("doc1");
        storage
            .add_entry_to_toc(&TocEntry::new("T", "", "h"), &id)
            .unwrap();
        storage.add_metadata(&id, 5, &Vec::new()).unwrap();

        storage
            .add_to_fulltext_index(
                &whole(&[(0, "hello")]),
                &whole(&[(0, "greeting")]),
                &whole(&[(0, "hello"), (2, "hello"), (1, "world")]),
                &id,
            )
            .unwrap();

        let content = storage
            .fulltext_result_by_words(&["hello".to_string(), "world".to_string()], None)
            .unwrap();
        assert_eq!(content.words.len(), 2);

        let hello = &content.words[0];
        assert_eq!(hello.bags.len(), 1);
        assert_eq!(hello.bags[0].positions.title, vec![0]);
        assert_eq!(hello.bags[0].positions.content, vec![0, 2]);
        assert_eq!(hello.bags[0].word_count, 5);

        let world = &content.words[1];
        assert_eq!(world.bags[0].positions.content, vec![1]);
        assert!(world.bags[0].positions.title.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let storage = fresh_storage();
        let id = ExternalId::new("ghost");
        storage.remove_from_index(&id).unwrap();
        storage.remove_from_toc(&id).unwrap();
    }

    #[test]
    fn test_transaction_nesting() {
        let storage = fresh_storage();
        storage.start_transaction().unwrap();
        storage.start_transaction().unwrap();
        // The inner pair is a no-op, so this commit leaves the outer
        // transaction open.
        storage.commit_transaction().unwrap();
        storage.commit_transaction().unwrap();
        assert!(storage.commit_transaction().is_err());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let storage = fresh_storage();
        let id = ExternalId::new("doc1");

        storage.start_transaction().unwrap();
        storage
            .add_entry_to_toc(&TocEntry::new("T", "", "h"), &id)
            .unwrap();
        storage.rollback_transaction().unwrap();

        assert!(storage.get_toc_by_external_id(&id).unwrap().is_none());
    }

    #[test]
    fn test_word_keys_truncate() {
        let storage = fresh_storage();
        let id = ExternalId::new("doc1");
        storage
            .add_entry_to_toc(&TocEntry::new("T", "", "h"), &id)
            .unwrap();

        let long_word = "a".repeat(300);
        storage
            .add_to_fulltext_index(&[], &[], &whole(&[(0, &long_word)]), &id)
            .unwrap();

        // Lookup by any form that truncates to the same key resolves.
        let content = storage
            .fulltext_result_by_words(&[format!("{}bcd", "a".repeat(255))], None)
            .unwrap();
        assert_eq!(content.words[0].bags.len(), 1);
    }

    #[test]
    fn test_snippet_query_matches_and_falls_back() {
        let storage = fresh_storage();
        let with_hits = ExternalId::new("hits");
        let title_only = ExternalId::new("title-only");
        for (id, title) in [(&with_hits, "A"), (&title_only, "B")] {
            storage
                .add_entry_to_toc(&TocEntry::new(title, "", "h"), id)
                .unwrap();
            storage
                .add_snippets(
                    id,
                    &[
                        SnippetSource {
                            min_word_pos: 0,
                            max_word_pos: 4,
                            text: "first paragraph".to_string(),
                            format: SentenceFormat::Plain,
                        },
                        SnippetSource {
                            min_word_pos: 5,
                            max_word_pos: 9,
                            text: "second paragraph".to_string(),
                            format: SentenceFormat::Plain,
                        },
                        SnippetSource {
                            min_word_pos: 10,
                            max_word_pos: 14,
                            text: "third paragraph".to_string(),
                            format: SentenceFormat::Plain,
                        },
                    ],
                )
                .unwrap();
        }

        let rows = storage
            .get_snippets(&SnippetQuery {
                requests: vec![
                    SnippetRequest {
                        external_id: with_hits.clone(),
                        positions: vec![12],
                    },
                    SnippetRequest {
                        external_id: title_only.clone(),
                        positions: vec![],
                    },
                ],
            })
            .unwrap();

        // Matched row for position 12 plus the two fallback rows.
        let hits_rows: Vec<&SnippetRow> = rows
            .iter()
            .filter(|r| r.external_id == with_hits)
            .collect();
        assert_eq!(hits_rows.len(), 3);
        assert!(hits_rows.iter().any(|r| r.text == "third paragraph"));

        // Only the fallback pair for the document without content hits.
        let title_rows: Vec<&SnippetRow> = rows
            .iter()
            .filter(|r| r.external_id == title_only)
            .collect();
        assert_eq!(title_rows.len(), 2);
        assert_eq!(title_rows[0].text, "first paragraph");
        assert_eq!(title_rows[1].text, "second paragraph");
    }

    #[test]
    fn test_excluded_words_refresh_on_erase() {
        let storage = SqliteStorage::open(StorageConfig {
            excluded_word_threshold: 1,
            ..StorageConfig::in_memory()
        })
        .unwrap();
        storage.erase().unwrap();

        for n in 0..3 {
            let id = ExternalId::new(format!("doc{n}"));
            storage
                .add_entry_to_toc(&TocEntry::new("T", "", "h"), &id)
                .unwrap();
            storage
                .add_to_fulltext_index(&[], &[], &whole(&[(0, "common")]), &id)
                .unwrap();
        }

        // The set is read-only during indexing; it only refreshes on erase.
        assert!(!storage.is_excluded_word("common"));

        storage.erase().unwrap();
        assert!(!storage.is_excluded_word("common"));
        assert_eq!(storage.get_toc_size(None).unwrap(), 0);
    }
}
