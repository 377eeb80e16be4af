//! Entity repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/get/scan/update/delete over the three record tables.
//! - Keep SQL details and row decoding inside the persistence boundary.
//!
//! # Invariants
//! - A record row and the reference rows it owns are written in one
//!   transaction; nothing spans more than one record.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::finding::Finding;
use crate::model::researcher::Researcher;
use crate::model::subject::Subject;
use crate::model::{Document, Entity, EntityId, EntityKind};
use crate::repo::reference_repo::{
    delete_owned_rows, load_reference_set, load_reference_sets, replace_reference_set,
    ID_CHUNK_SIZE,
};
use crate::repo::scan::build_scan_sql;
use crate::repo::{ensure_connection_ready, parse_uuid};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(EntityKind, EntityId),
    Duplicate(EntityKind, EntityId),
    /// Filter terms the store cannot express (operators, arrays, objects).
    InvalidQuery(String),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl RepoError {
    /// Whether the failure means the store itself cannot be reached.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Db(err) => err.is_unavailable(),
            _ => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::Duplicate(kind, id) => write!(f, "{kind} already exists: {id}"),
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Scan parameters already bounded by the search option normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanQuery {
    /// Equality terms combined with AND; empty matches everything.
    pub filter: Document,
    /// Field name, `-` prefixed for descending order.
    pub sort: String,
    pub limit: u32,
    pub skip: u64,
}

/// Storage mapping for one record table.
///
/// `COLUMNS` lists the scalar columns besides `uuid`, `created_date` and
/// `updated_date`. Column names equal the record's serialized field names.
pub trait SqlEntity: Entity {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Values for `COLUMNS`, in declaration order.
    fn column_values(&self) -> Vec<Value>;

    /// Decodes one row; reference sets are left empty.
    fn from_row(row: &Row<'_>) -> RepoResult<Self>;
}

/// Repository interface for one record type.
pub trait EntityRepository<E: Entity> {
    fn insert(&self, record: &E) -> RepoResult<EntityId>;
    fn get(&self, id: EntityId) -> RepoResult<Option<E>>;
    /// Fetches `ids` in the given order, skipping ids with no record.
    fn get_many(&self, ids: &[EntityId]) -> RepoResult<Vec<E>>;
    fn scan(&self, query: &ScanQuery) -> RepoResult<Vec<E>>;
    fn update(&self, id: EntityId, patch: E::Patch, now_ms: i64) -> RepoResult<E>;
    /// Removes the record and the reference rows it owns.
    fn delete(&self, id: EntityId) -> RepoResult<E>;
}

/// SQLite-backed repository for any [`SqlEntity`].
pub struct SqliteEntityRepository<'conn, E> {
    conn: &'conn Connection,
    _record: PhantomData<E>,
}

impl<'conn, E: SqlEntity> SqliteEntityRepository<'conn, E> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self {
            conn,
            _record: PhantomData,
        })
    }

    fn select_sql() -> String {
        format!(
            "SELECT uuid, {}, created_date, updated_date FROM {}",
            quoted_columns(E::COLUMNS),
            E::TABLE
        )
    }

    fn with_references(&self, mut record: E) -> RepoResult<E> {
        let owner = record.id();
        for kind in E::KIND.related() {
            let ids = load_reference_set(self.conn, E::KIND, owner, kind)?;
            if let Some(set) = record.references_mut(kind) {
                *set = ids;
            }
        }
        Ok(record)
    }

    /// Loads reference sets for many records with one query per related
    /// kind and chunk of ids.
    fn with_references_many(&self, mut records: Vec<E>) -> RepoResult<Vec<E>> {
        let owners: Vec<EntityId> = records.iter().map(Entity::id).collect();
        for kind in E::KIND.related() {
            let sets = load_reference_sets(self.conn, E::KIND, &owners, kind)?;
            for record in &mut records {
                let ids = sets.get(&record.id()).cloned().unwrap_or_default();
                if let Some(set) = record.references_mut(kind) {
                    *set = ids;
                }
            }
        }
        Ok(records)
    }

    fn write_references(tx: &Transaction<'_>, record: &E) -> RepoResult<()> {
        for kind in E::KIND.related() {
            let ids = record.references(kind).unwrap_or_default();
            replace_reference_set(tx, E::KIND, record.id(), kind, ids)?;
        }
        Ok(())
    }
}

impl<E: SqlEntity> EntityRepository<E> for SqliteEntityRepository<'_, E> {
    fn insert(&self, record: &E) -> RepoResult<EntityId> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let placeholders = (1..=E::COLUMNS.len() + 3)
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} (uuid, {}, created_date, updated_date) VALUES ({placeholders});",
            E::TABLE,
            quoted_columns(E::COLUMNS)
        );

        let mut values = vec![Value::Text(record.id().to_string())];
        values.extend(record.column_values());
        values.push(Value::Integer(record.created_date()));
        values.push(Value::Integer(record.updated_date()));

        if let Err(err) = tx.execute(&sql, params_from_iter(values)) {
            if is_primary_key_violation(&err) {
                return Err(RepoError::Duplicate(E::KIND, record.id()));
            }
            return Err(err.into());
        }
        Self::write_references(&tx, record)?;
        tx.commit()?;

        Ok(record.id())
    }

    fn get(&self, id: EntityId) -> RepoResult<Option<E>> {
        let sql = format!("{} WHERE uuid = ?1;", Self::select_sql());
        let record = self
            .conn
            .query_row(&sql, [id.to_string()], |row| Ok(E::from_row(row)))
            .optional()?
            .transpose()?;

        record.map(|record| self.with_references(record)).transpose()
    }

    fn get_many(&self, ids: &[EntityId]) -> RepoResult<Vec<E>> {
        let mut found: HashMap<EntityId, E> = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("{} WHERE uuid IN ({placeholders});", Self::select_sql());
            let mut stmt = self.conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(chunk.iter().map(|id| id.to_string())))?;
            while let Some(row) = rows.next()? {
                let record = E::from_row(row)?;
                found.insert(record.id(), record);
            }
        }

        let ordered = ids
            .iter()
            .filter_map(|id| found.get(id).cloned())
            .collect();
        self.with_references_many(ordered)
    }

    fn scan(&self, query: &ScanQuery) -> RepoResult<Vec<E>> {
        let (clauses, mut bind_values) = build_scan_sql(E::KIND, E::COLUMNS, query)?;
        let sql = format!("{}{clauses}", Self::select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(
            i64::try_from(query.skip).unwrap_or(i64::MAX),
        ));
        let mut rows = stmt.query(params_from_iter(bind_values))?;

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(E::from_row(row)?);
        }
        drop(rows);

        self.with_references_many(records)
    }

    fn update(&self, id: EntityId, patch: E::Patch, now_ms: i64) -> RepoResult<E> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(mut record) = self.get(id)? else {
            return Err(RepoError::NotFound(E::KIND, id));
        };
        record.apply_patch(patch, now_ms);

        let assignments = E::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("\"{column}\" = ?{}", index + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments}, updated_date = ?{} WHERE uuid = ?1;",
            E::TABLE,
            E::COLUMNS.len() + 2
        );

        let mut values = vec![Value::Text(id.to_string())];
        values.extend(record.column_values());
        values.push(Value::Integer(record.updated_date()));
        tx.execute(&sql, params_from_iter(values))?;
        Self::write_references(&tx, &record)?;
        tx.commit()?;

        Ok(record)
    }

    fn delete(&self, id: EntityId) -> RepoResult<E> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let Some(record) = self.get(id)? else {
            return Err(RepoError::NotFound(E::KIND, id));
        };

        tx.execute(
            &format!("DELETE FROM {} WHERE uuid = ?1;", E::TABLE),
            [id.to_string()],
        )?;
        delete_owned_rows(&tx, E::KIND, id)?;
        tx.commit()?;

        Ok(record)
    }
}

impl SqlEntity for Subject {
    const TABLE: &'static str = "subjects";
    const COLUMNS: &'static [&'static str] = &["name", "field_of_study"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.field_of_study.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid(&row.get::<_, String>("uuid")?, "subjects.uuid")?,
            name: row.get("name")?,
            field_of_study: row.get("field_of_study")?,
            researchers: Vec::new(),
            findings: Vec::new(),
            created_date: row.get("created_date")?,
            updated_date: row.get("updated_date")?,
        })
    }
}

impl SqlEntity for Researcher {
    const TABLE: &'static str = "researchers";
    const COLUMNS: &'static [&'static str] =
        &["first_name", "last_name", "institution", "orcid_id"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.first_name.clone()),
            Value::Text(self.last_name.clone()),
            optional_text(self.institution.as_deref()),
            optional_text(self.orcid_id.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid(&row.get::<_, String>("uuid")?, "researchers.uuid")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            institution: row.get("institution")?,
            orcid_id: row.get("orcid_id")?,
            subjects: Vec::new(),
            findings: Vec::new(),
            created_date: row.get("created_date")?,
            updated_date: row.get("updated_date")?,
        })
    }
}

impl SqlEntity for Finding {
    const TABLE: &'static str = "findings";
    const COLUMNS: &'static [&'static str] = &["title", "abstract", "publication_date"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.abstract_text.clone()),
            optional_text(self.publication_date.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: parse_uuid(&row.get::<_, String>("uuid")?, "findings.uuid")?,
            title: row.get("title")?,
            abstract_text: row.get("abstract")?,
            publication_date: row.get("publication_date")?,
            researchers: Vec::new(),
            subjects: Vec::new(),
            created_date: row.get("created_date")?,
            updated_date: row.get("updated_date")?,
        })
    }
}

fn quoted_columns(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|column| format!("\"{column}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}
