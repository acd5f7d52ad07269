//! Person store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the primitives used by CRUD and reconciliation: find-all,
//!   find-by-id, insert-one, replace-one, delete-one, delete-many-by-model-id.
//! - Map rows to `Person` and reject malformed persisted data.
//!
//! # Invariants
//! - `id` is the primary key; `model_id` is indexed but not unique.
//! - Count-returning writes never turn "zero matched" into an error.

use crate::db::DbError;
use crate::model::person::{Address, Person, PersonId, PersonValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    model_id,
    first_name,
    last_name,
    email,
    phone,
    address_json,
    last_modified
FROM persons";

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error for person and metadata storage.
#[derive(Debug)]
pub enum RepoError {
    Validation(PersonValidationError),
    Db(DbError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
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

/// Result of a filtered write: whether the store acknowledged it and how
/// many documents it touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub acknowledged: bool,
    pub count: u64,
}

impl WriteOutcome {
    pub fn acknowledged(count: usize) -> Self {
        Self {
            acknowledged: true,
            count: count as u64,
        }
    }

    /// True only for an acknowledged write that touched exactly one document.
    pub fn is_single(&self) -> bool {
        self.acknowledged && self.count == 1
    }
}

/// Document-style person storage.
pub trait PersonStore {
    fn find_all(&self) -> RepoResult<Vec<Person>>;
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn insert_one(&self, person: &Person) -> RepoResult<PersonId>;
    /// Replaces the document whose id equals `person.id`.
    fn replace_one(&self, person: &Person) -> RepoResult<WriteOutcome>;
    fn delete_one(&self, id: PersonId) -> RepoResult<WriteOutcome>;
    /// Deletes every document carrying `model_id`.
    fn delete_by_model_id(&self, model_id: &str) -> RepoResult<WriteOutcome>;
}

impl<T: PersonStore + ?Sized> PersonStore for &T {
    fn find_all(&self) -> RepoResult<Vec<Person>> {
        (**self).find_all()
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        (**self).find_by_id(id)
    }

    fn insert_one(&self, person: &Person) -> RepoResult<PersonId> {
        (**self).insert_one(person)
    }

    fn replace_one(&self, person: &Person) -> RepoResult<WriteOutcome> {
        (**self).replace_one(person)
    }

    fn delete_one(&self, id: PersonId) -> RepoResult<WriteOutcome> {
        (**self).delete_one(id)
    }

    fn delete_by_model_id(&self, model_id: &str) -> RepoResult<WriteOutcome> {
        (**self).delete_by_model_id(model_id)
    }
}

/// SQLite-backed person store.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonStore for SqlitePersonRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} ORDER BY model_id ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut persons = Vec::new();
        while let Some(row) = rows.next()? {
            persons.push(parse_person_row(row)?);
        }
        Ok(persons)
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn insert_one(&self, person: &Person) -> RepoResult<PersonId> {
        person.validate()?;
        let address_json = encode_address(person.address.as_ref())?;

        self.conn.execute(
            "INSERT INTO persons (
                id,
                model_id,
                first_name,
                last_name,
                email,
                phone,
                address_json,
                last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                person.id.to_string(),
                person.model_id.as_str(),
                person.first_name.as_deref(),
                person.last_name.as_deref(),
                person.email.as_deref(),
                person.phone.as_deref(),
                address_json,
                person.last_modified,
            ],
        )?;

        Ok(person.id)
    }

    fn replace_one(&self, person: &Person) -> RepoResult<WriteOutcome> {
        person.validate()?;
        let address_json = encode_address(person.address.as_ref())?;

        let changed = self.conn.execute(
            "UPDATE persons
             SET
                model_id = ?1,
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                address_json = ?6,
                last_modified = ?7
             WHERE id = ?8;",
            params![
                person.model_id.as_str(),
                person.first_name.as_deref(),
                person.last_name.as_deref(),
                person.email.as_deref(),
                person.phone.as_deref(),
                address_json,
                person.last_modified,
                person.id.to_string(),
            ],
        )?;

        Ok(WriteOutcome::acknowledged(changed))
    }

    fn delete_one(&self, id: PersonId) -> RepoResult<WriteOutcome> {
        let changed = self
            .conn
            .execute("DELETE FROM persons WHERE id = ?1;", [id.to_string()])?;
        Ok(WriteOutcome::acknowledged(changed))
    }

    fn delete_by_model_id(&self, model_id: &str) -> RepoResult<WriteOutcome> {
        let changed = self
            .conn
            .execute("DELETE FROM persons WHERE model_id = ?1;", [model_id])?;
        Ok(WriteOutcome::acknowledged(changed))
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in persons.id"))
    })?;

    let address = match row.get::<_, Option<String>>("address_json")? {
        Some(raw) => Some(serde_json::from_str::<Address>(&raw).map_err(|err| {
            RepoError::InvalidData(format!("invalid persons.address_json for {id}: {err}"))
        })?),
        None => None,
    };

    let person = Person {
        id,
        model_id: row.get("model_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        address,
        last_modified: row.get("last_modified")?,
    };
    person.validate()?;
    Ok(person)
}

fn encode_address(address: Option<&Address>) -> RepoResult<Option<String>> {
    address
        .map(|value| {
            serde_json::to_string(value)
                .map_err(|err| RepoError::InvalidData(format!("address encode failed: {err}")))
        })
        .transpose()
}
