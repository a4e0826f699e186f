//! Student record models.
//!
//! A [`Student`] is a persisted row and always carries its backend-assigned id.
//! A [`NewStudent`] has not been stored yet and has no id, so `create` and
//! `update` cannot be handed the wrong shape of record.

use crate::db::ColumnAccess;
use crate::error::StoreResult;
use serde::{Deserialize, Serialize};

/// Column names of the `student` table.
pub mod columns {
    pub const ID: &str = "id";
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
}

/// A persisted student record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Student {
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// Map one result row to a student, reading all four columns by name.
    pub fn from_row<R: ColumnAccess + ?Sized>(row: &R) -> StoreResult<Self> {
        Ok(Self {
            id: row.get_i64(columns::ID)?,
            first_name: row.get_text(columns::FIRST_NAME)?,
            last_name: row.get_text(columns::LAST_NAME)?,
            email: row.get_text(columns::EMAIL)?,
        })
    }

    /// The mutable fields of this record, without its id.
    pub fn fields(&self) -> NewStudent {
        NewStudent {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
        }
    }
}

impl std::fmt::Display for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {} <{}>",
            self.id, self.first_name, self.last_name, self.email
        )
    }
}

/// A student that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewStudent {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }

    /// Attach a backend-assigned id.
    pub fn with_id(self, id: i64) -> Student {
        Student {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

impl std::fmt::Display for NewStudent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} <{}>", self.first_name, self.last_name, self.email)
    }
}
