//! Member (library patron) model and related types
//!
//! Identity issuance and credentials live in an external auth collaborator;
//! this server stores the directory rows the lending ledger references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};

/// Member roles. Only `member` may hold borrowings; `librarian` manages the
/// catalog and can inspect any member's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Member,
    Librarian,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Librarian => "librarian",
        }
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(MemberRole::Member),
            "librarian" => Ok(MemberRole::Librarian),
            _ => Err(format!("Invalid member role: {}", s)),
        }
    }
}

// SQLx conversion for MemberRole (stored as text)
impl sqlx::Type<Postgres> for MemberRole {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for MemberRole {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for MemberRole {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Member model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: MemberRole,
    pub created_at: DateTime<Utc>,
}

/// Member listing query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MemberQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("member".parse::<MemberRole>().unwrap(), MemberRole::Member);
        assert_eq!(
            "Librarian".parse::<MemberRole>().unwrap(),
            MemberRole::Librarian
        );
        assert!("admin".parse::<MemberRole>().is_err());
        assert_eq!(MemberRole::Librarian.to_string(), "librarian");
    }
}
