// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction to manipulate person records.
//!
//! Every operation is a single statement against the `peoples` table and is implemented once per
//! supported backend.

use crate::model::{Person, PersonFields, PersonId, age_from_i32};
#[cfg(feature = "postgres")]
use people_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use people_core::db::sqlite;
use people_core::db::{DbError, DbResult, Executor, ensure_at_most_one_row};
use sqlx::Row;
#[cfg(feature = "postgres")]
use sqlx::postgres::PgRow;
#[cfg(any(feature = "sqlite", test))]
use sqlx::sqlite::SqliteRow;


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,

        #[allow(unused)]
        _ => unreachable!(),
    }
}

#[cfg(feature = "postgres")]
impl TryFrom<PgRow> for Person {
    type Error = DbError;

    fn try_from(row: PgRow) -> DbResult<Self> {
        let id: i32 = row.try_get("id").map_err(postgres::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(postgres::map_sqlx_error)?;
        let surname: String = row.try_get("surname").map_err(postgres::map_sqlx_error)?;
        let patronymic: String = row.try_get("patronymic").map_err(postgres::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(postgres::map_sqlx_error)?;
        let gender: String = row.try_get("gender").map_err(postgres::map_sqlx_error)?;
        let age: i32 = row.try_get("age").map_err(postgres::map_sqlx_error)?;

        let fields =
            PersonFields { name, surname, patronymic, country, gender, age: age_from_i32(age)? };
        Ok(Person::new(PersonId::new(id), fields))
    }
}

#[cfg(any(feature = "sqlite", test))]
impl TryFrom<SqliteRow> for Person {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i32 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let name: String = row.try_get("name").map_err(sqlite::map_sqlx_error)?;
        let surname: String = row.try_get("surname").map_err(sqlite::map_sqlx_error)?;
        let patronymic: String = row.try_get("patronymic").map_err(sqlite::map_sqlx_error)?;
        let country: String = row.try_get("country").map_err(sqlite::map_sqlx_error)?;
        let gender: String = row.try_get("gender").map_err(sqlite::map_sqlx_error)?;
        let age: i32 = row.try_get("age").map_err(sqlite::map_sqlx_error)?;

        let fields =
            PersonFields { name, surname, patronymic, country, gender, age: age_from_i32(age)? };
        Ok(Person::new(PersonId::new(id), fields))
    }
}

/// Inserts a new person described by `fields` and returns its newly-assigned identifier.
pub(crate) async fn create_person(ex: &mut Executor, fields: &PersonFields) -> DbResult<PersonId> {
    let id: i32 = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                INSERT INTO peoples (name, surname, patronymic, country, gender, age)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&fields.name)
                .bind(&fields.surname)
                .bind(&fields.patronymic)
                .bind(&fields.country)
                .bind(&fields.gender)
                .bind(i32::from(fields.age))
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            row.try_get("id").map_err(postgres::map_sqlx_error)?
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO peoples (name, surname, patronymic, country, gender, age)
                VALUES (?, ?, ?, ?, ?, ?)
                RETURNING id";
            let row = sqlx::query(query_str)
                .bind(&fields.name)
                .bind(&fields.surname)
                .bind(&fields.patronymic)
                .bind(&fields.country)
                .bind(&fields.gender)
                .bind(i32::from(fields.age))
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("id").map_err(sqlite::map_sqlx_error)?
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    Ok(PersonId::new(id))
}

/// Deletes the person identified by `id`.  Deleting a person that does not exist is not an error.
pub(crate) async fn delete_person(ex: &mut Executor, id: PersonId) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let done = sqlx::query("DELETE FROM peoples WHERE id = $1")
                .bind(id.as_i32())
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let done = sqlx::query("DELETE FROM peoples WHERE id = ?")
                .bind(id.as_i32())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_at_most_one_row(rows_affected, "Deletion")
}

/// Gets the person identified by `id`.
pub(crate) async fn get_person_by_id(ex: &mut Executor, id: PersonId) -> DbResult<Person> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let raw_person = sqlx::query("SELECT * FROM peoples WHERE id = $1")
                .bind(id.as_i32())
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Person::try_from(raw_person)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let raw_person = sqlx::query("SELECT * FROM peoples WHERE id = ?")
                .bind(id.as_i32())
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Person::try_from(raw_person)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Gets the person called `name` `surname`.  If there are multiple matches, returns the one that
/// was created first.
pub(crate) async fn get_person_by_name(
    ex: &mut Executor,
    name: &str,
    surname: &str,
) -> DbResult<Person> {
    match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str =
                "SELECT * FROM peoples WHERE name = $1 AND surname = $2 ORDER BY id LIMIT 1";
            let raw_person = sqlx::query(query_str)
                .bind(name)
                .bind(surname)
                .fetch_one(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            Person::try_from(raw_person)
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str =
                "SELECT * FROM peoples WHERE name = ? AND surname = ? ORDER BY id LIMIT 1";
            let raw_person = sqlx::query(query_str)
                .bind(name)
                .bind(surname)
                .fetch_one(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Person::try_from(raw_person)
        }

        #[allow(unused)]
        _ => unreachable!(),
    }
}

/// Overwrites all the attributes of the person identified by `id` with `fields`.  Updating a
/// person that does not exist is not an error.
pub(crate) async fn update_person(
    ex: &mut Executor,
    id: PersonId,
    fields: &PersonFields,
) -> DbResult<()> {
    let rows_affected = match ex {
        #[cfg(feature = "postgres")]
        Executor::Postgres(ex) => {
            let query_str = "
                UPDATE peoples
                SET name = $2, surname = $3, patronymic = $4, country = $5, gender = $6, age = $7
                WHERE id = $1";
            let done = sqlx::query(query_str)
                .bind(id.as_i32())
                .bind(&fields.name)
                .bind(&fields.surname)
                .bind(&fields.patronymic)
                .bind(&fields.country)
                .bind(&fields.gender)
                .bind(i32::from(fields.age))
                .execute(&mut **ex)
                .await
                .map_err(postgres::map_sqlx_error)?;
            done.rows_affected()
        }

        #[cfg(any(feature = "sqlite", test))]
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE peoples
                SET name = ?, surname = ?, patronymic = ?, country = ?, gender = ?, age = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(&fields.name)
                .bind(&fields.surname)
                .bind(&fields.patronymic)
                .bind(&fields.country)
                .bind(&fields.gender)
                .bind(i32::from(fields.age))
                .bind(id.as_i32())
                .execute(&mut **ex)
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }

        #[allow(unused)]
        _ => unreachable!(),
    };
    ensure_at_most_one_row(rows_affected, "Update")
}
