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

//! Operations on people.

use crate::db;
use crate::driver::Driver;
use crate::model::{Person, PersonFields, PersonId};
use log::info;
use people_core::driver::DriverResult;

impl Driver {
    /// Adds a new person described by `fields`, guessing any unknown attributes first.
    pub(crate) async fn add_person(self, fields: PersonFields) -> DriverResult<PersonId> {
        let fields = self.enrich(fields).await;
        let id = db::create_person(&mut self.db.ex().await?, &fields).await?;
        info!("Added person {} {} with id {}", fields.name, fields.surname, id.as_i32());
        Ok(id)
    }

    /// Deletes the person identified by `id`, if it exists.
    pub(crate) async fn delete_person(self, id: PersonId) -> DriverResult<()> {
        db::delete_person(&mut self.db.ex().await?, id).await?;
        info!("Deleted person with id {}", id.as_i32());
        Ok(())
    }

    /// Gets the person identified by `id`.
    pub(crate) async fn get_person_by_id(self, id: PersonId) -> DriverResult<Person> {
        let person = db::get_person_by_id(&mut self.db.ex().await?, id).await?;
        Ok(person)
    }

    /// Gets the first person added with the given `name` and `surname`.
    pub(crate) async fn get_person_by_name(
        self,
        name: &str,
        surname: &str,
    ) -> DriverResult<Person> {
        let person = db::get_person_by_name(&mut self.db.ex().await?, name, surname).await?;
        Ok(person)
    }

    /// Replaces all attributes of the person identified by `id` with `fields`.
    ///
    /// Unknown attributes in `fields` are stored as unknown: no lookups happen on edits.
    pub(crate) async fn edit_person(self, id: PersonId, fields: PersonFields) -> DriverResult<()> {
        db::update_person(&mut self.db.ex().await?, id, &fields).await?;
        info!("Edited person with id {}", id.as_i32());
        Ok(())
    }
}
