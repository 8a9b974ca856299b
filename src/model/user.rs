// Ridehail
// Copyright 2025 Julio Merino
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

//! The `User` data type.

use crate::model::{DisplayName, EmailAddress, HashedPassword, Role, UserId};

/// Representation of a user's information.
#[derive(Debug, PartialEq)]
#[cfg_attr(test, derive(Clone))]
pub(crate) struct User {
    /// Identifier of the user.
    id: UserId,

    /// Name of the user.
    name: DisplayName,

    /// Email of the user.  Unique across all users.
    email: EmailAddress,

    /// Hashed password.
    password: HashedPassword,

    /// Role declared by the user at registration time.
    role: Role,
}

impl User {
    /// Creates a new user with the given fields.
    pub(crate) fn new(
        id: UserId,
        name: DisplayName,
        email: EmailAddress,
        password: HashedPassword,
        role: Role,
    ) -> Self {
        Self { id, name, email, password, role }
    }

    /// Gets the user's identifier.
    pub(crate) fn id(&self) -> UserId {
        self.id
    }

    /// Gets the user's name.
    pub(crate) fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Gets the user's email address.
    pub(crate) fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Gets the user's password as a hash.
    pub(crate) fn password(&self) -> &HashedPassword {
        &self.password
    }

    /// Gets the user's role.
    pub(crate) fn role(&self) -> Role {
        self.role
    }
}
