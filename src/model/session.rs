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

//! The `Session` data type.

use crate::model::{AccessToken, UserId};
use time::OffsetDateTime;

/// Represents an authenticated session.
///
/// Sessions cannot be revoked: they stay valid until `expires_at` passes.
#[cfg_attr(test, derive(Clone, Debug, PartialEq))]
pub(crate) struct Session {
    /// The access token for the session, which acts as its identifier.
    access_token: AccessToken,

    /// The user that owns the session.
    user_id: UserId,

    /// Timestamp past which the session is no longer valid.
    expires_at: OffsetDateTime,
}

impl Session {
    /// Creates a new session from its parts.
    pub(crate) fn new(
        access_token: AccessToken,
        user_id: UserId,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self { access_token, user_id, expires_at }
    }

    /// Returns the session's access token.
    pub(crate) fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    /// Returns the session's access token, consuming the session.
    pub(crate) fn take_access_token(self) -> AccessToken {
        self.access_token
    }

    /// Returns the user that owns the session.
    pub(crate) fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the timestamp past which the session is no longer valid.
    pub(crate) fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }
}
