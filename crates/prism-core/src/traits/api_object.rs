// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::api::user_data::UserDataSlots;

/// Behaviour shared by every object of the abstraction.
pub trait ApiObject {
    /// The underlying native object (pointer or handle) as a raw value.
    ///
    /// Zero when the backend has no native counterpart.
    fn native_object(&self) -> u64;

    /// Auxiliary state attached to this object by external code.
    fn user_data(&self) -> &UserDataSlots;
}
