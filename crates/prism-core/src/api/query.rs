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

//! Query types.

/// Kind of value a query pool records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// Number of samples that passed depth and stencil tests.
    Occlusion,
    /// Non-zero when any sample passed.
    BinaryOcclusion,
    /// GPU timestamp in device ticks.
    Timestamp,
    /// Pipeline statistics counters.
    PipelineStatistics,
}

impl QueryType {
    /// Size in bytes of one result of this type.
    pub const fn result_size(self) -> u32 {
        match self {
            QueryType::PipelineStatistics => 88,
            _ => 8,
        }
    }

    /// `true` for queries bracketed by `begin_query`/`finish_query`.
    ///
    /// Timestamps are written by `finish_query` alone.
    pub const fn is_scoped(self) -> bool {
        !matches!(self, QueryType::Timestamp)
    }
}
