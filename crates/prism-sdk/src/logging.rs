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

//! Logger setup.

use crate::config::PrismConfig;
use env_logger::{Builder, Env};

/// Installs the process logger, filtered by `RUST_LOG` or `config.log_level`.
///
/// ## Returns
/// `false` when a logger was already installed, which is left untouched.
pub fn init_logging(config: &PrismConfig) -> bool {
    Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
