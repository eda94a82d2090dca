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

//! The public entry point of prism.
//!
//! [`Prism`] wires the software backend into the context registry: it reads a
//! [`PrismConfig`], installs the logger and owns the registry that the GL
//! entry point hooks forward to.

#![warn(missing_docs)]

pub mod config;
pub mod factory;
pub mod logging;

pub use config::PrismConfig;
pub use factory::SoftRuntimeFactory;
pub use logging::init_logging;

pub use prism_core as core;
pub use prism_hooks as hooks;
pub use prism_infra as infra;

use anyhow::Result;
use prism_hooks::{ContextRegistry, NativeGl};
use std::sync::Arc;

/// The registry type [`Prism`] builds.
pub type PrismRegistry<N> = ContextRegistry<N, SoftRuntimeFactory>;

/// An attached instance: the configured registry behind the GL hooks.
pub struct Prism<N: NativeGl> {
    config: PrismConfig,
    registry: Arc<PrismRegistry<N>>,
}

impl<N: NativeGl> Prism<N> {
    /// Validates `config`, installs logging and builds the registry over `native`.
    pub fn attach(config: PrismConfig, native: N) -> Result<Self> {
        config.validate()?;
        init_logging(&config);
        let factory = SoftRuntimeFactory::new(config.device.clone());
        let registry = Arc::new(ContextRegistry::new(
            native,
            factory,
            config.registry.clone(),
        ));
        log::info!(
            "Prism: Attached with a {:?} software backend",
            config.device.api
        );
        Ok(Self { config, registry })
    }

    /// The configuration this instance was attached with.
    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    /// The registry the hooks forward to.
    pub fn registry(&self) -> &Arc<PrismRegistry<N>> {
        &self.registry
    }

    /// Resets every live runtime and releases the registry.
    pub fn detach(self) {
        drop(self);
    }
}

impl<N: NativeGl> Drop for Prism<N> {
    fn drop(&mut self) {
        self.registry.shutdown();
        log::info!("Prism: Detached");
    }
}
