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

//! Runtime construction for the context registry.

use prism_core::RuntimeError;
use prism_hooks::{RuntimeFactory, RuntimeRequest};
use prism_infra::{SoftDevice, SoftDeviceConfig, SoftEffectRuntime};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds a [`SoftEffectRuntime`] over a fresh software device per context.
#[derive(Debug)]
pub struct SoftRuntimeFactory {
    device: SoftDeviceConfig,
    created: AtomicUsize,
}

impl SoftRuntimeFactory {
    /// A factory whose devices use `device`.
    pub fn new(device: SoftDeviceConfig) -> Self {
        Self {
            device,
            created: AtomicUsize::new(0),
        }
    }

    /// Device configuration handed to every runtime.
    pub fn device_config(&self) -> &SoftDeviceConfig {
        &self.device
    }

    /// Number of runtimes built so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }
}

impl RuntimeFactory for SoftRuntimeFactory {
    type Runtime = SoftEffectRuntime;

    fn create_runtime(&self, request: &RuntimeRequest) -> Result<Self::Runtime, RuntimeError> {
        if self.device.max_texture_dimension == 0 {
            return Err(RuntimeError::Construction(
                "device configured without texture support".to_owned(),
            ));
        }
        let runtime = SoftEffectRuntime::new(SoftDevice::new(self.device.clone()));
        self.created.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "SoftRuntimeFactory: Built {:?} runtime for {:?} (compatibility: {}).",
            self.device.api,
            request.context,
            request.compatibility
        );
        Ok(runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prism_hooks::{DeviceContext, NativeContext, WindowHandle};

    fn request() -> RuntimeRequest {
        RuntimeRequest {
            context: NativeContext(0x10),
            device_context: DeviceContext(0x20),
            window: WindowHandle(0x30),
            compatibility: false,
        }
    }

    #[test]
    fn counts_built_runtimes() {
        let factory = SoftRuntimeFactory::new(SoftDeviceConfig::default());
        assert!(factory.create_runtime(&request()).is_ok());
        assert!(factory.create_runtime(&request()).is_ok());
        assert_eq!(factory.created(), 2);
    }

    #[test]
    fn rejects_unusable_device_limits() {
        let factory = SoftRuntimeFactory::new(SoftDeviceConfig {
            max_texture_dimension: 0,
            ..SoftDeviceConfig::default()
        });
        assert!(matches!(
            factory.create_runtime(&request()),
            Err(RuntimeError::Construction(_))
        ));
        assert_eq!(factory.created(), 0);
    }
}
