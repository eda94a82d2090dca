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

//! In-memory native GL layer and runtime factories shared by the registry tests.

#![allow(dead_code)]

use prism_core::api::caps::DeviceApi;
use prism_core::RuntimeError;
use prism_hooks::native::ProcAddress;
use prism_hooks::pixel_format::PixelFormatDescriptor;
use prism_hooks::{
    DeviceContext, NativeContext, NativeGl, PbufferHandle, RuntimeFactory, RuntimeRequest,
    WindowHandle,
};
use prism_infra::{SoftDevice, SoftDeviceConfig, SoftEffectRuntime};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct FakeState {
    next_handle: usize,
    contexts: HashSet<NativeContext>,
    windows: HashMap<DeviceContext, WindowHandle>,
    own_dc: HashSet<WindowHandle>,
    sizes: HashMap<WindowHandle, (u32, u32)>,
    pbuffers: HashMap<PbufferHandle, DeviceContext>,
    current: HashMap<ThreadId, (Option<DeviceContext>, Option<NativeContext>)>,
    version: (u32, u32),
    last_attribs: Vec<i32>,
    swaps: Vec<DeviceContext>,
    make_current_calls: usize,
    fallback_dcs: HashSet<DeviceContext>,
    fallbacks_created: usize,
    lookups: Vec<String>,
    last_error: u32,
}

/// A single-process stand-in for the windowing system and the GL driver.
#[derive(Debug)]
pub struct FakeNative {
    state: Mutex<FakeState>,
}

impl Default for FakeNative {
    fn default() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_handle: 0x100,
                version: (4, 6),
                ..FakeState::default()
            }),
        }
    }
}

impl FakeNative {
    fn handle(state: &mut FakeState) -> usize {
        state.next_handle += 0x10;
        state.next_handle
    }

    /// A device context backed by an own-DC window of the given size.
    pub fn add_window(&self, width: u32, height: u32) -> DeviceContext {
        let mut state = self.state.lock().unwrap();
        let hdc = DeviceContext(Self::handle(&mut state));
        let window = WindowHandle(Self::handle(&mut state));
        state.windows.insert(hdc, window);
        state.own_dc.insert(window);
        state.sizes.insert(window, (width, height));
        hdc
    }

    /// A device context that draws to no window.
    pub fn add_memory_dc(&self) -> DeviceContext {
        let mut state = self.state.lock().unwrap();
        DeviceContext(Self::handle(&mut state))
    }

    pub fn resize(&self, hdc: DeviceContext, width: u32, height: u32) {
        let mut state = self.state.lock().unwrap();
        let window = state.windows[&hdc];
        state.sizes.insert(window, (width, height));
    }

    pub fn destroy_window(&self, hdc: DeviceContext) {
        self.state.lock().unwrap().windows.remove(&hdc);
    }

    pub fn set_supported_version(&self, major: u32, minor: u32) {
        self.state.lock().unwrap().version = (major, minor);
    }

    pub fn last_attribs(&self) -> Vec<i32> {
        self.state.lock().unwrap().last_attribs.clone()
    }

    pub fn swaps(&self) -> Vec<DeviceContext> {
        self.state.lock().unwrap().swaps.clone()
    }

    pub fn is_alive(&self, context: NativeContext) -> bool {
        self.state.lock().unwrap().contexts.contains(&context)
    }

    pub fn fallbacks_created(&self) -> usize {
        self.state.lock().unwrap().fallbacks_created
    }

    pub fn live_fallbacks(&self) -> usize {
        self.state.lock().unwrap().fallback_dcs.len()
    }

    pub fn lookups(&self) -> Vec<String> {
        self.state.lock().unwrap().lookups.clone()
    }

    pub fn last_error(&self) -> u32 {
        self.state.lock().unwrap().last_error
    }

    fn new_context(&self) -> NativeContext {
        let mut state = self.state.lock().unwrap();
        let context = NativeContext(Self::handle(&mut state));
        state.contexts.insert(context);
        context
    }
}

impl NativeGl for FakeNative {
    fn create_layer_context(&self, _hdc: DeviceContext, _plane: i32) -> Option<NativeContext> {
        Some(self.new_context())
    }

    fn create_context_attribs(
        &self,
        _hdc: DeviceContext,
        share: Option<NativeContext>,
        attribs: &[i32],
    ) -> Option<NativeContext> {
        if let Some(share) = share {
            if !self.is_alive(share) {
                return None;
            }
        }
        self.state.lock().unwrap().last_attribs = attribs.to_vec();
        Some(self.new_context())
    }

    fn delete_context(&self, context: NativeContext) -> bool {
        let mut state = self.state.lock().unwrap();
        for binding in state.current.values_mut() {
            if binding.1 == Some(context) {
                *binding = (None, None);
            }
        }
        state.contexts.remove(&context)
    }

    fn share_lists(&self, source: NativeContext, target: NativeContext) -> bool {
        self.is_alive(source) && self.is_alive(target)
    }

    fn make_current(&self, hdc: Option<DeviceContext>, context: Option<NativeContext>) -> bool {
        let mut state = self.state.lock().unwrap();
        state.make_current_calls += 1;
        if let Some(context) = context {
            if !state.contexts.contains(&context) || hdc.is_none() {
                return false;
            }
        }
        state.current.insert(thread::current().id(), (hdc, context));
        true
    }

    fn current_context(&self) -> Option<NativeContext> {
        let state = self.state.lock().unwrap();
        state.current.get(&thread::current().id()).and_then(|c| c.1)
    }

    fn current_dc(&self) -> Option<DeviceContext> {
        let state = self.state.lock().unwrap();
        state.current.get(&thread::current().id()).and_then(|c| c.0)
    }

    fn supports_version(&self, major: u32, minor: u32) -> bool {
        self.state.lock().unwrap().version >= (major, minor)
    }

    fn swap_buffers(&self, hdc: DeviceContext) -> bool {
        self.state.lock().unwrap().swaps.push(hdc);
        true
    }

    fn choose_pixel_format(&self, _hdc: DeviceContext, _descriptor: &PixelFormatDescriptor) -> i32 {
        7
    }

    fn get_pbuffer_dc(&self, pbuffer: PbufferHandle) -> Option<DeviceContext> {
        let mut state = self.state.lock().unwrap();
        let hdc = DeviceContext(Self::handle(&mut state));
        state.pbuffers.insert(pbuffer, hdc);
        Some(hdc)
    }

    fn release_pbuffer_dc(&self, pbuffer: PbufferHandle, hdc: DeviceContext) -> bool {
        self.state.lock().unwrap().pbuffers.remove(&pbuffer) == Some(hdc)
    }

    fn get_proc_address(&self, name: &str) -> Option<ProcAddress> {
        let mut state = self.state.lock().unwrap();
        state.lookups.push(name.to_owned());
        name.starts_with("gl").then_some(0x1000 + state.lookups.len())
    }

    fn window_from_dc(&self, hdc: DeviceContext) -> Option<WindowHandle> {
        let state = self.state.lock().unwrap();
        state.windows.get(&hdc).copied()
    }

    fn window_has_own_dc(&self, window: WindowHandle) -> bool {
        self.state.lock().unwrap().own_dc.contains(&window)
    }

    fn client_size(&self, window: WindowHandle) -> (u32, u32) {
        let state = self.state.lock().unwrap();
        state.sizes.get(&window).copied().unwrap_or((0, 0))
    }

    fn create_fallback_dc(&self) -> Option<DeviceContext> {
        let mut state = self.state.lock().unwrap();
        let hdc = DeviceContext(Self::handle(&mut state));
        let window = WindowHandle(Self::handle(&mut state));
        state.windows.insert(hdc, window);
        state.fallback_dcs.insert(hdc);
        state.fallbacks_created += 1;
        Some(hdc)
    }

    fn release_fallback_dc(&self, hdc: DeviceContext) {
        let mut state = self.state.lock().unwrap();
        state.windows.remove(&hdc);
        state.fallback_dcs.remove(&hdc);
    }

    fn set_last_error(&self, code: u32) {
        self.state.lock().unwrap().last_error = code;
    }
}

/// Builds software runtimes and counts the attempts.
#[derive(Debug, Default)]
pub struct SoftFactory {
    pub attempts: AtomicUsize,
    pub fail: bool,
}

impl SoftFactory {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl RuntimeFactory for SoftFactory {
    type Runtime = SoftEffectRuntime;

    fn create_runtime(&self, request: &RuntimeRequest) -> Result<SoftEffectRuntime, RuntimeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RuntimeError::Construction(format!(
                "refusing {:?}",
                request.context
            )));
        }
        let device = SoftDevice::new(SoftDeviceConfig::for_api(DeviceApi::OpenGL));
        Ok(SoftEffectRuntime::new(device))
    }
}
