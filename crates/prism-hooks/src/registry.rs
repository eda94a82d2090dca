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

//! The process-wide registry behind the intercepted context entry points.

use crate::attribs::ContextAttribs;
use crate::config::RegistryConfig;
use crate::native::{
    DeviceContext, NativeContext, NativeGl, PbufferHandle, ProcAddress, WindowHandle,
    ERROR_INVALID_PARAMETER,
};
use crate::pixel_format::PixelFormatDescriptor;
use crate::proc_alias;
use crate::sharing::SharingGroups;
use prism_core::{EffectRuntime, RuntimeError};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// `WGL_SWAP_MAIN_PLANE`
pub const SWAP_MAIN_PLANE: u32 = 0x1;

/// A runtime shared between the registry and its callers.
pub type SharedRuntime<R> = Arc<Mutex<R>>;

/// What the registry knows about a context it wants a runtime for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeRequest {
    /// The context the runtime is keyed by, the representative of its group.
    pub context: NativeContext,
    /// The device context it was made current with.
    pub device_context: DeviceContext,
    /// The window behind `device_context`.
    pub window: WindowHandle,
    /// The context was created through the legacy entry point.
    pub compatibility: bool,
}

/// Builds the runtime associated with a newly activated context.
pub trait RuntimeFactory: Send + Sync {
    /// The runtime type handed out by the registry.
    type Runtime: EffectRuntime;

    /// Constructs an uninitialised runtime. The registry initialises it on
    /// the first presentation, once the window size is known.
    fn create_runtime(&self, request: &RuntimeRequest) -> Result<Self::Runtime, RuntimeError>;
}

struct RuntimeSlot<R> {
    runtime: SharedRuntime<R>,
    device_contexts: Vec<DeviceContext>,
}

impl<R> RuntimeSlot<R> {
    fn add_device_context(&mut self, hdc: DeviceContext) {
        if !self.device_contexts.contains(&hdc) {
            self.device_contexts.push(hdc);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Binding {
    key: NativeContext,
    device_context: DeviceContext,
}

struct RegistryState<R> {
    groups: SharingGroups,
    legacy: HashSet<NativeContext>,
    pbuffer_dcs: HashSet<DeviceContext>,
    runtimes: HashMap<NativeContext, RuntimeSlot<R>>,
    failed: HashSet<NativeContext>,
    // One entry per thread that last made a context current. A thread that
    // exits while bound keeps its entry until that context is deleted or the
    // registry shuts down, so the map is bounded by the number of threads.
    bindings: HashMap<ThreadId, Binding>,
}

impl<R> Default for RegistryState<R> {
    fn default() -> Self {
        Self {
            groups: SharingGroups::new(),
            legacy: HashSet::new(),
            pbuffer_dcs: HashSet::new(),
            runtimes: HashMap::new(),
            failed: HashSet::new(),
            bindings: HashMap::new(),
        }
    }
}

impl<R> RegistryState<R> {
    /// The earliest-created member of `context`'s group that owns a runtime.
    fn authoritative(&mut self, context: NativeContext) -> Option<NativeContext> {
        if !self.groups.contains(context) {
            return self.runtimes.contains_key(&context).then_some(context);
        }
        self.groups
            .members(context)
            .into_iter()
            .find(|member| self.runtimes.contains_key(member))
    }

    fn unbind(&mut self, thread: ThreadId) {
        self.bindings.remove(&thread);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks native contexts and the runtimes associated with them.
///
/// Every hook forwards to the original entry point through `N` and never
/// fails a native call because of its own bookkeeping. The maps are guarded
/// by a single mutex; the current runtime is tracked per calling thread.
pub struct ContextRegistry<N: NativeGl, F: RuntimeFactory> {
    native: N,
    factory: F,
    config: RegistryConfig,
    state: Mutex<RegistryState<F::Runtime>>,
}

impl<N: NativeGl, F: RuntimeFactory> ContextRegistry<N, F> {
    /// Creates an empty registry.
    pub fn new(native: N, factory: F, config: RegistryConfig) -> Self {
        log::info!(
            "ContextRegistry: Created with a GL {}.{} floor",
            config.min_major_version,
            config.min_minor_version
        );
        Self {
            native,
            factory,
            config,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// The native layer the registry forwards to.
    pub fn native(&self) -> &N {
        &self.native
    }

    /// The runtime factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The active settings.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // --- Context Creation ---

    /// `wglCreateContext`: a main-plane layer context flagged as legacy.
    pub fn create_context(&self, hdc: DeviceContext) -> Option<NativeContext> {
        log::info!("ContextRegistry: Redirecting create_context({hdc:?}) to create_layer_context");
        let context = self.create_layer_context(hdc, 0)?;
        // Tracked here rather than in create_layer_context: drivers may route
        // attribute-based creation through the layer entry point.
        lock(&self.state).legacy.insert(context);
        Some(context)
    }

    /// `wglCreateLayerContext`. Only the main plane is supported.
    pub fn create_layer_context(&self, hdc: DeviceContext, plane: i32) -> Option<NativeContext> {
        if plane != 0 {
            log::warn!("ContextRegistry: Access to layer plane {plane} is unsupported");
            self.native.set_last_error(ERROR_INVALID_PARAMETER);
            return None;
        }
        let Some(context) = self.native.create_layer_context(hdc, plane) else {
            log::warn!("ContextRegistry: Native create_layer_context({hdc:?}) failed");
            return None;
        };
        lock(&self.state).groups.insert(context);
        log::debug!("ContextRegistry: Created {context:?} on {hdc:?}");
        Some(context)
    }

    /// `wglCreateContextAttribsARB`.
    ///
    /// The request is rewritten according to the registry configuration
    /// before it reaches the driver, and the new context joins the group of
    /// `share` when one is given.
    pub fn create_context_attribs(
        &self,
        hdc: DeviceContext,
        share: Option<NativeContext>,
        attribs: &[i32],
    ) -> Option<NativeContext> {
        let request = ContextAttribs::parse(attribs);
        if request.layer_plane != 0 {
            log::warn!(
                "ContextRegistry: Access to layer plane {} is unsupported",
                request.layer_plane
            );
            self.native.set_last_error(ERROR_INVALID_PARAMETER);
            return None;
        }
        log::info!(
            "ContextRegistry: Requesting {} context for version {}.{}",
            if request.compatibility { "compatibility" } else { "core" },
            request.major,
            request.minor
        );

        let list = request.to_native(&self.config);
        let Some(context) = self.native.create_context_attribs(hdc, share, &list) else {
            log::warn!("ContextRegistry: Native create_context_attribs({hdc:?}) failed");
            return None;
        };

        let mut state = lock(&self.state);
        state.groups.insert(context);
        if let Some(share) = share {
            state.groups.union(share, context);
            log::debug!("ContextRegistry: {context:?} shares objects with {share:?}");
        }
        Some(context)
    }

    /// `wglShareLists`. Joins the groups of both contexts on success.
    pub fn share_lists(&self, source: NativeContext, target: NativeContext) -> bool {
        if !self.native.share_lists(source, target) {
            log::warn!("ContextRegistry: Native share_lists({source:?}, {target:?}) failed");
            return false;
        }
        lock(&self.state).groups.union(source, target);
        true
    }

    // --- Activation ---

    /// `wglMakeCurrent`.
    ///
    /// Binds the calling thread to the runtime of `context`'s group, creating
    /// it on first use. The native result is returned unchanged.
    pub fn make_current(&self, hdc: Option<DeviceContext>, context: Option<NativeContext>) -> bool {
        if !self.native.make_current(hdc, context) {
            log::debug!("ContextRegistry: Native make_current({hdc:?}, {context:?}) failed");
            return false;
        }

        let thread = thread::current().id();
        let mut state = lock(&self.state);
        let (Some(hdc), Some(context)) = (hdc, context) else {
            state.unbind(thread);
            return true;
        };

        if let Some(key) = state.authoritative(context) {
            if key != context {
                log::debug!("ContextRegistry: Using shared context {key:?} for {context:?}");
            }
            if let Some(slot) = state.runtimes.get_mut(&key) {
                // The application may switch device contexts without switching
                // render contexts, so every DC seen is kept.
                slot.add_device_context(hdc);
            }
            state.bindings.insert(thread, Binding { key, device_context: hdc });
            return true;
        }

        state.groups.insert(context);
        let key = state.groups.resolve_root(context).unwrap_or(context);
        if state.failed.contains(&key) {
            log::trace!("ContextRegistry: {key:?} previously failed, staying unbound");
            state.unbind(thread);
            return true;
        }

        let window = match self.native.window_from_dc(hdc) {
            Some(window) if !state.pbuffer_dcs.contains(&hdc) => window,
            _ => {
                log::debug!(
                    "ContextRegistry: Skipping {context:?} because {hdc:?} has no associated window"
                );
                state.unbind(thread);
                return true;
            }
        };
        if !self.native.window_has_own_dc(window) {
            log::warn!("ContextRegistry: Window class of {window:?} is missing CS_OWNDC");
        }

        let (major, minor) = (self.config.min_major_version, self.config.min_minor_version);
        if !self.native.supports_version(major, minor) {
            log::error!(
                "ContextRegistry: {}, no runtime for {key:?}",
                RuntimeError::CapabilityFloor { major, minor }
            );
            state.failed.insert(key);
            state.unbind(thread);
            return true;
        }

        let request = RuntimeRequest {
            context: key,
            device_context: hdc,
            window,
            compatibility: state.legacy.contains(&key),
        };
        match self.factory.create_runtime(&request) {
            Ok(mut runtime) => {
                if request.compatibility {
                    runtime.set_compatibility_context(true);
                }
                state.runtimes.insert(
                    key,
                    RuntimeSlot {
                        runtime: Arc::new(Mutex::new(runtime)),
                        device_contexts: vec![hdc],
                    },
                );
                state.bindings.insert(thread, Binding { key, device_context: hdc });
                log::info!("ContextRegistry: Created runtime for {key:?} on {hdc:?}");
            }
            Err(e) => {
                log::error!("ContextRegistry: {e}, no runtime for {key:?}");
                state.failed.insert(key);
                state.unbind(thread);
            }
        }
        true
    }

    // --- Destruction ---

    /// `wglDeleteContext`.
    ///
    /// Tears down the runtime keyed by `context` while the context still
    /// exists, then forgets every trace of it and calls the native delete.
    pub fn delete_context(&self, context: NativeContext) -> bool {
        log::info!("ContextRegistry: Redirecting delete_context({context:?})");

        let slot = {
            let mut state = lock(&self.state);
            let slot = state.runtimes.remove(&context);
            state.bindings.retain(|_, binding| binding.key != context);
            state.legacy.remove(&context);
            state.failed.remove(&context);
            state.groups.remove(context);
            slot
        };
        if let Some(slot) = slot {
            self.tear_down(context, slot);
        }

        let deleted = self.native.delete_context(context);
        if !deleted {
            log::warn!("ContextRegistry: Native delete_context({context:?}) failed");
        }
        deleted
    }

    fn tear_down(&self, context: NativeContext, slot: RuntimeSlot<F::Runtime>) {
        log::debug!("ContextRegistry: Cleaning up runtime of {context:?}");
        let previous_context = self.native.current_context();
        if previous_context == Some(context) {
            lock(&slot.runtime).on_reset();
            return;
        }

        let previous_dc = self.native.current_dc();
        let mut fallback = None;
        let hdc = match slot.device_contexts.first() {
            Some(&hdc) if self.native.window_from_dc(hdc).is_some() => Some(hdc),
            _ => {
                fallback = self.native.create_fallback_dc();
                fallback
            }
        };

        match hdc {
            Some(hdc) if self.native.make_current(Some(hdc), Some(context)) => {
                lock(&slot.runtime).on_reset();
                self.native.make_current(previous_dc, previous_context);
            }
            _ => log::warn!(
                "ContextRegistry: Unable to make {context:?} current, leaking its GPU resources"
            ),
        }

        if let Some(hdc) = fallback {
            self.native.release_fallback_dc(hdc);
        }
    }

    // --- Presentation ---

    /// `wglSwapBuffers`.
    ///
    /// Resizes the runtime presenting to `hdc` when its window changed size,
    /// notifies it, and always forwards the swap.
    pub fn swap_buffers(&self, hdc: DeviceContext) -> bool {
        let runtime = {
            let state = lock(&self.state);
            let current = state
                .bindings
                .get(&thread::current().id())
                .and_then(|binding| state.runtimes.get(&binding.key))
                .filter(|slot| slot.device_contexts.contains(&hdc));
            current
                .or_else(|| {
                    state
                        .runtimes
                        .values()
                        .find(|slot| slot.device_contexts.contains(&hdc))
                })
                .map(|slot| Arc::clone(&slot.runtime))
        };

        // The window is gone when the application destroyed it before the swap.
        if let (Some(window), Some(runtime)) = (self.native.window_from_dc(hdc), runtime) {
            let (width, height) = self.native.client_size(window);
            let mut runtime = lock(&runtime);
            if runtime.get_frame_width_and_height() != (width, height) {
                log::info!("ContextRegistry: Resizing runtime on {hdc:?} to {width}x{height}");
                runtime.on_reset();
                if !(width == 0 && height == 0) {
                    if let Err(e) = runtime.on_init(width, height) {
                        log::error!("ContextRegistry: Failed to recreate runtime on {hdc:?}: {e}");
                    }
                }
            }
            runtime.on_present();
        }

        self.native.swap_buffers(hdc)
    }

    /// `wglSwapLayerBuffers`. Only the main plane can be swapped.
    pub fn swap_layer_buffers(&self, hdc: DeviceContext, planes: u32) -> bool {
        if planes != SWAP_MAIN_PLANE {
            log::debug!("ContextRegistry: Swapping layer planes {planes:#x} is unsupported");
            self.native.set_last_error(ERROR_INVALID_PARAMETER);
            return false;
        }
        self.swap_buffers(hdc)
    }

    /// `wglSwapMultipleBuffers`.
    pub fn swap_multiple_buffers(&self, device_contexts: &[DeviceContext]) -> u32 {
        for &hdc in device_contexts {
            self.swap_buffers(hdc);
        }
        0
    }

    // --- Pixel Formats & Pbuffers ---

    /// `wglChoosePixelFormat`. Layered formats are refused.
    pub fn choose_pixel_format(&self, hdc: DeviceContext, descriptor: &PixelFormatDescriptor) -> i32 {
        log::debug!("ContextRegistry: choose_pixel_format({hdc:?}, {descriptor:?})");
        if let Err(e) = descriptor.validate() {
            log::error!("ContextRegistry: {e}");
            self.native.set_last_error(ERROR_INVALID_PARAMETER);
            return 0;
        }
        if !descriptor.is_double_buffered() {
            log::warn!("ContextRegistry: Single buffered OpenGL contexts are not supported");
        }

        let format = self.native.choose_pixel_format(hdc, descriptor);
        if format == 0 {
            log::warn!("ContextRegistry: Native choose_pixel_format({hdc:?}) failed");
        }
        format
    }

    /// `wglGetPbufferDCARB`. The returned DC is never given a runtime.
    pub fn get_pbuffer_dc(&self, pbuffer: PbufferHandle) -> Option<DeviceContext> {
        let Some(hdc) = self.native.get_pbuffer_dc(pbuffer) else {
            log::warn!("ContextRegistry: Native get_pbuffer_dc({pbuffer:?}) failed");
            return None;
        };
        lock(&self.state).pbuffer_dcs.insert(hdc);
        Some(hdc)
    }

    /// `wglReleasePbufferDCARB`.
    pub fn release_pbuffer_dc(&self, pbuffer: PbufferHandle, hdc: DeviceContext) -> bool {
        if !self.native.release_pbuffer_dc(pbuffer, hdc) {
            log::warn!("ContextRegistry: Native release_pbuffer_dc({pbuffer:?}) failed");
            return false;
        }
        lock(&self.state).pbuffer_dcs.remove(&hdc);
        true
    }

    /// `wglGetProcAddress`, with extension names redirected to core ones.
    pub fn get_proc_address(&self, name: &str) -> Option<ProcAddress> {
        let resolved = proc_alias::resolve(name);
        if resolved != name {
            log::trace!("ContextRegistry: Resolving {name} as {resolved}");
        }
        self.native.get_proc_address(resolved)
    }

    // --- Queries & Management ---

    /// The runtime bound to the calling thread.
    pub fn current_runtime(&self) -> Option<SharedRuntime<F::Runtime>> {
        let state = lock(&self.state);
        let binding = state.bindings.get(&thread::current().id())?;
        state.runtimes.get(&binding.key).map(|slot| Arc::clone(&slot.runtime))
    }

    /// The device context the calling thread's runtime was last bound with.
    pub fn current_device_context(&self) -> Option<DeviceContext> {
        let state = lock(&self.state);
        state
            .bindings
            .get(&thread::current().id())
            .map(|binding| binding.device_context)
    }

    /// The runtime that `context` resolves to through its sharing group.
    pub fn runtime_for(&self, context: NativeContext) -> Option<SharedRuntime<F::Runtime>> {
        let mut state = lock(&self.state);
        let key = state.authoritative(context)?;
        state.runtimes.get(&key).map(|slot| Arc::clone(&slot.runtime))
    }

    /// Device contexts seen with the runtime keyed by `context`.
    pub fn device_contexts_of(&self, context: NativeContext) -> Vec<DeviceContext> {
        lock(&self.state)
            .runtimes
            .get(&context)
            .map(|slot| slot.device_contexts.clone())
            .unwrap_or_default()
    }

    /// The representative of `context`'s sharing group.
    pub fn resolve_root(&self, context: NativeContext) -> Option<NativeContext> {
        lock(&self.state).groups.resolve_root(context)
    }

    /// Number of live runtimes.
    pub fn runtime_count(&self) -> usize {
        lock(&self.state).runtimes.len()
    }

    /// `true` when runtime construction for `context` failed and is not retried.
    pub fn is_failed(&self, context: NativeContext) -> bool {
        lock(&self.state).failed.contains(&context)
    }

    /// `true` when `context` was created through the legacy entry point.
    pub fn is_legacy(&self, context: NativeContext) -> bool {
        lock(&self.state).legacy.contains(&context)
    }

    /// Number of threads currently bound to a runtime.
    pub fn bound_thread_count(&self) -> usize {
        lock(&self.state).bindings.len()
    }

    /// Forgets the calling thread's current runtime.
    pub fn clear_thread_binding(&self) {
        lock(&self.state).unbind(thread::current().id());
    }

    /// Resets every runtime and clears all state. Runs on process detach.
    pub fn shutdown(&self) {
        let slots: Vec<_> = {
            let mut state = lock(&self.state);
            let state = std::mem::take(&mut *state);
            state.runtimes.into_values().collect()
        };
        log::info!("ContextRegistry: Shutting down {} runtimes", slots.len());
        for slot in slots {
            lock(&slot.runtime).on_reset();
        }
    }
}
