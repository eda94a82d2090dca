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

//! The native side of the interception boundary.
//!
//! Hooks never call the windowing system directly. Every native entry point
//! they forward to, and every query they need about windows and device
//! contexts, goes through [`NativeGl`]. A platform layer implements it over
//! the original (trampolined) functions; tests implement it in memory.

use crate::pixel_format::PixelFormatDescriptor;
use std::fmt;

macro_rules! native_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:#x})", stringify!($name), self.0)
            }
        }
    };
}

native_handle!(
    /// A native rendering context (`HGLRC`).
    NativeContext
);
native_handle!(
    /// A native device context (`HDC`).
    DeviceContext
);
native_handle!(
    /// A native window (`HWND`).
    WindowHandle
);
native_handle!(
    /// A native off-screen pixel buffer (`HPBUFFERARB`).
    PbufferHandle
);

/// Address of a resolved native function.
pub type ProcAddress = usize;

/// `ERROR_INVALID_PARAMETER`, reported through [`NativeGl::set_last_error`].
pub const ERROR_INVALID_PARAMETER: u32 = 87;

/// Trampolines to the original native entry points plus the window queries
/// the registry depends on.
///
/// Implementations must be callable from any thread. Functions that the
/// native API scopes to the calling thread (`current_context`, `make_current`)
/// keep that scoping.
pub trait NativeGl: Send + Sync {
    // --- Context Lifecycle ---

    /// Original `wglCreateLayerContext`.
    fn create_layer_context(&self, hdc: DeviceContext, plane: i32) -> Option<NativeContext>;

    /// Original `wglCreateContextAttribsARB`; `attribs` is zero-terminated.
    fn create_context_attribs(
        &self,
        hdc: DeviceContext,
        share: Option<NativeContext>,
        attribs: &[i32],
    ) -> Option<NativeContext>;

    /// Original `wglDeleteContext`.
    fn delete_context(&self, context: NativeContext) -> bool;

    /// Original `wglShareLists`.
    fn share_lists(&self, source: NativeContext, target: NativeContext) -> bool;

    /// Original `wglMakeCurrent`. `None` for both releases the calling thread's context.
    fn make_current(&self, hdc: Option<DeviceContext>, context: Option<NativeContext>) -> bool;

    /// Original `wglGetCurrentContext` for the calling thread.
    fn current_context(&self) -> Option<NativeContext>;

    /// Original `wglGetCurrentDC` for the calling thread.
    fn current_dc(&self) -> Option<DeviceContext>;

    /// `true` when the current context reaches GL `major.minor`.
    fn supports_version(&self, major: u32, minor: u32) -> bool;

    // --- Presentation ---

    /// Original `wglSwapBuffers`.
    fn swap_buffers(&self, hdc: DeviceContext) -> bool;

    // --- Pixel Formats & Pbuffers ---

    /// Original `wglChoosePixelFormat`; zero on failure.
    fn choose_pixel_format(&self, hdc: DeviceContext, descriptor: &PixelFormatDescriptor) -> i32;

    /// Original `wglGetPbufferDCARB`.
    fn get_pbuffer_dc(&self, pbuffer: PbufferHandle) -> Option<DeviceContext>;

    /// Original `wglReleasePbufferDCARB`.
    fn release_pbuffer_dc(&self, pbuffer: PbufferHandle, hdc: DeviceContext) -> bool;

    /// Original `wglGetProcAddress`.
    fn get_proc_address(&self, name: &str) -> Option<ProcAddress>;

    // --- Windowing ---

    /// The window a device context draws to, `None` once it is gone.
    fn window_from_dc(&self, hdc: DeviceContext) -> Option<WindowHandle>;

    /// `true` when the window class owns a private device context (`CS_OWNDC`).
    fn window_has_own_dc(&self, window: WindowHandle) -> bool;

    /// Client area size of a window.
    fn client_size(&self, window: WindowHandle) -> (u32, u32);

    /// Creates a hidden window with a GL-capable pixel format and returns its
    /// device context. Used to tear down contexts whose window is gone.
    fn create_fallback_dc(&self) -> Option<DeviceContext>;

    /// Destroys a window created by [`create_fallback_dc`](Self::create_fallback_dc).
    fn release_fallback_dc(&self, hdc: DeviceContext);

    /// `SetLastError`.
    fn set_last_error(&self, code: u32);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_print_in_hex() {
        assert_eq!(format!("{:?}", NativeContext(0x1f)), "NativeContext(0x1f)");
        assert_eq!(format!("{:?}", DeviceContext(16)), "DeviceContext(0x10)");
    }
}
