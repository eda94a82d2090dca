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

mod common;

use common::{FakeNative, SoftFactory};
use prism_core::EffectRuntime;
use prism_hooks::attribs::{
    find_attrib, CONTEXT_COMPATIBILITY_PROFILE_BIT, CONTEXT_CORE_PROFILE_BIT, CONTEXT_MAJOR_VERSION,
    CONTEXT_MINOR_VERSION, CONTEXT_PROFILE_MASK,
};
use prism_hooks::native::ERROR_INVALID_PARAMETER;
use prism_hooks::pixel_format::PixelFormatDescriptor;
use prism_hooks::{ContextRegistry, NativeContext, PbufferHandle, RegistryConfig};
use std::sync::Arc;
use std::thread;

type Registry = ContextRegistry<FakeNative, SoftFactory>;

fn registry() -> Registry {
    registry_with(SoftFactory::default())
}

fn registry_with(factory: SoftFactory) -> Registry {
    let config = RegistryConfig {
        force_debug_context: false,
        ..RegistryConfig::default()
    };
    ContextRegistry::new(FakeNative::default(), factory, config)
}

const CORE_4_5: [i32; 7] = [
    CONTEXT_MAJOR_VERSION,
    4,
    CONTEXT_MINOR_VERSION,
    5,
    CONTEXT_PROFILE_MASK,
    CONTEXT_CORE_PROFILE_BIT,
    0,
];

fn create(registry: &Registry, share: Option<NativeContext>) -> NativeContext {
    let hdc = registry.native().add_window(640, 480);
    registry
        .create_context_attribs(hdc, share, &CORE_4_5)
        .expect("context creation should succeed")
}

#[test]
fn test_first_activation_creates_a_runtime_initialised_on_present() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(800, 600);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    assert_eq!(registry.runtime_count(), 0, "Runtimes are created lazily");

    // --- 2. ACT ---
    assert!(registry.make_current(Some(hdc), Some(context)));
    let runtime = registry.current_runtime().expect("the thread should be bound");
    let size_before_present = runtime.lock().unwrap().get_frame_width_and_height();
    assert!(registry.swap_buffers(hdc));

    // --- 3. ASSERT ---
    assert_eq!(size_before_present, (0, 0));
    let runtime = runtime.lock().unwrap();
    assert_eq!(runtime.get_frame_width_and_height(), (800, 600));
    assert_eq!(runtime.frame_count(), 1);
    assert_eq!(registry.native().swaps(), vec![hdc]);
    assert_eq!(registry.device_contexts_of(context), vec![hdc]);
    assert_eq!(registry.current_device_context(), Some(hdc));
}

#[test]
fn test_resized_window_reinitialises_the_runtime_before_present() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(800, 600);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    registry.make_current(Some(hdc), Some(context));
    registry.swap_buffers(hdc);
    let runtime = registry.current_runtime().unwrap();
    let events = runtime.lock().unwrap().events().receiver().clone();
    while events.try_recv().is_ok() {}

    // --- 2. ACT ---
    registry.native().resize(hdc, 1024, 768);
    registry.swap_buffers(hdc);

    // --- 3. ASSERT ---
    assert_eq!(runtime.lock().unwrap().get_frame_width_and_height(), (1024, 768));
    let received: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).collect();
    assert_eq!(
        received,
        vec![
            prism_infra::RuntimeEvent::Reset,
            prism_infra::RuntimeEvent::Initialized {
                width: 1024,
                height: 768
            },
            prism_infra::RuntimeEvent::Presented { frame: 2 },
        ],
        "Teardown and reinit must happen before the present notification"
    );
}

#[test]
fn test_minimised_window_resets_without_reinitialising() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(320, 200);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    registry.make_current(Some(hdc), Some(context));
    registry.swap_buffers(hdc);

    // --- 2. ACT ---
    registry.native().resize(hdc, 0, 0);
    let swapped = registry.swap_buffers(hdc);

    // --- 3. ASSERT ---
    assert!(swapped, "The native swap proceeds regardless");
    let runtime = registry.current_runtime().unwrap();
    assert!(!runtime.lock().unwrap().is_initialized());
    assert_eq!(registry.native().swaps().len(), 2);
}

#[test]
fn test_sharing_chain_survives_destruction_of_a_middle_link() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let a = create(&registry, None);
    let b = create(&registry, Some(a));
    let c = create(&registry, Some(b));
    let hdc = registry.native().add_window(640, 480);

    // --- 2. ACT ---
    registry.make_current(Some(hdc), Some(c));
    let root_before = registry.resolve_root(c);
    let runtime = registry.runtime_for(c).unwrap();
    registry.make_current(None, None);
    assert!(registry.delete_context(b));

    // --- 3. ASSERT ---
    assert_eq!(root_before, Some(a));
    assert_eq!(registry.resolve_root(c), Some(a), "C must still resolve to A");
    assert!(
        Arc::ptr_eq(&registry.runtime_for(a).unwrap(), &runtime),
        "The runtime is keyed by the group root"
    );
    assert!(Arc::ptr_eq(&registry.runtime_for(c).unwrap(), &runtime));
    assert_eq!(registry.resolve_root(b), None);
}

#[test]
fn test_deleting_the_root_promotes_the_next_member() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let a = create(&registry, None);
    let b = create(&registry, Some(a));
    let hdc = registry.native().add_window(640, 480);
    registry.make_current(Some(hdc), Some(b));
    assert_eq!(registry.runtime_count(), 1);

    // --- 2. ACT ---
    registry.make_current(None, None);
    registry.delete_context(a);
    registry.make_current(Some(hdc), Some(b));

    // --- 3. ASSERT ---
    assert_eq!(registry.resolve_root(b), Some(b));
    assert_eq!(registry.runtime_count(), 1, "A new runtime is keyed by the promoted member");
    assert_eq!(registry.device_contexts_of(b), vec![hdc]);
}

#[test]
fn test_share_lists_redirects_to_the_first_created_runtime() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let (hdc_a, hdc_b) = (
        registry.native().add_window(640, 480),
        registry.native().add_window(320, 240),
    );
    let a = registry.create_context_attribs(hdc_a, None, &CORE_4_5).unwrap();
    let b = registry.create_context_attribs(hdc_b, None, &CORE_4_5).unwrap();
    registry.make_current(Some(hdc_a), Some(a));
    registry.make_current(Some(hdc_b), Some(b));
    let runtime_a = registry.runtime_for(a).unwrap();
    let runtime_b = registry.runtime_for(b).unwrap();

    // --- 2. ACT ---
    assert!(registry.share_lists(a, b));
    registry.make_current(Some(hdc_b), Some(b));

    // --- 3. ASSERT ---
    assert!(Arc::ptr_eq(&registry.current_runtime().unwrap(), &runtime_a));
    assert_eq!(registry.runtime_count(), 2, "B's runtime is redirected, not deleted");
    assert_eq!(registry.device_contexts_of(a), vec![hdc_a, hdc_b]);

    registry.make_current(None, None);
    registry.delete_context(a);
    registry.make_current(Some(hdc_b), Some(b));
    assert!(Arc::ptr_eq(&registry.current_runtime().unwrap(), &runtime_b));
}

#[test]
fn test_failed_construction_is_not_retried_for_the_same_context() {
    // --- 1. ARRANGE ---
    let registry = registry_with(SoftFactory::failing());
    let hdc = registry.native().add_window(640, 480);
    let first = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    let second = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();

    // --- 2. ACT ---
    let results = [
        registry.make_current(Some(hdc), Some(first)),
        registry.make_current(Some(hdc), Some(second)),
        registry.make_current(Some(hdc), Some(first)),
        registry.make_current(Some(hdc), Some(first)),
    ];

    // --- 3. ASSERT ---
    assert_eq!(results, [true; 4], "Native activation is never blocked");
    assert_eq!(
        registry.factory().attempts(),
        2,
        "One attempt per context, the failure is cached per handle"
    );
    assert!(registry.is_failed(first));
    assert!(registry.is_failed(second));
    assert!(registry.current_runtime().is_none());
}

#[test]
fn test_contexts_below_the_capability_floor_stay_unaugmented() {
    // --- 1. ARRANGE ---
    let registry = registry();
    registry.native().set_supported_version(3, 3);
    let hdc = registry.native().add_window(640, 480);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();

    // --- 2. ACT ---
    let made_current = registry.make_current(Some(hdc), Some(context));
    registry.make_current(Some(hdc), Some(context));

    // --- 3. ASSERT ---
    assert!(made_current);
    assert_eq!(registry.factory().attempts(), 0);
    assert!(registry.is_failed(context));
    assert!(registry.current_runtime().is_none());
    assert!(registry.swap_buffers(hdc), "Presentation passes through");
}

#[test]
fn test_offscreen_device_contexts_get_no_runtime() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let window_dc = registry.native().add_window(640, 480);
    let context = registry.create_context_attribs(window_dc, None, &CORE_4_5).unwrap();
    let pbuffer_dc = registry.get_pbuffer_dc(PbufferHandle(0x77)).unwrap();
    let memory_dc = registry.native().add_memory_dc();

    // --- 2. ACT ---
    registry.make_current(Some(pbuffer_dc), Some(context));
    let on_pbuffer = registry.current_runtime().is_some();
    registry.make_current(Some(memory_dc), Some(context));
    let on_memory = registry.current_runtime().is_some();
    registry.make_current(Some(window_dc), Some(context));

    // --- 3. ASSERT ---
    assert!(!on_pbuffer);
    assert!(!on_memory);
    assert!(!registry.is_failed(context), "Skipped activations are not failures");
    assert!(registry.current_runtime().is_some());
    assert!(registry.release_pbuffer_dc(PbufferHandle(0x77), pbuffer_dc));
}

#[test]
fn test_deleting_the_current_context_tears_its_runtime_down() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(800, 600);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    registry.make_current(Some(hdc), Some(context));
    registry.swap_buffers(hdc);
    let runtime = registry.current_runtime().unwrap();

    // --- 2. ACT ---
    let deleted = registry.delete_context(context);

    // --- 3. ASSERT ---
    assert!(deleted);
    assert!(!runtime.lock().unwrap().is_initialized(), "GPU resources go before the context");
    assert!(registry.current_runtime().is_none());
    assert_eq!(registry.runtime_count(), 0);
    assert!(!registry.native().is_alive(context));
    assert_eq!(registry.native().fallbacks_created(), 0);
}

#[test]
fn test_deleting_a_context_whose_window_is_gone_uses_a_fallback_surface() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(800, 600);
    let other_dc = registry.native().add_window(100, 100);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    let other = registry.create_context_attribs(other_dc, None, &CORE_4_5).unwrap();
    registry.make_current(Some(hdc), Some(context));
    registry.swap_buffers(hdc);
    let runtime = registry.current_runtime().unwrap();
    registry.make_current(Some(other_dc), Some(other));
    registry.native().destroy_window(hdc);

    // --- 2. ACT ---
    registry.delete_context(context);

    // --- 3. ASSERT ---
    assert!(!runtime.lock().unwrap().is_initialized());
    assert_eq!(registry.native().fallbacks_created(), 1);
    assert_eq!(registry.native().live_fallbacks(), 0, "The fallback window is released");
    assert!(
        Arc::ptr_eq(&registry.current_runtime().unwrap(), &registry.runtime_for(other).unwrap()),
        "The previous binding is restored"
    );
}

#[test]
fn test_current_runtime_is_tracked_per_thread() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let main_dc = registry.native().add_window(640, 480);
    let main_context = registry.create_context_attribs(main_dc, None, &CORE_4_5).unwrap();
    let worker_dc = registry.native().add_window(320, 240);
    let worker_context = registry.create_context_attribs(worker_dc, None, &CORE_4_5).unwrap();
    registry.make_current(Some(main_dc), Some(main_context));

    // --- 2. ACT ---
    let (unbound_at_start, bound_after) = thread::scope(|scope| {
        scope
            .spawn(|| {
                let unbound = registry.current_runtime().is_none();
                registry.make_current(Some(worker_dc), Some(worker_context));
                let bound = registry.current_runtime().map(|r| Arc::as_ptr(&r) as usize);
                (unbound, bound)
            })
            .join()
            .expect("worker thread panicked")
    });

    // --- 3. ASSERT ---
    assert!(unbound_at_start, "A new thread starts without a runtime");
    let main_runtime = registry.current_runtime().unwrap();
    assert_eq!(
        bound_after,
        registry.runtime_for(worker_context).map(|r| Arc::as_ptr(&r) as usize)
    );
    assert!(Arc::ptr_eq(&main_runtime, &registry.runtime_for(main_context).unwrap()));
    assert_eq!(registry.runtime_count(), 2);
}

#[test]
fn test_bindings_of_exited_threads_go_with_their_context() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(640, 480);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    thread::scope(|scope| {
        scope
            .spawn(|| registry.make_current(Some(hdc), Some(context)))
            .join()
            .expect("worker thread panicked")
    });
    assert_eq!(
        registry.bound_thread_count(),
        1,
        "An exited thread keeps its binding until the context goes"
    );

    // --- 2. ACT ---
    assert!(registry.delete_context(context));

    // --- 3. ASSERT ---
    assert_eq!(registry.bound_thread_count(), 0);
    assert_eq!(registry.runtime_count(), 0);
}

#[test]
fn test_legacy_contexts_drive_compatibility_runtimes() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(640, 480);

    // --- 2. ACT ---
    let context = registry.create_context(hdc).unwrap();
    registry.make_current(Some(hdc), Some(context));

    // --- 3. ASSERT ---
    assert!(registry.is_legacy(context));
    let runtime = registry.current_runtime().unwrap();
    assert!(runtime.lock().unwrap().is_compatibility_context());
}

#[test]
fn test_old_version_requests_are_upgraded_to_the_floor() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(640, 480);
    let request = [
        CONTEXT_MAJOR_VERSION,
        3,
        CONTEXT_MINOR_VERSION,
        3,
        CONTEXT_PROFILE_MASK,
        CONTEXT_CORE_PROFILE_BIT,
        0,
    ];

    // --- 2. ACT ---
    registry.create_context_attribs(hdc, None, &request).unwrap();

    // --- 3. ASSERT ---
    let sent = registry.native().last_attribs();
    assert_eq!(find_attrib(&sent, CONTEXT_MAJOR_VERSION), Some(4));
    assert_eq!(find_attrib(&sent, CONTEXT_MINOR_VERSION), Some(3));
    assert_eq!(
        find_attrib(&sent, CONTEXT_PROFILE_MASK),
        Some(CONTEXT_COMPATIBILITY_PROFILE_BIT)
    );
}

#[test]
fn test_layer_planes_are_rejected_with_invalid_parameter() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(640, 480);

    // --- 2. ACT ---
    let context = registry.create_layer_context(hdc, 1);
    let swapped = registry.swap_layer_buffers(hdc, 0x2);

    // --- 3. ASSERT ---
    assert!(context.is_none());
    assert!(!swapped);
    assert_eq!(registry.native().last_error(), ERROR_INVALID_PARAMETER);
    assert!(registry.native().swaps().is_empty());
    assert!(registry.swap_layer_buffers(hdc, 0x1), "The main plane swaps normally");
}

#[test]
fn test_layered_pixel_formats_are_refused() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(640, 480);
    let overlay = PixelFormatDescriptor {
        reserved: 0x1,
        ..PixelFormatDescriptor::window(32, 24, 8)
    };

    // --- 2. ACT ---
    let refused = registry.choose_pixel_format(hdc, &overlay);
    let accepted = registry.choose_pixel_format(hdc, &PixelFormatDescriptor::window(32, 24, 8));

    // --- 3. ASSERT ---
    assert_eq!(refused, 0);
    assert_eq!(registry.native().last_error(), ERROR_INVALID_PARAMETER);
    assert_eq!(accepted, 7);
}

#[test]
fn test_extension_entry_points_resolve_to_core_names() {
    // --- 1. ARRANGE ---
    let registry = registry();

    // --- 2. ACT ---
    let framebuffer = registry.get_proc_address("glBindFramebufferEXT");
    registry.get_proc_address("glClear");

    // --- 3. ASSERT ---
    assert!(framebuffer.is_some());
    assert_eq!(registry.native().lookups(), vec!["glBindFramebuffer", "glClear"]);
}

#[test]
fn test_swap_multiple_buffers_presents_each_surface() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let first = registry.native().add_window(64, 64);
    let second = registry.native().add_window(64, 64);

    // --- 2. ACT ---
    let result = registry.swap_multiple_buffers(&[first, second]);

    // --- 3. ASSERT ---
    assert_eq!(result, 0);
    assert_eq!(registry.native().swaps(), vec![first, second]);
}

#[test]
fn test_shutdown_resets_every_runtime() {
    // --- 1. ARRANGE ---
    let registry = registry();
    let hdc = registry.native().add_window(640, 480);
    let context = registry.create_context_attribs(hdc, None, &CORE_4_5).unwrap();
    registry.make_current(Some(hdc), Some(context));
    registry.swap_buffers(hdc);
    let runtime = registry.current_runtime().unwrap();

    // --- 2. ACT ---
    registry.shutdown();

    // --- 3. ASSERT ---
    assert!(!runtime.lock().unwrap().is_initialized());
    assert_eq!(registry.runtime_count(), 0);
    assert!(registry.current_runtime().is_none());
    assert_eq!(registry.resolve_root(context), None);
}
