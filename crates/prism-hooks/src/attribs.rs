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

//! `wglCreateContextAttribsARB` attribute lists.

use crate::config::RegistryConfig;

/// `WGL_CONTEXT_MAJOR_VERSION_ARB`
pub const CONTEXT_MAJOR_VERSION: i32 = 0x2091;
/// `WGL_CONTEXT_MINOR_VERSION_ARB`
pub const CONTEXT_MINOR_VERSION: i32 = 0x2092;
/// `WGL_CONTEXT_LAYER_PLANE_ARB`
pub const CONTEXT_LAYER_PLANE: i32 = 0x2093;
/// `WGL_CONTEXT_FLAGS_ARB`
pub const CONTEXT_FLAGS: i32 = 0x2094;
/// `WGL_CONTEXT_PROFILE_MASK_ARB`
pub const CONTEXT_PROFILE_MASK: i32 = 0x9126;

/// `WGL_CONTEXT_DEBUG_BIT_ARB`
pub const CONTEXT_DEBUG_BIT: i32 = 0x1;
/// `WGL_CONTEXT_CORE_PROFILE_BIT_ARB`
pub const CONTEXT_CORE_PROFILE_BIT: i32 = 0x1;
/// `WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB`
pub const CONTEXT_COMPATIBILITY_PROFILE_BIT: i32 = 0x2;

/// A parsed context creation request.
///
/// Unrecognised attributes are kept in order and passed on unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextAttribs {
    /// Requested major version, 1 when absent.
    pub major: i32,
    /// Requested minor version, 0 when absent.
    pub minor: i32,
    /// Requested layer plane.
    pub layer_plane: i32,
    /// `WGL_CONTEXT_FLAGS_ARB` value.
    pub flags: i32,
    /// `true` for a compatibility profile, including every version below 3.2.
    pub compatibility: bool,
    entries: Vec<(i32, i32)>,
}

impl ContextAttribs {
    /// Parses name/value pairs up to the terminating zero name.
    pub fn parse(list: &[i32]) -> Self {
        let mut attribs = Self {
            major: 1,
            minor: 0,
            layer_plane: 0,
            flags: 0,
            compatibility: false,
            entries: Vec::new(),
        };
        for pair in list.chunks_exact(2) {
            let (name, value) = (pair[0], pair[1]);
            if name == 0 {
                break;
            }
            match name {
                CONTEXT_MAJOR_VERSION => attribs.major = value,
                CONTEXT_MINOR_VERSION => attribs.minor = value,
                CONTEXT_LAYER_PLANE => attribs.layer_plane = value,
                CONTEXT_FLAGS => attribs.flags = value,
                CONTEXT_PROFILE_MASK => {
                    attribs.compatibility = value & CONTEXT_COMPATIBILITY_PROFILE_BIT != 0
                }
                _ => {}
            }
            attribs.entries.push((name, value));
        }
        if attribs.version() < (3, 2) {
            attribs.compatibility = true;
        }
        attribs
    }

    /// The requested `(major, minor)` pair.
    pub fn version(&self) -> (i32, i32) {
        (self.major, self.minor)
    }

    /// `true` when the request sits below `config`'s version floor.
    pub fn below_floor(&self, config: &RegistryConfig) -> bool {
        self.version() < (config.min_major_version as i32, config.min_minor_version as i32)
    }

    /// Builds the zero-terminated list handed to the native call.
    ///
    /// The flags and profile mask are appended, the native side uses the last
    /// value of a repeated attribute. A request below the floor is raised to
    /// it with the compatibility profile when `config` allows upgrades.
    pub fn to_native(&self, config: &RegistryConfig) -> Vec<i32> {
        let mut flags = self.flags;
        if config.force_debug_context {
            flags |= CONTEXT_DEBUG_BIT;
        }
        let profile = if self.compatibility {
            CONTEXT_COMPATIBILITY_PROFILE_BIT
        } else {
            CONTEXT_CORE_PROFILE_BIT
        };

        let mut entries = self.entries.clone();
        entries.push((CONTEXT_FLAGS, flags));
        entries.push((CONTEXT_PROFILE_MASK, profile));

        if config.upgrade_legacy_requests && self.below_floor(config) {
            let (major, minor) = (config.min_major_version as i32, config.min_minor_version as i32);
            log::info!(
                "ContextRegistry: Replacing requested version {}.{} with {major}.{minor}",
                self.major,
                self.minor
            );
            entries.retain(|(name, _)| {
                !matches!(*name, CONTEXT_MAJOR_VERSION | CONTEXT_MINOR_VERSION | CONTEXT_PROFILE_MASK)
            });
            entries.push((CONTEXT_MAJOR_VERSION, major));
            entries.push((CONTEXT_MINOR_VERSION, minor));
            entries.push((CONTEXT_PROFILE_MASK, CONTEXT_COMPATIBILITY_PROFILE_BIT));
        }

        let mut list: Vec<i32> = entries.into_iter().flat_map(|(n, v)| [n, v]).collect();
        list.push(0);
        list
    }
}

/// Looks up the last value of `name` in a zero-terminated native list.
pub fn find_attrib(list: &[i32], name: i32) -> Option<i32> {
    list.chunks_exact(2)
        .take_while(|pair| pair[0] != 0)
        .filter(|pair| pair[0] == name)
        .map(|pair| pair[1])
        .last()
}
