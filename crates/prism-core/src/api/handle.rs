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

//! Opaque handles naming device objects.
//!
//! Every handle is a 64-bit value whose meaning is private to the device that
//! issued it. Zero is reserved as the "none" sentinel, and a device never hands
//! out the same value twice while the object is alive.

use serde::{Deserialize, Serialize};

macro_rules! define_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// The invalid sentinel.
            pub const NONE: Self = Self(0);

            /// `true` for the zero sentinel.
            pub const fn is_none(self) -> bool {
                self.0 == 0
            }

            /// `true` for any non-zero handle.
            pub const fn is_some(self) -> bool {
                self.0 != 0
            }

            /// The raw 64-bit value.
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

define_handle!(
    /// A sampler state object.
    SamplerHandle
);
define_handle!(
    /// A buffer or texture.
    ResourceHandle
);
define_handle!(
    /// A typed window onto a [`ResourceHandle`].
    ResourceViewHandle
);
define_handle!(
    /// A graphics or compute pipeline.
    PipelineHandle
);
define_handle!(
    /// The binding shape a pipeline expects.
    PipelineLayoutHandle
);
define_handle!(
    /// The shape of one descriptor set.
    DescriptorSetLayoutHandle
);
define_handle!(
    /// A concrete set of descriptors conforming to a layout.
    DescriptorSetHandle
);
define_handle!(
    /// A fixed-size array of queries of one type.
    QueryPoolHandle
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_the_none_sentinel() {
        assert!(ResourceHandle::NONE.is_none());
        assert!(ResourceHandle::default().is_none());
        assert!(SamplerHandle(3).is_some());
        assert_eq!(QueryPoolHandle(0xdead).raw(), 0xdead);
    }
}
