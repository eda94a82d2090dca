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

//! Declarative macro generating strongly typed bit sets.
//!
//! The generated type wraps the raw integer, exposes every declared flag as an
//! associated constant and implements the usual set operators. Undeclared bits
//! are preserved so values coming from native code survive a round trip.

#[macro_export]
#[doc(hidden)]
macro_rules! prism_bitflags {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident: $ty:ty {
            $(
                $(#[$flag_attr:meta])*
                const $flag_name:ident = $flag_value:expr;
            )*
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name {
            bits: $ty,
        }

        impl $name {
            /// The set with no flag raised.
            pub const EMPTY: Self = Self { bits: 0 };

            $(
                $(#[$flag_attr])*
                pub const $flag_name: Self = Self { bits: $flag_value };
            )*

            /// Wraps raw bits, keeping bits that match no declared flag.
            pub const fn from_bits_retain(bits: $ty) -> Self {
                Self { bits }
            }

            /// The raw integer value.
            pub const fn bits(self) -> $ty {
                self.bits
            }

            /// `true` when no bit is set.
            pub const fn is_empty(self) -> bool {
                self.bits == 0
            }

            /// `true` when every bit of `other` is set in `self`.
            pub const fn contains(self, other: Self) -> bool {
                self.bits & other.bits == other.bits
            }

            /// `true` when `self` and `other` share at least one bit.
            pub const fn intersects(self, other: Self) -> bool {
                self.bits & other.bits != 0
            }

            /// Raises the bits of `other`.
            pub fn insert(&mut self, other: Self) {
                self.bits |= other.bits;
            }

            /// Clears the bits of `other`.
            pub fn remove(&mut self, other: Self) {
                self.bits &= !other.bits;
            }

            /// Copy of `self` with the bits of `other` raised.
            #[must_use]
            pub const fn union(self, other: Self) -> Self {
                Self { bits: self.bits | other.bits }
            }

            /// Copy of `self` with the bits of `other` cleared.
            #[must_use]
            pub const fn difference(self, other: Self) -> Self {
                Self { bits: self.bits & !other.bits }
            }

            /// Number of bits set.
            pub const fn count(self) -> u32 {
                self.bits.count_ones()
            }
        }

        impl core::ops::BitOr for $name {
            type Output = Self;
            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl core::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.insert(rhs);
            }
        }

        impl core::ops::BitAnd for $name {
            type Output = Self;
            fn bitand(self, rhs: Self) -> Self {
                Self { bits: self.bits & rhs.bits }
            }
        }

        impl core::ops::BitAndAssign for $name {
            fn bitand_assign(&mut self, rhs: Self) {
                self.bits &= rhs.bits;
            }
        }

        impl core::ops::Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                self.difference(rhs)
            }
        }

        impl core::ops::Not for $name {
            type Output = Self;
            fn not(self) -> Self {
                Self { bits: !self.bits }
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                if self.bits == 0 {
                    return write!(f, "{}(EMPTY)", stringify!($name));
                }
                let mut rest = self.bits;
                let mut sep = "";
                write!(f, "{}(", stringify!($name))?;
                $(
                    let flag: $ty = $flag_value;
                    if flag != 0 && rest & flag == flag {
                        write!(f, "{}{}", sep, stringify!($flag_name))?;
                        rest &= !flag;
                        sep = " | ";
                    }
                )*
                if rest != 0 {
                    write!(f, "{}{:#x}", sep, rest)?;
                }
                write!(f, ")")
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::prism_bitflags! {
        struct Access: u32 {
            const READ = 1 << 0;
            const WRITE = 1 << 1;
            const READ_WRITE = (1 << 0) | (1 << 1);
            const EXEC = 1 << 4;
        }
    }

    #[test]
    fn combined_flag_contains_its_parts() {
        let rw = Access::READ_WRITE;
        assert!(rw.contains(Access::READ));
        assert!(rw.contains(Access::WRITE));
        assert!(!rw.contains(Access::EXEC));
        assert_eq!(rw.count(), 2);
    }

    #[test]
    fn insert_remove_and_operators_agree() {
        let mut flags = Access::EMPTY;
        flags.insert(Access::EXEC);
        flags |= Access::READ;
        assert_eq!(flags, Access::EXEC | Access::READ);

        flags.remove(Access::EXEC);
        assert_eq!(flags, Access::READ);
        flags.remove(Access::READ);
        assert!(flags.is_empty());
        assert!(!Access::from_bits_retain(0x100).is_empty(), "Undeclared bits count");
        assert_eq!((Access::READ_WRITE - Access::WRITE), Access::READ);
        assert!(!(Access::READ & Access::WRITE).intersects(Access::READ_WRITE));
    }

    #[test]
    fn unknown_bits_are_retained_and_printed() {
        let raw = Access::from_bits_retain(0x101);
        assert_eq!(raw.bits(), 0x101);
        assert_eq!(format!("{raw:?}"), "Access(READ | 0x100)");
        assert_eq!(format!("{:?}", Access::EMPTY), "Access(EMPTY)");
    }

    #[test]
    fn debug_lists_single_flags_before_combinations() {
        let both = Access::READ | Access::WRITE;
        assert_eq!(both, Access::READ_WRITE);
        assert_eq!(format!("{both:?}"), "Access(READ | WRITE)");
    }
}
