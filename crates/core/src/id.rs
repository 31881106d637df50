// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes

/// Characters used for generated id suffixes.
///
/// Lowercase alphanumerics only: ids become directory and branch names, which
/// must survive case-insensitive filesystems and git ref rules.
pub const ID_ALPHABET: [char; 36] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r',
    's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Length of the random part of a generated id
pub const ID_SUFFIX_LEN: usize = 16;

/// Define a prefixed string id backed by `SmolStr`.
///
/// Generated ids look like `{prefix}{16 random chars}`. Ids parsed from
/// strings are taken as-is. The type borrows and derefs as `str`, so maps
/// keyed by it can be queried with `&str`.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident($prefix:literal);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(smol_str::SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            /// Fresh random id.
            pub fn new() -> Self {
                let suffix = nanoid::format(
                    nanoid::rngs::default,
                    &$crate::id::ID_ALPHABET,
                    $crate::id::ID_SUFFIX_LEN,
                );
                Self(smol_str::format_smolstr!("{}{}", Self::PREFIX, suffix))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(smol_str::SmolStr::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(smol_str::SmolStr::from(s))
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }
    };
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
