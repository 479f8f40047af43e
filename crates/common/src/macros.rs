/// Macros for newtypes over integers that travel as native JSON numbers.
pub(super) mod safe_u64 {

    /// Largest integer a JSON consumer can hold without precision loss,
    /// `2^53 - 1`.
    pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

    /// Generates `new`, `new_or_panic` and `get` methods, and `PartialEq`
    /// against `u64`.
    macro_rules! new_get_partialeq {
        ($target:ty) => {
            impl $target {
                pub const fn new(val: u64) -> Option<Self> {
                    if val <= $crate::macros::safe_u64::MAX_SAFE_INTEGER {
                        Some(Self(val))
                    } else {
                        None
                    }
                }

                pub const fn new_or_panic(val: u64) -> Self {
                    match Self::new(val) {
                        Some(x) => x,
                        None => panic!("Invalid constant"),
                    }
                }

                pub const fn get(&self) -> u64 {
                    self.0
                }
            }

            impl PartialEq<u64> for $target {
                fn eq(&self, other: &u64) -> bool {
                    self.0 == *other
                }
            }
        };
    }

    /// Generates a u64 alike serialization and a bounds checked
    /// deserialization.
    macro_rules! serdes {
        ($target:ty) => {
            impl serde::Serialize for $target {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: serde::Serializer,
                {
                    serializer.serialize_u64(self.0)
                }
            }

            impl<'de> serde::Deserialize<'de> for $target {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: serde::Deserializer<'de>,
                {
                    let raw = u64::deserialize(deserializer)?;
                    <$target>::new(raw).ok_or_else(|| {
                        serde::de::Error::invalid_value(
                            serde::de::Unexpected::Unsigned(raw),
                            &"an integer no larger than 2^53 - 1",
                        )
                    })
                }
            }
        };
    }

    pub(crate) use {new_get_partialeq, serdes};
}

/// Generates felt newtype-wrappers and the `macro_prelude` module.
///
/// Note that this is a single-use macro as it generates a module.
///
/// Usage:
///     `felt_newtypes!([x1, x2, ..]; [y1, y2, ..])`
/// where `x` is the set of `Felt` wrapper types and `y` the 251 bit wrappers.
macro_rules! felt_newtypes {
    ([$($felt:ident),* $(,)?]; [$($felt251:ident),* $(,)?]) => {
        crate::macros::felt_newtypes!(@define_felt $($felt),*);
        crate::macros::felt_newtypes!(@define_felt251 $($felt251),*);

        pub mod macro_prelude {
            pub use super::felt;

            crate::macros::felt_newtypes!(@generate_felt_macro $($felt),*);
            crate::macros::felt_newtypes!(@generate_felt251_macro $($felt251),*);

            crate::macros::felt_newtypes!(@generate_use $($felt),*);
            crate::macros::felt_newtypes!(@generate_use $($felt251),*);
        }
    };

    (@define_felt $head:ident, $($tail:ident),+ $(,)?) => {
        crate::macros::felt_newtypes!(@define_felt $head);
        crate::macros::felt_newtypes!(@define_felt $($tail),+);
    };

    (@define_felt $target:ident) => {
        #[derive(Copy, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, PartialOrd, Ord)]
        pub struct $target(pub $crate::Felt);

        #[allow(unused)]
        impl $target {
            pub const ZERO: Self = Self($crate::Felt::ZERO);

            pub fn as_inner(&self) -> &$crate::Felt {
                &self.0
            }
        }

        impl From<$crate::Felt> for $target {
            fn from(felt: $crate::Felt) -> Self {
                Self(felt)
            }
        }

        $crate::macros::fmt::thin_debug!($target);
        $crate::macros::fmt::thin_display!($target);
    };

    (@define_felt251 $head:ident, $($tail:ident),+ $(,)?) => {
        crate::macros::felt_newtypes!(@define_felt251 $head);
        crate::macros::felt_newtypes!(@define_felt251 $($tail),+);
    };

    (@define_felt251 $target:ident) => {
        #[derive(Copy, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, PartialOrd, Ord)]
        pub struct $target(pub $crate::Felt);

        $crate::macros::fmt::thin_debug!($target);
        $crate::macros::fmt::thin_display!($target);

        impl $target {
            pub const ZERO: Self = Self($crate::Felt::ZERO);

            pub fn as_inner(&self) -> &$crate::Felt {
                &self.0
            }

            pub const fn new(felt: $crate::Felt) -> Option<Self> {
                if felt.has_more_than_251_bits() {
                    None
                } else {
                    Some(Self(felt))
                }
            }

            pub const fn new_or_panic(felt: $crate::Felt) -> Self {
                match Self::new(felt) {
                    Some(value) => value,
                    None => panic!("Too many bits, addresses are limited to 251"),
                }
            }

            pub const fn get(&self) -> &$crate::Felt {
                &self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $target {
            fn deserialize<D>(de: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let felt = <$crate::Felt as serde::Deserialize>::deserialize(de)?;
                Self::new(felt).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($target), " exceeds 251 bits"))
                })
            }
        }
    };

    (@generate_use $head:ident, $($tail:ident),+ $(,)?) => {
        crate::macros::felt_newtypes!(@generate_use $head);
        crate::macros::felt_newtypes!(@generate_use $($tail),+);
    };

    (@generate_use $target:ident) => {
        paste::paste! {
            pub use [<$target:snake>];
        }
    };

    (@generate_felt_macro $head:ident, $($tail:ident),+ $(,)?) => {
        crate::macros::felt_newtypes!(@generate_felt_macro $head);
        crate::macros::felt_newtypes!(@generate_felt_macro $($tail),+);
    };

    (@generate_felt_macro $target:ident) => {
        paste::paste! {
            #[macro_export]
            macro_rules! [<$target:snake>] {
                ($hex:expr) => {
                    $target($crate::felt!($hex))
                };
            }
        }
    };

    (@generate_felt251_macro $head:ident, $($tail:ident),+ $(,)?) => {
        crate::macros::felt_newtypes!(@generate_felt251_macro $head);
        crate::macros::felt_newtypes!(@generate_felt251_macro $($tail),+);
    };

    (@generate_felt251_macro $target:ident) => {
        paste::paste! {
            #[macro_export]
            macro_rules! [<$target:snake>] {
                ($hex:expr) => {
                    $target::new_or_panic($crate::felt!($hex))
                };
            }
        }
    };
}
pub(super) use felt_newtypes;

pub(super) mod fmt {

    /// Adds a thin display implementation which uses the inner fields Display.
    macro_rules! thin_display {
        ($target:ty) => {
            impl std::fmt::Display for $target {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    std::fmt::Display::fmt(&self.0, f)
                }
            }
        };
    }

    /// Adds a thin Debug implementation, printing `X(Felt(0x1))` as `X(0x1)`.
    macro_rules! thin_debug {
        ($target:ty) => {
            impl std::fmt::Debug for $target {
                fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(fmt, "{}({})", stringify!($target), self.0)
                }
            }
        };
    }

    pub(crate) use {thin_debug, thin_display};
}

/// Creates a [Felt](crate::Felt) from a hex string literal verified at
/// compile time.
#[macro_export]
macro_rules! felt {
    ($hex:expr) => {{
        // Forces const evaluation, otherwise the parse would only happen at runtime.
        const CONST_FELT: $crate::Felt = match $crate::Felt::from_hex_str($hex) {
            Ok(f) => f,
            Err($crate::HexParseError::InvalidNibble(_)) => panic!("Invalid hex digit"),
            Err($crate::HexParseError::InvalidLength { .. }) => panic!("Too many hex digits"),
            Err($crate::HexParseError::Overflow) => panic!("Felt overflow"),
        };
        CONST_FELT
    }};
}

/// Creates a [Felt](crate::Felt) from a byte slice, failing at compile time
/// when used in const context with an invalid value.
#[macro_export]
macro_rules! felt_bytes {
    ($bytes:expr) => {{
        match $crate::Felt::from_be_slice($bytes) {
            Ok(felt) => felt,
            Err($crate::OverflowError) => panic!("Invalid constant: OverflowError"),
        }
    }};
}
