//! Domain models for GymDesk.
//!
//! Plain records mirrored from storage tables. Every tenant-scoped entity
//! carries the `unit_id` of the gym location that owns it.

/// Declares a fieldless enum persisted as its variant name.
///
/// Generates `as_str`, `FromStr` (unknown names are a validation error)
/// and an `ALL` slice in declaration order. Defined ahead of the module
/// declarations so every model file sees it in textual scope.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::error::GymError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err($crate::error::GymError::validation(format!(
                        "unknown {} value: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub mod activity;
pub mod appointment;
pub mod assessment;
pub mod automation;
pub mod chat;
pub mod check_in;
pub mod contract;
pub mod invoice;
pub mod lead;
pub mod plan;
pub mod session;
pub mod staff;
pub mod unit;
pub mod workout;
