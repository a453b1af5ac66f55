//! Conversions for enums that travel over the wire as fixed strings.
//!
//! ```rust
//! use provider_mailgun_domain::impl_wire_enum;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Scheme {
//!     Http,
//!     Https,
//! }
//!
//! impl_wire_enum!(Scheme {
//!     Http => "http",
//!     Https => "https",
//! });
//!
//! assert_eq!(Scheme::Https.as_str(), "https");
//! assert_eq!("HTTP".parse::<Scheme>(), Ok(Scheme::Http));
//! ```

/// Generates `as_str`, `Display` and case-insensitive `FromStr`.
#[macro_export]
macro_rules! impl_wire_enum {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
