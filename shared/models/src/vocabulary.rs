//! Closed vocabularies shared by the domain models.
//!
//! Each vocabulary is a fieldless enum with a stable lowercase wire form used
//! both in CSV files and in the database.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {vocabulary} value '{value}', expected one of: {expected}")]
pub struct UnknownVariant {
    pub vocabulary: &'static str,
    pub value: String,
    pub expected: String,
}

/// Normalize free text before matching it against a vocabulary:
/// lowercase, trimmed, with spaces and hyphens folded to `_`.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident: $label:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const VALUES: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::vocabulary::UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match $crate::vocabulary::normalize_token(s).as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err($crate::vocabulary::UnknownVariant {
                        vocabulary: $label,
                        value: s.trim().to_string(),
                        expected: Self::VALUES.join(", "),
                    }),
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

pub(crate) use vocabulary;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("  En cours "), "en_cours");
        assert_eq!(normalize_token("EN-COURS"), "en_cours");
    }
}
