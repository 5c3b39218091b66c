//! Enum-like settings that the control plane treats case-insensitively.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Raised when a string does not name a known variant.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown {kind} `{value}` (expected one of: {expected})")]
pub struct UnknownValue {
    /// Setting being parsed.
    pub kind: &'static str,
    /// Value supplied.
    pub value: String,
    /// Comma separated list of accepted spellings.
    pub expected: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Canonical spelling used on the wire.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text ),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                $(
                    if value.eq_ignore_ascii_case($text) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(UnknownValue {
                    kind: $kind,
                    value: value.to_owned(),
                    expected: [$($text),+].join(", "),
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_enum!(
    /// Pricing tier of the server.
    SkuTier, "sku tier" {
        /// Burstable entry tier.
        Basic => "Basic",
        /// Balanced compute and memory.
        #[default]
        GeneralPurpose => "GeneralPurpose",
        /// Memory heavy workloads.
        MemoryOptimized => "MemoryOptimized",
    }
);

string_enum!(
    /// Hardware generation backing the sku.
    SkuFamily, "sku family" {
        /// Fourth generation hosts.
        Gen4 => "Gen4",
        /// Fifth generation hosts.
        #[default]
        Gen5 => "Gen5",
    }
);

string_enum!(
    /// MySQL engine version.
    ServerVersion, "server version" {
        /// MySQL 5.6.
        FiveSix => "5.6",
        /// MySQL 5.7.
        #[default]
        FiveSeven => "5.7",
    }
);

string_enum!(
    /// Whether clients must connect over TLS.
    SslEnforcement, "ssl enforcement" {
        /// TLS required.
        #[default]
        Enabled => "Enabled",
        /// Plain connections allowed.
        Disabled => "Disabled",
    }
);

string_enum!(
    /// Whether backups are replicated to the paired region.
    GeoRedundantBackup, "geo-redundant backup" {
        /// Replicated backups.
        Enabled => "Enabled",
        /// Local backups only.
        #[default]
        Disabled => "Disabled",
    }
);

string_enum!(
    /// How a new server is initialised.
    CreateMode, "create mode" {
        /// Empty server.
        #[default]
        Default => "Default",
        /// Restore from another server's backup.
        PointInTimeRestore => "PointInTimeRestore",
    }
);
