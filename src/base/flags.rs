//! Small bitsets and enums shared by the input graph and the projected model.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

// ============================================================================
// USAGE
// ============================================================================

/// How a projected type is used by the operations that reach it.
///
/// Bits only ever accumulate during propagation; nothing clears them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct UsageFlags(u32);

impl UsageFlags {
    pub const NONE: Self = Self(0);
    pub const INPUT: Self = Self(1 << 1);
    pub const OUTPUT: Self = Self(1 << 2);
    pub const API_VERSION_ENUM: Self = Self(1 << 3);
    pub const JSON_MERGE_PATCH: Self = Self(1 << 4);
    pub const MULTIPART_FORM_DATA: Self = Self(1 << 5);
    /// The type is an anonymous body assembled from spread parameters.
    /// Never propagated to referenced types.
    pub const SPREAD: Self = Self(1 << 6);
    pub const EXCEPTION: Self = Self(1 << 7);
    pub const JSON: Self = Self(1 << 8);
    pub const XML: Self = Self(1 << 9);

    const NAMES: [(Self, &'static str); 9] = [
        (Self::INPUT, "Input"),
        (Self::OUTPUT, "Output"),
        (Self::API_VERSION_ENUM, "ApiVersionEnum"),
        (Self::JSON_MERGE_PATCH, "JsonMergePatch"),
        (Self::MULTIPART_FORM_DATA, "MultipartFormData"),
        (Self::SPREAD, "Spread"),
        (Self::EXCEPTION, "Exception"),
        (Self::JSON, "Json"),
        (Self::XML, "Xml"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// The bits that flow onward to referenced types.
    pub const fn propagated(self) -> Self {
        self.difference(Self::SPREAD)
    }
}

impl BitOr for UsageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for UsageFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for UsageFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Debug for UsageFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("UsageFlags(None)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "UsageFlags({})", names.join(" | "))
    }
}

// ============================================================================
// ACCESS
// ============================================================================

/// Visibility of a projected method or type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Access {
    #[default]
    Public,
    Internal,
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// How a client may be constructed: directly, through its parent, or both.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct InitializedBy(u8);

impl InitializedBy {
    pub const INDIVIDUALLY: Self = Self(1 << 0);
    pub const PARENT: Self = Self(1 << 1);
    pub const BOTH: Self = Self(Self::INDIVIDUALLY.0 | Self::PARENT.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Build from raw bits. Returns `None` for the empty set or unknown bits.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits == 0 || bits & !Self::BOTH.0 != 0 {
            None
        } else {
            Some(Self(bits))
        }
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn individually(self) -> bool {
        self.contains(Self::INDIVIDUALLY)
    }

    pub const fn by_parent(self) -> bool {
        self.contains(Self::PARENT)
    }
}

impl BitOr for InitializedBy {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for InitializedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.individually(), self.by_parent()) {
            (true, true) => f.write_str("InitializedBy(Individually | Parent)"),
            (true, false) => f.write_str("InitializedBy(Individually)"),
            (false, true) => f.write_str("InitializedBy(Parent)"),
            (false, false) => f.write_str("InitializedBy(None)"),
        }
    }
}
