//! Arena identifiers.
//!
//! Every declaration in the input graph and every node in the projected
//! type catalogue is addressed by a compact `u32` index. Identity of a
//! projected node is index equality, never structural comparison.

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize))]
        pub struct $name(pub u32);

        impl $name {
            /// Create an id from an arena index.
            pub fn new(index: usize) -> Self {
                Self(index as u32)
            }

            /// Get the index into the arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(
    /// A type declaration (scalar, literal, enum, union, collection, composite).
    TypeDeclId
);
arena_id!(
    /// A property declaration, owned by a composite or an operation.
    PropertyId
);
arena_id!(
    /// An operation declaration.
    OperationId
);
arena_id!(
    /// A namespace or interface.
    ContainerId
);
arena_id!(
    /// A node in the projected type catalogue.
    SdkTypeId
);

/// Reference to any input declaration.
///
/// Used as the key for scoped overrides and as the target of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DeclRef {
    Type(TypeDeclId),
    Property(PropertyId),
    Operation(OperationId),
    Container(ContainerId),
}

impl From<TypeDeclId> for DeclRef {
    fn from(id: TypeDeclId) -> Self {
        DeclRef::Type(id)
    }
}

impl From<PropertyId> for DeclRef {
    fn from(id: PropertyId) -> Self {
        DeclRef::Property(id)
    }
}

impl From<OperationId> for DeclRef {
    fn from(id: OperationId) -> Self {
        DeclRef::Operation(id)
    }
}

impl From<ContainerId> for DeclRef {
    fn from(id: ContainerId) -> Self {
        DeclRef::Container(id)
    }
}

impl std::fmt::Display for DeclRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclRef::Type(id) => id.fmt(f),
            DeclRef::Property(id) => id.fmt(f),
            DeclRef::Operation(id) => id.fmt(f),
            DeclRef::Container(id) => id.fmt(f),
        }
    }
}
