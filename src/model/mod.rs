//! The generator-ready client model.
//!
//! ```text
//! SdkPackage
//! ├── clients: Vec<SdkClient>          (tree: children, methods, initialization)
//! ├── catalogue: TypeCatalogue         (arena of SdkType, SdkTypeId identity)
//! ├── models / enums / unions          (ids of reachable named types)
//! └── diagnostics
//! ```

mod catalogue;
mod client;
mod method;
mod package;
mod property;
mod types;

pub use catalogue::TypeCatalogue;
pub use client::{ClientInitialization, SdkClient};
pub use method::{
    LinkLocation, LroLink, LroMetadata, MethodKind, MonitorProperty, OperationLink, OperationRef,
    PagingMetadata, PropertyMapping, SdkHttpOperation, SdkHttpResponse, SdkMethod,
    SdkMethodResponse, SdkResponseHeader, ServiceMethod, SourceKind, StatusMonitorMetadata,
    TerminalStates,
};
pub use package::SdkPackage;
pub use property::{ParamRef, PropertyKind, SdkProperty};
pub use types::{
    BuiltinKind, SdkBuiltin, SdkConstant, SdkCredential, SdkEndpoint, SdkEnum, SdkEnumValue,
    SdkModel, SdkType, SdkTypeKind, SdkUnion,
};
