//! Projection options

use smol_str::SmolStr;

/// Which service version the projection targets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ApiVersionSelection {
    /// The newest declared version.
    #[default]
    Latest,
    /// Keep operations of every version; defaults still use the newest.
    All,
    Specific(SmolStr),
}

/// Options for one projection run
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "camelCase"))]
pub struct ProjectionOptions {
    /// Emitter language scope for scoped customizations (`None` = all scopes only)
    pub scope: Option<SmolStr>,
    /// Force resource-manager conventions on or off (`None` = take from the service)
    pub arm: Option<bool>,
    /// Do not push usage and access from a subtype to its base
    pub disable_usage_access_propagation_to_base: bool,
    pub api_version: ApiVersionSelection,
    /// Project unions of string literals (and `string`) as enums
    pub flatten_union_as_enum: bool,
    /// Default for operations without a protocol API customization
    pub generate_protocol_methods: bool,
    /// Default for operations without a convenient API customization
    pub generate_convenience_methods: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            scope: None,
            arm: None,
            disable_usage_access_propagation_to_base: false,
            api_version: ApiVersionSelection::Latest,
            flatten_union_as_enum: true,
            generate_protocol_methods: true,
            generate_convenience_methods: true,
        }
    }
}

impl ProjectionOptions {
    pub fn with_scope(mut self, scope: impl Into<SmolStr>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_arm(mut self, arm: bool) -> Self {
        self.arm = Some(arm);
        self
    }

    pub fn with_api_version(mut self, selection: ApiVersionSelection) -> Self {
        self.api_version = selection;
        self
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Pick the version to default to from versions ordered oldest first.
    pub fn selected_version<'a>(&'a self, versions: &'a [SmolStr]) -> Option<&'a SmolStr> {
        match &self.api_version {
            ApiVersionSelection::Specific(v) if versions.contains(v) => Some(v),
            _ => versions.last(),
        }
    }
}
