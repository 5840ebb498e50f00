use formc_interchange::InterchangeError;

/// A compilation error. Every failure is fatal to the whole call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("presentation targets bundle {presentation} but the bundle digest is {bundle}")]
    PresentationBundleMismatch { presentation: String, bundle: String },

    #[error(
        "attribute '{attribute}' is a referencing attribute, but the referenced bundle {digest} is not loaded"
    )]
    UnresolvedReference { attribute: String, digest: String },

    #[error("unsupported attribute type {attr_type} for attribute '{attribute}'")]
    UnsupportedAttributeType {
        attribute: String,
        attr_type: String,
    },

    #[error("attribute '{attribute}' not found in bundle {bundle}")]
    AttributeNotFound { attribute: String, bundle: String },

    #[error("page '{page}' {detail}")]
    ConflictingPageAddressing { page: String, detail: String },

    #[error("nested page declares none of 'n', 'nr' or 'ns'")]
    UnnamedPage,

    #[error(
        "list '{attribute}' has identifier format {found}; possible values are 'uuid', 'bigint'"
    )]
    InvalidListIdentifierFormat { attribute: String, found: String },

    #[error("referenced bundle for attribute '{attribute}' of bundle {bundle} not found")]
    MissingDependencyForFind { attribute: String, bundle: String },

    #[error("reference cycle detected: {}", .cycle.join(" \u{2192} "))]
    CyclicReference { cycle: Vec<String> },

    #[error("page '{attribute}' embeds a reference, but the attribute type is {attr_type}")]
    NotAReference {
        attribute: String,
        attr_type: String,
    },

    #[error(transparent)]
    Interchange(#[from] InterchangeError),
}

impl CompileError {
    /// Stable kind name, used in machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            CompileError::PresentationBundleMismatch { .. } => "PresentationBundleMismatch",
            CompileError::UnresolvedReference { .. } => "UnresolvedReference",
            CompileError::UnsupportedAttributeType { .. } => "UnsupportedAttributeType",
            CompileError::AttributeNotFound { .. } => "AttributeNotFound",
            CompileError::ConflictingPageAddressing { .. } => "ConflictingPageAddressing",
            CompileError::UnnamedPage => "UnnamedPage",
            CompileError::InvalidListIdentifierFormat { .. } => "InvalidListIdentifierFormat",
            CompileError::MissingDependencyForFind { .. } => "MissingDependencyForFind",
            CompileError::CyclicReference { .. } => "CyclicReference",
            CompileError::NotAReference { .. } => "NotAReference",
            CompileError::Interchange(_) => "Interchange",
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "kind":    self.kind(),
            "message": self.to_string(),
        })
    }
}
