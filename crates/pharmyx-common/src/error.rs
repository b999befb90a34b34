use thiserror::Error;

/// Rejections of the caller's request. These are the only conditions that
/// abort an analysis; data gaps are carried in the result instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("No VCF file uploaded")]
    MissingVcf,

    #[error("Drug name required")]
    MissingDrug,

    #[error("No supported variants detected in VCF")]
    NoSupportedVariants,
}

#[derive(Debug, Error)]
pub enum PharmyxError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PharmyxError {
    /// The input rejection behind this error, if it is one.
    pub fn as_input(&self) -> Option<&InputError> {
        match self {
            PharmyxError::Input(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PharmyxError>;
