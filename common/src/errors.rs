/// Error kinds every provider adapter can report.
///
/// Adapters return these wrapped in `anyhow::Error`; callers recognise them
/// again with [`is_not_found`] and friends, which look through any context
/// layered on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudError {
    NotFound(String),
    NotImplemented(String),
    NotSupported(String),
    Timeout(String),
    Unauthorized(String),
    MissingParameter(String),
    InputParameter(String),
}

impl CloudError {
    pub fn not_found(what: impl Into<String>) -> Self {
        CloudError::NotFound(what.into())
    }

    pub fn not_implemented(what: impl Into<String>) -> Self {
        CloudError::NotImplemented(what.into())
    }

    pub fn not_supported(what: impl Into<String>) -> Self {
        CloudError::NotSupported(what.into())
    }
}

impl std::fmt::Display for CloudError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudError::NotFound(what) => write!(f, "Resource not found: {}", what),
            CloudError::NotImplemented(what) => write!(f, "Not implemented: {}", what),
            CloudError::NotSupported(what) => write!(f, "Not supported: {}", what),
            CloudError::Timeout(what) => write!(f, "Timeout: {}", what),
            CloudError::Unauthorized(who) => write!(f, "{} Unauthorized", who),
            CloudError::MissingParameter(name) => write!(f, "Missing parameter: {}", name),
            CloudError::InputParameter(msg) => write!(f, "Input parameter error: {}", msg),
        }
    }
}

impl std::error::Error for CloudError {}

fn find(err: &anyhow::Error) -> Option<&CloudError> {
    err.chain().find_map(|e| e.downcast_ref::<CloudError>())
}

pub fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(find(err), Some(CloudError::NotFound(_)))
}

pub fn is_not_implemented(err: &anyhow::Error) -> bool {
    matches!(find(err), Some(CloudError::NotImplemented(_)))
}

pub fn is_not_supported(err: &anyhow::Error) -> bool {
    matches!(find(err), Some(CloudError::NotSupported(_)))
}

pub fn is_timeout(err: &anyhow::Error) -> bool {
    matches!(find(err), Some(CloudError::Timeout(_)))
}
