use smartlamp_frame::FrameError;
use smartlamp_session::EngineError;

const ENOENT: i32 = -2;
const EIO: i32 = -5;
const EACCES: i32 = -13;
const ENODEV: i32 = -19;
const EINVAL: i32 = -22;

/// Errors that can occur during attribute access.
#[derive(Debug, thiserror::Error)]
pub enum AttrError {
    /// No attribute with this name.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("attribute {0} is not readable")]
    NotReadable(String),

    #[error("attribute {0} is not writable")]
    NotWritable(String),

    /// The written text does not parse as the attribute's value type.
    #[error("invalid value for {attribute}: {input:?}")]
    InvalidInput { attribute: String, input: String },

    /// The device is gone or the surface was unpublished.
    #[error("device detached")]
    DeviceDetached,

    /// The device transaction failed.
    #[error("I/O error on {attribute}: {source}")]
    Io {
        attribute: String,
        #[source]
        source: EngineError,
    },

    /// The reply payload does not decode as the attribute's value type.
    #[error("cannot decode {attribute}: {source}")]
    Decode {
        attribute: String,
        #[source]
        source: FrameError,
    },
}

impl AttrError {
    pub(crate) fn from_engine(attribute: &str, err: EngineError) -> Self {
        match err {
            EngineError::DeviceDetached => AttrError::DeviceDetached,
            source => AttrError::Io {
                attribute: attribute.to_string(),
                source,
            },
        }
    }

    /// Negative errno a file-like exposure layer reports for this error.
    pub fn errno(&self) -> i32 {
        match self {
            AttrError::UnknownAttribute(_) => ENOENT,
            AttrError::NotReadable(_) | AttrError::NotWritable(_) => EACCES,
            AttrError::InvalidInput { .. } => EINVAL,
            AttrError::DeviceDetached => ENODEV,
            AttrError::Io { .. } | AttrError::Decode { .. } => EIO,
        }
    }

    /// Returns true for device-side failures a textual read collapses to
    /// the sentinel value.
    pub fn is_device_failure(&self) -> bool {
        matches!(self, AttrError::Io { .. } | AttrError::Decode { .. })
    }
}

pub type Result<T> = std::result::Result<T, AttrError>;
