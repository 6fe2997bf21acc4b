pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session cannot start with the given settings. Nothing has been
    /// read or written when this is returned.
    #[error("{0}")]
    Configuration(String),
    /// The encoder reported a failure.
    #[error("{operation}: {message}{}", format_detail(.detail))]
    Codec {
        /// The call that failed, e.g. `Failed to encode frame`.
        operation: &'static str,
        message: String,
        /// Additional text supplied by the encoder, if any.
        detail: Option<String>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_detail(detail: &Option<String>) -> String {
    match detail {
        Some(detail) => format!("\n    {detail}"),
        None => String::new(),
    }
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn codec(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Codec {
            operation,
            message: message.into(),
            detail: None,
        }
    }

    /// Attaches encoder-provided detail to a codec error. Other kinds are
    /// returned unchanged.
    pub fn with_detail(self, text: impl Into<String>) -> Self {
        match self {
            Error::Codec {
                operation, message, ..
            } => Error::Codec {
                operation,
                message,
                detail: Some(text.into()),
            },
            other => other,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}
