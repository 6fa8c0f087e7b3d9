use gallery_files::FilesError;

use crate::constants::INTERNAL_ERROR_MESSAGE;

#[derive(Debug, thiserror::Error)]
pub enum GalleryError {
    #[error("invalid request: {message}")]
    Validation {
        message: String,
        /// Validator error list, serialised as JSON
        details: Option<serde_json::Value>,
    },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to render image: {0}")]
    Render(#[from] image::ImageError),
    #[error("failed to build archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("file storage error: {0}")]
    Files(FilesError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GalleryError {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            GalleryError::Validation { .. } | GalleryError::BadRequest(_) => 400,
            GalleryError::NotFound(_) => 404,
            GalleryError::Conflict(_) => 409,
            GalleryError::InvalidConfig(_)
            | GalleryError::Render(_)
            | GalleryError::Archive(_)
            | GalleryError::Files(_)
            | GalleryError::Io(_)
            | GalleryError::Internal(_) => 500,
        }
    }

    /// Whether the error is the caller's fault (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Message safe to show to clients.
    ///
    /// Internal failures collapse to a generic message; paths and library errors stay in the
    /// server log.
    pub fn public_message(&self) -> String {
        match self {
            GalleryError::Validation { message, .. } => message.clone(),
            GalleryError::BadRequest(message)
            | GalleryError::NotFound(message)
            | GalleryError::Conflict(message) => message.clone(),
            _ => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    /// Validator error list for schema failures.
    pub fn details(&self) -> Option<&serde_json::Value> {
        match self {
            GalleryError::Validation { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl From<FilesError> for GalleryError {
    fn from(err: FilesError) -> Self {
        match err {
            FilesError::NotFound(what) => GalleryError::NotFound(format!("{what} not found")),
            FilesError::AlreadyExists(what) => {
                GalleryError::Conflict(format!("{what} already exists"))
            }
            FilesError::NotEmpty(what) => {
                GalleryError::Conflict(format!("{what} is not empty"))
            }
            FilesError::InvalidName(e) => GalleryError::BadRequest(e.to_string()),
            other => GalleryError::Files(other),
        }
    }
}

pub type GalleryResult<T> = std::result::Result<T, GalleryError>;
