// error.rs — 查看器错误分类

use std::path::PathBuf;
use thiserror::Error;

/// Coarse category the host cares about. Both kinds end up as an inline
/// message; neither is allowed to take the process down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LoadFailure,
    EnvironmentUnavailable,
}

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("failed to read {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: u64 },

    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode panorama: {0}")]
    Decode(#[from] image::ImageError),

    #[error("panorama image is empty")]
    EmptyImage,

    #[error("panorama loader stopped before delivering a result")]
    LoaderStopped,

    #[error("3D rendering unavailable: {0}")]
    EnvironmentUnavailable(String),
}

impl ViewerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ViewerError::EnvironmentUnavailable(_) => ErrorKind::EnvironmentUnavailable,
            _ => ErrorKind::LoadFailure,
        }
    }

    /// Localised one-liner for the overlay. Details go to the log instead.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::LoadFailure => crate::i18n::tr("error.load_failed"),
            ErrorKind::EnvironmentUnavailable => crate::i18n::tr("error.environment_unavailable"),
        }
    }
}

impl From<wgpu::CreateSurfaceError> for ViewerError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        ViewerError::EnvironmentUnavailable(e.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for ViewerError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        ViewerError::EnvironmentUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_environment_errors_are_environment_kind() {
        let env = ViewerError::EnvironmentUnavailable("no adapter".into());
        assert_eq!(env.kind(), ErrorKind::EnvironmentUnavailable);

        let open = ViewerError::Open {
            path: PathBuf::from("missing.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(open.kind(), ErrorKind::LoadFailure);
        assert_eq!(ViewerError::EmptyImage.kind(), ErrorKind::LoadFailure);
        assert_eq!(ViewerError::LoaderStopped.kind(), ErrorKind::LoadFailure);
    }

    #[test]
    fn user_message_is_never_empty() {
        let err = ViewerError::EmptyImage;
        assert!(!err.user_message().is_empty());
    }
}
