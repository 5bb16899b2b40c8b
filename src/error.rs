use thiserror::Error;

/// Main error type for the Prompt-Compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Video error: {0}")]
    Video(#[from] VideoError),

    #[error("File name error: {0}")]
    FileName(#[from] FileNameError),

    #[error("Build stage error: {0}")]
    Stage(#[from] StageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Coarse classification of failures, shared by every error variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or empty input at construction time
    InvalidArgument,
    /// A file name that does not follow the video file name format
    MalformedName,
    /// A build stage failed, usually after its collaborator ran out of retries
    StageFailure,
    /// A video variant declared no applicable handlers
    MissingHandlerChain,
    /// Configuration could not be loaded or is inconsistent
    Config,
    /// Local filesystem failure
    Io,
    Other,
}

/// Video entity errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Invalid argument: {details}")]
    InvalidArgument { details: String },

    #[error("No handler chain defined for video of type {video_type}")]
    MissingHandlerChain { video_type: String },

    #[error("Video {id} has no media location")]
    MissingMedia { id: String },

    #[error("Illegal build phase transition for video {id}: {from} -> {to}")]
    IllegalPhase { id: String, from: String, to: String },
}

/// File name codec errors
#[derive(Error, Debug)]
pub enum FileNameError {
    #[error("Malformed video file name '{name}': {reason}")]
    MalformedName { name: String, reason: String },

    #[error("Invalid file name component: {details}")]
    InvalidArgument { details: String },
}

/// Errors raised while running a build handler
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Stage '{stage}' failed: {reason}")]
    Failed { stage: String, reason: String },

    #[error("Stage '{stage}' failed after {attempts} attempts: {reason}")]
    RetriesExhausted {
        stage: String,
        attempts: u32,
        reason: String,
    },

    #[error("Stage '{stage}' returned without a media location")]
    NoMediaProduced { stage: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Shorthand for a construction-time argument error
    pub fn invalid_argument<S: Into<String>>(details: S) -> Self {
        VideoError::InvalidArgument {
            details: details.into(),
        }
        .into()
    }

    /// Shorthand for a failed build stage
    pub fn stage<S: Into<String>, R: ToString>(stage: S, reason: R) -> Self {
        StageError::Failed {
            stage: stage.into(),
            reason: reason.to_string(),
        }
        .into()
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Video(VideoError::InvalidArgument { .. }) => ErrorKind::InvalidArgument,
            Self::Video(VideoError::MissingHandlerChain { .. }) => ErrorKind::MissingHandlerChain,
            Self::Video(VideoError::MissingMedia { .. }) => ErrorKind::StageFailure,
            Self::Video(VideoError::IllegalPhase { .. }) => ErrorKind::Other,
            Self::FileName(FileNameError::MalformedName { .. }) => ErrorKind::MalformedName,
            Self::FileName(FileNameError::InvalidArgument { .. }) => ErrorKind::InvalidArgument,
            Self::Stage(_) => ErrorKind::StageFailure,
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Generic(_) => ErrorKind::Other,
        }
    }

    /// Check if this error is recoverable (a new build attempt may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            // IO errors might be temporary
            Self::Io(_) => true,
            // Provider calls fail transiently
            Self::Stage(StageError::Failed { .. }) => true,
            Self::Stage(StageError::RetriesExhausted { .. }) => true,
            // Most other errors are permanent
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::InvalidArgument { details }) => {
                format!("The video could not be created: {}.", details)
            }
            Self::Stage(StageError::RetriesExhausted { stage, attempts, .. }) => {
                format!(
                    "The '{}' step kept failing after {} attempts. Please try the build again later.",
                    stage, attempts
                )
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
