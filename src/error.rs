use std::path::PathBuf;

/// Fatal errors. Failed `midclt` calls are not errors, see [`crate::utils::gateway::CallResult`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more required settings are empty
    #[error("The following variables must be set: {}", .fields.join(", "))]
    MissingConfig { fields: Vec<&'static str> },

    /// The config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not a valid admin config
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Reading the password from the terminal failed
    #[error("Failed to read password: {0}")]
    PasswordPrompt(std::io::Error),

    /// The log file could not be created
    #[error("Failed to create log file {path}: {source}")]
    LogFile {
        path: String,
        source: std::io::Error,
    },

    /// A global logger was already registered
    #[error("Logger initialization error: {0}")]
    Logger(#[from] log::SetLoggerError),
}
