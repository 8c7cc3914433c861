use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request has timed out.")]
    Timeout,

    #[error("An HTTP error occurred.  Check your settings. {0}")]
    Http(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value: {message}")]
    Invalid { message: String },

    #[error(
        "No settings file found. A default one was written to {}, edit it and run the command again.",
        .0.display()
    )]
    ConfigCreated(PathBuf),

    #[error("The response body is not valid JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("Stash editor error: {0}")]
    Editor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(error.to_string())
        }
    }
}
