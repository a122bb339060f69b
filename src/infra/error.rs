use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Failures while connecting the tool to files, sockets and the render service.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("invalid settings: {0}")]
    Settings(String),
    #[error("could not start logging: {0}")]
    Logging(String),
    #[error("could not build the render client")]
    RenderClient(#[source] reqwest::Error),
    #[error("could not read {}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not listen on {addr}")]
    Listen {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

impl InfraError {
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings(message.into())
    }

    pub fn read_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }
}
