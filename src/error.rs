use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by stream bundle operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The pager command string could not be split into arguments.
    #[error("failed to parse pager command `{command}`")]
    Tokenize {
        command: String,
        source: shell_words::ParseError,
    },
    /// The pager command string contained no program.
    #[error("pager command `{command}` is empty")]
    EmptyCommand { command: String },
    /// The pager program is not on the search path.
    #[error("pager executable `{program}` not found")]
    ExecutableNotFound {
        program: String,
        source: which::Error,
    },
    /// The pipe feeding the pager could not be set up.
    #[error("failed to create pager pipe")]
    PipeCreation {
        #[source]
        source: io::Error,
    },
    /// The pager process could not be started.
    #[error("failed to start pager `{program}`")]
    ProcessStart {
        program: PathBuf,
        source: io::Error,
    },
    /// A user-supplied file could not be opened.
    #[error("failed to open `{path}`")]
    FileOpen { path: PathBuf, source: io::Error },
    /// Reading an opened file or the input stream failed.
    #[error("failed to read `{path}`")]
    Read { path: PathBuf, source: io::Error },
    /// A temporary file could not be created.
    #[error("failed to create temporary file in `{dir}`")]
    TempFile { dir: PathBuf, source: io::Error },
    /// A width probe produced output that is not a column count.
    #[error("unexpected terminal width `{output}`")]
    SizeParse {
        output: String,
        source: ParseIntError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
