use std::io;
use std::path::PathBuf;

/// Debugger failures. All of them are recoverable: the session reports the
/// error and keeps accepting commands, nothing ever crosses the hook
/// boundary back into the evaluator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot read source file {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line} out of range for {path}")]
    LineOutOfRange { path: PathBuf, line: usize },
}
