//! Error types for promptcat.

use crate::config::ConfigError;
use crate::output::OutputError;
use crate::tokens::TokenizerError;
use crate::walker::WalkError;

/// Top-level error type for promptcat operations.
///
/// Every variant is fatal. Problems with a single file are reported as
/// [`crate::scanner::FileError`] and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum PromptcatError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("tokenizer error: {0}")]
    Tokenizer(#[from] TokenizerError),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map an error to its exit code.
pub fn exit_code(error: &PromptcatError) -> i32 {
    match error {
        PromptcatError::Config(_) => 2,
        PromptcatError::Tokenizer(_) => 2,
        PromptcatError::Walk(WalkError::PermissionDenied { .. }) => 4,
        PromptcatError::Walk(_) => 3,
        PromptcatError::Output(_) => 1,
        PromptcatError::ThreadPool(_) => 1,
        PromptcatError::Io(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let config = PromptcatError::from(ConfigError::PathNotFound(PathBuf::from("x")));
        assert_eq!(exit_code(&config), 2);

        let tokenizer = PromptcatError::from(TokenizerError::Unsupported("llama".into()));
        assert_eq!(exit_code(&tokenizer), 2);

        let denied = PromptcatError::from(WalkError::PermissionDenied {
            path: PathBuf::from("secret"),
        });
        assert_eq!(exit_code(&denied), 4);

        let missing = PromptcatError::from(WalkError::NotFound {
            path: PathBuf::from("gone"),
        });
        assert_eq!(exit_code(&missing), 3);
    }

    #[test]
    fn test_messages_are_single_line() {
        let err = PromptcatError::from(ConfigError::PathNotFound(PathBuf::from("nope")));
        assert_eq!(err.to_string(), "path 'nope' does not exist");
        assert!(!err.to_string().contains('\n'));
    }
}
