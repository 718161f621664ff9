//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (gallery-dl, ffmpeg)
//! with configurable timeouts so a hung tool cannot block a download call forever.

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Why an external process produced no `Output`.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The binary does not exist on PATH
    #[error("{0} not found")]
    NotFound(String),

    /// Spawn or wait failed for another reason
    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {}s", timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

/// Run an async Command with a timeout.
///
/// The child is spawned with `kill_on_drop`, so a timed-out process is killed
/// when its future is dropped. A non-zero exit status is not an error here:
/// callers inspect `Output::status` themselves.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, ProcessError> {
    let program = cmd.as_std().get_program().to_string_lossy().to_string();
    cmd.kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Err(ProcessError::NotFound(program)),
        Ok(Err(e)) => Err(ProcessError::Io { program, source: e }),
        Err(_) => {
            log::error!("{} timed out after {}s, killing", program, timeout.as_secs());
            Err(ProcessError::TimedOut { program, timeout })
        }
    }
}

/// Keep the tail of a tool's stderr, where the actual error line usually is.
pub fn stderr_excerpt(stderr: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= max_chars {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - max_chars).collect();
    format!("…{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_excerpt_short() {
        assert_eq!(stderr_excerpt(b"  error: boom\n", 100), "error: boom");
    }

    #[test]
    fn test_stderr_excerpt_keeps_tail() {
        let excerpt = stderr_excerpt(b"0123456789", 4);
        assert_eq!(excerpt, "…6789");
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_found() {
        let mut cmd = Command::new("igdora-definitely-missing-binary");
        let result = run_with_timeout(&mut cmd, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(ProcessError::NotFound(_))));
    }
}
