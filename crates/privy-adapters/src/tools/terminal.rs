//! Shell command execution
//!
//! Always gated by the confirmation policy (side effect). Media players and
//! openers are started in the background; everything else runs under
//! `sh -c` and is killed if the run is cancelled.

use std::process::Stdio;

use async_trait::async_trait;

use privy::{Capability, CapabilityDescriptor, CapabilityError, Effect, InputShape};

use super::{find_executable, spawn_detached};

const NAME: &str = "terminal_tool";
const BACKGROUND: &[&str] = &["mpv", "xdg-open"];

pub struct TerminalTool {
    mpv_path: String,
    descriptor: CapabilityDescriptor,
}

impl TerminalTool {
    pub fn new(mpv_path: impl Into<String>) -> Self {
        Self {
            mpv_path: mpv_path.into(),
            descriptor: CapabilityDescriptor::new(
                NAME,
                "Execute a shell command on the user's machine. The user must confirm first.",
                InputShape::required("command", "Shell command line"),
            )
            .with_effect(Effect::SideEffect),
        }
    }

    /// Substitute the configured mpv binary for a leading `mpv`
    fn resolve(&self, command: &str) -> (String, String) {
        let mut parts = command.split_whitespace();
        let program = parts.next().unwrap_or_default().to_string();
        let rest = parts.collect::<Vec<_>>().join(" ");
        if program == "mpv" {
            let line = format!("{} {}", self.mpv_path, rest).trim().to_string();
            return (program, line);
        }
        (program, command.to_string())
    }
}

#[async_trait]
impl Capability for TerminalTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &str) -> Result<String, CapabilityError> {
        let command = input.trim();
        if command.is_empty() {
            return Err(CapabilityError::failed(NAME, "empty command"));
        }

        let (program, line) = self.resolve(command);
        let executable = if program == "mpv" {
            self.mpv_path.as_str()
        } else {
            program.as_str()
        };
        if find_executable(executable).is_none() {
            return Err(CapabilityError::MissingExecutable { program });
        }

        if BACKGROUND.contains(&program.as_str()) {
            let args: Vec<&str> = line.split_whitespace().skip(1).collect();
            spawn_detached(executable, &args)?;
            tracing::info!("🖥️ Started '{}' in background", program);
            return Ok(format!("Started '{}' in background.", program));
        }

        tracing::info!("🖥️ Running: {}", line);
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CapabilityError::failed(NAME, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            return Err(CapabilityError::NonZeroExit {
                program,
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(format!("Output:\n{}\nErrors:\n{}", stdout, stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mpv_is_substituted() {
        let tool = TerminalTool::new("/opt/mpv/bin/mpv");
        assert_eq!(
            tool.resolve("mpv  video.mp4 --fs"),
            ("mpv".to_string(), "/opt/mpv/bin/mpv video.mp4 --fs".to_string())
        );
        assert_eq!(
            tool.resolve("ls -la"),
            ("ls".to_string(), "ls -la".to_string())
        );
    }

    #[tokio::test]
    async fn test_runs_command_and_captures_output() {
        let tool = TerminalTool::new("mpv");
        let output = tool.invoke("echo hello; echo oops 1>&2").await.unwrap();
        assert_eq!(output, "Output:\nhello\n\nErrors:\noops\n");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let tool = TerminalTool::new("mpv");
        let err = tool.invoke("no-such-program-4242 --help").await.unwrap_err();
        assert_eq!(
            err,
            CapabilityError::MissingExecutable {
                program: "no-such-program-4242".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let tool = TerminalTool::new("mpv");
        let err = tool.invoke("sh -c 'echo bad >&2; exit 3'").await.unwrap_err();
        assert!(matches!(err, CapabilityError::NonZeroExit { code: 3, ref stderr, .. } if stderr == "bad"));
    }

    #[test]
    fn test_is_side_effecting() {
        assert!(TerminalTool::new("mpv").descriptor().effect.requires_confirmation());
    }
}
