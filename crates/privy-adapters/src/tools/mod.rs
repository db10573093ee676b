//! Capability Adapters
//!
//! - `search_tool`: SearXNG web search
//! - `weather_tool`: wttr.in one-line forecast
//! - `dad_joke_tool`: icanhazdadjoke
//! - `terminal_tool`: shell command execution (side effect)
//! - `youtube_tool`: yt-dlp download + mpv playback (side effect)

mod joke;
mod media;
mod search;
mod terminal;
mod weather;

use std::path::{Path, PathBuf};
use std::process::Stdio;

use privy::CapabilityError;

pub use joke::DadJokeTool;
pub use media::YoutubeTool;
pub use search::{format_results, SearchHit, SearchTool};
pub use terminal::TerminalTool;
pub use weather::{extract_location, WeatherTool};

/// Resolve `program` against `PATH`; paths containing a separator are
/// checked as given
pub fn find_executable(program: &str) -> Option<PathBuf> {
    if program.is_empty() {
        return None;
    }
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

/// Start `program` without waiting for it; output is discarded
pub(crate) fn spawn_detached(program: &str, args: &[&str]) -> Result<(), CapabilityError> {
    let executable = find_executable(program).ok_or_else(|| CapabilityError::MissingExecutable {
        program: program.to_string(),
    })?;

    tokio::process::Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| CapabilityError::failed(program, e))
}
