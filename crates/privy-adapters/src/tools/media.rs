//! YouTube playback
//!
//! Finds a video with `yt-dlp`, downloads it into a media cache named by the
//! query fingerprint and plays it with `mpv`. A cached file is played again
//! without downloading.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;

use privy::{Capability, CapabilityDescriptor, CapabilityError, Effect, Fingerprint, InputShape};

use super::{find_executable, spawn_detached};

const NAME: &str = "youtube_tool";
const FORMAT: &str = "best[height<=720]";

pub struct YoutubeTool {
    yt_dlp_path: String,
    mpv_path: String,
    media_dir: PathBuf,
    descriptor: CapabilityDescriptor,
}

impl YoutubeTool {
    pub fn new(
        yt_dlp_path: impl Into<String>,
        mpv_path: impl Into<String>,
        media_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            mpv_path: mpv_path.into(),
            media_dir: media_dir.into(),
            descriptor: CapabilityDescriptor::new(
                NAME,
                "Search YouTube for a video or song, download it and play it locally.",
                InputShape::required("query", "What to play"),
            )
            .with_effect(Effect::SideEffect),
        }
    }

    /// Search terms with a leading "play" / "watch" / "listen to" removed
    fn search_terms(query: &str) -> &str {
        let query = query.trim();
        for verb in ["play ", "listen to ", "watch "] {
            if query
                .get(..verb.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(verb))
            {
                return query[verb.len()..].trim();
            }
        }
        query
    }

    fn play(&self, file: &Path) -> Result<(), CapabilityError> {
        let file = file.to_string_lossy();
        spawn_detached(&self.mpv_path, &[file.as_ref()])
    }

    async fn download(&self, terms: &str, stem: &str) -> Result<String, CapabilityError> {
        let yt_dlp = find_executable(&self.yt_dlp_path).ok_or_else(|| {
            CapabilityError::MissingExecutable {
                program: self.yt_dlp_path.clone(),
            }
        })?;

        tokio::fs::create_dir_all(&self.media_dir)
            .await
            .map_err(|e| CapabilityError::failed(NAME, e))?;
        let template = self.media_dir.join(format!("{}.%(ext)s", stem));

        tracing::info!("⬇️ Downloading video for: {}", terms);
        let output = tokio::process::Command::new(yt_dlp)
            .arg("--format")
            .arg(FORMAT)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-simulate")
            .arg("--print")
            .arg("title")
            .arg("--output")
            .arg(&template)
            .arg(format!("ytsearch1:{}", terms))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| CapabilityError::failed(NAME, e))?;

        if !output.status.success() {
            return Err(CapabilityError::NonZeroExit {
                program: self.yt_dlp_path.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if title.is_empty() {
            return Err(CapabilityError::failed(NAME, "No video found for the search query"));
        }
        Ok(title)
    }
}

#[async_trait]
impl Capability for YoutubeTool {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, input: &str) -> Result<String, CapabilityError> {
        let terms = Self::search_terms(input);
        if terms.is_empty() {
            return Err(CapabilityError::failed(NAME, "nothing to search for"));
        }
        tracing::info!("🎬 YouTube search: '{}'", terms);

        let stem = Fingerprint::of(terms).to_string();
        if let Some(file) = cached_media(&self.media_dir, &stem).await {
            tracing::info!("📦 Found cached video: {}", file.display());
            self.play(&file)?;
            return Ok(format!("Playing cached video for: {}", terms));
        }

        let title = self.download(terms, &stem).await?;
        let file = cached_media(&self.media_dir, &stem).await.ok_or_else(|| {
            CapabilityError::failed(NAME, "Video downloaded but file not found in cache")
        })?;
        self.play(&file)?;
        Ok(format!("Downloaded and playing: {}", title))
    }
}

/// A finished download named `<stem>.<ext>`; partial downloads are skipped
async fn cached_media(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut entries = tokio::fs::read_dir(dir).await.ok()?;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let matches_stem = path.file_stem().and_then(|s| s.to_str()) == Some(stem);
        let partial = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "part" || e == "ytdl");
        if matches_stem && !partial && path.is_file() {
            return Some(path);
        }
    }
    None
}
