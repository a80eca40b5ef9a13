//! Remux repair for downloaded videos with broken timestamps.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::probe::media_duration;

/// Verify a downloaded video is playable, remuxing it if not.
///
/// Some providers serve files with missing or non-monotonic presentation
/// timestamps that render as a frozen frame. If the file fails a probe,
/// stream-copy it through ffmpeg with regenerated timestamps and use the
/// remuxed copy. Returns the path to use, which is the original when the
/// file is fine or the repair itself fails.
pub async fn fix_if_broken(path: impl AsRef<Path>) -> MediaResult<PathBuf> {
    let path = path.as_ref();

    match media_duration(path).await {
        Ok(duration) if duration > 0.0 => return Ok(path.to_path_buf()),
        Ok(_) => debug!(path = %path.display(), "video probes with zero duration, remuxing"),
        Err(err) => debug!(path = %path.display(), error = %err, "video failed probe, remuxing"),
    }

    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let fixed = path.with_extension("fixed.mp4");
    let output = Command::new("ffmpeg")
        .args(["-y", "-fflags", "+genpts", "-i"])
        .arg(path)
        .args(["-c", "copy"])
        .arg(&fixed)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        warn!(path = %path.display(), "remux failed, keeping original file");
        let _ = tokio::fs::remove_file(&fixed).await;
        return Ok(path.to_path_buf());
    }

    Ok(fixed)
}
