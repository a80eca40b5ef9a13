//! Streaming download of candidate media.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::error::{MediaError, MediaResult};

/// Map a content type to a file extension.
fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    // Parameters like "; charset=..." are ignored.
    let mime = content_type.split(';').next().unwrap_or("").trim();
    match mime {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "video/mp4" => Some("mp4"),
        "video/webm" => Some("webm"),
        "video/quicktime" => Some("mov"),
        "audio/ogg" => Some("ogg"),
        _ => None,
    }
}

/// Extension from the URL path, if it looks like a media extension.
fn extension_for_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let ext = Path::new(parsed.path()).extension()?.to_str()?.to_lowercase();
    matches!(
        ext.as_str(),
        "jpg" | "jpeg" | "png" | "webp" | "gif" | "mp4" | "webm" | "mov" | "ogg"
    )
    .then_some(ext)
}

/// Download `url` into `dir`, streaming to disk.
///
/// The file is named `<stem>.<ext>` with the extension taken from the
/// response content type, then the URL path, then `fallback_ext`. Returns
/// the written path. Non-success responses and empty bodies are errors so
/// the caller can move on to the next candidate.
pub async fn download_to_dir(
    client: &reqwest::Client,
    url: &str,
    dir: impl AsRef<Path>,
    stem: &str,
    fallback_ext: &str,
) -> MediaResult<PathBuf> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    let ext = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(extension_for_content_type)
        .map(str::to_string)
        .or_else(|| extension_for_url(url))
        .unwrap_or_else(|| fallback_ext.to_string());

    let path = dir.as_ref().join(format!("{stem}.{ext}"));
    let mut file = File::create(&path).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    if written == 0 {
        let _ = tokio::fs::remove_file(&path).await;
        return Err(MediaError::download_failed(format!("{url} returned an empty body")));
    }

    debug!(url, path = %path.display(), bytes = written, "downloaded asset");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extension_inference() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(
            extension_for_content_type("video/mp4; charset=binary"),
            Some("mp4")
        );
        assert_eq!(extension_for_content_type("text/html"), None);
        assert_eq!(
            extension_for_url("https://cdn.example.com/a/b/photo.PNG?sig=1"),
            Some("png".to_string())
        );
        assert_eq!(extension_for_url("https://example.com/page"), None);
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/asset"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(vec![0x89u8, 0x50, 0x4e, 0x47]),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = reqwest::Client::new();
        let path = download_to_dir(
            &client,
            &format!("{}/asset", server.uri()),
            dir.path(),
            "seg0",
            "jpg",
        )
        .await
        .unwrap();

        assert_eq!(path.file_name().unwrap(), "seg0.png");
        assert_eq!(std::fs::read(&path).unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_download_rejects_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = reqwest::Client::new();
        let err = download_to_dir(
            &client,
            &format!("{}/gone", server.uri()),
            dir.path(),
            "seg0",
            "jpg",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
    }

    #[tokio::test]
    async fn test_download_rejects_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(Vec::<u8>::new()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let client = reqwest::Client::new();
        let err = download_to_dir(
            &client,
            &format!("{}/empty", server.uri()),
            dir.path(),
            "seg1",
            "jpg",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!dir.path().join("seg1.jpg").exists());
    }
}
