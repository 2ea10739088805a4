//! Fetch image bytes for a catalog image reference.

use theframe_core::{FrameError, FrameResult, ImageRef};
use tracing::debug;

/// Read a local image or download a remote one.
pub async fn fetch_image(image: &ImageRef, client: &reqwest::Client) -> FrameResult<Vec<u8>> {
    let source_err = |message: String| FrameError::ImageSource {
        reference: image.to_string(),
        message,
    };

    match image {
        ImageRef::Local(path) => tokio::fs::read(path).await.map_err(|e| source_err(e.to_string())),
        ImageRef::Remote(url) => {
            debug!(url = %url, "Downloading image");
            let response = client
                .get(url)
                .send()
                .await
                .map_err(|e| source_err(format!("request failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(source_err(format!("HTTP {status}")));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| source_err(format!("failed to read body: {e}")))?;
            debug!(url = %url, bytes = bytes.len(), "Downloaded image");
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering every request with `response`.
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/art/vermeer.jpg")
    }

    #[tokio::test]
    async fn reads_local_files() {
        let path = std::env::temp_dir().join(format!("theframe-src-{}.jpg", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"\xFF\xD8\xFFdata").unwrap();
        let bytes = fetch_image(&ImageRef::Local(path.clone()), &reqwest::Client::new())
            .await
            .unwrap();
        assert_eq!(bytes, b"\xFF\xD8\xFFdata");
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_local_file_is_a_source_error() {
        let err = fetch_image(&ImageRef::Local("/definitely/not/here.jpg".into()), &reqwest::Client::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FrameError::ImageSource { .. }));
    }

    #[tokio::test]
    async fn downloads_remote_images() {
        let url = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\nabcd").await;
        let bytes = fetch_image(&ImageRef::Remote(url), &reqwest::Client::new()).await.unwrap();
        assert_eq!(bytes, b"abcd");
    }

    #[tokio::test]
    async fn http_errors_are_source_errors() {
        let url = serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let err = fetch_image(&ImageRef::Remote(url), &reqwest::Client::new()).await.unwrap_err();
        match err {
            FrameError::ImageSource { message, .. } => assert!(message.contains("404")),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
