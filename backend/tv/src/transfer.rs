//! Image byte transfer over the socket announced in `ready_to_use`.

use std::io::ErrorKind;
use std::time::Duration;

use theframe_core::{FrameError, FrameResult, ImageFileType};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use crate::protocol::{transfer_header, ConnInfo};

/// The TV presents a self-signed certificate on every TLS socket.
pub(crate) fn tls_connector() -> Result<native_tls::TlsConnector, native_tls::Error> {
    native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
}

/// Connect to `conn`, then send the header and the image.
pub async fn send_image_bytes(
    conn: &ConnInfo,
    image: &[u8],
    file_type: ImageFileType,
    timeout: Duration,
) -> FrameResult<()> {
    let address = format!("{}:{}", conn.ip, conn.port);
    let tcp = tokio::time::timeout(timeout, TcpStream::connect(&address))
        .await
        .map_err(|_| FrameError::Upload(format!("timed out connecting to {address}")))?
        .map_err(|e| io_failure(&address, e))?;
    debug!(address = %address, secured = conn.secured, bytes = image.len(), "Opened transfer socket");

    let transfer = async {
        if conn.secured {
            let connector = tls_connector()
                .map_err(|e| FrameError::Upload(format!("cannot create TLS connector: {e}")))?;
            let mut stream = tokio_native_tls::TlsConnector::from(connector)
                .connect(&conn.ip, tcp)
                .await
                .map_err(|e| FrameError::Upload(format!("TLS handshake with {address} failed: {e}")))?;
            write_payload(&mut stream, conn, image, file_type)
                .await
                .map_err(|e| io_failure(&address, e))
        } else {
            let mut stream = tcp;
            write_payload(&mut stream, conn, image, file_type)
                .await
                .map_err(|e| io_failure(&address, e))
        }
    };

    tokio::time::timeout(timeout, transfer)
        .await
        .map_err(|_| FrameError::Upload(format!("timed out sending image to {address}")))?
}

async fn write_payload<W: AsyncWrite + Unpin>(
    stream: &mut W,
    conn: &ConnInfo,
    image: &[u8],
    file_type: ImageFileType,
) -> std::io::Result<()> {
    stream.write_all(&transfer_header(image.len(), file_type, &conn.key)).await?;
    stream.write_all(image).await?;
    stream.flush().await?;
    stream.shutdown().await
}

fn io_failure(address: &str, e: std::io::Error) -> FrameError {
    match e.kind() {
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe => {
            FrameError::ConnectionReset(format!("transfer socket {address}: {e}"))
        }
        _ => FrameError::Upload(format!("transfer to {address} failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn sends_header_then_image() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let receiver = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        });

        let conn = ConnInfo { ip: "127.0.0.1".into(), port, key: "k".into(), secured: false };
        send_image_bytes(&conn, b"PIXELS", ImageFileType::Jpeg, Duration::from_secs(5))
            .await
            .unwrap();

        let received = receiver.await.unwrap();
        let len = u32::from_be_bytes([received[0], received[1], received[2], received[3]]) as usize;
        let header: serde_json::Value = serde_json::from_slice(&received[4..4 + len]).unwrap();
        assert_eq!(header["secKey"], "k");
        assert_eq!(&received[4 + len..], b"PIXELS");
    }

    #[tokio::test]
    async fn refused_socket_is_an_upload_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let conn = ConnInfo { ip: "127.0.0.1".into(), port, key: "k".into(), secured: false };
        let err = send_image_bytes(&conn, b"x", ImageFileType::Png, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FrameError::Upload(_)));
    }
}
