//! SMTP reachability check for the settings surface.
//!
//! Only connection testing is in scope: open a TCP stream to the
//! configured host and read the server greeting. Outbound mail
//! delivery itself is not part of this service.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ApiError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect to `host:port` and read the SMTP greeting line.
///
/// A reachable SMTP server answers with a `220 ...` banner; anything
/// else is reported as a validation failure so the admin console can
/// show it.
pub async fn test_connection(host: &str, port: u16) -> Result<String, ApiError> {
    let addr = format!("{host}:{port}");
    debug!(%addr, "testing SMTP connection");

    let mut stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
        .await
        .map_err(|_| ApiError::Validation(format!("connection to {addr} timed out")))?
        .map_err(|e| ApiError::Validation(format!("could not connect to {addr}: {e}")))?;

    let mut buf = [0u8; 512];
    let read = timeout(CONNECT_TIMEOUT, stream.read(&mut buf))
        .await
        .map_err(|_| ApiError::Validation(format!("{addr} sent no greeting before timeout")))?
        .map_err(|e| ApiError::Validation(format!("failed reading greeting from {addr}: {e}")))?;

    let greeting = String::from_utf8_lossy(&buf[..read]).trim().to_string();
    if !greeting.starts_with("220") {
        return Err(ApiError::Validation(format!(
            "unexpected SMTP greeting from {addr}: {greeting}"
        )));
    }

    Ok(greeting)
}
