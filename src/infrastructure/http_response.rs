// HTTP response utilities with optional Brotli encoding
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Check if client accepts Brotli compression
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

pub async fn brotli_compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = BrotliEncoder::new(data);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Build a response from raw bytes, compressing them when the client allows it
pub async fn encoded_response(
    status: StatusCode,
    content_type: &'static str,
    body: Vec<u8>,
    compress: bool,
    extra_headers: &[(header::HeaderName, HeaderValue)],
) -> Result<Response<Body>, StatusCode> {
    let (body_bytes, content_encoding) = if compress {
        let compressed = brotli_compress(&body).await.map_err(|e| {
            tracing::error!("Brotli compression error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        tracing::debug!("Compressed: {} → {} bytes", body.len(), compressed.len());
        (compressed, Some("br"))
    } else {
        (body, None)
    };

    let mut response_builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body_bytes.len())
        .header(header::VARY, "accept-encoding");

    if let Some(encoding) = content_encoding {
        response_builder = response_builder.header(header::CONTENT_ENCODING, encoding);
    }
    for (name, value) in extra_headers {
        response_builder = response_builder.header(name, value);
    }

    response_builder.body(Body::from(body_bytes)).map_err(|e| {
        tracing::error!("Response build error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Serialize a value as JSON with optional compression
pub async fn json_response<T: Serialize>(status: StatusCode, data: &T, compress: bool) -> Response<Body> {
    let body = match serde_json::to_vec(data) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("JSON serialization error: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match encoded_response(status, "application/json", body, compress, &[]).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// File download with a Content-Disposition attachment header
pub async fn download_response(
    content_type: &'static str,
    file_name: &str,
    body: Vec<u8>,
    compress: bool,
) -> Response<Body> {
    let disposition = match HeaderValue::from_str(&format!("attachment; filename=\"{}\"", file_name)) {
        Ok(value) => value,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    match encoded_response(
        StatusCode::OK,
        content_type,
        body,
        compress,
        &[(header::CONTENT_DISPOSITION, disposition)],
    )
    .await
    {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
