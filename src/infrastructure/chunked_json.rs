// Chunked JSON streaming utilities
use crate::application::monitoring_service::MonitoringFeed;
use crate::infrastructure::http_response::brotli_compress;
use crate::infrastructure::json_mapper::{message_to_dto, StreamMessageDto};
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;

/// Create a chunked streaming response, one length-prefixed JSON message per chunk
pub async fn chunked_json_stream<S>(
    stream: S,
    compress: bool,
) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = StreamMessageDto> + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(&msg, compress).await });

    let body = Body::from_stream(byte_stream);

    // Chunks are compressed individually, so no Content-Encoding header here:
    // clients would otherwise try to decompress the framed stream as a whole.
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson-framed")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single message to a chunk: 4-byte big-endian length, then payload
pub async fn serialize_chunk(msg: &StreamMessageDto, compress: bool) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(msg)?;

    let payload = if compress {
        brotli_compress(json).await?
    } else {
        json
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Stream a mounted monitoring view. The feed lives inside the body stream,
/// so the view's timer is cancelled as soon as the client disconnects.
pub async fn stream_from_feed(mut feed: MonitoringFeed, compress: bool) -> impl IntoResponse {
    let stream = async_stream::stream! {
        while let Some(msg) = feed.recv().await {
            yield message_to_dto(msg);
        }
    };

    match chunked_json_stream(stream, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::power::PowerSample;
    use crate::infrastructure::json_mapper::sample_to_dto;
    use async_compression::tokio::bufread::BrotliDecoder;
    use chrono::NaiveDate;
    use tokio::io::AsyncReadExt;

    fn message() -> StreamMessageDto {
        let at = NaiveDate::from_ymd_opt(2024, 6, 21)
            .unwrap()
            .and_hms_opt(13, 15, 0)
            .unwrap();
        let sample = PowerSample::new(at, 4.1, 3.3, 0.8);
        StreamMessageDto::Sample {
            grid_status: sample.direction().as_str(),
            tiles: Vec::new(),
            sample: sample_to_dto(&sample),
        }
    }

    fn prefix(chunk: &[u8]) -> usize {
        u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize
    }

    #[tokio::test]
    async fn test_chunk_is_length_prefixed() {
        let chunk = serialize_chunk(&message(), false).await.unwrap();
        assert_eq!(prefix(&chunk), chunk.len() - 4);

        let value: serde_json::Value = serde_json::from_slice(&chunk[4..]).unwrap();
        assert_eq!(value["type"], "sample");
        assert_eq!(value["gridStatus"], "exporting");
        assert_eq!(value["sample"]["gridFlow"], 0.8);
    }

    #[tokio::test]
    async fn test_compressed_chunk_decodes() {
        let chunk = serialize_chunk(&message(), true).await.unwrap();
        assert_eq!(prefix(&chunk), chunk.len() - 4);

        let mut decoder = BrotliDecoder::new(&chunk[4..]);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["sample"]["timestamp"], "13:15");
    }
}
