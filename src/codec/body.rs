//! Request body decoding.

use std::io::{self, Write};

use axum::body::Body;
use axum::http::{header, HeaderMap};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;

use crate::codec::DecodeError;

/// Encodings understood on the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
    Snappy,
}

impl ContentEncoding {
    /// Unknown encodings are treated as identity.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match headers
            .get(header::CONTENT_ENCODING)
            .map(|value| value.as_bytes())
        {
            Some(b"gzip") => ContentEncoding::Gzip,
            Some(b"snappy") => ContentEncoding::Snappy,
            _ => ContentEncoding::Identity,
        }
    }
}

/// Read and decode a request body, never holding more than `limit` decoded bytes.
pub async fn decode_body(
    encoding: ContentEncoding,
    body: Body,
    limit: usize,
) -> Result<Bytes, DecodeError> {
    match encoding {
        ContentEncoding::Identity => read_bounded(body, limit).await,
        ContentEncoding::Gzip => inflate_gzip(body, limit).await,
        ContentEncoding::Snappy => {
            let raw = read_bounded(body, limit).await?;
            decode_snappy(&raw, limit)
        }
    }
}

/// Collect the body, failing as soon as it grows past `limit`.
pub async fn read_bounded(body: Body, limit: usize) -> Result<Bytes, DecodeError> {
    let mut stream = body.into_data_stream();
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DecodeError::Read(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(DecodeError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// Inflate the body as it arrives; the compressed stream itself is never buffered.
async fn inflate_gzip(body: Body, limit: usize) -> Result<Bytes, DecodeError> {
    let mut decoder = flate2::write::GzDecoder::new(CappedBuffer::new(limit));
    let mut stream = body.into_data_stream();
    let mut received = 0usize;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DecodeError::Read(e.to_string()))?;
        received += chunk.len();
        if let Err(e) = decoder.write_all(&chunk) {
            return Err(gzip_error(decoder.get_ref(), e));
        }
    }

    if received == 0 {
        return Err(DecodeError::Gzip(io::ErrorKind::UnexpectedEof.into()));
    }
    if let Err(e) = decoder.try_finish() {
        return Err(gzip_error(decoder.get_ref(), e));
    }
    let out = decoder.finish().map_err(DecodeError::Gzip)?;
    Ok(Bytes::from(out.buf))
}

fn gzip_error(out: &CappedBuffer, err: io::Error) -> DecodeError {
    if out.overflowed {
        DecodeError::TooLarge { limit: out.limit }
    } else {
        DecodeError::Gzip(err)
    }
}

fn decode_snappy(raw: &[u8], limit: usize) -> Result<Bytes, DecodeError> {
    if snap::raw::decompress_len(raw)? > limit {
        return Err(DecodeError::TooLarge { limit });
    }
    let decoded = snap::raw::Decoder::new().decompress_vec(raw)?;
    Ok(Bytes::from(decoded))
}

/// Write sink that refuses to grow past `limit`.
struct CappedBuffer {
    buf: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl CappedBuffer {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
            overflowed: false,
        }
    }
}

impl Write for CappedBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.buf.len() + data.len() > self.limit {
            self.overflowed = true;
            return Err(io::Error::other("decoded payload exceeds limit"));
        }
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn chunked(data: Vec<u8>, size: usize) -> Body {
        let chunks: Vec<Result<Bytes, io::Error>> = data
            .chunks(size)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Body::from_stream(futures_util::stream::iter(chunks))
    }

    #[test]
    fn encoding_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(ContentEncoding::from_headers(&headers), ContentEncoding::Identity);
        headers.insert(header::CONTENT_ENCODING, "gzip".parse().unwrap());
        assert_eq!(ContentEncoding::from_headers(&headers), ContentEncoding::Gzip);
        headers.insert(header::CONTENT_ENCODING, "snappy".parse().unwrap());
        assert_eq!(ContentEncoding::from_headers(&headers), ContentEncoding::Snappy);
        headers.insert(header::CONTENT_ENCODING, "br".parse().unwrap());
        assert_eq!(ContentEncoding::from_headers(&headers), ContentEncoding::Identity);
    }

    #[tokio::test]
    async fn identity_within_limit() {
        let out = decode_body(ContentEncoding::Identity, Body::from("cpu value=1"), 64)
            .await
            .unwrap();
        assert_eq!(&out[..], b"cpu value=1");
    }

    #[tokio::test]
    async fn identity_over_limit() {
        let body = chunked(vec![b'x'; 100], 7);
        let err = decode_body(ContentEncoding::Identity, body, 99).await.unwrap_err();
        assert!(matches!(err, DecodeError::TooLarge { limit: 99 }));
    }

    #[tokio::test]
    async fn gzip_streamed_in_small_chunks() {
        let payload = b"cpu,host=a value=1\n".repeat(200);
        let body = chunked(gzip(&payload), 5);
        let out = decode_body(ContentEncoding::Gzip, body, payload.len())
            .await
            .unwrap();
        assert_eq!(&out[..], &payload[..]);
    }

    #[tokio::test]
    async fn gzip_bomb_is_capped() {
        let payload = vec![0u8; 1 << 20];
        let compressed = gzip(&payload);
        assert!(compressed.len() < 4096);
        let err = decode_body(ContentEncoding::Gzip, Body::from(compressed), 4096)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::TooLarge { limit: 4096 }));
    }

    #[tokio::test]
    async fn gzip_garbage_is_bad_request() {
        let err = decode_body(ContentEncoding::Gzip, Body::from("not gzip at all"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Gzip(_)));
    }

    #[tokio::test]
    async fn gzip_empty_body_is_bad_request() {
        let err = decode_body(ContentEncoding::Gzip, Body::empty(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Gzip(_)));
    }

    #[tokio::test]
    async fn gzip_truncated_is_bad_request() {
        let mut compressed = gzip(b"cpu value=1");
        compressed.truncate(compressed.len() - 4);
        let err = decode_body(ContentEncoding::Gzip, Body::from(compressed), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Gzip(_)));
    }

    #[tokio::test]
    async fn snappy_block_format() {
        let payload = b"mem used=5i\n".repeat(50);
        let compressed = snap::raw::Encoder::new().compress_vec(&payload).unwrap();
        let out = decode_body(ContentEncoding::Snappy, Body::from(compressed), payload.len())
            .await
            .unwrap();
        assert_eq!(&out[..], &payload[..]);
    }

    #[tokio::test]
    async fn snappy_decoded_size_is_capped() {
        let payload = vec![b'a'; 10_000];
        let compressed = snap::raw::Encoder::new().compress_vec(&payload).unwrap();
        let err = decode_body(ContentEncoding::Snappy, Body::from(compressed), 1_000)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn snappy_garbage_is_bad_request() {
        let err = decode_body(ContentEncoding::Snappy, Body::from(vec![0xff; 16]), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, DecodeError::Snappy(_)));
    }
}
