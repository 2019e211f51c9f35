use http::header;
use httparse::Status;
use tracing::trace;

use crate::protocol::{TransferEncoding, TransferError};

const MAX_HEADER_NUM: usize = 64;

/// Derive the body framing from a response header section.
///
/// Intended for use inside a reader's headers-done callback: pass the
/// header blob straight through. Per RFC 7230 §3.3, a `Transfer-Encoding`
/// whose final encoding is `chunked` wins; otherwise `Content-Length`
/// fixes the body size; otherwise the body runs to connection close.
pub fn response_framing(head: &[u8]) -> Result<TransferEncoding, TransferError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut response = httparse::Response::new(&mut headers);

    match response.parse(head) {
        Ok(Status::Complete(parsed)) => {
            trace!(header_size = parsed, "parsed response head");
            derive(response.headers, TransferEncoding::Unknown)
        }
        Ok(Status::Partial) => {
            Err(TransferError::InvalidHeader { reason: "incomplete header section".into() })
        }
        Err(e) => Err(TransferError::InvalidHeader { reason: e.to_string() }),
    }
}

/// Derive the body framing from a request header section.
///
/// Requests that declare no framing have no body.
pub fn request_framing(head: &[u8]) -> Result<TransferEncoding, TransferError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut request = httparse::Request::new(&mut headers);

    match request.parse(head) {
        Ok(Status::Complete(parsed)) => {
            trace!(header_size = parsed, "parsed request head");
            derive(request.headers, TransferEncoding::Length(0))
        }
        Ok(Status::Partial) => {
            Err(TransferError::InvalidHeader { reason: "incomplete header section".into() })
        }
        Err(e) => Err(TransferError::InvalidHeader { reason: e.to_string() }),
    }
}

fn derive(
    headers: &[httparse::Header<'_>],
    fallback: TransferEncoding,
) -> Result<TransferEncoding, TransferError> {
    let mut te_value = None;
    let mut cl_value = None;

    for h in headers {
        if h.name.eq_ignore_ascii_case(header::TRANSFER_ENCODING.as_str()) {
            te_value = Some(h.value);
        } else if h.name.eq_ignore_ascii_case(header::CONTENT_LENGTH.as_str()) {
            cl_value = Some(h.value);
        }
    }

    match (te_value, cl_value) {
        (None, None) => Ok(fallback),

        (Some(te), None) => {
            if is_chunked(te) {
                Ok(TransferEncoding::Chunked)
            } else {
                Ok(fallback)
            }
        }

        (None, Some(cl)) => {
            let cl_str = std::str::from_utf8(cl)
                .map_err(|_| TransferError::InvalidContentLength { reason: "not utf-8".into() })?;
            let length = cl_str
                .trim()
                .parse::<u64>()
                .map_err(|_| TransferError::InvalidContentLength { reason: cl_str.into() })?;
            Ok(TransferEncoding::Length(length))
        }

        (Some(_), Some(_)) => Err(TransferError::InvalidContentLength {
            reason: "transfer-encoding and content-length both present".into(),
        }),
    }
}

fn is_chunked(value: &[u8]) -> bool {
    std::str::from_utf8(value)
        .ok()
        .and_then(|encodings| encodings.rsplit(',').next())
        .map(|last_encoding| last_encoding.trim().eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn chunked_response() {
        let head = indoc! {b"
            HTTP/1.1 200 OK
            Transfer-Encoding: chunked

        "};
        assert_eq!(response_framing(head).unwrap(), TransferEncoding::Chunked);
    }

    #[test]
    fn chunked_must_be_last_encoding() {
        let head = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip, chunked\r\n\r\n";
        assert_eq!(response_framing(head).unwrap(), TransferEncoding::Chunked);

        let head = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked, gzip\r\n\r\n";
        assert_eq!(response_framing(head).unwrap(), TransferEncoding::Unknown);
    }

    #[test]
    fn content_length_response() {
        let head = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n";
        assert_eq!(response_framing(head).unwrap(), TransferEncoding::Length(5));
    }

    #[test]
    fn bare_response_reads_to_eof() {
        let head = b"HTTP/1.1 200 OK\r\nServer: test\r\n\r\n";
        assert_eq!(response_framing(head).unwrap(), TransferEncoding::Unknown);
    }

    #[test]
    fn bare_request_has_no_body() {
        let head = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
        assert_eq!(request_framing(head).unwrap(), TransferEncoding::Length(0));
    }

    #[test]
    fn request_with_length() {
        let head = b"POST /upload HTTP/1.1\r\nContent-Length: 42\r\n\r\n";
        assert_eq!(request_framing(head).unwrap(), TransferEncoding::Length(42));
    }

    #[test]
    fn conflicting_framing_headers() {
        let head =
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Length: 5\r\n\r\n";
        let err = response_framing(head).unwrap_err();
        assert!(matches!(err, TransferError::InvalidContentLength { .. }));
    }

    #[test]
    fn invalid_content_length() {
        let head = b"HTTP/1.1 200 OK\r\nContent-Length: five\r\n\r\n";
        let err = response_framing(head).unwrap_err();
        assert!(matches!(err, TransferError::InvalidContentLength { .. }));
    }
}
