use crate::error::{Error, Result};
use hyper::StatusCode;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body("Not Found".as_bytes().to_vec())
    }

    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body("Internal Server Error".as_bytes().to_vec())
    }

    /// 204 No Content
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    pub fn redirect(location: &str) -> Self {
        Self::new(StatusCode::FOUND).with_header("Location", location)
    }

    /// Map a handler error onto an HTTP response. Server-side errors keep a
    /// generic body so internals never leak to clients.
    pub fn from_error(err: &Error) -> Self {
        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            Self::internal_error()
        } else {
            Self::new(status)
                .with_header("Content-Type", "text/plain; charset=utf-8")
                .with_body(err.to_string().into_bytes())
        }
    }

    pub fn json<T: Serialize>(data: T) -> Result<Self> {
        let json_string = serde_json::to_string(&data)?;
        Ok(Self::ok()
            .with_header("Content-Type", "application/json")
            .with_body(json_string.into_bytes()))
    }

    pub fn html(content: impl Into<String>) -> Self {
        Self::ok()
            .with_header("Content-Type", "text/html; charset=utf-8")
            .with_body(content.into().into_bytes())
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::ok()
            .with_header("Content-Type", "text/plain; charset=utf-8")
            .with_body(content.into().into_bytes())
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Add a header to an existing response (mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Get the body size in bytes
    pub fn body_size(&self) -> usize {
        self.body.len()
    }

    pub fn into_hyper(self) -> hyper::Response<hyper::Body> {
        let mut builder = hyper::Response::builder().status(self.status);

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        builder
            .body(hyper::Body::from(self.body))
            .unwrap_or_else(|_| hyper::Response::new(hyper::Body::empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_constructors() {
        assert_eq!(Response::ok().status, StatusCode::OK);
        assert_eq!(Response::not_found().status, StatusCode::NOT_FOUND);
        assert_eq!(Response::no_content().status, StatusCode::NO_CONTENT);
        assert_eq!(
            Response::internal_error().status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_json_response() {
        let resp = Response::json(serde_json::json!({"ok": true})).unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.body, br#"{"ok":true}"#);
    }

    #[test]
    fn test_from_error_hides_internal_details() {
        let resp = Response::from_error(&Error::internal("secret detail"));
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body, b"Internal Server Error");

        let resp = Response::from_error(&Error::validation("bad value"));
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(String::from_utf8(resp.body).unwrap().contains("bad value"));
    }

    #[test]
    fn test_headers() {
        let resp = Response::ok().with_header("X-One", "1");
        let mut resp = resp;
        resp.add_header("X-Two", "2");
        assert_eq!(resp.headers.len(), 2);
    }
}
