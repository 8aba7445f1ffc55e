//! HTTP response building module
//!
//! Provides builders for the responses the file server produces.

use super::body::{FileBody, ResponseBody};
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LOCATION};
use hyper::{Response, StatusCode};

const ERROR_CONTENT_TYPE: &str = "text/html;charset=utf-8";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Build an error response with a small HTML explanation
pub fn build_error_response(
    status: StatusCode,
    message: &str,
    is_head: bool,
) -> Response<ResponseBody> {
    let page = error_page(status, message);
    let content_length = page.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(page)
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, ERROR_CONTENT_TYPE)
        .header(CONTENT_LENGTH, content_length)
        .body(ResponseBody::full(body))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            fallback(status)
        })
}

/// Build 400 Bad Request response
pub fn build_400_response(is_head: bool) -> Response<ResponseBody> {
    build_error_response(StatusCode::BAD_REQUEST, "Bad request path.", is_head)
}

/// Build 403 Forbidden response
pub fn build_403_response(is_head: bool) -> Response<ResponseBody> {
    build_error_response(StatusCode::FORBIDDEN, "Access denied.", is_head)
}

/// Build 404 Not Found response
pub fn build_404_response(is_head: bool) -> Response<ResponseBody> {
    build_error_response(StatusCode::NOT_FOUND, "File not found.", is_head)
}

/// Build 500 Internal Server Error response
pub fn build_500_response(is_head: bool) -> Response<ResponseBody> {
    build_error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Error reading file.",
        is_head,
    )
}

/// Build 501 Not Implemented response for unsupported methods
pub fn build_501_response(method: &str) -> Response<ResponseBody> {
    build_error_response(
        StatusCode::NOT_IMPLEMENTED,
        &format!("Unsupported method ({}).", escape_html(method)),
        false,
    )
}

/// Build 301 redirect response
pub fn build_redirect_response(target: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, target)
        .header(CONTENT_LENGTH, 0)
        .body(ResponseBody::empty())
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::MOVED_PERMANENTLY, &e);
            fallback(StatusCode::MOVED_PERMANENTLY)
        })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(LAST_MODIFIED, last_modified)
        .body(ResponseBody::empty())
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::NOT_MODIFIED, &e);
            fallback(StatusCode::NOT_MODIFIED)
        })
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, HTML_CONTENT_TYPE)
        .header(CONTENT_LENGTH, content_length)
        .body(ResponseBody::full(body))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::OK, &e);
            fallback(StatusCode::OK)
        })
}

/// Build 200 response streaming a file
///
/// `Content-Length` always reflects the file size, also for HEAD, where the
/// file is dropped unread.
pub fn build_file_response(
    file: FileBody,
    content_type: &str,
    last_modified: Option<&str>,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_length = file.remaining();
    let body = if is_head {
        ResponseBody::empty()
    } else {
        ResponseBody::File(file)
    };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, content_length);
    if let Some(last_modified) = last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(StatusCode::OK, &e);
        fallback(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn error_page(status: StatusCode, message: &str) -> String {
    format!(
        "<!DOCTYPE HTML>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>Error response</title>\n\
         </head>\n\
         <body>\n\
         <h1>Error response</h1>\n\
         <p>Error code: {}</p>\n\
         <p>Message: {}</p>\n\
         </body>\n\
         </html>\n",
        status.as_u16(),
        message,
    )
}

fn fallback(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::empty());
    *response.status_mut() = status;
    response
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempRoot;
    use http_body_util::BodyExt;

    async fn body_string(response: Response<ResponseBody>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_page() {
        let response = build_404_response(false);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], ERROR_CONTENT_TYPE);
        let body = body_string(response).await;
        assert!(body.contains("Error code: 404"));
        assert!(body.contains("File not found."));
    }

    #[tokio::test]
    async fn test_head_error_keeps_length() {
        let response = build_403_response(true);
        let length: usize = response.headers()[CONTENT_LENGTH]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(length > 0);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_501_escapes_method() {
        let body = body_string(build_501_response("<X>")).await;
        assert!(body.contains("Unsupported method (&lt;X&gt;)."));
    }

    #[test]
    fn test_redirect() {
        let response = build_redirect_response("/docs/?page=2");
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers()[LOCATION], "/docs/?page=2");
    }

    #[tokio::test]
    async fn test_file_response_head() {
        let root = TempRoot::new();
        root.write("app.wasm", b"\0asm");
        let file = tokio::fs::File::open(root.path().join("app.wasm")).await.unwrap();

        let response = build_file_response(
            FileBody::new(file, 4),
            "application/wasm",
            Some("Sun, 06 Nov 1994 08:49:37 GMT"),
            true,
        );
        assert_eq!(response.headers()[CONTENT_LENGTH], "4");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/wasm");
        assert_eq!(
            response.headers()[LAST_MODIFIED],
            "Sun, 06 Nov 1994 08:49:37 GMT"
        );
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_file_response_streams_file() {
        let root = TempRoot::new();
        root.write("main.js", b"console.log(1)");
        let file = tokio::fs::File::open(root.path().join("main.js")).await.unwrap();

        let response =
            build_file_response(FileBody::new(file, 14), "text/javascript", None, false);
        assert_eq!(response.headers()[CONTENT_LENGTH], "14");
        assert!(!response.headers().contains_key(LAST_MODIFIED));
        assert_eq!(body_string(response).await, "console.log(1)");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }
}
