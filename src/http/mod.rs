//! HTTP protocol layer module
//!
//! Protocol-level helpers kept apart from the file-serving logic: MIME
//! resolution, request path translation, date validators, response bodies,
//! response builders and the cross-origin isolation layer.

pub mod body;
pub mod cache;
pub mod isolation;
pub mod mime;
pub mod path;
pub mod response;

// Re-export commonly used items
pub use body::{FileBody, ResponseBody};
pub use isolation::Isolated;
pub use mime::resolve_mime_type;
pub use response::{
    build_304_response, build_400_response, build_403_response, build_404_response,
    build_500_response, build_501_response, build_error_response, build_file_response,
    build_html_response, build_redirect_response,
};
