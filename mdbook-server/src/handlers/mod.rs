//! Request handlers

mod books;
mod export;
mod items;
mod references;
mod sync;

pub use books::*;
pub use export::*;
pub use items::*;
pub use references::*;
pub use sync::*;

use axum::Json;
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Keep only characters safe in a download file name
fn sanitize_filename(name: &str, max_len: usize) -> String {
    name.chars()
        .take(max_len)
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_' || *c == '.')
        .collect::<String>()
        .trim()
        .to_string()
}

/// `Content-Disposition` value for an attachment
fn attachment(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_filename() {
        assert_eq!(sanitize_filename("Brevet/../x", 50), "Brevet..x");
        assert_eq!(
            attachment("Åland.docx"),
            "attachment; filename=\"_land.docx\"; filename*=UTF-8''%C3%85land.docx"
        );
    }
}
