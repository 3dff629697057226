//! Minimal server-rendered pages (login, consent, embedded shell).
//!
//! Styling is out of scope; pages are plain HTML with escaped dynamic values.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Escape text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap `body` (already escaped) in a complete document.
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n<main>\n{}\n</main>\n</body>\n</html>\n",
        escape(title),
        body
    )
}

/// Rendered error state: never a redirect.
pub fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!("<p role=\"alert\">Error: {}</p>", escape(message));
    (status, Html(page("Error", &body))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn error_page_keeps_status() {
        let response = error_page(StatusCode::BAD_REQUEST, "Missing authorization_id");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
