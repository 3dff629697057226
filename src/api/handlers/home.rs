/*
 * Responsibility
 * - GET / (session gated): サインイン中のユーザーと logout form
 */
use axum::response::Html;

use crate::api::extractors::PrincipalExtractor;
use crate::api::html::{escape, page};

pub async fn home(PrincipalExtractor(principal): PrincipalExtractor) -> Html<String> {
    let who = principal.email.as_deref().unwrap_or(&principal.subject_id);
    let body = format!(
        "<h1>Home</h1>\n<p>Signed in as {}</p>\n\
         <form action=\"/auth/logout\" method=\"POST\"><button type=\"submit\">Sign out</button></form>",
        escape(who)
    );
    Html(page("Home", &body))
}
