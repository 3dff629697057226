/*
 * Responsibility
 * - GET /chatgpt: agent host の iframe に埋め込まれる UI の入口
 * - gateway では session 免除 (machine-auth 扱い)。ここで bearer を自分で再検証する
 *   - 有効な bearer → 利用者として描画
 *   - なし / 無効 → anonymous shell (token bridge が解決するまで中身は出さない)
 */
use axum::{
    extract::State,
    http::HeaderMap,
    response::Html,
};

use crate::api::html::{escape, page};
use crate::services::auth::bearer::bearer_token;
use crate::state::AppState;

pub async fn embedded_entry(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let principal = state.auth.bearer.verify(bearer_token(&headers)).await;

    let body = match principal {
        Some(principal) => {
            let who = principal.email.as_deref().unwrap_or(&principal.subject_id);
            format!(
                "<section data-session=\"authenticated\">\n<h1>Welcome</h1>\n<p>Signed in as {}</p>\n</section>",
                escape(who)
            )
        }
        None => "<section data-session=\"anonymous\"></section>".to_string(),
    };

    Html(page("Embedded", &body))
}
