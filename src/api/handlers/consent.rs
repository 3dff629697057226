/*
 * Responsibility
 * - GET /oauth/consent?authorization_id=... (session gated)
 * - 認可サーバから authorization details を取得し、approve / deny の form を描画
 * - id 欠如 / 取得失敗は error 表示 (400)。redirect はしない
 */
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use crate::api::extractors::PrincipalExtractor;
use crate::api::html::{error_page, escape, page};
use crate::services::auth::AuthServerError;
use crate::services::auth::server::AuthorizationDetails;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConsentQuery {
    #[serde(default)]
    pub authorization_id: Option<String>,
}

pub async fn consent_page(
    State(state): State<AppState>,
    PrincipalExtractor(principal): PrincipalExtractor,
    Query(query): Query<ConsentQuery>,
) -> Response {
    let Some(authorization_id) = query
        .authorization_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
    else {
        return error_page(StatusCode::BAD_REQUEST, "Missing authorization_id");
    };

    match state
        .auth
        .server
        .get_authorization_details(&authorization_id, &principal.token)
        .await
    {
        Ok(details) => Html(render(&authorization_id, &details)).into_response(),
        Err(err) => {
            warn!(error = ?err, %authorization_id, "authorization details unavailable");
            let message = match err {
                AuthServerError::Api { message, .. } if !message.is_empty() => message,
                _ => "Invalid authorization request".to_string(),
            };
            error_page(StatusCode::BAD_REQUEST, &message)
        }
    }
}

fn render(authorization_id: &str, details: &AuthorizationDetails) -> String {
    let client = escape(&details.client.name);
    let scopes = details.scopes();

    let mut body = format!(
        "<h1>Authorize {client}</h1>\n\
         <p>This application wants to access your account.</p>\n\
         <dl>\n<dt>Client:</dt><dd>{client}</dd>\n"
    );
    if let Some(client_id) = &details.client.client_id {
        body.push_str(&format!(
            "<dt>Client ID:</dt><dd><code>{}</code></dd>\n",
            escape(client_id)
        ));
    }
    body.push_str(&format!(
        "<dt>Redirect URI:</dt><dd><code>{}</code></dd>\n</dl>\n",
        escape(&details.redirect_url),
    ));

    if !scopes.is_empty() {
        body.push_str("<p>Requested permissions:</p>\n<ul>\n");
        for scope in scopes {
            body.push_str(&format!("<li><code>{}</code></li>\n", escape(scope)));
        }
        body.push_str("</ul>\n");
    }

    body.push_str(&format!(
        "<form action=\"/api/oauth/decision\" method=\"POST\">\n\
         <input type=\"hidden\" name=\"authorization_id\" value=\"{}\">\n\
         <button type=\"submit\" name=\"decision\" value=\"approve\">Approve</button>\n\
         <button type=\"submit\" name=\"decision\" value=\"deny\">Deny</button>\n\
         </form>",
        escape(authorization_id)
    ));

    page(&format!("Authorize {}", details.client.name), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::server::OAuthClientInfo;

    #[test]
    fn renders_client_scopes_and_decision_form() {
        let details = AuthorizationDetails {
            authorization_id: "az_1".into(),
            client: OAuthClientInfo {
                name: "Agent <beta>".into(),
                client_id: Some("c1".into()),
            },
            redirect_url: "https://client.example.com/cb".into(),
            scope: Some("openid email".into()),
        };

        let html = render("az_1", &details);

        assert!(html.contains("Authorize Agent &lt;beta&gt;"));
        assert!(html.contains("<dt>Client ID:</dt><dd><code>c1</code></dd>"));
        assert!(html.contains("<li><code>openid</code></li>"));
        assert!(html.contains("<li><code>email</code></li>"));
        assert!(html.contains("name=\"authorization_id\" value=\"az_1\""));
        assert!(html.contains("action=\"/api/oauth/decision\""));
    }
}
