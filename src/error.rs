use crate::auth::validate_session;
use crate::quotes::QuoteError;
use crate::views::ApologyTemplate;
use askama::Template;
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tower_sessions::Session;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("{0}")]
    Auth(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0}")]
    Lookup(&'static str),
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("amount too large")]
    Overflow,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("Password hashing error: {0}")]
    Hash(argon2::password_hash::Error),
    #[error("Quote source error: {0}")]
    Quotes(#[from] QuoteError),
    #[error("Template error: {0}")]
    Render(#[from] askama::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::Conflict(_)
            | AppError::Lookup(_)
            | AppError::Overflow => StatusCode::BAD_REQUEST,
            AppError::Auth(_) | AppError::InsufficientFunds => StatusCode::FORBIDDEN,
            AppError::Quotes(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::Hash(_)
            | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message shown to the user. Internal failures get a generic one.
    fn public_message(&self) -> String {
        match self {
            AppError::Quotes(_) => "quote service unavailable".to_string(),
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::Hash(_)
            | AppError::Render(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Auth(reason) => tracing::debug!("Rejected credentials: {}", reason),
            AppError::Database(_)
            | AppError::Session(_)
            | AppError::Hash(_)
            | AppError::Quotes(_)
            | AppError::Render(_) => tracing::error!(error = ?self, "Request failed"),
            _ => {}
        }

        let apology = Apology {
            status,
            message: self.public_message(),
        };
        let mut response = render_apology(&apology, None);
        response.extensions_mut().insert(apology);
        response
    }
}

/// Status and message of a rendered apology, kept so the page can be
/// rendered again once the session user is known.
#[derive(Debug, Clone)]
struct Apology {
    status: StatusCode,
    message: String,
}

fn render_apology(apology: &Apology, user: Option<String>) -> Response {
    let template = ApologyTemplate {
        user,
        code: apology.status.as_u16(),
        message: &apology.message,
    };
    match template.render() {
        Ok(html) => (apology.status, Html(html)).into_response(),
        Err(_) => (apology.status, apology.message.clone()).into_response(),
    }
}

/// Re-render apology pages with the logged in user's navigation.
///
/// Errors are converted to responses without access to the session, so the
/// first rendering always shows the logged out navigation.
pub async fn apology_with_user(request: Request, next: Next) -> Response {
    let session = request.extensions().get::<Session>().cloned();
    let response = next.run(request).await;

    let apology = response.extensions().get::<Apology>().cloned();
    let (Some(apology), Some(session)) = (apology, session) else {
        return response;
    };
    match validate_session(&session).await {
        Ok(Some(user)) => render_apology(&apology, Some(user.username)),
        _ => response,
    }
}
