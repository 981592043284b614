use crate::auth::{self, SessionUser};
use crate::error::AppError;
use crate::forms::{AddCashForm, ChangePasswordForm, LoginForm, RegisterForm};
use crate::handlers::AppState;
use crate::trading;
use crate::views::{
    render, AddCashTemplate, ChangePasswordTemplate, LoginTemplate, RegisterTemplate,
};
use axum::{
    extract::State,
    response::{Html, Redirect},
    Form,
};
use tower_sessions::Session;

pub async fn register_form() -> Result<Html<String>, AppError> {
    render(&RegisterTemplate { user: None })
}

/// Create an account and log straight into it.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, AppError> {
    let registration = form.validate()?;
    let user = auth::register(&state.pool, registration).await?;
    auth::start_session(&session, &user).await?;
    Ok(Redirect::to("/"))
}

/// Showing the login page forgets any current user.
pub async fn login_form(session: Session) -> Result<Html<String>, AppError> {
    session.clear().await;
    render(&LoginTemplate { user: None })
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AppError> {
    session.clear().await;
    let credentials = form.validate()?;
    let user = auth::login(&state.pool, credentials).await?;
    auth::start_session(&session, &user).await?;
    Ok(Redirect::to("/"))
}

pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    auth::end_session(&session).await?;
    Ok(Redirect::to("/"))
}

pub async fn change_password_form(user: SessionUser) -> Result<Html<String>, AppError> {
    render(&ChangePasswordTemplate {
        user: Some(user.username),
    })
}

pub async fn change_password(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Redirect, AppError> {
    let change = form.validate()?;
    auth::change_password(&state.pool, user.id, change).await?;
    Ok(Redirect::to("/"))
}

pub async fn add_cash_form(user: SessionUser) -> Result<Html<String>, AppError> {
    render(&AddCashTemplate {
        user: Some(user.username),
    })
}

pub async fn add_cash(
    State(state): State<AppState>,
    user: SessionUser,
    Form(form): Form<AddCashForm>,
) -> Result<Redirect, AppError> {
    let deposit = form.validate()?;
    trading::add_cash(&state.pool, user.id, deposit).await?;
    Ok(Redirect::to("/"))
}
