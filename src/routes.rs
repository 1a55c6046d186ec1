use std::{borrow::Cow, collections::HashMap};

use actix_session::Session;
use actix_web::{
    http::header,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::{Deserialize, Serialize};
use tera::Context;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    errors::AppError,
    flash::{flash, take_flashes},
    AppState,
};

/// The routing table: every path and method the application answers.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(vec!["/", "/index"])
            .name("index")
            .route(web::get().to(index_handler)),
    )
    .service(
        web::resource("/login")
            .name("login")
            .route(web::get().to(login_handler))
            .route(web::post().to(login_form_handler)),
    );
}

#[derive(Serialize)]
struct DisplayUser {
    username: &'static str,
}

#[derive(Serialize)]
struct DirectoryEntry {
    financial_year: &'static str,
    category: &'static str,
    description: &'static str,
}

// Fixed demo content until the page is wired to the directories table.
const DEMO_USER: DisplayUser = DisplayUser {
    username: "Adminator",
};

fn demo_directories() -> Vec<DirectoryEntry> {
    vec![
        DirectoryEntry {
            financial_year: "2024",
            category: "banking",
            description: "Bank statements and reconciliations",
        },
        DirectoryEntry {
            financial_year: "2024",
            category: "receivables",
            description: "Customer invoices and remittances",
        },
        DirectoryEntry {
            financial_year: "2024",
            category: "payables",
            description: "Supplier bills and payment runs",
        },
    ]
}

fn render(state: &AppState, template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = state.templates.render(template, context).map_err(|e| {
        log::error!("Failed to render template {}: {}", template, e);
        AppError::TemplateError(e)
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

/// index handler
pub async fn index_handler(
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let mut context = Context::new();
    context.insert("title", "Home");
    context.insert("user", &DEMO_USER);
    context.insert("directories", &demo_directories());
    context.insert("messages", &take_flashes(&session)?);

    render(&state, "index.html", &context)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required")
            .with_message(Cow::Borrowed("This field is required.")));
    }
    Ok(())
}

/// Sign-in form. Only its shape is validated; the credentials are not
/// checked against stored users.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    username: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    password: String,
    #[serde(default)]
    remember_me: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    submit: Option<String>,
}

impl LoginForm {
    /// Unchecked boxes are not submitted at all; `false` and empty count as off.
    pub fn remember_me(&self) -> bool {
        match self.remember_me.as_deref() {
            None => false,
            Some(value) => !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "false"),
        }
    }
}

/// What the login template sees. The password is never sent back.
#[derive(Serialize, Default)]
struct LoginFormView {
    username: String,
    remember_me: bool,
    errors: HashMap<String, Vec<String>>,
}

impl LoginFormView {
    fn empty() -> Self {
        let mut view = Self::default();
        for field in ["username", "password"] {
            view.errors.insert(field.to_string(), Vec::new());
        }
        view
    }

    fn rejected(form: &LoginForm, errors: &ValidationErrors) -> Self {
        let mut view = Self::empty();
        view.username = form.username.clone();
        view.remember_me = form.remember_me();
        for (field, field_errors) in errors.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            view.errors.insert(field.to_string(), messages);
        }
        view
    }
}

fn render_login(
    state: &AppState,
    session: &Session,
    form: &LoginFormView,
) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("title", "Sign In");
    context.insert("form", form);
    context.insert("messages", &take_flashes(session)?);

    render(state, "login.html", &context)
}

/// login page
pub async fn login_handler(
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    render_login(&state, &session, &LoginFormView::empty())
}

fn login_message(form: &LoginForm) -> String {
    let remember_me = if form.remember_me() { "True" } else { "False" };
    format!(
        "Login requested for user {}, remember_me={}",
        form.username, remember_me
    )
}

/// login form submission
pub async fn login_form_handler(
    web::Form(form): web::Form<LoginForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<impl Responder, AppError> {
    if let Err(errors) = form.validate() {
        log::info!("Login form rejected: {}", errors);
        return render_login(&state, &session, &LoginFormView::rejected(&form, &errors));
    }

    let message = login_message(&form);
    log::info!("{}", message);
    flash(&session, message)?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/index"))
        .finish())
}
