//! Account route handlers: signup, login, logout and profile.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::{OrderRepository, UserRepository};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{
    PageContext, RequireAuth, end_session, flash, set_current_user,
};
use crate::models::{CurrentUser, FlashLevel, Order, User};
use crate::services::auth::{AuthError, AuthService, Registration};
use crate::state::AppState;

/// Recent orders shown on the profile page.
const PROFILE_ORDERS: usize = 5;

/// Where to go after login: a same-site absolute path, or home.
#[must_use]
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        is_staff: user.is_staff,
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

// =============================================================================
// Forms
// =============================================================================

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// Signup form data.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    fn registration(&self) -> Registration<'_> {
        Registration {
            username: &self.username,
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            password: &self.password1,
            password_confirmation: &self.password2,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/signup.html")]
pub struct SignupTemplate {
    pub page: PageContext,
    pub form: SignupForm,
    pub error: Option<String>,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "users/profile.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub user: User,
    pub orders: Vec<Order>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(page))]
pub async fn login_page(page: PageContext, Query(query): Query<NextQuery>) -> LoginTemplate {
    LoginTemplate {
        page,
        username: String::new(),
        next: query.next.unwrap_or_default(),
        error: None,
    }
}

/// Handle login form submission.
#[instrument(skip(state, page, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let user = match AuthService::new(state.pool())
        .login(&form.username, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials) => {
            tracing::info!("Login failed");
            return Ok(LoginTemplate {
                page,
                username: form.username,
                next: form.next.unwrap_or_default(),
                error: Some(AuthError::InvalidCredentials.user_message()),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    start_session(&session, &user).await?;
    flash(
        &session,
        FlashLevel::Success,
        format!("Welcome back, {}!", user.username),
    )
    .await;

    Ok(Redirect::to(safe_next(form.next.as_deref())).into_response())
}

/// Log out, discarding the cart with the session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    end_session(&session).await?;
    clear_sentry_user();
    flash(
        &session,
        FlashLevel::Success,
        "You have been logged out successfully.",
    )
    .await;
    Ok(Redirect::to("/"))
}

// =============================================================================
// Signup Routes
// =============================================================================

/// Display the signup page.
#[instrument(skip(page))]
pub async fn signup_page(page: PageContext) -> SignupTemplate {
    SignupTemplate {
        page,
        form: SignupForm::default(),
        error: None,
    }
}

/// Create an account and log it in.
#[instrument(skip(state, page, session, form), fields(username = %form.username))]
pub async fn signup(
    State(state): State<AppState>,
    page: PageContext,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let user = match AuthService::new(state.pool())
        .register(&form.registration())
        .await
    {
        Ok(user) => user,
        Err(e @ (AuthError::Repository(_) | AuthError::PasswordHash)) => return Err(e.into()),
        Err(e) => {
            let error = Some(e.user_message());
            let form = SignupForm {
                password1: String::new(),
                password2: String::new(),
                ..form
            };
            return Ok(SignupTemplate { page, form, error }.into_response());
        }
    };

    start_session(&session, &user).await?;
    flash(
        &session,
        FlashLevel::Success,
        format!(
            "Welcome to Metra, {}! Your account has been created successfully.",
            user.username
        ),
    )
    .await;

    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Profile
// =============================================================================

/// Account details and recent orders.
#[instrument(skip(state, page, user))]
pub async fn profile(
    State(state): State<AppState>,
    page: PageContext,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let Some(account) = UserRepository::new(state.pool()).get_by_id(user.id).await? else {
        // account deleted while the session was alive
        return Ok(Redirect::to("/users/login/").into_response());
    };
    let mut orders = OrderRepository::new(state.pool())
        .list_for_user(account.id)
        .await?;
    orders.truncate(PROFILE_ORDERS);

    Ok(ProfileTemplate {
        page,
        user: account,
        orders,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_rejects_offsite_targets() {
        assert_eq!(safe_next(Some("/orders/")), "/orders/");
        assert_eq!(safe_next(Some("//evil.example/")), "/");
        assert_eq!(safe_next(Some("https://evil.example/")), "/");
        assert_eq!(safe_next(None), "/");
    }

    #[test]
    fn test_signup_form_maps_password_fields() {
        let form = SignupForm {
            password1: "first".to_string(),
            password2: "second".to_string(),
            ..SignupForm::default()
        };
        let reg = form.registration();
        assert_eq!(reg.password, "first");
        assert_eq!(reg.password_confirmation, "second");
    }
}
