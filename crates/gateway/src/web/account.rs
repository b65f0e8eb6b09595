//! Registration, login and logout for page flows

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::flash::{self, Level};
use crate::handlers::auth::authenticate;
use crate::AppState;
use roastingreels_common::{
    auth::hash_password,
    db::{models::{RoleSet, ROLE_EDITOR}, NewUser},
    errors::{field_errors, AppError, Result},
};

const EMAIL_TAKEN: &str = "There is already an account with this email.";

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Please enter your name."))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,

    #[serde(default)]
    #[validate(length(
        min = 8,
        max = 4096,
        message = "Your password should be at least 8 characters"
    ))]
    pub password: String,

    #[serde(default)]
    #[validate(must_match(other = "password", message = "The password fields must match."))]
    pub password_repeat: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AccountPage {
    pub flashes: Vec<flash::Flash>,
}

/// Roles granted at registration
pub fn initial_roles(email: &str, editor_suffix: &str) -> RoleSet {
    if !editor_suffix.is_empty() && email.ends_with(editor_suffix) {
        RoleSet::new([ROLE_EDITOR])
    } else {
        RoleSet::default()
    }
}

fn account_page(jar: CookieJar) -> Response {
    let (jar, flashes) = flash::take(jar);
    (jar, Json(AccountPage { flashes })).into_response()
}

pub async fn register_form(jar: CookieJar) -> Response {
    account_page(jar)
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut form): Form<RegistrationForm>,
) -> Result<(CookieJar, Redirect)> {
    form.name = form.name.trim().to_string();
    form.email = form.email.trim().to_lowercase();

    let mut errors = field_errors(form.validate());
    if !errors.contains_key("email")
        && state.store.find_user_by_email(&form.email).await?.is_some()
    {
        errors.insert("email".into(), EMAIL_TAKEN.into());
    }

    if !errors.is_empty() {
        return Ok((
            flash::push_all(jar, Level::Error, errors.into_values()),
            Redirect::to("/register"),
        ));
    }

    let roles = initial_roles(&form.email, &state.config.auth.editor_email_suffix);
    let created = state
        .store
        .create_user(NewUser {
            email: form.email,
            name: form.name,
            password_hash: hash_password(&form.password)?,
            roles,
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = user.id, editor = user.has_role(ROLE_EDITOR), "User registered");
            Ok((jar, Redirect::to("/login")))
        }
        // lost a race with another registration
        Err(AppError::Duplicate { .. }) => Ok((
            flash::push(jar, Level::Error, EMAIL_TAKEN),
            Redirect::to("/register"),
        )),
        Err(e) => Err(e),
    }
}

pub async fn login_form(jar: CookieJar) -> Response {
    account_page(jar)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect)> {
    let user = match authenticate(state.store.as_ref(), &form.email, &form.password).await {
        Ok(user) => user,
        Err(AppError::Unauthorized { message }) => {
            tracing::warn!(email = %form.email, "Login failed");
            return Ok((flash::push(jar, Level::Error, message), Redirect::to("/login")));
        }
        Err(e) => return Err(e),
    };

    let token = state.jwt.generate_token(&user)?;
    let cookie = Cookie::build((state.jwt.cookie_name().to_string(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(state.jwt.expiration_secs()))
        .build();

    tracing::info!(user_id = user.id, "User logged in");
    Ok((jar.add(cookie), Redirect::to("/")))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let cookie = Cookie::build((state.jwt.cookie_name().to_string(), "")).path("/");
    (jar.remove(cookie), Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flash_messages, location, set_cookie, TestApp, PASSWORD};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use roastingreels_common::auth::AuthContext;

    #[test]
    fn test_editor_suffix_grants_role() {
        let suffix = "@roastingreels.editor.com";
        assert_eq!(
            initial_roles("ann@roastingreels.editor.com", suffix).stored(),
            [ROLE_EDITOR.to_string()]
        );
        assert!(initial_roles("ann@example.com", suffix).stored().is_empty());
        assert!(initial_roles("ann@roastingreels.editor.com.evil", suffix)
            .stored()
            .is_empty());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let app = TestApp::new().await;

        let response = app
            .form(
                "/register",
                None,
                "name=Ann&email=ann%40roastingreels.editor.com&password=long-enough&password_repeat=long-enough",
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        let user = app
            .state
            .store
            .find_user_by_email("ann@roastingreels.editor.com")
            .await
            .unwrap()
            .unwrap();
        assert!(user.has_role(ROLE_EDITOR));
        assert_ne!(user.password, "long-enough");

        let response = app
            .form(
                "/login",
                None,
                "email=ann%40roastingreels.editor.com&password=long-enough",
            )
            .await;
        assert_eq!(location(&response), "/");

        let token = set_cookie(&response, "auth_token").unwrap();
        let context = AuthContext::try_from(app.state.jwt.validate_token(&token).unwrap()).unwrap();
        assert_eq!(context.user_id, user.id);
        assert!(context.is_editor());
    }

    #[tokio::test]
    async fn test_register_rejects_short_and_mismatched_passwords() {
        let app = TestApp::new().await;

        let response = app
            .form(
                "/register",
                None,
                "name=Bo&email=bo%40example.com&password=short&password_repeat=other",
            )
            .await;

        assert_eq!(location(&response), "/register");
        let messages = flash_messages(&response);
        assert!(messages.contains(&"Your password should be at least 8 characters".to_string()));
        assert!(messages.contains(&"The password fields must match.".to_string()));
        assert!(app.state.store.find_user_by_email("bo@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let app = TestApp::new().await;
        app.member().await;

        let response = app
            .form(
                "/register",
                None,
                "name=Copy&email=Member%40example.com&password=long-enough&password_repeat=long-enough",
            )
            .await;

        assert_eq!(location(&response), "/register");
        assert_eq!(flash_messages(&response), vec![EMAIL_TAKEN.to_string()]);
    }

    #[tokio::test]
    async fn test_login_with_bad_password() {
        let app = TestApp::new().await;
        app.member().await;

        let response = app
            .form("/login", None, "email=member%40example.com&password=wrong-password")
            .await;

        assert_eq!(location(&response), "/login");
        assert_eq!(flash_messages(&response), vec!["Invalid credentials.".to_string()]);
        assert!(set_cookie(&response, "auth_token").is_none());
    }

    #[tokio::test]
    async fn test_login_with_known_password() {
        let app = TestApp::new().await;
        app.member().await;

        let response = app
            .form("/login", None, &format!("email=member%40example.com&password={}", PASSWORD))
            .await;

        assert_eq!(location(&response), "/");
        assert!(set_cookie(&response, "auth_token").is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = TestApp::new().await;
        let token = app.member_token().await;

        let response = app.page("/logout", Some(&token)).await;

        assert_eq!(location(&response), "/");
        assert_eq!(set_cookie(&response, "auth_token").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_flash_is_shown_once() {
        let app = TestApp::new().await;
        let cookie = flash::encode(&[flash::Flash {
            level: Level::Success,
            message: "Saved".into(),
        }]);
        let request = Request::get("/login")
            .header(header::COOKIE, format!("flash={}", cookie))
            .body(Body::empty())
            .unwrap();

        let response = app.send(request).await;

        assert_eq!(set_cookie(&response, "flash").as_deref(), Some(""));
        let body = crate::test_support::body_json(response).await;
        assert_eq!(body["flashes"][0]["message"], "Saved");
        assert_eq!(body["flashes"][0]["level"], "success");
    }
}
