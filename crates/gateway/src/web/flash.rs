//! One-shot notices carried across a redirect in a cookie

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

/// Queue a message for the next page view
pub fn push(jar: CookieJar, level: Level, message: impl Into<String>) -> CookieJar {
    push_all(jar, level, [message.into()])
}

pub fn push_all<I>(jar: CookieJar, level: Level, messages: I) -> CookieJar
where
    I: IntoIterator<Item = String>,
{
    let mut queued = read(&jar);
    queued.extend(messages.into_iter().map(|message| Flash { level, message }));

    let cookie = Cookie::build((FLASH_COOKIE, encode(&queued)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    jar.add(cookie)
}

/// Drain the queued messages
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Flash>) {
    let queued = read(&jar);
    if queued.is_empty() {
        return (jar, queued);
    }

    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), queued)
}

fn read(jar: &CookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .map(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

pub fn encode(messages: &[Flash]) -> String {
    URL_SAFE_NO_PAD.encode(serde_json::to_vec(messages).unwrap_or_default())
}

/// Messages in a cookie value; anything unreadable is dropped
pub fn decode(value: &str) -> Vec<Flash> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}
