//! One-shot status messages carried in a signed cookie

use axum_extra::extract::cookie::{Cookie, SignedCookieJar};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};

const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

fn decode(value: &str) -> Vec<FlashMessage> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn encode(messages: &[FlashMessage]) -> String {
    // Serializing plain strings and enums cannot fail
    let json = serde_json::to_vec(messages).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn pending(jar: &SignedCookieJar) -> Vec<FlashMessage> {
    jar.get(FLASH_COOKIE)
        .map(|cookie| decode(cookie.value()))
        .unwrap_or_default()
}

/// Queue `message` for the next rendered page
pub fn push(jar: SignedCookieJar, message: FlashMessage) -> SignedCookieJar {
    let mut messages = pending(&jar);
    messages.push(message);

    let cookie = Cookie::build((FLASH_COOKIE, encode(&messages)))
        .path("/")
        .http_only(true);
    jar.add(cookie)
}

/// Drain all queued messages; they are not shown again
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<FlashMessage>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }

    let messages = pending(&jar);
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, messages)
}
