//! Visitor identity and preferences
//!
//! A durable visitor id, display name, theme choice and detected OS live in
//! long-lived cookies; the same data is mirrored to a user-profile record in
//! the hosted store whenever it changes. Everything here works against the
//! [`CookieStore`] trait so the wasm driver can back it with `document.cookie`
//! while tests use an in-memory jar.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cookie names shared across the site
pub const UID_COOKIE: &str = "site:uid";
pub const NAME_COOKIE: &str = "site:name";
pub const DARK_COOKIE: &str = "site:dark";
pub const OS_COOKIE: &str = "site:os";

/// Cookie lifetime: five years
pub const COOKIE_DAYS: u32 = 365 * 5;

/// Default display name for new visitors
pub const DEFAULT_NAME: &str = "Anonymous";

/// Minimal cookie jar interface
pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&mut self, name: &str, value: &str, days: u32);
}

/// In-memory jar for native builds and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCookies {
    values: HashMap<String, String>,
}

impl MemoryCookies {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }

    fn set(&mut self, name: &str, value: &str, _days: u32) {
        self.values.insert(name.to_string(), value.to_string());
    }
}

/// Profile record mirrored to the hosted store on change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    #[serde(rename = "darkMode")]
    pub dark_mode: bool,
    pub os: String,
    #[serde(rename = "firstVisit")]
    pub first_visit: bool,
}

/// The visitor's session, loaded from cookies
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub uid: String,
    pub name: String,
    pub dark_mode: bool,
    pub os: String,
    /// True only the first time this browser shows up
    pub first_visit: bool,
}

impl Session {
    /// Read existing cookies or mint a fresh identity
    ///
    /// Writes back everything it decides (uid, name default, OS) so the next
    /// visit finds a complete jar. Dark mode defaults to on.
    pub fn load_or_create<S, R>(store: &mut S, rng: &mut R, now_ms: u64, user_agent: &str, platform: &str) -> Self
    where
        S: CookieStore,
        R: Rng,
    {
        let existing_uid = store.get(UID_COOKIE).filter(|v| !v.is_empty());
        let first_visit = existing_uid.is_none();
        let uid = existing_uid.unwrap_or_else(|| {
            let id = generate_uid(rng, now_ms);
            store.set(UID_COOKIE, &id, COOKIE_DAYS);
            id
        });

        let name = store
            .get(NAME_COOKIE)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                store.set(NAME_COOKIE, DEFAULT_NAME, COOKIE_DAYS);
                DEFAULT_NAME.to_string()
            });

        let dark_mode = match store.get(DARK_COOKIE) {
            Some(v) => v == "true",
            None => true,
        };

        let os = detect_os(user_agent, platform);
        store.set(OS_COOKIE, &os, COOKIE_DAYS);

        Self {
            uid,
            name,
            dark_mode,
            os,
            first_visit,
        }
    }

    /// Rename the visitor; returns false when nothing changed
    pub fn set_name<S: CookieStore>(&mut self, store: &mut S, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == self.name {
            return false;
        }
        self.name = trimmed.to_string();
        store.set(NAME_COOKIE, &self.name, COOKIE_DAYS);
        true
    }

    /// Flip the theme preference
    pub fn set_dark_mode<S: CookieStore>(&mut self, store: &mut S, dark: bool) {
        self.dark_mode = dark;
        store.set(DARK_COOKIE, if dark { "true" } else { "false" }, COOKIE_DAYS);
    }

    /// Snapshot for mirroring to the hosted store
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            name: self.name.clone(),
            dark_mode: self.dark_mode,
            os: self.os.clone(),
            first_visit: self.first_visit,
        }
    }
}

/// Random id: alphanumeric tail plus the current time in base 36
pub fn generate_uid<R: Rng>(rng: &mut R, now_ms: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let tail: String = (0..11)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}{}", tail, to_base36(now_ms))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Best-effort OS detection from user agent and platform strings
pub fn detect_os(user_agent: &str, platform: &str) -> String {
    let p = platform.to_ascii_lowercase();
    let ua = user_agent.to_ascii_lowercase();
    if p.contains("win") {
        "Windows".to_string()
    } else if p.contains("mac") {
        "macOS".to_string()
    } else if p.contains("linux") {
        "Linux".to_string()
    } else if ua.contains("android") {
        "Android".to_string()
    } else if ua.contains("iphone") || ua.contains("ipad") || ua.contains("ipod") {
        "iOS".to_string()
    } else if !platform.is_empty() {
        platform.to_string()
    } else {
        "Unknown".to_string()
    }
}
