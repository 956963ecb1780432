//! Cookie service — set/get/clear httpOnly auth cookies.
//!
//! Both credentials travel in distinct httpOnly, SameSite=Lax cookies
//! scoped to the whole origin: `latch_access`, `latch_refresh`.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "latch_access";
/// Cookie name for the refresh secret.
pub const REFRESH_COOKIE: &str = "latch_refresh";

/// Build a httpOnly cookie for the access token.
pub fn access_cookie(token: &str, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE.to_string(), token.to_string()))
        .http_only(true)
        .secure(false) // TODO: set true in production
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build a httpOnly cookie for the refresh secret.
pub fn refresh_cookie(secret: &str, max_age_days: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), secret.to_string()))
        .http_only(true)
        .secure(false) // TODO: set true in production
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::days(max_age_days))
        .build()
}

/// Build an expired cookie to clear the access token.
pub fn clear_access_cookie() -> Cookie<'static> {
    Cookie::build((ACCESS_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Build an expired cookie to clear the refresh secret.
pub fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE.to_string(), String::new()))
        .http_only(true)
        .secure(false)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_cookie_is_scoped_and_http_only() {
        let cookie = access_cookie("tok", 900);
        assert_eq!(cookie.name(), ACCESS_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(900)));
    }

    #[test]
    fn refresh_cookie_lives_for_days() {
        let cookie = refresh_cookie("sec", 30);
        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.max_age(), Some(Duration::days(30)));
    }

    #[test]
    fn clearing_cookies_expire_immediately() {
        assert_eq!(clear_access_cookie().max_age(), Some(Duration::ZERO));
        assert_eq!(clear_refresh_cookie().max_age(), Some(Duration::ZERO));
        assert!(clear_access_cookie().value().is_empty());
    }
}
