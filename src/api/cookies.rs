use crate::config::{CookieConfig, SameSitePolicy};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Builds the refresh cookie with the configured security attributes.
/// HttpOnly is not negotiable.
#[must_use]
pub fn refresh_cookie(config: &CookieConfig, token: String, ttl: std::time::Duration) -> Cookie<'static> {
    let max_age = Duration::try_from(ttl).unwrap_or(Duration::ZERO);

    Cookie::build((REFRESH_COOKIE_NAME, token))
        .http_only(true)
        .secure(config.secure)
        .same_site(same_site(config.same_site))
        .path(config.path.clone())
        .max_age(max_age)
        .build()
}

/// Builds a removal cookie: same attributes, empty value, zero Max-Age.
#[must_use]
pub fn clear_refresh_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .http_only(true)
        .secure(config.secure)
        .same_site(same_site(config.same_site))
        .path(config.path.clone())
        .max_age(Duration::ZERO)
        .build()
}

/// Reads the refresh token out of the request's cookie jar.
#[must_use]
pub fn refresh_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME).map(|cookie| cookie.value().to_string())
}

const fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::None => SameSite::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CookieConfig {
        CookieConfig { secure: true, same_site: SameSitePolicy::Lax, path: "/auth".to_string() }
    }

    #[test]
    fn set_cookie_carries_configured_attributes() {
        let cookie =
            refresh_cookie(&config(), "token-value".to_string(), std::time::Duration::from_secs(7 * 24 * 3600));

        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
    }

    #[test]
    fn clear_cookie_empties_value_and_max_age() {
        let cookie = clear_refresh_cookie(&config());

        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/auth"));
    }
}
