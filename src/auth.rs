use std::io::{self, Write};
use std::path::PathBuf;

use crate::error::{Result, RfError};

/// Supplies the bearer token the API client attaches to requests. Consulted
/// once per request; `None` sends the request unauthenticated and lets the
/// server decide.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// Token sources, in order: a configured environment variable, then the
/// stored token file `~/.config/routefinder/token`.
pub struct StoredCredentials {
    env_var: Option<String>,
}

impl StoredCredentials {
    pub fn new(env_var: Option<String>) -> Self {
        Self { env_var }
    }
}

impl CredentialProvider for StoredCredentials {
    fn token(&self) -> Option<String> {
        if let Some(var) = &self.env_var {
            if let Ok(token) = std::env::var(var) {
                if !token.is_empty() {
                    return Some(token);
                }
            }
        }
        load_stored_token()
    }
}

/// Stored token path: ~/.config/routefinder/token
fn token_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("routefinder").join("token"))
}

fn load_stored_token() -> Option<String> {
    let path = token_path()?;
    let token = std::fs::read_to_string(path).ok()?;
    let token = token.trim().to_string();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn save_token(token: &str) -> io::Result<()> {
    if let Some(path) = token_path() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, token)?;
    }
    Ok(())
}

/// Browser-based sign-in. The service runs the OAuth dance itself; we only
/// open the init URL and read the token back from the redirect the user
/// pastes in.
pub fn login(base_url: &str, provider: &str) -> Result<()> {
    let redirect = "routefinder://oauth-callback";
    let auth_url = format!(
        "{}/auth/{}/init?redirect={}",
        base_url.trim_end_matches('/'),
        provider,
        urlencoding::encode(redirect)
    );

    println!("Opening browser to sign in with {}...", provider);
    println!("  {}", auth_url);
    if open::that(&auth_url).is_err() {
        println!("Could not open a browser; visit the URL above manually.");
    }

    println!();
    println!("After authorizing, the browser is redirected to a routefinder:// URL");
    println!("carrying your token.");
    print!("Paste that URL (or the token itself) here: ");
    io::stdout().flush().ok();

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let input = line.trim();
    if input.is_empty() {
        return Err(RfError::Auth("no token provided".to_string()));
    }

    let token = extract_token(input).unwrap_or_else(|| input.to_string());
    save_token(&token)?;
    println!("Token saved.");
    Ok(())
}

/// Remove the stored token. Tokens supplied via environment variable are
/// untouched.
pub fn logout() -> Result<()> {
    if let Some(path) = token_path() {
        match std::fs::remove_file(path) {
            Ok(()) => println!("Signed out."),
            Err(e) if e.kind() == io::ErrorKind::NotFound => println!("No stored token."),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Pull the token out of an OAuth callback URL. The service puts it in the
/// query string; some providers hand it back in the fragment instead.
pub fn extract_token(url: &str) -> Option<String> {
    let (rest, fragment) = match url.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (url, None),
    };

    if let Some((_, query)) = rest.split_once('?') {
        if let Some(token) = find_token_param(query) {
            return Some(token);
        }
    }

    fragment.and_then(find_token_param)
}

fn find_token_param(params: &str) -> Option<String> {
    params
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "token")
        .map(|(_, value)| {
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_token_from_query() {
        assert_eq!(
            extract_token("routefinder://oauth-callback?token=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn extract_token_from_query_with_other_params() {
        assert_eq!(
            extract_token("routefinder://oauth-callback?state=xyz&token=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn extract_token_from_fragment() {
        assert_eq!(
            extract_token("routefinder://oauth-callback#token=abc123"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn extract_token_prefers_query_over_fragment() {
        assert_eq!(
            extract_token("app://cb?token=fromquery#token=fromfragment"),
            Some("fromquery".to_string())
        );
    }

    #[test]
    fn extract_token_decodes_percent_encoding() {
        assert_eq!(
            extract_token("app://cb?token=ab%2Fcd"),
            Some("ab/cd".to_string())
        );
    }

    #[test]
    fn extract_token_missing() {
        assert_eq!(extract_token("routefinder://oauth-callback?state=xyz"), None);
        assert_eq!(extract_token("not-a-url"), None);
    }
}
