use crate::error::{RemoteError, RemoteResult};
use crate::options::AuthOptions;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Path from the last `/api/wow` onward; the whole URL when absent.
pub fn api_path(url: &str) -> &str {
    url.to_ascii_lowercase()
        .rfind("/api/wow")
        .map_or(url, |start| &url[start..])
}

/// `<directive> <public>:<base64(HMAC-SHA1(private, "GET\n<date>\n<path>\n"))>`
pub fn signature(auth: &AuthOptions, date: &str, path: &str) -> RemoteResult<String> {
    let mut mac = HmacSha1::new_from_slice(auth.private_key.as_bytes())
        .map_err(|e| RemoteError::Signing(format!("failed to initialize HMAC: {e}")))?;
    mac.update(format!("GET\n{date}\n{path}\n").as_bytes());
    let digest = BASE64.encode(mac.finalize().into_bytes());
    Ok(format!("{} {}:{digest}", auth.directive, auth.public_key))
}

/// `Date` and `Authorization` headers of a signed request.
pub fn auth_headers(
    auth: &AuthOptions,
    url: &str,
    now: DateTime<Utc>,
) -> RemoteResult<Vec<(String, String)>> {
    let date = now.to_rfc2822();
    let authorization = signature(auth, &date, api_path(url))?;
    Ok(vec![
        ("Date".to_string(), date),
        ("Authorization".to_string(), authorization),
    ])
}
