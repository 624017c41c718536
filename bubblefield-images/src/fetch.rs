use crate::{Fetcher, ImageError};
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use std::borrow::Cow;

/// Thumbnail size requested from Google-hosted avatars.
const GOOGLE_AVATAR_SIZE: &str = "=s64-c";

/// Rewrites Google avatar URLs (`...=s96-c`) to request a small thumbnail.
/// Every other URL is returned unchanged.
pub fn normalize_avatar_url(url: &str) -> Cow<'_, str> {
    if !url.contains("googleusercontent.com") {
        return Cow::Borrowed(url);
    }

    let mut search = 0;
    while let Some(pos) = url[search..].find("=s") {
        let start = search + pos;
        let digits_start = start + 2;
        let digits = url[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let end = digits_start + digits;
        if digits > 0 && url[end..].starts_with("-c") {
            return Cow::Owned(format!(
                "{}{}{}",
                &url[..start],
                GOOGLE_AVATAR_SIZE,
                &url[end + 2..]
            ));
        }
        search = digits_start;
    }

    Cow::Borrowed(url)
}

/// Resolves `data:` URLs, `file://` URLs and plain filesystem paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl Fetcher for LocalFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Bytes, ImageError>> {
        let url = url.to_string();
        async move {
            if let Some(rest) = url.strip_prefix("data:") {
                return decode_data_url(&url, rest);
            }

            let path = url.strip_prefix("file://").unwrap_or(&url);
            if path.contains("://") {
                return Err(ImageError::UnsupportedUrl(url.clone()));
            }

            tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(|e| ImageError::Fetch {
                    url: url.clone(),
                    reason: e.to_string(),
                })
        }
        .boxed()
    }
}

/// Downloads `http(s)` URLs; every other URL is handed to [`LocalFetcher`].
///
/// Overall load time is bounded by the [`ImageCache`](crate::ImageCache) timeout, so the
/// client itself carries none.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ImageError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("bubblefield/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ImageError::Client(e.to_string()))?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        HttpFetcher { client }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Bytes, ImageError>> {
        if !is_remote(url) {
            return LocalFetcher.fetch(url);
        }

        let client = self.client.clone();
        let url = url.to_string();
        async move {
            let failed = |e: reqwest::Error| ImageError::Fetch {
                url: url.clone(),
                reason: e.to_string(),
            };
            let response = client
                .get(url.as_str())
                .send()
                .await
                .map_err(failed)?
                .error_for_status()
                .map_err(failed)?;
            response.bytes().await.map_err(failed)
        }
        .boxed()
    }
}

fn is_remote(url: &str) -> bool {
    url.split_once("://")
        .map_or(false, |(scheme, _)| {
            scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
        })
}

fn decode_data_url(url: &str, rest: &str) -> Result<Bytes, ImageError> {
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| ImageError::UnsupportedUrl(url.to_string()))?;
    if !meta.ends_with(";base64") {
        return Err(ImageError::UnsupportedUrl(url.to_string()));
    }
    base64::decode(payload.trim())
        .map(Bytes::from)
        .map_err(|e| ImageError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
}
