use std::collections::BTreeMap;

use percent_encoding::percent_decode_str;
use url::Url;

use crate::util::errors::{invalid_argument, SdkResult};

pub type QueryParameters = BTreeMap<String, String>;

/// Decoded query parameters of `url`; later duplicates win.
pub fn query_parameters(url: &Url) -> QueryParameters {
    url.query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Builds `scheme://host/path?query`, with `path` made absolute when non-empty.
pub fn build_url(
    scheme: &str,
    host: &str,
    path: &str,
    query: &QueryParameters,
) -> SdkResult<Url> {
    let path = if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let raw = format!("{scheme}://{host}{path}");
    let mut url = Url::parse(&raw).map_err(|err| {
        invalid_argument("url", raw.clone(), format!("Unable to build URL: {err}"))
    })?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Appends a single query item, keeping existing ones.
pub fn append_query_item(url: &Url, key: &str, value: &str) -> Url {
    let mut updated = url.clone();
    updated.query_pairs_mut().append_pair(key, value);
    updated
}

pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

pub fn has_http_scheme(url: &Url) -> bool {
    url.scheme().starts_with("http")
}
