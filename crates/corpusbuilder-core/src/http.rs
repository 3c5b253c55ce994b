//! Shared reqwest client setup for the NCBI endpoints.

use crate::error::Result;

/// Client identifying itself as `{tool}/{version}`, with gzip and an
/// optional HTTP(S) proxy. A blank proxy string counts as none.
pub(crate) fn build_client(tool: &str, proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(format!("{tool}/{}", env!("CARGO_PKG_VERSION")))
        .gzip(true);
    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        builder = builder.proxy(reqwest::Proxy::all(proxy)?);
    }
    Ok(builder.build()?)
}
