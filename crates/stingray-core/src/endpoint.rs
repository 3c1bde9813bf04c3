use url::Url;

/// Default REST API version of the traffic manager.
pub const DEFAULT_API_VERSION: &str = "3.0";

/// Builds pool URLs of the form
/// `<base>/api/tm/<version>/config/active/pools/<pool>`.
#[derive(Debug, Clone)]
pub struct PoolEndpoint {
    base: Url,
    api_version: String,
}

impl PoolEndpoint {
    /// Endpoint for `https://<host>:<port>`.
    pub fn https(host: &str, port: u16, api_version: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(&format!("https://{host}:{port}/"))?;
        Ok(Self::from_base_url(base, api_version))
    }

    pub fn from_base_url(base: Url, api_version: &str) -> Self {
        Self {
            base,
            api_version: api_version.to_string(),
        }
    }

    /// URL of a single pool. The pool name is percent-encoded as one path segment.
    pub fn pool_url(&self, pool: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "api",
                "tm",
                self.api_version.as_str(),
                "config",
                "active",
                "pools",
                pool,
            ]);
        }
        url
    }
}
