//! Client identification
//!
//! Who is on the other end of a request: IP and User-Agent. Forwarding
//! headers are only believed when the socket peer is a trusted proxy.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap, header};

/// Reverse proxies allowed to report the client address.
///
/// Read from request extensions; when absent no proxy is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustedProxies(Vec<IpAddr>);

impl TrustedProxies {
    pub fn new(proxies: Vec<IpAddr>) -> Self {
        Self(proxies)
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Request origin details used for logging and rate-limit keys.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Build from headers plus the socket address, when the server was
    /// started with connect info.
    pub fn from_parts(headers: &HeaderMap, direct: Option<SocketAddr>, trusted: &TrustedProxies) -> Self {
        Self {
            ip: extract_client_ip(headers, direct.map(|addr| addr.ip()), trusted),
            user_agent: extract_user_agent(headers),
        }
    }

    /// Same as the extractor, for middleware holding the whole request.
    pub fn resolve(headers: &HeaderMap, extensions: &Extensions) -> Self {
        let direct = extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        match extensions.get::<TrustedProxies>() {
            Some(trusted) => Self::from_parts(headers, direct, trusted),
            None => Self::from_parts(headers, direct, &TrustedProxies::default()),
        }
    }

    pub fn ip_string(&self) -> String {
        self.ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn user_agent_or_unknown(&self) -> &str {
        self.user_agent.as_deref().unwrap_or("unknown")
    }
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::resolve(&parts.headers, &parts.extensions))
    }
}

/// Extract client IP address
///
/// A peer outside `trusted` is the client. Behind a trusted proxy the
/// right-most X-Forwarded-For hop that is not itself a trusted proxy wins,
/// then X-Real-IP, then the proxy's own address.
pub fn extract_client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trusted: &TrustedProxies,
) -> Option<IpAddr> {
    let peer = direct_ip?;
    if !trusted.contains(&peer) {
        return Some(peer);
    }

    if let Some(xff) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        for hop in xff.rsplit(',') {
            match hop.trim().parse::<IpAddr>() {
                Ok(ip) if trusted.contains(&ip) => continue,
                Ok(ip) => return Some(ip),
                // Anything left of a malformed hop is unverifiable.
                Err(_) => return Some(peer),
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
        .or(Some(peer))
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const PROXY: &str = "10.0.0.2";

    fn trusted() -> TrustedProxies {
        TrustedProxies::new(vec![PROXY.parse().unwrap(), "10.0.0.3".parse().unwrap()])
    }

    fn xff(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_untrusted_peer_ignores_forwarding_headers() {
        let peer: IpAddr = "198.51.100.7".parse().unwrap();
        let mut headers = xff("192.168.1.1");
        headers.insert("x-real-ip", HeaderValue::from_static("10.1.2.3"));

        assert_eq!(extract_client_ip(&headers, Some(peer), &trusted()), Some(peer));
        assert_eq!(extract_client_ip(&headers, Some(peer), &TrustedProxies::default()), Some(peer));
        assert_eq!(extract_client_ip(&headers, None, &trusted()), None);
    }

    #[test]
    fn test_trusted_proxy_takes_rightmost_untrusted_hop() {
        let proxy: IpAddr = PROXY.parse().unwrap();

        let spoofed = xff("1.1.1.1, 203.0.113.5");
        assert_eq!(
            extract_client_ip(&spoofed, Some(proxy), &trusted()),
            Some("203.0.113.5".parse().unwrap())
        );

        let chained = xff("203.0.113.5, 10.0.0.3");
        assert_eq!(
            extract_client_ip(&chained, Some(proxy), &trusted()),
            Some("203.0.113.5".parse().unwrap())
        );

        assert_eq!(extract_client_ip(&xff("203.0.113.5, junk"), Some(proxy), &trusted()), Some(proxy));
    }

    #[test]
    fn test_trusted_proxy_falls_back_to_real_ip_then_peer() {
        let proxy: IpAddr = PROXY.parse().unwrap();
        assert_eq!(extract_client_ip(&HeaderMap::new(), Some(proxy), &trusted()), Some(proxy));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(
            extract_client_ip(&headers, Some(proxy), &trusted()),
            Some("203.0.113.9".parse().unwrap())
        );
    }

    #[test]
    fn test_client_info_defaults() {
        let info = ClientInfo::from_parts(&HeaderMap::new(), None, &TrustedProxies::default());
        assert_eq!(info.ip_string(), "unknown");
        assert_eq!(info.user_agent_or_unknown(), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.5"));
        let addr: SocketAddr = "203.0.113.9:5000".parse().unwrap();
        let info = ClientInfo::from_parts(&headers, Some(addr), &TrustedProxies::default());
        assert_eq!(info.ip_string(), "203.0.113.9");
        assert_eq!(info.user_agent_or_unknown(), "curl/8.5");
    }

    #[test]
    fn test_resolve_reads_extensions() {
        let headers = xff("203.0.113.5");
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 51000))));
        assert_eq!(ClientInfo::resolve(&headers, &extensions).ip_string(), "10.0.0.2");

        extensions.insert(trusted());
        assert_eq!(ClientInfo::resolve(&headers, &extensions).ip_string(), "203.0.113.5");

        assert_eq!(ClientInfo::resolve(&HeaderMap::new(), &Extensions::new()).ip_string(), "unknown");
    }
}
