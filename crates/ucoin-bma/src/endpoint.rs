use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use url::Url;

use crate::error::{BmaError, BmaResult};

/// Request paths of the node API, relative to the endpoint root.
pub mod paths {
    pub const NODE_SUMMARY: &str = "node/summary";
    pub const CURRENT_BLOCK: &str = "blockchain/current";
    pub const BLOCK: &str = "blockchain/block";
    pub const WOT_ADD: &str = "wot/add";
    pub const TX_HISTORY: &str = "tx/history";
    pub const PEERS: &str = "network/peering/peers";
}

/// API name that prefixes an endpoint line in peer documents.
pub const BMA_API: &str = "BASIC_MERKLED_API";

/// A node endpoint as advertised in peer documents:
/// `BASIC_MERKLED_API [domain] [ipv4] [ipv6] port`.
///
/// At least one of the three addresses is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BmaEndpoint {
    pub server: Option<String>,
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
    pub port: u16,
}

impl BmaEndpoint {
    pub fn from_inline(inline: &str) -> BmaResult<Self> {
        let invalid = |reason: &str| BmaError::InvalidEndpoint {
            input: inline.to_string(),
            reason: reason.to_string(),
        };
        let mut tokens: Vec<&str> = inline.split_whitespace().collect();
        if tokens.first() != Some(&BMA_API) {
            return Err(invalid("expected BASIC_MERKLED_API prefix"));
        }
        let port = tokens
            .pop()
            .filter(|_| tokens.len() > 1)
            .ok_or_else(|| invalid("missing address or port"))?;
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;

        let mut endpoint = Self {
            server: None,
            ipv4: None,
            ipv6: None,
            port,
        };
        for token in &tokens[1..] {
            if let Ok(ip) = token.parse::<Ipv4Addr>() {
                endpoint.ipv4.get_or_insert(ip);
            } else if let Ok(ip) = token.parse::<Ipv6Addr>() {
                endpoint.ipv6.get_or_insert(ip);
            } else if endpoint.server.is_none() {
                endpoint.server = Some(token.to_string());
            } else {
                return Err(invalid("more than one domain"));
            }
        }
        Ok(endpoint)
    }

    /// Handler for this endpoint, preferring the domain, then IPv4, then IPv6.
    pub fn conn_handler(&self) -> BmaResult<ConnectionHandler> {
        let host = match (&self.server, self.ipv4, self.ipv6) {
            (Some(server), _, _) => server.clone(),
            (None, Some(ip), _) => ip.to_string(),
            (None, None, Some(ip)) => format!("[{ip}]"),
            (None, None, None) => {
                return Err(BmaError::InvalidEndpoint {
                    input: self.to_string(),
                    reason: "no address".into(),
                })
            }
        };
        ConnectionHandler::new(&host, self.port)
    }
}

impl fmt::Display for BmaEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(BMA_API)?;
        if let Some(server) = &self.server {
            write!(f, " {server}")?;
        }
        if let Some(ip) = self.ipv4 {
            write!(f, " {ip}")?;
        }
        if let Some(ip) = self.ipv6 {
            write!(f, " {ip}")?;
        }
        write!(f, " {}", self.port)
    }
}

impl FromStr for BmaEndpoint {
    type Err = BmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_inline(s)
    }
}

/// Base URL that every request of one client is resolved against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionHandler {
    base: Url,
}

impl ConnectionHandler {
    /// Plain-HTTP handler for `host:port`. IPv6 hosts must be bracketed.
    pub fn new(host: &str, port: u16) -> BmaResult<Self> {
        Self::from_url(&format!("http://{host}:{port}/"))
    }

    /// Handler rooted at an arbitrary base URL, e.g. behind a reverse proxy.
    pub fn from_url(base: &str) -> BmaResult<Self> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { base })
    }

    pub fn server(&self) -> &str {
        self.base.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.base.port_or_known_default()
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of an API path such as `blockchain/current`.
    pub fn url(&self, path: &str) -> BmaResult<Url> {
        Ok(self.base.join(path.trim_start_matches('/'))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form() {
        let endpoint = BmaEndpoint::from_inline("BASIC_MERKLED_API cgeek.fr 9330").unwrap();
        assert_eq!(endpoint.server.as_deref(), Some("cgeek.fr"));
        assert_eq!(endpoint.port, 9330);
        assert!(endpoint.ipv4.is_none());
    }

    #[test]
    fn full_form() {
        let endpoint =
            BmaEndpoint::from_inline("BASIC_MERKLED_API metab.ucoin.io 88.174.120.187 2001:db8::1 9201").unwrap();
        assert_eq!(endpoint.server.as_deref(), Some("metab.ucoin.io"));
        assert_eq!(endpoint.ipv4, Some(Ipv4Addr::new(88, 174, 120, 187)));
        assert_eq!(endpoint.ipv6, Some("2001:db8::1".parse().unwrap()));
        assert_eq!(endpoint.to_string(), "BASIC_MERKLED_API metab.ucoin.io 88.174.120.187 2001:db8::1 9201");
    }

    #[test]
    fn rejects_other_api_and_missing_parts() {
        assert!(BmaEndpoint::from_inline("WS2P cgeek.fr 9330").is_err());
        assert!(BmaEndpoint::from_inline("BASIC_MERKLED_API 9330").is_err());
        assert!(BmaEndpoint::from_inline("BASIC_MERKLED_API cgeek.fr port").is_err());
        assert!(BmaEndpoint::from_inline("").is_err());
    }

    #[test]
    fn handler_prefers_domain_then_ipv4_then_ipv6() {
        let full = BmaEndpoint::from_inline("BASIC_MERKLED_API node.example 10.0.0.1 ::1 80").unwrap();
        assert_eq!(full.conn_handler().unwrap().server(), "node.example");

        let v4 = BmaEndpoint::from_inline("BASIC_MERKLED_API 10.0.0.1 ::1 80").unwrap();
        assert_eq!(v4.conn_handler().unwrap().server(), "10.0.0.1");

        let v6 = BmaEndpoint::from_inline("BASIC_MERKLED_API ::1 8999").unwrap();
        let handler = v6.conn_handler().unwrap();
        assert_eq!(handler.url("node/summary").unwrap().as_str(), "http://[::1]:8999/node/summary");
    }

    #[test]
    fn urls_resolve_under_base_path() {
        let handler = ConnectionHandler::from_url("https://proxy.example/bma").unwrap();
        assert_eq!(
            handler.url(paths::CURRENT_BLOCK).unwrap().as_str(),
            "https://proxy.example/bma/blockchain/current"
        );
        assert_eq!(handler.port(), Some(443));
    }
}
