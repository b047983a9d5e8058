use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use tungstenite::client::IntoClientRequest;
use tungstenite::handshake::client::Request;

use super::ConnectError;

/// Where the coaching backend serves its feed unless told otherwise.
pub static DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";

/// Default size of the raw frame channel between the socket and the session.
pub static DEFAULT_FEED_CHANNEL_SIZE: usize = 64;

/// Time allowed for the TCP connection to each resolved address, and then
/// for the websocket handshake.
pub static CONNECT_TIMEOUT: Duration = Duration::from_millis(3000);

/// How often the reader thread wakes up to check for a local close.
pub static POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time allowed for the peer to answer a close frame.
pub static CLOSE_TIMEOUT: Duration = Duration::from_millis(1000);

pub fn default_endpoint() -> String {
    match env::var("DOTACOACH_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => endpoint.trim().to_string(),
        _ => DEFAULT_ENDPOINT.to_string(),
    }
}

pub fn feed_channel_size() -> usize {
    let min_size = DEFAULT_FEED_CHANNEL_SIZE;
    if let Ok(req) = env::var("DOTACOACH_FEED_BUFSIZE") {
        std::cmp::max(req.parse().unwrap_or(0), min_size)
    } else {
        min_size
    }
}

/// Builds the handshake request for `endpoint` and resolves the addresses
/// to try, in resolver order. Only plain `ws://` endpoints are supported.
pub fn resolve(endpoint: &str) -> Result<(Request, Vec<SocketAddr>), ConnectError> {
    let invalid = |reason: &'static str| ConnectError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let request = endpoint
        .into_client_request()
        .map_err(|_| invalid("not a valid URL"))?;
    let uri = request.uri();
    match uri.scheme_str() {
        Some("ws") => {}
        Some(other) => return Err(ConnectError::UnsupportedScheme(other.to_string())),
        None => return Err(invalid("missing ws:// scheme")),
    }
    let host = uri.host().ok_or_else(|| invalid("missing host"))?;
    // IPv6 literals come back bracketed
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = uri.port_u16().unwrap_or(80);
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs()?.collect();
    if addrs.is_empty() {
        return Err(invalid("address resolution failed"));
    }
    Ok((request, addrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_localhost() {
        let (request, addrs) = resolve("ws://127.0.0.1:8080/ws").unwrap();
        assert_eq!(request.uri().path(), "/ws");
        assert_eq!(addrs, vec!["127.0.0.1:8080".parse::<SocketAddr>().unwrap()]);
    }

    #[test]
    fn test_resolve_default_port() {
        let (_, addrs) = resolve("ws://127.0.0.1/ws").unwrap();
        assert_eq!(addrs[0].port(), 80);
        let (_, addrs) = resolve("ws://[::1]:9000/").unwrap();
        assert_eq!(addrs[0], "[::1]:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_resolve_rejects_other_schemes() {
        assert!(matches!(
            resolve("wss://localhost/ws"),
            Err(ConnectError::UnsupportedScheme(s)) if s == "wss"
        ));
        assert!(matches!(
            resolve("not a url"),
            Err(ConnectError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_feed_channel_size_override() {
        env::set_var("DOTACOACH_FEED_BUFSIZE", "256");
        assert_eq!(feed_channel_size(), 256);
        env::set_var("DOTACOACH_FEED_BUFSIZE", "8");
        assert_eq!(feed_channel_size(), DEFAULT_FEED_CHANNEL_SIZE);
        env::set_var("DOTACOACH_FEED_BUFSIZE", "lots");
        assert_eq!(feed_channel_size(), DEFAULT_FEED_CHANNEL_SIZE);
        env::remove_var("DOTACOACH_FEED_BUFSIZE");
        assert_eq!(feed_channel_size(), DEFAULT_FEED_CHANNEL_SIZE);
    }
}
