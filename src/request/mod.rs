//! # Request Module
//!
//! The capability set a request must offer to be dispatched, plus the
//! concrete base request and buffered response used by hosting loops and
//! tests.
//!
//! ## Overview
//!
//! [`HttpRequest`] is deliberately small: a string-keyed attribute store and
//! the path accessors that dispatch layers override. Anything implementing it
//! can sit at the bottom of a [`RequestChain`](crate::chain::RequestChain).
//!
//! [`HttpResponse`] only needs to report whether it is committed and to drop
//! buffered output; a forward requires both.

mod base;
mod response;

pub use base::BaseRequest;
pub use response::{BufferedResponse, HeaderVec, MAX_INLINE_HEADERS};

use http::Method;

use crate::attributes::AttrValue;

/// Lazily produced attribute names. Recomputed on every call.
pub type AttributeNames<'a> = Box<dyn Iterator<Item = String> + 'a>;

/// A request that can be dispatched and wrapped.
pub trait HttpRequest: Send {
    fn attribute(&self, name: &str) -> Option<AttrValue>;

    /// Store an attribute. Storing `Null` removes it.
    fn set_attribute(&mut self, name: &str, value: AttrValue);

    fn remove_attribute(&mut self, name: &str);

    fn attribute_names(&self) -> AttributeNames<'_>;

    fn method(&self) -> Method;

    /// Absolute path of the request, context path included, query excluded.
    fn request_uri(&self) -> String;

    fn context_path(&self) -> String;

    /// The part of the path the serving handler's pattern owns.
    fn servlet_path(&self) -> String;

    fn path_info(&self) -> Option<String>;

    fn query_string(&self) -> Option<String>;

    fn scheme(&self) -> String;

    fn server_name(&self) -> String;

    fn server_port(&self) -> Option<u16>;

    /// Reconstructed absolute URL: `scheme://host[:port]` + request URI.
    fn request_url(&self) -> String {
        build_request_url(
            &self.scheme(),
            &self.server_name(),
            self.server_port(),
            &self.request_uri(),
        )
    }
}

/// Output side of a dispatch.
pub trait HttpResponse: Send {
    /// True once status and headers have been sent to the client.
    fn is_committed(&self) -> bool;

    /// Discard buffered, uncommitted body output. Status and headers stay.
    fn reset_buffer(&mut self);

    fn set_status(&mut self, status: u16);

    fn set_header(&mut self, name: &str, value: String);

    fn write(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// Send buffered output, committing the response.
    fn flush(&mut self) -> std::io::Result<()>;
}

/// Build `scheme://host[:port]uri`, leaving the port out when it is unknown
/// or the default for the scheme (80 for `http`, 443 for `https`).
#[must_use]
pub fn build_request_url(scheme: &str, host: &str, port: Option<u16>, uri: &str) -> String {
    let mut url = String::with_capacity(scheme.len() + host.len() + uri.len() + 9);
    url.push_str(scheme);
    url.push_str("://");
    url.push_str(host);
    if let Some(port) = port {
        let default_port = match scheme {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };
        if port > 0 && default_port.is_some_and(|d| d != port) {
            url.push(':');
            url.push_str(&port.to_string());
        }
    }
    url.push_str(uri);
    url
}

#[cfg(test)]
mod tests {
    use super::build_request_url;

    #[test]
    fn test_default_ports_are_omitted() {
        assert_eq!(
            build_request_url("http", "example.com", Some(80), "/a"),
            "http://example.com/a"
        );
        assert_eq!(
            build_request_url("https", "example.com", Some(443), "/a"),
            "https://example.com/a"
        );
    }

    #[test]
    fn test_non_default_ports_are_kept() {
        assert_eq!(
            build_request_url("http", "localhost", Some(8080), "/a"),
            "http://localhost:8080/a"
        );
        assert_eq!(
            build_request_url("https", "localhost", Some(80), "/"),
            "https://localhost:80/"
        );
    }

    #[test]
    fn test_unknown_port_is_omitted() {
        assert_eq!(
            build_request_url("http", "localhost", None, "/x"),
            "http://localhost/x"
        );
    }
}
