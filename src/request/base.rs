use std::collections::HashMap;

use http::Method;
use tracing::debug;

use super::{AttributeNames, HttpRequest};
use crate::attributes::AttrValue;
use crate::paths::context_relative_path;

/// The request as received from the hosting server.
///
/// Holds the raw path identity and an attribute map. Dispatch layers wrap it
/// without ever rewriting these fields.
#[derive(Debug, Clone)]
pub struct BaseRequest {
    method: Method,
    scheme: String,
    server_name: String,
    server_port: Option<u16>,
    context_path: String,
    request_uri: String,
    servlet_path: String,
    path_info: Option<String>,
    query_string: Option<String>,
    attributes: HashMap<String, AttrValue>,
}

impl BaseRequest {
    /// Create a request for `uri`, which may carry a query string.
    ///
    /// The servlet path defaults to the whole context-relative path with no
    /// path info, as if a default handler had been mapped.
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (uri, None),
        };
        Self {
            method,
            scheme: "http".to_string(),
            server_name: "localhost".to_string(),
            server_port: Some(80),
            context_path: String::new(),
            request_uri: path.to_string(),
            servlet_path: path.to_string(),
            path_info: None,
            query_string: query,
            attributes: HashMap::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Build a base request from an `http::Request` served under
    /// `context_path`.
    pub fn from_http<B>(req: &http::Request<B>, context_path: &str) -> Self {
        let uri = req.uri();
        let request_uri = uri.path().to_string();
        let host_header = req
            .headers()
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok());

        // IPv6 literals keep their brackets so the rebuilt URL stays valid.
        let (server_name, header_port) = match host_header {
            Some(host) => match host.parse::<http::uri::Authority>() {
                Ok(authority) => (authority.host().to_string(), authority.port_u16()),
                Err(_) => (host.to_string(), None),
            },
            None => (uri.host().unwrap_or("localhost").to_string(), None),
        };
        let scheme = uri.scheme_str().unwrap_or("http").to_string();
        let server_port = uri.port_u16().or(header_port).or(match scheme.as_str() {
            "https" => Some(443),
            "http" => Some(80),
            _ => None,
        });

        let servlet_path = context_relative_path(&request_uri, context_path)
            .unwrap_or_else(|| request_uri.clone());

        debug!(
            method = %req.method(),
            request_uri = %request_uri,
            context_path = %context_path,
            "Base request built"
        );

        Self {
            method: req.method().clone(),
            scheme,
            server_name,
            server_port,
            context_path: context_path.to_string(),
            request_uri,
            servlet_path,
            path_info: None,
            query_string: uri.query().map(str::to_string),
            attributes: HashMap::new(),
        }
    }

    /// Move the request under `context_path`. The URI must already start
    /// with it.
    #[must_use]
    pub fn with_context_path(mut self, context_path: &str) -> Self {
        self.context_path = context_path.to_string();
        if let Some(relative) = context_relative_path(&self.request_uri, context_path) {
            self.servlet_path = relative;
        }
        self
    }

    #[must_use]
    pub fn with_servlet_path(mut self, servlet_path: &str, path_info: Option<&str>) -> Self {
        self.servlet_path = servlet_path.to_string();
        self.path_info = path_info.map(str::to_string);
        self
    }

    #[must_use]
    pub fn with_server(mut self, scheme: &str, name: &str, port: Option<u16>) -> Self {
        self.scheme = scheme.to_string();
        self.server_name = name.to_string();
        self.server_port = port;
        self
    }

    /// Request URI exactly as received, including any query string.
    #[must_use]
    pub fn raw_target(&self) -> String {
        match &self.query_string {
            Some(q) => format!("{}?{q}", self.request_uri),
            None => self.request_uri.clone(),
        }
    }
}

impl HttpRequest for BaseRequest {
    fn attribute(&self, name: &str) -> Option<AttrValue> {
        self.attributes.get(name).cloned()
    }

    fn set_attribute(&mut self, name: &str, value: AttrValue) {
        if value.is_null() {
            self.attributes.remove(name);
        } else {
            self.attributes.insert(name.to_string(), value);
        }
    }

    fn remove_attribute(&mut self, name: &str) {
        self.attributes.remove(name);
    }

    fn attribute_names(&self) -> AttributeNames<'_> {
        Box::new(self.attributes.keys().cloned())
    }

    fn method(&self) -> Method {
        self.method.clone()
    }

    fn request_uri(&self) -> String {
        self.request_uri.clone()
    }

    fn context_path(&self) -> String {
        self.context_path.clone()
    }

    fn servlet_path(&self) -> String {
        self.servlet_path.clone()
    }

    fn path_info(&self) -> Option<String> {
        self.path_info.clone()
    }

    fn query_string(&self) -> Option<String> {
        self.query_string.clone()
    }

    fn scheme(&self) -> String {
        self.scheme.clone()
    }

    fn server_name(&self) -> String {
        self.server_name.clone()
    }

    fn server_port(&self) -> Option<u16> {
        self.server_port
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_is_split_from_uri() {
        let req = BaseRequest::get("/index.html?query=params");
        assert_eq!(req.request_uri(), "/index.html");
        assert_eq!(req.query_string().as_deref(), Some("query=params"));
        assert_eq!(req.raw_target(), "/index.html?query=params");
    }

    #[test]
    fn test_null_attribute_removes() {
        let mut req = BaseRequest::get("/");
        req.set_attribute("a", json!("x"));
        assert_eq!(req.attribute("a"), Some(json!("x")));
        req.set_attribute("a", AttrValue::Null);
        assert_eq!(req.attribute("a"), None);
        assert_eq!(req.attribute_names().count(), 0);
    }

    #[test]
    fn test_from_http_reads_host_and_context() {
        let http_req = http::Request::builder()
            .method(Method::POST)
            .uri("/app/cart/items?page=2")
            .header(http::header::HOST, "shop.example:8443")
            .body(())
            .unwrap();
        let req = BaseRequest::from_http(&http_req, "/app");
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.context_path(), "/app");
        assert_eq!(req.servlet_path(), "/cart/items");
        assert_eq!(req.server_name(), "shop.example");
        assert_eq!(req.server_port(), Some(8443));
        assert_eq!(req.query_string().as_deref(), Some("page=2"));
        assert_eq!(req.request_url(), "http://shop.example:8443/app/cart/items");
    }

    #[test]
    fn test_from_http_ipv6_host() {
        let bare = http::Request::builder()
            .uri("/a")
            .header(http::header::HOST, "[::1]")
            .body(())
            .unwrap();
        let req = BaseRequest::from_http(&bare, "");
        assert_eq!(req.server_name(), "[::1]");
        assert_eq!(req.server_port(), Some(80));

        let with_port = http::Request::builder()
            .uri("/a")
            .header(http::header::HOST, "[::1]:8080")
            .body(())
            .unwrap();
        let req = BaseRequest::from_http(&with_port, "");
        assert_eq!(req.server_name(), "[::1]");
        assert_eq!(req.server_port(), Some(8080));
        assert_eq!(req.request_url(), "http://[::1]:8080/a");
    }

    #[test]
    fn test_with_context_path_recomputes_servlet_path() {
        let req = BaseRequest::get("/ctx/a/b").with_context_path("/ctx");
        assert_eq!(req.servlet_path(), "/a/b");
        assert_eq!(req.request_uri(), "/ctx/a/b");
    }
}
