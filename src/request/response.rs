use std::sync::Arc;

use smallvec::SmallVec;
use tracing::debug;

use super::HttpResponse;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage. Names are `Arc<str>` since the same few names repeat.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Default number of body bytes buffered before the response commits.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// A response that buffers body output until flushed or the buffer fills.
///
/// Once committed, status and headers are frozen and buffered output can no
/// longer be discarded.
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    status: u16,
    headers: HeaderVec,
    buffer: Vec<u8>,
    sent: Vec<u8>,
    buffer_size: usize,
    committed: bool,
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferedResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            buffer: Vec::with_capacity(buffer_size.min(DEFAULT_BUFFER_SIZE)),
            sent: Vec::new(),
            buffer_size,
            committed: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get a header by name (case-insensitive).
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Everything written so far, sent or still buffered.
    #[must_use]
    pub fn body(&self) -> Vec<u8> {
        let mut body = self.sent.clone();
        body.extend_from_slice(&self.buffer);
        body
    }

    /// Body as UTF-8 text, lossy.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body()).into_owned()
    }

    /// Convert into an `http::Response`, committing whatever is buffered.
    pub fn into_http(mut self) -> Result<http::Response<Vec<u8>>, http::Error> {
        self.commit();
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(&**name, value.as_str());
        }
        builder.body(self.sent)
    }

    fn commit(&mut self) {
        if !self.committed {
            debug!(
                status = self.status,
                header_count = self.headers.len(),
                buffered_bytes = self.buffer.len(),
                "Response committed"
            );
        }
        self.committed = true;
        self.sent.append(&mut self.buffer);
    }
}

impl HttpResponse for BufferedResponse {
    fn is_committed(&self) -> bool {
        self.committed
    }

    fn reset_buffer(&mut self) {
        self.buffer.clear();
    }

    fn set_status(&mut self, status: u16) {
        if !self.committed {
            self.status = status;
        }
    }

    fn set_header(&mut self, name: &str, value: String) {
        if self.committed {
            return;
        }
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > self.buffer_size {
            self.commit();
        }
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.commit();
        Ok(())
    }
}
