//! wiremock server driven from synchronous tests.
//!
//! The services use blocking clients, so tests keep a current-thread runtime
//! around only to start the server, mount mocks and read what it received.

use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

pub struct MockHttp {
    server: MockServer,
    rt: Runtime,
}

impl MockHttp {
    pub fn start() -> Self {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        let server = rt.block_on(MockServer::start());
        Self { server, rt }
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn port(&self) -> u16 {
        self.server.address().port()
    }

    pub fn received(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }
}

/// `METHOD /path?query` of a received request.
pub fn request_line(req: &Request) -> String {
    match req.url.query() {
        Some(q) => format!("{} {}?{}", req.method, req.url.path(), q),
        None => format!("{} {}", req.method, req.url.path()),
    }
}
