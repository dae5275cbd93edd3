use std::ops::Deref;
use std::sync::Arc;

use crate::dns_parser::Response;
use crate::server::NameServer;

/// The result of a lookup
///
/// Dereferences to the response it wraps.
#[derive(Debug, Clone)]
pub struct Answer {
    response: Arc<Response>,
    server: Option<NameServer>,
    from_cache: bool,
}

impl Answer {
    pub(crate) fn new(response: Arc<Response>, server: NameServer) -> Answer {
        Answer {
            response,
            server: Some(server),
            from_cache: false,
        }
    }

    pub(crate) fn cached(response: Arc<Response>) -> Answer {
        Answer {
            response,
            server: None,
            from_cache: true,
        }
    }

    /// The server that answered, `None` for cached answers.
    pub fn server(&self) -> Option<NameServer> {
        self.server
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn response(&self) -> &Arc<Response> {
        &self.response
    }
}

impl Deref for Answer {
    type Target = Response;

    fn deref(&self) -> &Response {
        &self.response
    }
}
