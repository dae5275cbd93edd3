//! A DNS stub client.
//!
//! [`Resolver`] sends queries to a list of name servers, retrying and
//! failing over between them, and keeps the answers in a cache for as long
//! as their records live. The wire format lives in [`dns_parser`].

use log::debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod address_family;
mod answer;
mod cache;
mod config;
pub mod dns_parser;
mod error;
mod host;
mod lookup;
mod server;
mod transport;

pub use crate::answer::Answer;
pub use crate::cache::{CacheKey, ResponseCache};
pub use crate::config::{ResolverOptions, ServerOrder, Timeout, TransportMode};
pub use crate::error::ResolveError;
pub use crate::host::{FixedServers, ServerSource, SystemServers};
pub use crate::lookup::Lookup;
pub use crate::server::{NameServer, DEFAULT_PORT};
pub use crate::transport::{NetTransport, Protocol, Transport};

use crate::dns_parser::{Class, Name, RecordFactory, Request, Type};

struct Inner {
    servers: Vec<NameServer>,
    options: ResolverOptions,
    cache: ResponseCache,
    factory: RecordFactory,
    transport: Arc<dyn Transport>,
}

/// Resolves queries against a fixed set of name servers
///
/// Cloning is cheap, clones share the cache.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<Inner>,
}

impl Resolver {
    pub fn new(servers: Vec<NameServer>, options: ResolverOptions) -> Result<Resolver, ResolveError> {
        Resolver::with_transport(servers, options, Arc::new(NetTransport::new()))
    }

    /// Uses the servers `source` knows about.
    pub fn from_source<S: ServerSource>(
        source: &S,
        options: ResolverOptions,
    ) -> Result<Resolver, ResolveError> {
        let servers = source.servers()?;
        debug!("using name servers {:?} from {:?}", servers, source);
        Resolver::new(servers, options)
    }

    /// Uses the servers of `/etc/resolv.conf`.
    pub fn system(options: ResolverOptions) -> Result<Resolver, ResolveError> {
        Resolver::from_source(&SystemServers::new(), options)
    }

    pub fn with_transport(
        servers: Vec<NameServer>,
        options: ResolverOptions,
        transport: Arc<dyn Transport>,
    ) -> Result<Resolver, ResolveError> {
        Resolver::with_factory(servers, options, transport, RecordFactory::new())
    }

    /// Parses records with `factory` instead of the built-in parsers.
    pub fn with_factory(
        servers: Vec<NameServer>,
        options: ResolverOptions,
        transport: Arc<dyn Transport>,
        factory: RecordFactory,
    ) -> Result<Resolver, ResolveError> {
        options.validate()?;
        Ok(Resolver {
            inner: Arc::new(Inner {
                cache: ResponseCache::new(&options),
                servers,
                options,
                factory,
                transport,
            }),
        })
    }

    pub fn servers(&self) -> &[NameServer] {
        &self.inner.servers
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.inner.options
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// Builds a request for `name` honoring the options.
    pub fn request(&self, name: Name, qtype: Type, qclass: Class) -> Request {
        let mut request = Request::new(name, qtype, qclass);
        request.recursion_desired = self.inner.options.recursion_desired;
        request.edns_payload_size = self.inner.options.edns_payload_size;
        request
    }

    pub async fn query(&self, request: &Request) -> Result<Answer, ResolveError> {
        self.query_with_cancel(request, &CancellationToken::new())
            .await
    }

    pub async fn query_with_cancel(
        &self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Answer, ResolveError> {
        let inner = &*self.inner;
        Lookup::new(
            &inner.servers,
            &*inner.transport,
            &inner.options,
            &inner.cache,
            &inner.factory,
        )
        .run(request, cancel)
        .await
    }

    /// Looks up `name`, given in presentation format.
    pub async fn resolve(&self, name: &str, qtype: Type) -> Result<Answer, ResolveError> {
        self.resolve_with_cancel(name, qtype, &CancellationToken::new())
            .await
    }

    pub async fn resolve_with_cancel(
        &self,
        name: &str,
        qtype: Type,
        cancel: &CancellationToken,
    ) -> Result<Answer, ResolveError> {
        let name = name.parse::<Name>()?;
        let request = self.request(name, qtype, Class::IN);
        self.query_with_cancel(&request, cancel).await
    }

    /// Runs `query` on a runtime of its own.
    ///
    /// Fails with `ResolveError::BlockingInRuntime` when called from within
    /// a tokio runtime.
    pub fn query_blocking(&self, request: &Request) -> Result<Answer, ResolveError> {
        block_on(self.query(request))?
    }

    pub fn resolve_blocking(&self, name: &str, qtype: Type) -> Result<Answer, ResolveError> {
        block_on(self.resolve(name, qtype))?
    }
}

fn block_on<F: std::future::Future>(future: F) -> Result<F::Output, ResolveError> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(ResolveError::BlockingInRuntime);
    }
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()?;
    Ok(runtime.block_on(future))
}
