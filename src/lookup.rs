use std::sync::Arc;

use log::{debug, warn};
use rand::seq::SliceRandom;
use tokio_util::sync::CancellationToken;

use crate::answer::Answer;
use crate::cache::{CacheKey, ResponseCache};
use crate::config::{ResolverOptions, ServerOrder, TransportMode};
use crate::dns_parser::{RecordFactory, Request, Response};
use crate::error::ResolveError;
use crate::server::NameServer;
use crate::transport::{Protocol, Transport};

/// A single lookup driven across the configured servers
///
/// Every server gets `retries + 1` attempts. A truncated UDP answer is
/// asked for again over TCP right away, which doesn't count as another
/// attempt.
pub struct Lookup<'a> {
    servers: &'a [NameServer],
    transport: &'a dyn Transport,
    options: &'a ResolverOptions,
    cache: &'a ResponseCache,
    factory: &'a RecordFactory,
    attempts: usize,
}

impl<'a> Lookup<'a> {
    pub fn new(
        servers: &'a [NameServer],
        transport: &'a dyn Transport,
        options: &'a ResolverOptions,
        cache: &'a ResponseCache,
        factory: &'a RecordFactory,
    ) -> Lookup<'a> {
        Lookup {
            servers,
            transport,
            options,
            cache,
            factory,
            attempts: 0,
        }
    }

    pub async fn run(
        mut self,
        request: &Request,
        cancel: &CancellationToken,
    ) -> Result<Answer, ResolveError> {
        let key = CacheKey::from(&request.question);
        if self.options.use_cache {
            if let Some(response) = self.cache.get(&key) {
                debug!("cache hit for {} {}", key.name(), request.question.qtype);
                return Ok(Answer::cached(response));
            }
            debug!("cache miss for {} {}", key.name(), request.question.qtype);
        }

        if self.servers.is_empty() {
            return Err(ResolveError::NoServers);
        }
        let data = request.encode()?;

        let mut last_error = None;
        let mut error_answer: Option<Answer> = None;
        for server in self.server_order() {
            match self.ask_server(server, &data, request.id, cancel).await {
                Ok(answer) if answer.response_code.is_success() => {
                    // A truncated answer may lack records the full one has.
                    if self.options.use_cache && !answer.is_truncated() {
                        self.cache.add(key, answer.response().clone(), false);
                    }
                    return Ok(answer);
                }
                Ok(answer) => {
                    debug!("{} answered {}", server, answer.response_code);
                    error_answer = Some(answer);
                    if !self.options.continue_on_error {
                        break;
                    }
                }
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                Err(err) => {
                    warn!("giving up on {}: {}", server, err);
                    last_error = Some(Box::new(err));
                }
            }
        }

        match error_answer {
            Some(answer) => self.error_response(key, answer),
            None => Err(ResolveError::Connectivity {
                attempts: self.attempts,
                last: last_error,
            }),
        }
    }

    fn server_order(&self) -> Vec<&'a NameServer> {
        let mut order: Vec<&'a NameServer> = self.servers.iter().collect();
        if self.options.server_order == ServerOrder::Shuffled {
            order.shuffle(&mut rand::thread_rng());
        }
        order
    }

    fn error_response(&self, key: CacheKey, answer: Answer) -> Result<Answer, ResolveError> {
        if self.options.use_cache && self.options.cache_failures {
            self.cache.add(key, answer.response().clone(), true);
        }
        if self.options.throw_on_error {
            return Err(ResolveError::ErrorResponse {
                code: answer.response_code,
                answer: Box::new(answer),
            });
        }
        Ok(answer)
    }

    /// Tries one server until it answers or runs out of attempts.
    async fn ask_server(
        &mut self,
        server: &NameServer,
        data: &[u8],
        id: u16,
        cancel: &CancellationToken,
    ) -> Result<Answer, ResolveError> {
        let mut protocol = match self.options.transport {
            TransportMode::TcpOnly => Protocol::Tcp,
            _ => Protocol::Udp,
        };
        let mut last = None;
        for attempt in 0..=self.options.retries {
            self.attempts += 1;
            debug!("attempt {} to {} over {:?}", attempt + 1, server, protocol);

            let mut result = self.exchange(server, protocol, data, id, cancel).await;
            if let Ok(ref response) = result {
                if response.is_truncated()
                    && protocol == Protocol::Udp
                    && self.options.transport == TransportMode::UdpWithTcpFallback
                {
                    debug!("truncated answer from {}, asking again over TCP", server);
                    protocol = Protocol::Tcp;
                    result = self.exchange(server, protocol, data, id, cancel).await;
                }
            }

            match result {
                Ok(response) => return Ok(Answer::new(Arc::new(response), *server)),
                Err(ResolveError::Cancelled) => return Err(ResolveError::Cancelled),
                Err(err) => {
                    debug!("attempt {} to {} failed: {}", attempt + 1, server, err);
                    last = Some(err);
                }
            }
        }
        Err(last.unwrap_or(ResolveError::Timeout))
    }

    /// One exchange raced against the timeout and cancellation.
    async fn exchange(
        &self,
        server: &NameServer,
        protocol: Protocol,
        data: &[u8],
        id: u16,
        cancel: &CancellationToken,
    ) -> Result<Response, ResolveError> {
        let exchange = self.transport.exchange(server, protocol, data, id);
        let reply = match self.options.timeout.as_duration() {
            Some(limit) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
                reply = tokio::time::timeout(limit, exchange) => match reply {
                    Ok(reply) => reply?,
                    Err(_) => return Err(ResolveError::Timeout),
                },
            },
            None => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResolveError::Cancelled),
                reply = exchange => reply?,
            },
        };
        let response = Response::parse(&reply, self.factory).map_err(|err| {
            warn!("couldn't parse response from {}: {}", server, err);
            err
        })?;
        Ok(response)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::collections::{HashMap, VecDeque};
    use std::io;
    use std::net::{Ipv4Addr, SocketAddr};
    use std::str::FromStr;
    use std::sync::Mutex;
    use std::time::Duration;

    use futures_util::future::{self, BoxFuture, FutureExt};

    use super::*;
    use crate::config::Timeout;
    use crate::dns_parser::{Builder, Class, Name, RRData, ResponseCode, Type};

    #[derive(Debug, Clone, Copy)]
    pub enum Reply {
        Answer(ResponseCode),
        Truncated,
        Fail,
        Garbage,
        Hang,
    }

    /// Answers from a per-server script and logs every exchange.
    #[derive(Default)]
    pub struct Scripted {
        script: Mutex<HashMap<SocketAddr, VecDeque<Reply>>>,
        pub log: Mutex<Vec<(NameServer, Protocol)>>,
    }

    impl Scripted {
        pub fn new() -> Scripted {
            Scripted::default()
        }

        pub fn script(self, server: NameServer, replies: &[Reply]) -> Scripted {
            self.script
                .lock()
                .unwrap()
                .insert(server.addr, replies.iter().copied().collect());
            self
        }

        pub fn exchanges(&self) -> Vec<(NameServer, Protocol)> {
            self.log.lock().unwrap().clone()
        }
    }

    pub fn packet(id: u16, code: ResponseCode, truncated: bool) -> Vec<u8> {
        let name = Name::from_str("example.com").unwrap();
        let mut builder = Builder::new_response(id, true, false)
            .add_question(&name, Type::A, Class::IN)
            .unwrap()
            .add_answer(&name, Class::IN, 300, &RRData::A(Ipv4Addr::new(192, 0, 2, 1)))
            .unwrap();
        builder.set_response_code(code);
        if truncated {
            builder.set_truncated();
        }
        builder.build().unwrap()
    }

    impl Transport for Scripted {
        fn exchange<'a>(
            &'a self,
            server: &'a NameServer,
            protocol: Protocol,
            _request: &'a [u8],
            id: u16,
        ) -> BoxFuture<'a, io::Result<Vec<u8>>> {
            self.log.lock().unwrap().push((*server, protocol));
            let reply = self
                .script
                .lock()
                .unwrap()
                .get_mut(&server.addr)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Reply::Fail);
            match reply {
                Reply::Answer(code) => future::ready(Ok(packet(id, code, false))).boxed(),
                Reply::Truncated => {
                    future::ready(Ok(packet(id, ResponseCode::NoError, true))).boxed()
                }
                Reply::Fail => future::ready(Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "refused",
                )))
                .boxed(),
                Reply::Garbage => future::ready(Ok(vec![0u8; 5])).boxed(),
                Reply::Hang => future::pending().boxed(),
            }
        }
    }

    fn servers(count: usize) -> Vec<NameServer> {
        (1..=count)
            .map(|i| NameServer::from_str(&format!("192.0.2.{}", i)).unwrap())
            .collect()
    }

    fn request() -> Request {
        Request::new(Name::from_str("example.com").unwrap(), Type::A, Class::IN)
    }

    async fn run(
        servers: &[NameServer],
        transport: &Scripted,
        options: &ResolverOptions,
        cache: &ResponseCache,
    ) -> Result<Answer, ResolveError> {
        let factory = RecordFactory::new();
        Lookup::new(servers, transport, options, cache, &factory)
            .run(&request(), &CancellationToken::new())
            .await
    }

    #[tokio::test]
    async fn continues_on_error() {
        let servers = servers(3);
        let transport = Scripted::new()
            .script(servers[0], &[Reply::Answer(ResponseCode::ServerFailure)])
            .script(servers[1], &[Reply::Answer(ResponseCode::Refused)])
            .script(servers[2], &[Reply::Answer(ResponseCode::NameError)]);
        let options = ResolverOptions::default();
        let answer = run(&servers, &transport, &options, &ResponseCache::default())
            .await
            .unwrap();
        assert_eq!(
            transport.exchanges(),
            vec![
                (servers[0], Protocol::Udp),
                (servers[1], Protocol::Udp),
                (servers[2], Protocol::Udp),
            ]
        );
        assert_eq!(answer.server(), Some(servers[2]));
        assert_eq!(answer.response_code, ResponseCode::NameError);
    }

    #[tokio::test]
    async fn fails_fast() {
        let servers = servers(3);
        let transport = Scripted::new()
            .script(servers[0], &[Reply::Answer(ResponseCode::ServerFailure)])
            .script(servers[1], &[Reply::Answer(ResponseCode::NoError)]);
        let options = ResolverOptions {
            continue_on_error: false,
            ..Default::default()
        };
        let answer = run(&servers, &transport, &options, &ResponseCache::default())
            .await
            .unwrap();
        assert_eq!(transport.exchanges(), vec![(servers[0], Protocol::Udp)]);
        assert_eq!(answer.response_code, ResponseCode::ServerFailure);
    }

    #[tokio::test]
    async fn throws_on_error() {
        let servers = servers(1);
        let transport =
            Scripted::new().script(servers[0], &[Reply::Answer(ResponseCode::ServerFailure)]);
        let options = ResolverOptions {
            throw_on_error: true,
            ..Default::default()
        };
        match run(&servers, &transport, &options, &ResponseCache::default()).await {
            Err(err @ ResolveError::ErrorResponse { .. }) => {
                assert_eq!(err.code(), ResponseCode::ServerFailure)
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_attempts_use_up_retries() {
        let servers = servers(2);
        let transport = Scripted::new()
            .script(servers[0], &[Reply::Fail, Reply::Garbage, Reply::Fail])
            .script(servers[1], &[Reply::Answer(ResponseCode::NoError)]);
        let options = ResolverOptions::default();
        let answer = run(&servers, &transport, &options, &ResponseCache::default())
            .await
            .unwrap();
        let to_first = transport
            .exchanges()
            .iter()
            .filter(|(server, _)| *server == servers[0])
            .count();
        assert_eq!(to_first, 3);
        assert_eq!(answer.server(), Some(servers[1]));
        assert!(!answer.from_cache());
    }

    #[tokio::test]
    async fn truncation_falls_back_to_tcp() {
        let servers = servers(1);
        let transport = Scripted::new().script(
            servers[0],
            &[Reply::Truncated, Reply::Answer(ResponseCode::NoError)],
        );
        let options = ResolverOptions::default();
        let answer = run(&servers, &transport, &options, &ResponseCache::default())
            .await
            .unwrap();
        assert_eq!(
            transport.exchanges(),
            vec![(servers[0], Protocol::Udp), (servers[0], Protocol::Tcp)]
        );
        assert!(!answer.is_truncated());
    }

    #[tokio::test]
    async fn udp_only_keeps_truncated_answer() {
        let servers = servers(1);
        let transport = Scripted::new().script(servers[0], &[Reply::Truncated]);
        let options = ResolverOptions {
            transport: TransportMode::UdpOnly,
            ..Default::default()
        };
        let cache = ResponseCache::default();
        let answer = run(&servers, &transport, &options, &cache).await.unwrap();
        assert_eq!(transport.exchanges().len(), 1);
        assert!(answer.is_truncated());
        assert!(!answer.from_cache());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn tcp_only() {
        let servers = servers(1);
        let transport =
            Scripted::new().script(servers[0], &[Reply::Answer(ResponseCode::NoError)]);
        let options = ResolverOptions {
            transport: TransportMode::TcpOnly,
            ..Default::default()
        };
        run(&servers, &transport, &options, &ResponseCache::default())
            .await
            .unwrap();
        assert_eq!(transport.exchanges(), vec![(servers[0], Protocol::Tcp)]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_use_up_retries() {
        let servers = servers(2);
        let transport = Scripted::new()
            .script(servers[0], &[Reply::Hang, Reply::Hang])
            .script(servers[1], &[Reply::Answer(ResponseCode::NoError)]);
        let options = ResolverOptions {
            retries: 1,
            timeout: Timeout::Finite(Duration::from_secs(1)),
            ..Default::default()
        };
        let started = tokio::time::Instant::now();
        let answer = run(&servers, &transport, &options, &ResponseCache::default())
            .await
            .unwrap();
        assert_eq!(answer.server(), Some(servers[1]));
        assert_eq!(transport.exchanges().len(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn connectivity_error() {
        let servers = servers(2);
        let transport = Scripted::new();
        let options = ResolverOptions::default();
        match run(&servers, &transport, &options, &ResponseCache::default()).await {
            Err(ResolveError::Connectivity { attempts, last }) => {
                assert_eq!(attempts, 6);
                assert!(matches!(last.as_deref(), Some(ResolveError::Io(_))));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn no_servers() {
        let transport = Scripted::new();
        let result = run(&[], &transport, &ResolverOptions::default(), &ResponseCache::default()).await;
        assert!(matches!(result, Err(ResolveError::NoServers)));
    }

    #[tokio::test]
    async fn cancellation_wins() {
        let servers = servers(1);
        let transport =
            Scripted::new().script(servers[0], &[Reply::Answer(ResponseCode::NoError)]);
        let options = ResolverOptions::default();
        let cache = ResponseCache::default();
        let factory = RecordFactory::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = Lookup::new(&servers, &transport, &options, &cache, &factory)
            .run(&request(), &cancel)
            .await;
        assert!(matches!(result, Err(ResolveError::Cancelled)));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_waiting() {
        let servers = servers(1);
        let transport = Scripted::new().script(servers[0], &[Reply::Hang]);
        let options = ResolverOptions {
            timeout: Timeout::Infinite,
            ..Default::default()
        };
        let cache = ResponseCache::default();
        let factory = RecordFactory::new();
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            canceller.cancel();
        });
        let result = Lookup::new(&servers, &transport, &options, &cache, &factory)
            .run(&request(), &cancel)
            .await;
        assert!(matches!(result, Err(ResolveError::Cancelled)));
        assert_eq!(transport.exchanges().len(), 1);
    }

    #[tokio::test]
    async fn answers_are_cached() {
        let servers = servers(1);
        let transport =
            Scripted::new().script(servers[0], &[Reply::Answer(ResponseCode::NoError)]);
        let options = ResolverOptions::default();
        let cache = ResponseCache::default();
        let first = run(&servers, &transport, &options, &cache).await.unwrap();
        assert!(!first.from_cache());
        let second = run(&servers, &transport, &options, &cache).await.unwrap();
        assert!(second.from_cache());
        assert_eq!(second.server(), None);
        assert_eq!(transport.exchanges().len(), 1);
    }

    #[tokio::test]
    async fn failures_are_cached_when_asked() {
        let servers = servers(1);
        let transport = Scripted::new().script(
            servers[0],
            &[
                Reply::Answer(ResponseCode::NameError),
                Reply::Answer(ResponseCode::NameError),
            ],
        );
        let cache = ResponseCache::default();
        run(&servers, &transport, &ResolverOptions::default(), &cache)
            .await
            .unwrap();
        assert!(cache.is_empty());

        let options = ResolverOptions {
            cache_failures: true,
            ..Default::default()
        };
        run(&servers, &transport, &options, &cache).await.unwrap();
        let cached = run(&servers, &transport, &options, &cache).await.unwrap();
        assert!(cached.from_cache());
        assert_eq!(cached.response_code, ResponseCode::NameError);
        assert_eq!(transport.exchanges().len(), 2);
    }

    #[tokio::test]
    async fn shuffled_order_asks_every_server() {
        let servers = servers(4);
        let transport = Scripted::new();
        let options = ResolverOptions {
            retries: 0,
            server_order: ServerOrder::Shuffled,
            ..Default::default()
        };
        let _ = run(&servers, &transport, &options, &ResponseCache::default()).await;
        let mut asked: Vec<_> = transport.exchanges().into_iter().map(|(s, _)| s).collect();
        asked.sort_by_key(|s| s.addr);
        assert_eq!(asked, servers);
    }
}
