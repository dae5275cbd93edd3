use std::time::Duration;

use crate::error::ResolveError;

/// A duration that may also be unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timeout {
    Finite(Duration),
    Infinite,
}

impl Timeout {
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Timeout::Finite(duration) => Some(duration),
            Timeout::Infinite => None,
        }
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Timeout {
        Timeout::Finite(duration)
    }
}

/// Which protocols a lookup may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// UDP first, TCP again when the answer came back truncated
    UdpWithTcpFallback,
    UdpOnly,
    TcpOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerOrder {
    /// In the order the servers were configured
    Fixed,
    /// In a fresh random order for every lookup
    Shuffled,
}

/// Options controlling how lookups are run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Additional attempts per server after the first one failed
    pub retries: usize,
    /// Timeout of a single attempt
    pub timeout: Timeout,
    pub transport: TransportMode,
    pub server_order: ServerOrder,
    /// Ask the next server when one answers with an error code
    pub continue_on_error: bool,
    /// Turn error responses into `ResolveError::ErrorResponse`
    pub throw_on_error: bool,
    pub use_cache: bool,
    /// Cache error responses, for `failed_results_cache_duration`
    pub cache_failures: bool,
    pub failed_results_cache_duration: Duration,
    pub minimum_cache_timeout: Option<Timeout>,
    pub maximum_cache_timeout: Option<Timeout>,
    pub recursion_desired: bool,
    pub edns_payload_size: Option<u16>,
}

impl Default for ResolverOptions {
    fn default() -> ResolverOptions {
        ResolverOptions {
            retries: 2,
            timeout: Timeout::Finite(Duration::from_secs(5)),
            transport: TransportMode::UdpWithTcpFallback,
            server_order: ServerOrder::Fixed,
            continue_on_error: true,
            throw_on_error: false,
            use_cache: true,
            cache_failures: false,
            failed_results_cache_duration: Duration::from_secs(5),
            minimum_cache_timeout: None,
            maximum_cache_timeout: None,
            recursion_desired: true,
            edns_payload_size: None,
        }
    }
}

impl ResolverOptions {
    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.timeout == Timeout::Finite(Duration::from_secs(0)) {
            return Err(ResolveError::InvalidOptions("timeout must not be zero"));
        }
        if let (Some(min), Some(max)) = (self.minimum_cache_timeout, self.maximum_cache_timeout) {
            if min > max {
                return Err(ResolveError::InvalidOptions(
                    "minimum cache timeout exceeds the maximum",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = ResolverOptions::default();
        assert_eq!(options.retries, 2);
        assert_eq!(options.transport, TransportMode::UdpWithTcpFallback);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let options = ResolverOptions {
            timeout: Timeout::Finite(Duration::from_secs(0)),
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = ResolverOptions {
            minimum_cache_timeout: Some(Timeout::Infinite),
            maximum_cache_timeout: Some(Duration::from_secs(60).into()),
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = ResolverOptions {
            timeout: Timeout::Infinite,
            minimum_cache_timeout: Some(Duration::from_secs(60).into()),
            maximum_cache_timeout: Some(Timeout::Infinite),
            ..Default::default()
        };
        assert!(options.validate().is_ok());
    }
}
