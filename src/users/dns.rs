use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};
use tracing::{debug, warn};

/// Decides whether an email domain can receive mail.
#[async_trait]
pub trait DomainResolver: Send + Sync {
    async fn resolves(&self, domain: &str) -> bool;
}

/// Raw record queries behind [`MailDomainResolver`].
#[async_trait]
pub trait RecordLookup: Send + Sync {
    async fn has_mx(&self, domain: &str) -> bool;
    async fn has_address(&self, domain: &str) -> bool;
}

/// A domain accepts mail if it publishes an MX record, or failing that an
/// A/AAAA record.
#[derive(Debug, Clone)]
pub struct MailDomainResolver<L> {
    lookup: L,
}

impl<L: RecordLookup> MailDomainResolver<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl<L: RecordLookup> DomainResolver for MailDomainResolver<L> {
    async fn resolves(&self, domain: &str) -> bool {
        self.lookup.has_mx(domain).await || self.lookup.has_address(domain).await
    }
}

/// DNS queries through hickory, configured from the host's resolv.conf.
#[derive(Clone)]
pub struct HickoryLookup {
    resolver: TokioAsyncResolver,
}

impl HickoryLookup {
    pub fn from_system_conf() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            warn!(error = %e, "system resolver config unavailable; using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { resolver }
    }
}

// Trailing dot keeps search domains from being appended.
fn fqdn(domain: &str) -> String {
    format!("{}.", domain.trim_end_matches('.'))
}

#[async_trait]
impl RecordLookup for HickoryLookup {
    async fn has_mx(&self, domain: &str) -> bool {
        match self.resolver.mx_lookup(fqdn(domain)).await {
            Ok(records) => records.iter().next().is_some(),
            Err(e) => {
                debug!(error = %e, %domain, "mx lookup failed");
                false
            }
        }
    }

    async fn has_address(&self, domain: &str) -> bool {
        match self.resolver.lookup_ip(fqdn(domain)).await {
            Ok(ips) => ips.iter().next().is_some(),
            Err(e) => {
                debug!(error = %e, %domain, "address lookup failed");
                false
            }
        }
    }
}

pub type SystemResolver = MailDomainResolver<HickoryLookup>;

impl SystemResolver {
    pub fn from_system_conf() -> Self {
        MailDomainResolver::new(HickoryLookup::from_system_conf())
    }
}

/// Accepts every domain. Used when the DNS check is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

#[async_trait]
impl DomainResolver for AcceptAll {
    async fn resolves(&self, _domain: &str) -> bool {
        true
    }
}
