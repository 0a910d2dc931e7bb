use log::info;

use crate::retry::{retry_with_sleep, RetryError, RetryPolicy};
use crate::services::{CreateResponse, DdnsUpdateError, DnsApi, DnsRecord, NewRecord};

pub const WILDCARD: &str = "*";

/// The name whose A record is managed: a root domain plus an optional label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordTarget {
    root: Box<str>,
    subdomain: Option<Box<str>>,
}

impl RecordTarget {
    /// An empty subdomain means the apex. `*` is kept literally, the
    /// provider is the one giving it wildcard meaning. The root is stored
    /// lowercased and without a trailing dot.
    pub fn new(root: &str, subdomain: Option<&str>) -> Self {
        Self {
            root: root.trim_end_matches('.').to_ascii_lowercase().into(),
            subdomain: subdomain.filter(|s| !s.is_empty()).map(Into::into),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// The label relative to the root, as the provider wants it. Empty for
    /// the apex.
    pub fn label(&self) -> &str {
        self.subdomain.as_deref().unwrap_or("")
    }

    pub fn fqdn(&self) -> String {
        match &self.subdomain {
            Some(sub) => format!("{}.{}", sub, self.root),
            None => self.root.to_string(),
        }
    }

    /// Whether `record` would clash with the A record for this target: any
    /// address-bearing record at or below the root domain.
    fn conflicts_with(&self, record: &DnsRecord) -> bool {
        let name = record.name.trim_end_matches('.').to_ascii_lowercase();
        let name = name.as_str();
        let under_root = name == &*self.root
            || name
                .strip_suffix(&*self.root)
                .is_some_and(|prefix| prefix.ends_with('.'));

        under_root && record.kind.is_address_bearing()
    }
}

/// Lists the records of the root domain and deletes every one that would
/// conflict with the new record. Stops at the first failed delete.
pub fn remove_stale_records<A>(api: &mut A, target: &RecordTarget) -> Result<usize, DdnsUpdateError>
where
    A: DnsApi + ?Sized,
{
    let records = api.retrieve_records(target.root())?;

    let stale = records
        .iter()
        .filter(|record| target.conflicts_with(record))
        .collect::<Vec<_>>();

    for record in &stale {
        info!(
            "Deleting existing {} record for {} (was {}, TTL {})",
            record.kind, record.name, record.content, record.ttl
        );
        api.delete_record(target.root(), &record.id)?;
    }

    Ok(stale.len())
}

pub fn create_record<A>(
    api: &mut A,
    target: &RecordTarget,
    ip: &str,
) -> Result<CreateResponse, DdnsUpdateError>
where
    A: DnsApi + ?Sized,
{
    info!("Creating record: {} with answer of {}", target.fqdn(), ip);
    api.create_record(target.root(), &NewRecord::a(target.label(), ip))
}

/// Points `target` at `ip`: removes the conflicting records, then creates the
/// new one. Both steps are retried separately according to `policy`.
pub fn synchronize<A>(
    api: &mut A,
    target: &RecordTarget,
    ip: &str,
    policy: &RetryPolicy,
) -> Result<CreateResponse, RetryError>
where
    A: DnsApi + ?Sized,
{
    synchronize_with_sleep(api, target, ip, policy, std::thread::sleep)
}

/// [`synchronize`] with a custom sleep between attempts.
pub fn synchronize_with_sleep<A, S>(
    api: &mut A,
    target: &RecordTarget,
    ip: &str,
    policy: &RetryPolicy,
    mut sleep: S,
) -> Result<CreateResponse, RetryError>
where
    A: DnsApi + ?Sized,
    S: FnMut(std::time::Duration),
{
    retry_with_sleep(
        "remove stale records",
        policy,
        || remove_stale_records(&mut *api, target),
        &mut sleep,
    )?;
    retry_with_sleep(
        "create the record",
        policy,
        || create_record(&mut *api, target, ip),
        &mut sleep,
    )
}
