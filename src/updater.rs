use std::io;

use log::{info, warn};
use thiserror::Error;

use crate::cache::IpCache;
use crate::retry::{RetryError, RetryPolicy};
use crate::services::{CreateResponse, DnsApi};
use crate::sync::{self, RecordTarget};

/// One run's worth of work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateRequest {
    pub target: RecordTarget,

    /// The address to publish, already resolved.
    pub ip: Box<str>,

    /// Skip the update entirely when `ip` matches the cached address.
    pub cache_mode: bool,
}

#[derive(Debug)]
pub enum Outcome {
    /// The cached address matched, nothing was sent to the provider.
    Unchanged,

    /// The record was created and the cache updated.
    Published(CreateResponse),

    /// The provider answered the create call with an error status. The
    /// cache was left alone.
    Rejected(CreateResponse),
}

#[derive(Debug, Error)]
pub enum UpdateFailure {
    #[error("unable to read the cached IP from {0}: {1}")]
    Cache(Box<str>, io::Error),

    #[error(transparent)]
    Remote(#[from] RetryError),
}

/// Brings the provider's records in line with `request`, consulting and
/// refreshing `cache` around it.
pub fn update<A>(
    api: &mut A,
    cache: &IpCache,
    policy: &RetryPolicy,
    request: &UpdateRequest,
) -> Result<Outcome, UpdateFailure>
where
    A: DnsApi + ?Sized,
{
    update_with_sleep(api, cache, policy, request, std::thread::sleep)
}

pub fn update_with_sleep<A, S>(
    api: &mut A,
    cache: &IpCache,
    policy: &RetryPolicy,
    request: &UpdateRequest,
    sleep: S,
) -> Result<Outcome, UpdateFailure>
where
    A: DnsApi + ?Sized,
    S: FnMut(std::time::Duration),
{
    if request.cache_mode {
        let changed = cache
            .has_changed(&request.ip)
            .map_err(|e| UpdateFailure::Cache(cache.path().display().to_string().into(), e))?;

        if !changed {
            info!(
                "Your IP address hasn't changed, it's still {}. No need to update its DNS records.",
                request.ip
            );
            return Ok(Outcome::Unchanged);
        }
    }

    let response = sync::synchronize_with_sleep(api, &request.target, &request.ip, policy, sleep)?;

    if !response.is_success() {
        return Ok(Outcome::Rejected(response));
    }

    // The records are already live at this point, a stale cache only costs
    // an extra update next time.
    if let Err(e) = cache.write(&request.ip) {
        warn!(
            "Couldn't write the IP to cache file {}: {}",
            cache.path().display(),
            e
        );
    }

    Ok(Outcome::Published(response))
}
