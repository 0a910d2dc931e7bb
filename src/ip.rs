use log::info;

use crate::services::{DdnsUpdateError, DnsApi};

/// Works out which IP to publish. A non-empty `manual` address wins and is
/// used verbatim, without asking the provider or checking its syntax.
pub fn resolve_ip<A>(manual: Option<&str>, api: &mut A) -> Result<Box<str>, DdnsUpdateError>
where
    A: DnsApi + ?Sized,
{
    if let Some(ip) = manual.filter(|ip| !ip.is_empty()) {
        info!("Using manually specified IP {}", ip);
        return Ok(ip.into());
    }

    let ip = api.ping()?;
    info!("Provider reports our IP as {}", ip);
    Ok(ip)
}
