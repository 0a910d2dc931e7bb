#[cfg(test)]
pub mod dummy;
pub mod porkbun;

use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::string_or_number;

/// TTL given to every record we create, in seconds.
pub const RECORD_TTL: u32 = 300;

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum DdnsUpdateError {
    // the provider refuses to work with the domain at all, retrying is futile
    #[error("Porkbun rejected domain {0}: {1} (check the domain name and that API access is enabled for it)")]
    DomainRejected(Box<str>, Box<str>),

    #[error("Porkbun returned error: {0}")]
    Porkbun(Box<str>),

    // used when a service says it succeeded, but the returned JSON is nonsense
    #[error("received erroneous JSON: {0}")]
    Json(Box<str>),

    #[error("HTTP status {0}: {1}")]
    Status(u16, Box<str>),

    #[error("HTTP transport error: {0}")]
    TransportError(Box<str>),
}

impl DdnsUpdateError {
    /// Terminal errors are configuration problems on the user's side. The
    /// retry executor gives up on them immediately.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DdnsUpdateError::DomainRejected(..))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordKind {
    A,
    Alias,
    Cname,
    Other(Box<str>),
}

impl From<Box<str>> for RecordKind {
    fn from(kind: Box<str>) -> Self {
        match &*kind {
            "A" => RecordKind::A,
            "ALIAS" => RecordKind::Alias,
            "CNAME" => RecordKind::Cname,
            _ => RecordKind::Other(kind),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::A => write!(f, "A"),
            RecordKind::Alias => write!(f, "ALIAS"),
            RecordKind::Cname => write!(f, "CNAME"),
            RecordKind::Other(other) => write!(f, "{}", other),
        }
    }
}

impl RecordKind {
    /// Records that resolve a name to an address or alias target, and would
    /// therefore clash with the A record we are about to create.
    pub fn is_address_bearing(&self) -> bool {
        matches!(self, RecordKind::A | RecordKind::Alias | RecordKind::Cname)
    }
}

/// A record as listed by the provider.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DnsRecord {
    pub id: Box<str>,

    /// Fully qualified, e.g. `www.example.com`.
    pub name: Box<str>,

    #[serde(rename = "type", deserialize_with = "record_kind")]
    pub kind: RecordKind,

    #[serde(default)]
    pub content: Box<str>,

    #[serde(deserialize_with = "string_or_number")]
    pub ttl: u32,
}

fn record_kind<'de, D>(deserializer: D) -> Result<RecordKind, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <Box<str> as serde::Deserialize>::deserialize(deserializer).map(RecordKind::from)
}

/// Payload for creating a record. `name` is the label relative to the root
/// domain, so it is empty for the apex.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct NewRecord {
    pub name: Box<str>,

    #[serde(rename = "type")]
    pub kind: &'static str,

    pub content: Box<str>,

    pub ttl: u32,
}

impl NewRecord {
    pub fn a(name: &str, ip: &str) -> Self {
        Self {
            name: name.into(),
            kind: "A",
            content: ip.into(),
            ttl: RECORD_TTL,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApiStatus {
    Success,
    Error,
}

/// What the provider answered to a create call.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateResponse {
    pub status: ApiStatus,

    /// The full response, kept for reporting.
    pub body: serde_json::Value,
}

impl CreateResponse {
    pub fn is_success(&self) -> bool {
        self.status == ApiStatus::Success
    }
}

/// The four calls the updater needs from a DNS provider. All of them are
/// blocking and are issued one at a time.
pub trait DnsApi {
    /// Asks the provider which address our request came from.
    fn ping(&mut self) -> Result<Box<str>, DdnsUpdateError>;

    /// Lists every record of `domain`. A domain the provider won't serve is
    /// reported as [`DdnsUpdateError::DomainRejected`].
    fn retrieve_records(&mut self, domain: &str) -> Result<Vec<DnsRecord>, DdnsUpdateError>;

    fn delete_record(&mut self, domain: &str, id: &str) -> Result<(), DdnsUpdateError>;

    fn create_record(
        &mut self,
        domain: &str,
        record: &NewRecord,
    ) -> Result<CreateResponse, DdnsUpdateError>;
}
