//! An in-memory provider. It keeps a record set per run, logs every call it
//! receives, and can be told to fail in the ways Porkbun does.

use serde_json::json;

use super::{ApiStatus, CreateResponse, DdnsUpdateError, DnsApi, DnsRecord, NewRecord, RecordKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Ping,
    Retrieve(Box<str>),
    Delete(Box<str>, Box<str>),
    Create(Box<str>, NewRecord),
}

pub struct Service {
    pub ip: Box<str>,
    pub records: Vec<DnsRecord>,
    pub calls: Vec<Call>,

    /// The next this many pings fail with a transport error.
    pub failing_pings: u32,
    /// The next this many creates fail with a transport error.
    pub failing_creates: u32,
    /// Deleting this record id always fails.
    pub undeletable: Option<Box<str>>,
    pub reject_domain: bool,
    pub create_status: ApiStatus,

    next_id: u64,
}

impl Service {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.into(),
            records: Vec::new(),
            calls: Vec::new(),
            failing_pings: 0,
            failing_creates: 0,
            undeletable: None,
            reject_domain: false,
            create_status: ApiStatus::Success,
            next_id: 1000,
        }
    }

    pub fn with_record(mut self, id: &str, name: &str, kind: &str, content: &str) -> Self {
        self.records.push(DnsRecord {
            id: id.into(),
            name: name.into(),
            kind: RecordKind::from(Box::<str>::from(kind)),
            content: content.into(),
            ttl: 600,
        });
        self
    }

    pub fn creates(&self) -> Vec<&NewRecord> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Create(_, record) => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn deleted_ids(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Delete(_, id) => Some(&**id),
                _ => None,
            })
            .collect()
    }
}

impl DnsApi for Service {
    fn ping(&mut self) -> Result<Box<str>, DdnsUpdateError> {
        self.calls.push(Call::Ping);

        if self.failing_pings > 0 {
            self.failing_pings -= 1;
            return Err(DdnsUpdateError::TransportError("connection reset".into()));
        }

        Ok(self.ip.clone())
    }

    fn retrieve_records(&mut self, domain: &str) -> Result<Vec<DnsRecord>, DdnsUpdateError> {
        self.calls.push(Call::Retrieve(domain.into()));

        if self.reject_domain {
            return Err(DdnsUpdateError::DomainRejected(
                domain.into(),
                "Invalid domain.".into(),
            ));
        }

        Ok(self.records.clone())
    }

    fn delete_record(&mut self, domain: &str, id: &str) -> Result<(), DdnsUpdateError> {
        self.calls.push(Call::Delete(domain.into(), id.into()));

        if self.undeletable.as_deref() == Some(id) {
            return Err(DdnsUpdateError::Porkbun("Could not delete record.".into()));
        }

        self.records.retain(|record| &*record.id != id);
        Ok(())
    }

    fn create_record(
        &mut self,
        domain: &str,
        record: &NewRecord,
    ) -> Result<CreateResponse, DdnsUpdateError> {
        self.calls.push(Call::Create(domain.into(), record.clone()));

        if self.failing_creates > 0 {
            self.failing_creates -= 1;
            return Err(DdnsUpdateError::Status(503, "Service Unavailable".into()));
        }

        if self.create_status == ApiStatus::Error {
            return Ok(CreateResponse {
                status: ApiStatus::Error,
                body: json!({ "status": "ERROR", "message": "Create error: duplicate record." }),
            });
        }

        self.next_id += 1;
        let name = if record.name.is_empty() {
            domain.to_owned()
        } else {
            format!("{}.{}", record.name, domain)
        };

        self.records.push(DnsRecord {
            id: self.next_id.to_string().into(),
            name: name.into(),
            kind: RecordKind::A,
            content: record.content.clone(),
            ttl: record.ttl,
        });

        Ok(CreateResponse {
            status: ApiStatus::Success,
            body: json!({ "status": "SUCCESS", "id": self.next_id }),
        })
    }
}
