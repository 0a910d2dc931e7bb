use std::convert::Infallible;

use log::debug;
use serde_json::{json, Value};

use crate::config::ApiConfig;
use crate::http::{Error, Request};

use super::{ApiStatus, CreateResponse, DdnsUpdateError, DnsApi, DnsRecord, NewRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Service {
    config: ApiConfig,
}

impl From<ApiConfig> for Service {
    fn from(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl Service {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.endpoint.trim_end_matches('/'), path)
    }

    fn parse_error(error: Error) -> Result<Infallible, DdnsUpdateError> {
        match error {
            // Porkbun answers most client errors with a JSON body explaining
            // the failure. 429 is rate limiting, which is worth retrying.
            Error::Status(code, resp) if code < 500 && code != 429 => {
                let text = resp
                    .into_string()
                    .map_err(|e| DdnsUpdateError::Json(e.to_string().into()))?;

                match serde_json::from_str::<Value>(&text) {
                    Ok(json) => Err(DdnsUpdateError::Porkbun(error_message(&json).into())),
                    Err(_) => Err(DdnsUpdateError::Status(code, text.into())),
                }
            }
            Error::Status(code, resp) => {
                let text = resp.into_string().unwrap_or_default();
                Err(DdnsUpdateError::Status(code, text.into()))
            }
            Error::Transport(t) => Err(DdnsUpdateError::TransportError(t)),
        }
    }

    /// POSTs the config merged with `fields` to `path` and returns the JSON
    /// answer. Only transport and HTTP level failures are errors here, the
    /// `status` field is left to the caller.
    fn post(&self, path: &str, fields: Value) -> Result<Value, DdnsUpdateError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = Request::post(&url)
            .send_json(self.config.merged_with(fields))
            .map_err(|e| Self::parse_error(e).unwrap_err())?;

        response
            .into_json::<Value>()
            .map_err(|e| DdnsUpdateError::Json(e.to_string().into()))
    }
}

fn error_message(json: &Value) -> &str {
    json.get("message")
        .and_then(|v| v.as_str())
        .unwrap_or("(null)")
}

fn status_of(json: &Value) -> Result<ApiStatus, DdnsUpdateError> {
    let status = json
        .get("status")
        .ok_or_else(|| DdnsUpdateError::Json("response has no status".into()))?;

    serde_json::from_value(status.clone())
        .map_err(|e| DdnsUpdateError::Json(format!("unexpected status {}: {}", status, e).into()))
}

/// Turns an `ERROR` status into [`DdnsUpdateError::Porkbun`].
fn ensure_success(json: &Value) -> Result<(), DdnsUpdateError> {
    match status_of(json)? {
        ApiStatus::Success => Ok(()),
        ApiStatus::Error => Err(DdnsUpdateError::Porkbun(error_message(json).into())),
    }
}

pub(crate) fn parse_ping(json: &Value) -> Result<Box<str>, DdnsUpdateError> {
    ensure_success(json)?;

    json.get("yourIp")
        .and_then(|v| v.as_str())
        .map(Into::into)
        .ok_or_else(|| DdnsUpdateError::Json("ping response has no yourIp".into()))
}

pub(crate) fn parse_records(domain: &str, json: Value) -> Result<Vec<DnsRecord>, DdnsUpdateError> {
    if let ApiStatus::Error = status_of(&json)? {
        let reason = error_message(&json);
        return Err(DdnsUpdateError::DomainRejected(domain.into(), reason.into()));
    }

    let Some(records) = json.get("records") else {
        return Err(DdnsUpdateError::Json("retrieve response has no records".into()));
    };

    match records {
        Value::Null => Ok(Vec::new()),
        records => serde_json::from_value::<Vec<DnsRecord>>(records.clone())
            .map_err(|e| DdnsUpdateError::Json(e.to_string().into())),
    }
}

pub(crate) fn parse_create(json: Value) -> Result<CreateResponse, DdnsUpdateError> {
    let status = status_of(&json)?;
    Ok(CreateResponse { status, body: json })
}

/// See: https://porkbun.com/api/json/v3/documentation
impl DnsApi for Service {
    fn ping(&mut self) -> Result<Box<str>, DdnsUpdateError> {
        let json = self.post("ping", json!({}))?;
        parse_ping(&json)
    }

    fn retrieve_records(&mut self, domain: &str) -> Result<Vec<DnsRecord>, DdnsUpdateError> {
        let json = match self.post(&format!("dns/retrieve/{}", domain), json!({})) {
            Ok(json) => json,
            // Porkbun reports unknown domains and disabled API access with
            // a 400 and a message.
            Err(DdnsUpdateError::Porkbun(reason)) => {
                return Err(DdnsUpdateError::DomainRejected(domain.into(), reason))
            }
            Err(e) => return Err(e),
        };

        parse_records(domain, json)
    }

    fn delete_record(&mut self, domain: &str, id: &str) -> Result<(), DdnsUpdateError> {
        let json = self.post(&format!("dns/delete/{}/{}", domain, id), json!({}))?;
        ensure_success(&json)
    }

    fn create_record(
        &mut self,
        domain: &str,
        record: &NewRecord,
    ) -> Result<CreateResponse, DdnsUpdateError> {
        let fields = serde_json::to_value(record)
            .map_err(|e| DdnsUpdateError::Json(e.to_string().into()))?;

        let json = self.post(&format!("dns/create/{}", domain), fields)?;
        parse_create(json)
    }
}
