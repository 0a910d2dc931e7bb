mod ureq_backend;

use std::io::{self, Read};

use serde::de::DeserializeOwned;

pub use ureq_backend::Request;

/// Sent with every request so Porkbun can tell us apart from browsers.
pub const USER_AGENT: &str = concat!("porkbun-ddns/", env!("CARGO_PKG_VERSION"));

/// Responses larger than this are cut off when read as text. Porkbun never
/// sends anything close to it.
const MAX_TEXT_LEN: u64 = 2 * 1024 * 1024;

pub struct Response {
    pub(self) reader: Box<dyn Read>,
}

pub enum Error {
    /// The server answered, but with a status code >= 400. The body is kept
    /// because Porkbun explains most failures inside it.
    Status(u16, Response),
    Transport(Box<str>),
}

impl Response {
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, io::Error> {
        serde_json::from_reader(self.reader)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn into_string(self) -> Result<String, io::Error> {
        let mut vec = Vec::with_capacity(1024);
        self.reader.take(MAX_TEXT_LEN).read_to_end(&mut vec)?;
        String::from_utf8(vec).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
