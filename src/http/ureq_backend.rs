use std::time::Duration;

use serde::Serialize;
use ureq;

use super::{Error, Response, USER_AGENT};

/// Upper bound for a single request, connect and body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Request {
    inner: ureq::Request,
}

impl Request {
    pub fn post(url: &str) -> Self {
        let inner = ureq::post(url)
            .set("User-Agent", USER_AGENT)
            .timeout(REQUEST_TIMEOUT);
        Self { inner }
    }

    pub fn send_json(self, data: impl Serialize) -> Result<Response, Error> {
        self.inner
            .send_json(data)
            .map_err(|e| match e {
                ureq::Error::Status(code, resp) => Error::Status(
                    code,
                    Response {
                        reader: resp.into_reader(),
                    },
                ),
                ureq::Error::Transport(tp) => Error::Transport(tp.to_string().into()),
            })
            .map(|resp| Response {
                reader: resp.into_reader(),
            })
    }
}
