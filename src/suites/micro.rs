//! Probes for app hosting: this deployment pings its own `/ping` route.

use crate::error::StatusResult;
use crate::probe::registry::ProbeRegistry;
use crate::suites::ping::ping;

pub fn registry(http: reqwest::Client, ping_url: String) -> StatusResult<ProbeRegistry> {
    ProbeRegistry::new().with("test_ping", move || ping(http.clone(), ping_url.clone()))
}
