//! Fixed diagnostic requests against a CMDB.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, error, info};

use auth::{Params, SignatureHook, SignatureTrace};
use cmdb_rest::{CmdbRestClient, CmdbRestError};
use common::CmdbEnvironment;

/// One diagnostic request.
#[derive(Debug, Clone)]
pub struct ProbeCase {
    pub name: &'static str,
    /// Endpoint below the API prefix, e.g. `ci/s`.
    pub endpoint: &'static str,
    pub params: Params,
}

impl ProbeCase {
    fn new(name: &'static str, endpoint: &'static str, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map.into_iter().collect(),
            _ => Params::new(),
        };
        Self {
            name,
            endpoint,
            params,
        }
    }

    /// Path relative to the server root under the configured API prefix.
    pub fn path(&self, environment: &CmdbEnvironment) -> String {
        environment.endpoint_path(self.endpoint)
    }
}

/// The requests a probe run sends, in order.
///
/// Type 39 is queried both as `_type:(39)` and `_type:39`; servers differ in
/// which form they accept.
pub fn probe_cases() -> Vec<ProbeCase> {
    vec![
        ProbeCase::new("all CIs, no filter", "ci/s", json!({"count": 10})),
        ProbeCase::new(
            "CI type 39, bracketed query",
            "ci/s",
            json!({"q": "_type:(39)", "count": 10}),
        ),
        ProbeCase::new("service tree view list", "preference/relation/view", json!({})),
        ProbeCase::new("CI type definitions", "ci_types", json!({})),
        ProbeCase::new(
            "CI type 39, plain query",
            "ci/s",
            json!({"q": "_type:39", "count": 10}),
        ),
    ]
}

/// Hook logging every signature at debug level.
///
/// The trace carries no secret, so neither does the log line.
pub fn signing_hook() -> SignatureHook {
    Arc::new(|trace: &SignatureTrace<'_>| {
        debug!(
            path = %trace.path,
            keys = ?trace.keys,
            values = %trace.values,
            signature = %trace.signature,
            "Signed request"
        );
    })
}

/// Shape-dependent digest of a response body.
#[derive(Debug, PartialEq)]
pub enum ResponseSummary<'a> {
    /// Object with a `total` field, as returned by searches.
    Search {
        total: &'a Value,
        numfound: u64,
        first: Option<&'a Value>,
    },
    /// Top-level array.
    List {
        len: usize,
        first: Option<&'a Value>,
    },
    /// Anything else.
    Raw(&'a Value),
}

/// Pick the summary for a response body.
pub fn summarize(body: &Value) -> ResponseSummary<'_> {
    match body {
        Value::Object(map) if map.contains_key("total") => ResponseSummary::Search {
            total: &map["total"],
            numfound: map.get("numfound").and_then(Value::as_u64).unwrap_or(0),
            first: map
                .get("result")
                .and_then(Value::as_array)
                .and_then(|r| r.first()),
        },
        Value::Array(items) => ResponseSummary::List {
            len: items.len(),
            first: items.first(),
        },
        other => ResponseSummary::Raw(other),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl fmt::Display for ResponseSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search {
                total,
                numfound,
                first,
            } => {
                writeln!(f, "Total: {}", total)?;
                writeln!(f, "Found: {}", numfound)?;
                if let Some(first) = first {
                    writeln!(f, "First result:")?;
                    writeln!(f, "{}", pretty(first))?;
                }
                Ok(())
            }
            Self::List { len, first } => {
                writeln!(f, "Items: {}", len)?;
                if let Some(first) = first {
                    writeln!(f, "First item:")?;
                    writeln!(f, "{}", pretty(first))?;
                }
                Ok(())
            }
            Self::Raw(body) => writeln!(f, "{}", pretty(body)),
        }
    }
}

async fn run_case(client: &CmdbRestClient, case: &ProbeCase) -> Result<(), CmdbRestError> {
    let path = case.path(client.environment());
    let response = client.signed_get(&path, &case.params).await?;

    println!("Status: {}", response.status);
    println!("URL: {}", response.url);
    print!("{}", summarize(&response.body));
    Ok(())
}

/// Run every case in order and return how many failed.
///
/// A failing case is logged and the run goes on.
pub async fn run_probe(client: &CmdbRestClient, cases: &[ProbeCase]) -> usize {
    info!(cases = cases.len(), environment = %client.environment(), "Starting probe");

    let mut failures = 0;
    for case in cases {
        println!("\n=== {} ===", case.name);

        if let Err(e) = run_case(client, case).await {
            failures += 1;
            error!(case = case.name, endpoint = case.endpoint, error = %e, "Probe case failed");
        }
    }

    info!(failures = failures, "Probe complete");
    failures
}
