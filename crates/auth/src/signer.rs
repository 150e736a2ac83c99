//! SHA-1 request signing for the CMDB API.

use crate::credentials::ApiCredentials;
use crate::params::{scalar_text, Params, KEY_PARAM, SECRET_PARAM};
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::sync::Arc;

/// Redacted record of one signature computation.
///
/// The secret is never part of the trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTrace<'a> {
    /// URL path that was signed.
    pub path: &'a str,
    /// Parameter keys that contributed, in signing order.
    pub keys: Vec<&'a str>,
    /// Concatenated parameter values.
    pub values: &'a str,
    /// Resulting signature.
    pub signature: &'a str,
}

/// Callback invoked after every signature.
pub type SignatureHook = Arc<dyn Fn(&SignatureTrace<'_>) + Send + Sync>;

/// Request signer for authenticated CMDB API calls.
#[derive(Clone)]
pub struct RequestSigner {
    credentials: ApiCredentials,
    hook: Option<SignatureHook>,
}

impl RequestSigner {
    /// Create a new request signer with the given credentials.
    pub fn new(credentials: ApiCredentials) -> Self {
        Self {
            credentials,
            hook: None,
        }
    }

    /// Attach a hook that observes every signature.
    pub fn with_hook(mut self, hook: SignatureHook) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Get the API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// Compute the signature for `path` and `params`.
    ///
    /// The signing input is `path + secret + values`, where `values` joins the
    /// text of every scalar parameter in ascending key order. `_key`,
    /// `_secret`, structured values and `null` are left out.
    pub fn signature(&self, path: &str, params: &Params) -> String {
        let mut keys: Vec<&str> = params
            .iter()
            .filter(|(k, _)| k.as_str() != KEY_PARAM && k.as_str() != SECRET_PARAM)
            .filter(|(_, v)| !matches!(v, Value::Null | Value::Array(_) | Value::Object(_)))
            .map(|(k, _)| k.as_str())
            .collect();

        keys.sort_unstable();

        let values: String = keys
            .iter()
            .filter_map(|k| params.get(*k).and_then(scalar_text))
            .collect();

        let mut hasher = Sha1::new();
        hasher.update(path.as_bytes());
        hasher.update(self.credentials.expose_secret().as_bytes());
        hasher.update(values.as_bytes());
        let signature = hex::encode(hasher.finalize());

        if let Some(hook) = &self.hook {
            hook(&SignatureTrace {
                path,
                keys,
                values: &values,
                signature: &signature,
            });
        }

        signature
    }

    /// Return a copy of `params` with `_secret` and `_key` set.
    ///
    /// Any `_key`/`_secret` already in `params` is ignored for signing and
    /// replaced in the result. The caller's map is not modified.
    pub fn sign(&self, path: &str, params: &Params) -> Params {
        let signature = self.signature(path, params);

        let mut signed = params.clone();
        signed.insert(SECRET_PARAM.to_string(), Value::String(signature));
        signed.insert(
            KEY_PARAM.to_string(),
            Value::String(self.credentials.api_key().to_string()),
        );
        signed
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("credentials", &self.credentials)
            .field("hook", &self.hook.is_some())
            .finish()
    }
}
