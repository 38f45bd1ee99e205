//! Immutable description of one logical request.

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;

use tally_core::{Error, Result};

/// Everything needed to send (and resend) a request, minus credentials.
///
/// A replay after a token refresh sends the same descriptor again; only the
/// `Authorization` header, which the transport adds, differs.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    headers: HeaderMap,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|e| Error::Unknown {
            message: format!("request body could not be encoded: {e}"),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attach query parameters from a flat serializable struct or map.
    ///
    /// `None`/`null` fields are skipped and arrays repeat the key.
    pub fn with_query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        let encode_error = |reason: String| Error::Unknown {
            message: format!("query parameters could not be encoded: {reason}"),
        };

        let value = serde_json::to_value(query).map_err(|e| encode_error(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(encode_error("expected a struct or map".to_string()));
        };

        for (key, value) in fields {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items {
                        self.query.push((key.clone(), scalar(&item).map_err(encode_error)?));
                    }
                }
                other => self.query.push((key, scalar(&other).map_err(encode_error)?)),
            }
        }
        Ok(self)
    }

    /// Add an extra header. `Authorization` set here is replaced by the
    /// session token when one is stored.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

fn scalar(value: &Value) -> std::result::Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("unsupported query value {other}")),
    }
}
