//! Generic authenticated requests.
//!
//! These expose the four dispatcher verbs so any endpoint can be reached
//! from the shell, with the same refresh-and-replay handling as the
//! dedicated commands.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use tally_http::RequestDescriptor;

use crate::output;
use crate::session::SessionContext;

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Path below /api/v1 (e.g., /expenses)
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Path below /api/v1 (e.g., /categories)
    pub path: String,

    /// JSON request body
    #[arg(short, long, default_value = "{}")]
    pub data: String,
}

pub async fn get(args: ReadArgs, context: &SessionContext) -> Result<()> {
    let request = RequestDescriptor::get(&args.path).with_query(&query_object(args.query))?;
    dispatch(request, context).await
}

pub async fn delete(args: ReadArgs, context: &SessionContext) -> Result<()> {
    let request = RequestDescriptor::delete(&args.path).with_query(&query_object(args.query))?;
    dispatch(request, context).await
}

pub async fn post(args: WriteArgs, context: &SessionContext) -> Result<()> {
    let request = RequestDescriptor::post(&args.path).with_json(&parse_body(&args.data)?)?;
    dispatch(request, context).await
}

pub async fn patch(args: WriteArgs, context: &SessionContext) -> Result<()> {
    let request = RequestDescriptor::patch(&args.path).with_json(&parse_body(&args.data)?)?;
    dispatch(request, context).await
}

async fn dispatch(request: RequestDescriptor, context: &SessionContext) -> Result<()> {
    let client = context.authenticated_client()?;
    let description = format!("{} {}", request.method(), request.path());

    let value: Value = client
        .send(request)
        .await
        .with_context(|| format!("{description} failed"))?;

    if value.is_null() {
        output::success(&format!("{description} succeeded"));
        return Ok(());
    }
    output::json_pretty(&value)
}

fn parse_body(data: &str) -> Result<Value> {
    serde_json::from_str(data).context("Request body is not valid JSON")
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
    if key.is_empty() {
        return Err(format!("missing key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Collect pairs into an object; a repeated key becomes an array.
fn query_object(pairs: Vec<(String, String)>) -> Map<String, Value> {
    let mut query = Map::new();
    for (key, value) in pairs {
        let value = Value::String(value);
        match query.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                query.insert(key, value);
            }
        }
    }
    query
}
