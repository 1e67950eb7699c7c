use std::io::Write;

use anyhow::Context;
use compact_http::Connection;
use compact_http::http::request::{Method, RequestBuilder};
use compact_http::http::response::Response;

const USAGE: &str = "usage: compact-http <METHOD> <HOST> <PATH> [BODY]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (method, host, path, body) = match args.as_slice() {
        [method, host, path] => (method, host.clone(), path, Vec::new()),
        [method, host, path, body] => (method, host.clone(), path, body.clone().into_bytes()),
        _ => anyhow::bail!(USAGE),
    };

    let method = Method::from_str(&method.to_ascii_uppercase())
        .with_context(|| format!("Unsupported method {method}"))?;
    let request = RequestBuilder::new()
        .method(method)
        .path(path.as_str())
        .header("Accept", "*/*")
        .body(body)
        .build()
        .map_err(anyhow::Error::msg)?;

    let task = tokio::task::spawn_blocking(move || -> anyhow::Result<Response> {
        let mut conn = Connection::create(&host)?;
        let result = conn.fetch(&request);
        conn.close();
        result.with_context(|| format!("{} {} failed", request.method, request.path))
    });

    tokio::select! {
        res = task => {
            let response = res.context("Request task failed")??;
            print_response(&response)?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn print_response(response: &Response) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", response.status)?;
    for (name, value) in response.headers.iter() {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    out.write_all(&response.body)?;
    out.flush()?;
    Ok(())
}
