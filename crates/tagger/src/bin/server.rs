use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tagger::{TaggedWord, Tagger, TaggerError};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// HTTP endpoint for part-of-speech tagging.
#[derive(Parser)]
#[command(name = "tag-server", version, about, long_about = None)]
struct Cli {
    /// Directory holding vocab.txt, outTokens.txt and the model weights
    #[arg(short, long, value_name = "DIR")]
    model_dir: PathBuf,

    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:3030")]
    addr: String,
}

#[derive(Deserialize)]
struct TagRequest {
    text: String,
}

#[derive(Serialize)]
struct TagResponse {
    tags: Vec<TaggedWord>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let tagger = Arc::new(Tagger::from_directory(&cli.model_dir)?);

    let server = Server::http(&cli.addr)
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {e}", cli.addr))?;
    info!(addr = %cli.addr, "tag server listening");

    for request in server.incoming_requests() {
        let tagger = Arc::clone(&tagger);
        // thread per request
        thread::spawn(move || handle(&tagger, request));
    }
    Ok(())
}

fn handle(tagger: &Tagger, mut req: Request) {
    let url = req.url().to_string();
    let method = req.method().clone();

    let response = match (&method, url.as_str()) {
        (Method::Get, "/health") => Response::from_string("OK"),
        (Method::Post, "/tag") => {
            let mut body = String::new();
            if let Err(e) = req.as_reader().read_to_string(&mut body) {
                warn!(error = %e, "unreadable request body");
                json_response(StatusCode(400), &ErrorResponse { error: e.to_string() })
            } else {
                tag(tagger, &body)
            }
        }
        _ => Response::from_string("Not Found").with_status_code(StatusCode(404)),
    };
    if let Err(e) = req.respond(response) {
        warn!(error = %e, %url, "failed to send response");
    }
}

fn tag(tagger: &Tagger, body: &str) -> Response<Cursor<Vec<u8>>> {
    let request: TagRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            return json_response(StatusCode(400), &ErrorResponse {
                error: format!("malformed request: {e}"),
            })
        }
    };
    match tagger.predict(&request.text) {
        Ok(tags) => json_response(StatusCode(200), &TagResponse { tags }),
        Err(e @ TaggerError::InputTooLong { .. }) => {
            json_response(StatusCode(400), &ErrorResponse { error: e.to_string() })
        }
        Err(e) => {
            error!(error = %e, "tagging failed");
            json_response(StatusCode(500), &ErrorResponse { error: e.to_string() })
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Cursor<Vec<u8>>> {
    let body = serde_json::to_string(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"));
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        response.add_header(header);
    }
    response
}
