mod app;
mod routes;

use anyhow::{anyhow, Context};
use app::AppState;
use convodeck_core::LogNotifier;
use convodeck_data::{
    default_assets_dir, default_state_dir, load_store_config_with_env, JsonFileStorage,
    JsonOrderBook,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Response, Server, StatusCode};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:7878";

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let assets = std::env::var_os("CONVODECK_ASSETS")
        .map(PathBuf::from)
        .unwrap_or_else(default_assets_dir);
    let store = load_store_config_with_env(&assets)?;
    let state_dir = default_state_dir().context("no state directory; set CONVODECK_STATE_DIR")?;
    let orders = JsonOrderBook::open(state_dir.join("orders.json"))
        .with_context(|| format!("open orders in {}", state_dir.display()))?;

    let addr = std::env::var("CONVODECK_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let public_url = std::env::var("CONVODECK_PUBLIC_URL")
        .unwrap_or_else(|_| format!("http://{}", addr.replace("0.0.0.0", "localhost")));
    let state = AppState::new(
        store,
        Box::new(JsonFileStorage::new(state_dir.join("session"))),
        Box::new(orders),
        Box::new(LogNotifier),
    )
    .with_public_url(public_url);
    let state = Arc::new(Mutex::new(state));

    let server = Server::http(&addr).map_err(|err| anyhow!("start server on {addr}: {err}"))?;
    info!(%addr, state_dir = %state_dir.display(), "convodeck web server listening");
    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, &state) {
            warn!(error = %err, "request error");
        }
    }
    Ok(())
}

fn handle_request(
    mut request: tiny_http::Request,
    state: &Arc<Mutex<AppState>>,
) -> anyhow::Result<()> {
    let mut body = String::new();
    request
        .as_reader()
        .read_to_string(&mut body)
        .context("read request body")?;
    let method = request.method().clone();
    let url = request.url().to_string();
    let response = {
        let mut guard = state
            .lock()
            .map_err(|_| anyhow!("application state poisoned"))?;
        routes::handle(&mut guard, &method, &url, &body)
    };
    info!(%method, %url, status = response.status, "request");
    respond_json(request, response)
}

fn respond_json(request: tiny_http::Request, response: routes::ApiResponse) -> anyhow::Result<()> {
    let body = serde_json::to_vec_pretty(&response.body)?;
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|()| anyhow!("invalid content type header"))?;
    request.respond(
        Response::from_data(body)
            .with_status_code(StatusCode(response.status))
            .with_header(header),
    )?;
    Ok(())
}
