// src/cli/serve.rs — `promptspec serve`

use crate::api::{self, ApiState};
use crate::infra::config::Config;
use crate::memory::{spawn_store_server, store::Store};

/// Hand the store to its own task and serve the API until shutdown.
pub async fn run_serve(
    mut config: Config,
    store: Store,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let (handle, store_task) = spawn_store_server(store);
    let state = ApiState::new(handle, &config);

    if config.server.api_token.is_some() {
        tracing::info!("Bearer token auth enabled");
    }
    if config.server.debug {
        tracing::info!("Debug mode: CORS allows any origin");
    }

    let result = api::start_server(&config.server, state).await;
    store_task.abort();
    result
}
