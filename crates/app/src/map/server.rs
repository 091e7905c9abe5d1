//! Actix Web server exposing the map page, uploads, and the default input.
//!
//! Shared state is read-only: the configuration plus the bytes of the
//! default input. Every request performs its own load-and-render pass on the
//! blocking pool, so there is no "current map" to keep in sync.

use actix_web::{
    App, HttpResponse, HttpServer,
    http::header,
    web::{self, Bytes},
};
use anyhow::{Context, Result, anyhow};
use emissions_core::{Dataset, Metric, ScaleScope};
use emissions_ingest::{Input, LoadOptions};
use tracing::{info, warn};

use crate::map::{
    config::MapConfig,
    data::{UploadQuery, ViewQuery},
    document::build_map,
    page::ServerControls,
    pipeline::{load_input, render_dataset},
    telemetry,
};

/// Listener and request limits for `serve`.
#[derive(Clone, Debug)]
pub(crate) struct ServeOptions {
    pub(crate) bind: String,
    pub(crate) port: u16,
    pub(crate) max_upload_bytes: usize,
}

/// Shared state backing HTTP handlers.
pub(crate) struct ServerState {
    pub(crate) config: MapConfig,
    pub(crate) default_name: String,
    pub(crate) default_bytes: Bytes,
}

impl ServerState {
    /// Read the default input into memory and check that it loads.
    pub(crate) fn from_config(config: MapConfig) -> Result<Self> {
        let default_bytes = std::fs::read(&config.input)
            .with_context(|| format!("Failed to read default input {}", config.input.display()))?;
        let state = Self {
            default_name: config.input_file_name(),
            default_bytes: Bytes::from(default_bytes),
            config,
        };
        let dataset = state.load_default()?;
        info!(
            input = %state.default_name,
            layers = dataset.len(),
            "default input ready"
        );
        Ok(state)
    }

    fn load_default(&self) -> Result<Dataset> {
        load_input(
            Input::Upload {
                name: &self.default_name,
                bytes: &self.default_bytes,
            },
            &self.config.load,
        )
    }

    fn controls(&self, scope: ScaleScope, source_name: &str) -> ServerControls {
        ServerControls {
            scope,
            download_name: self.default_name.clone(),
            source_name: source_name.to_string(),
        }
    }

    fn render_default(&self, metric: Metric, scope: ScaleScope) -> Result<String> {
        let dataset = self.load_default()?;
        let controls = self.controls(scope, &self.default_name);
        let (_, html) = render_dataset(&self.config, &dataset, metric, scope, Some(controls))?;
        Ok(html)
    }

    fn render_upload(
        &self,
        name: Option<&str>,
        bytes: &[u8],
        metric: Metric,
        scope: ScaleScope,
    ) -> Result<String> {
        if bytes.is_empty() {
            return self.render_default(metric, scope);
        }
        let (name, options) = match name {
            Some(name) => (
                name,
                LoadOptions {
                    kind: None,
                    ..self.config.load.clone()
                },
            ),
            None => ("upload", self.config.load.clone()),
        };
        let dataset = load_input(Input::Upload { name, bytes }, &options)?;
        let controls = self.controls(scope, name);
        let (_, html) = render_dataset(&self.config, &dataset, metric, scope, Some(controls))?;
        Ok(html)
    }
}

/// Register every route on an app or test service.
pub(crate) fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index_route))
        .route("/upload", web::post().to(upload_route))
        .route("/download", web::get().to(download_route))
        .route("/map.json", web::get().to(map_json_route))
        .route("/metrics", web::get().to(metrics_route));
}

/// Run the server on the current thread until it is stopped.
pub(crate) fn serve(config: MapConfig, options: ServeOptions) -> Result<()> {
    let _ = telemetry::init_metrics_recorder();
    let state = web::Data::new(ServerState::from_config(config)?);
    let payload_limit = options.max_upload_bytes;

    info!(
        bind = %options.bind,
        port = options.port,
        max_upload_bytes = payload_limit,
        "starting map server"
    );

    actix_web::rt::System::new()
        .block_on(async move {
            HttpServer::new(move || {
                App::new()
                    .app_data(state.clone())
                    .app_data(web::PayloadConfig::new(payload_limit))
                    .configure(routes)
            })
            .bind((options.bind.as_str(), options.port))?
            .run()
            .await
        })
        .context("HTTP server error")
}

fn html_response(result: Result<Result<String>, actix_web::error::BlockingError>) -> HttpResponse {
    match result {
        Ok(Ok(html)) => HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(html),
        Ok(Err(err)) => unprocessable(err),
        Err(err) => unprocessable(anyhow!("render task failed: {err}")),
    }
}

fn unprocessable(err: anyhow::Error) -> HttpResponse {
    warn!("request failed: {err:#}");
    HttpResponse::UnprocessableEntity()
        .content_type("text/plain; charset=utf-8")
        .body(format!("{err:#}"))
}

/// Render the default input.
async fn index_route(query: web::Query<ViewQuery>, state: web::Data<ServerState>) -> HttpResponse {
    let state = state.into_inner();
    let metric = query.metric.unwrap_or(state.config.metric);
    let scope = query.scope.unwrap_or(state.config.scope);
    html_response(web::block(move || state.render_default(metric, scope)).await)
}

/// Render a user-supplied replacement file sent as the raw request body.
async fn upload_route(
    query: web::Query<UploadQuery>,
    body: Bytes,
    state: web::Data<ServerState>,
) -> HttpResponse {
    let state = state.into_inner();
    let UploadQuery {
        name,
        metric,
        scope,
    } = query.into_inner();
    let metric = metric.unwrap_or(state.config.metric);
    let scope = scope.unwrap_or(state.config.scope);
    metrics::counter!("co2map_uploads_total").increment(1);
    html_response(
        web::block(move || state.render_upload(name.as_deref(), &body, metric, scope)).await,
    )
}

/// Serve the bundled default input as an attachment.
async fn download_route(state: web::Data<ServerState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/octet-stream")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                state.default_name.replace('"', "")
            ),
        ))
        .body(state.default_bytes.clone())
}

/// Return the map document for the default input as JSON.
async fn map_json_route(
    query: web::Query<ViewQuery>,
    state: web::Data<ServerState>,
) -> HttpResponse {
    let state = state.into_inner();
    let metric = query.metric.unwrap_or(state.config.metric);
    let scope = query.scope.unwrap_or(state.config.scope);
    let result = web::block(move || {
        state
            .load_default()
            .map(|dataset| build_map(&dataset, &state.config.view, metric, scope))
    })
    .await;
    match result {
        Ok(Ok(document)) => HttpResponse::Ok().json(document),
        Ok(Err(err)) => unprocessable(err),
        Err(err) => unprocessable(anyhow!("render task failed: {err}")),
    }
}

/// Prometheus text exposition.
async fn metrics_route() -> HttpResponse {
    match telemetry::prometheus_handle() {
        Some(handle) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(handle.render()),
        None => HttpResponse::NoContent().finish(),
    }
}
