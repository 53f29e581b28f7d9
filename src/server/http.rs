//! HTTP server implementation
//!
//! One tokio task per connection; requests are routed by method and path
//! segments in [`handle_request`].

use hyper::body::Incoming;
use hyper::header::ORIGIN;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::Store;
use crate::routes::{
    self, assignments, auth_routes, dashboard, error_response, files, http_util::header_str,
    not_found_response, practice, todos, BoxBody, Cors,
};
use crate::storage::FileStore;
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub store: Arc<dyn Store>,
    pub jwt: JwtValidator,
    pub files: FileStore,
    pub cors: Cors,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn Store>, jwt: JwtValidator, files: FileStore) -> Self {
        let cors = Cors::new(args.cors_origins());
        Self {
            args,
            store,
            jwt,
            files,
            cors,
        }
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "LingoBee listening on {} (store: {})",
        state.args.listen,
        state.store.backend()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - dev JWT secret in use");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = header_str(req.headers(), ORIGIN.as_str()).map(str::to_string);

    info!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(state.cors.preflight(origin.as_deref()));
    }

    let mut response = match route(Arc::clone(&state), &method, &path, req).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code().is_server_error() {
                error!("[{}] {} {} failed: {}", addr, method, path, err);
            }
            error_response(&err)
        }
    };

    state.cors.apply(origin.as_deref(), &mut response);
    Ok(response)
}

async fn route(
    state: Arc<AppState>,
    method: &Method,
    path: &str,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.clone(), segments.as_slice()) {
        (Method::GET, []) => Ok(routes::root_banner()),
        (Method::GET, ["api", "health"]) => Ok(routes::health_check(state.store.backend())),

        // Auth
        (Method::POST, ["api", "auth", "register"]) => auth_routes::handle_register(req, state).await,
        (Method::POST, ["api", "auth", "login"]) => auth_routes::handle_login(req, state).await,
        (Method::GET, ["api", "auth", "profile"]) => auth_routes::handle_profile(req, state).await,
        (Method::POST, ["api", "auth", "logout"]) => Ok(auth_routes::handle_logout()),

        // Practice path
        (Method::GET, ["api", "practice", "sections"]) => practice::handle_sections(req, state).await,
        (Method::GET, ["api", "practice", "completed"]) => practice::handle_completed(req, state).await,
        (Method::GET, ["api", "practice", "questions", section_id, node_id]) => {
            practice::handle_questions(req, state, section_id, node_id).await
        }
        (Method::POST, ["api", "practice", "complete"]) => practice::handle_complete(req, state).await,

        // Todos; reorder must match before {id}
        (Method::GET, ["api", "todos"]) => todos::handle_list(req, state).await,
        (Method::POST, ["api", "todos"]) => todos::handle_create(req, state).await,
        (Method::PUT, ["api", "todos", "reorder"]) => todos::handle_reorder(req, state).await,
        (Method::PUT, ["api", "todos", id]) => todos::handle_update(req, state, id).await,
        (Method::DELETE, ["api", "todos", id]) => todos::handle_delete(req, state, id).await,

        // Assignments
        (Method::GET, ["api", "assignments"]) => assignments::handle_list(req, state).await,
        (Method::POST, ["api", "assignments", "submit"]) => assignments::handle_submit(req, state).await,
        (Method::POST, ["api", "assignments", "mark-done"]) => {
            assignments::handle_mark_done(req, state).await
        }
        (Method::POST, ["api", "assignments", "class-comment"]) => {
            assignments::handle_class_comment(req, state).await
        }
        (Method::POST, ["api", "assignments", "private-comment"]) => {
            assignments::handle_private_comment(req, state).await
        }
        (Method::POST, ["api", "assignments", "upload-url"]) => {
            assignments::handle_upload_url(req, state).await
        }
        (Method::POST, ["api", "assignments", "upload"]) => assignments::handle_upload(req, state).await,
        (Method::GET, ["api", "assignments", id]) => assignments::handle_details(req, state, id).await,

        // Dashboard
        (Method::GET, ["api", "dashboard", "featured-news"]) => {
            dashboard::handle_featured_news(req, state).await
        }
        (Method::GET, ["api", "dashboard", "materials"]) => dashboard::handle_materials(req, state).await,
        (Method::GET, ["api", "dashboard", "stats"]) => dashboard::handle_stats(req, state).await,
        (Method::GET, ["api", "dashboard", "material-filters"]) => {
            dashboard::handle_material_filters(req, state).await
        }

        // Uploaded files
        (Method::GET, ["files", rest @ ..]) if !rest.is_empty() => {
            files::handle_file(&state.files, rest).await
        }

        _ => Ok(not_found_response()),
    }
}
