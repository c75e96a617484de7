//! HTTP server for interactive exploration
//!
//! `varredor serve albums.csv` → loads the catalog, opens the browser, serves
//! the dashboard UI and a small JSON API behind it.
//!
//! The catalog is loaded once and kept in memory. Before each request the
//! source's CSV files and their modification times are checked; if any file
//! was added, removed or changed, the catalog is reloaded and weighted ratings
//! are recomputed from the new corpus.

use crate::catalog::{self, Catalog, Fingerprint};
use crate::dashboard::{Dashboard, FilterOptions};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::rating::RatingConfig;
use crate::report::{self, html};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, Server};

/// Download name for the filtered export
pub const EXPORT_FILE_NAME: &str = "varredor_progressivo_filtrado.csv";

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    fn failure(message: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(message.into()) }
    }
}

#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub port: u16,
    pub rating: RatingConfig,
    pub top: usize,
    pub open_browser: bool,
}

/// In-memory catalog that reloads when its source changes
pub struct CatalogCache {
    path: PathBuf,
    config: RatingConfig,
    fingerprint: Option<Fingerprint>,
    catalog: Catalog,
}

impl CatalogCache {
    pub fn open<P: AsRef<Path>>(path: P, config: RatingConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let fingerprint = catalog::source_fingerprint(&path);
        let catalog = catalog::load(&path, &config)?;
        Ok(Self { path, config, fingerprint, catalog })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Reload if the source changed. A failed reload keeps the previous data.
    pub fn refresh(&mut self) -> bool {
        let fingerprint = catalog::source_fingerprint(&self.path);
        if fingerprint == self.fingerprint {
            return false;
        }

        match catalog::load(&self.path, &self.config) {
            Ok(fresh) => {
                tracing::info!(path = %self.path.display(), albums = fresh.len(), "catalog reloaded");
                self.catalog = fresh;
                self.fingerprint = fingerprint;
                true
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "reload failed, keeping previous catalog");
                false
            }
        }
    }
}

/// A fully built response, independent of the transport
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub attachment: Option<&'static str>,
    pub body: Vec<u8>,
}

impl Reply {
    fn new(status: u16, content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self { status, content_type, attachment: None, body: body.into() }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Result<Self> {
        Ok(Self::new(status, "application/json", serde_json::to_vec(value)?))
    }
}

/// Start server, open browser, serve UI
pub fn start(path: PathBuf, config: ServeConfig) -> Result<()> {
    let mut cache = CatalogCache::open(&path, config.rating)?;

    let addr = format!("127.0.0.1:{}", config.port);
    let server = Server::http(&addr).map_err(|e| Error::Server(e.to_string()))?;

    let url = format!("http://localhost:{}", config.port);
    let path_str = path.canonicalize().unwrap_or(path.clone()).display().to_string();

    eprintln!("\n\x1b[1;32m🎸 Varredor Progressivo\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Catalog: {} ({} albums)\n", path_str, cache.catalog().len());

    if config.open_browser {
        let _ = open::that(&url);
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut cache, config.top) {
            tracing::error!(error = %e, "request failed");
        }
    }

    Ok(())
}

fn handle_request(request: Request, cache: &mut CatalogCache, top: usize) -> Result<()> {
    cache.refresh();

    let url = request.url().to_string();
    let method = request.method().clone();

    let reply = route(&method, &url, cache.catalog(), top).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build response");
        Reply::new(500, "text/plain", "Internal error")
    });
    tracing::info!(method = %method, url = %url, status = reply.status, "request");

    let mut response = Response::from_data(reply.body).with_status_code(reply.status);
    if let Some(h) = header("Content-Type", reply.content_type) {
        response = response.with_header(h);
    }
    if let Some(name) = reply.attachment {
        if let Some(h) = header("Content-Disposition", &format!("attachment; filename=\"{}\"", name)) {
            response = response.with_header(h);
        }
    }
    request.respond(response)?;
    Ok(())
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

/// Map a request to a reply
pub fn route(method: &Method, url: &str, catalog: &Catalog, top: usize) -> Result<Reply> {
    let mut parts = url.splitn(2, '?');
    let path = parts.next().unwrap_or("/");
    let query = parts.next().unwrap_or("");

    if *method != Method::Get {
        return Reply::json(405, &ApiResponse::failure("method not allowed"));
    }

    match path {
        // Serve embedded UI
        "/" => {
            let dashboard = Dashboard::build(catalog, &Filter::new(), top);
            let options = FilterOptions::from_albums(&catalog.albums);
            let page = html::render(&dashboard, &options, html::Mode::Live)?;
            Ok(Reply::new(200, "text/html; charset=utf-8", page))
        }

        "/api/dashboard" => match Filter::from_query(query) {
            Ok(filter) => {
                let dashboard = Dashboard::build(catalog, &filter, top);
                Reply::json(200, &ApiResponse::success(dashboard))
            }
            Err(e) => Reply::json(400, &ApiResponse::failure(e.to_string())),
        },

        "/api/options" => Reply::json(200, &ApiResponse::success(FilterOptions::from_albums(&catalog.albums))),

        "/api/export.csv" => match Filter::from_query(query) {
            Ok(filter) => {
                let dashboard = Dashboard::build(catalog, &filter, top);
                let mut reply = Reply::new(200, "text/csv; charset=utf-8", report::csv::to_bytes(&dashboard)?);
                reply.attachment = Some(EXPORT_FILE_NAME);
                Ok(reply)
            }
            Err(e) => Reply::json(400, &ApiResponse::failure(e.to_string())),
        },

        _ => Ok(Reply::new(404, "text/plain", "Not found")),
    }
}
