//! Request handling for the chart endpoints.
//!
//! The service is independent of any HTTP stack: a transport hands
//! [`ChartService::handle`] a method and request target and writes back the
//! returned [`Response`].

use crate::config::ServiceConfig;
use crate::error::KMeansError;
use crate::generator::generate_datasets;
use crate::orchestrator::Orchestrator;
use crate::store::{DatasetStore, InMemoryStore};
use crate::types::JobResult;
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use tracing::{error, info};

const CONTENT_TYPE_JSON: &str = "application/json";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Status, headers and body of a handled request.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Response {
    fn new(status: u16, content_type: &str, body: String) -> Self {
        Self {
            status,
            headers: vec![
                ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
                ("Content-Type".to_string(), content_type.to_string()),
            ],
            body,
        }
    }

    fn json(status: u16, body: String) -> Self {
        Self::new(status, CONTENT_TYPE_JSON, body)
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({ "error": message }).to_string())
    }

    /// Value of the first header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Serves clustered chart data from a working set of datasets.
pub struct ChartService<S: DatasetStore = InMemoryStore> {
    config: ServiceConfig,
    store: S,
    orchestrator: Orchestrator,
    rng: Mutex<ChaCha8Rng>,
}

impl ChartService<InMemoryStore> {
    /// Build a service whose store starts out with freshly generated data.
    pub fn new(config: ServiceConfig) -> Result<Self, KMeansError> {
        let service = Self::with_store(config, InMemoryStore::default())?;
        service.regenerate()?;
        Ok(service)
    }
}

impl<S: DatasetStore> ChartService<S> {
    /// Build a service around an existing store. The store is used as-is.
    pub fn with_store(config: ServiceConfig, store: S) -> Result<Self, KMeansError> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let orchestrator = Orchestrator::new(config.source_label.clone())
            .with_max_iters(config.max_iters)
            .with_tol(config.tol);

        Ok(Self {
            config,
            store,
            orchestrator,
            rng: Mutex::new(rng),
        })
    }

    /// Configuration the service was built with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Backing store holding the working datasets
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Turn the raw `k` query value into a usable cluster count.
    ///
    /// Missing or non-integer values (surrounding whitespace included) fall
    /// back to `k_default`; everything else is clamped into `[k_min, k_max]`.
    pub fn resolve_k(&self, k_param: Option<&str>) -> usize {
        let requested = k_param
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(self.config.k_default as i64);

        requested.clamp(self.config.k_min as i64, self.config.k_max as i64) as usize
    }

    /// Cluster a snapshot of every working dataset.
    pub fn aggregate(&self, k_param: Option<&str>) -> Result<Vec<JobResult>, KMeansError> {
        let k = self.resolve_k(k_param);
        let datasets = self.store.snapshot();

        let mut job_rng = ChaCha8Rng::seed_from_u64(self.rng.lock().gen());
        self.orchestrator.run_all(datasets, k, &mut job_rng)
    }

    /// Replace the working datasets with freshly generated ones.
    pub fn regenerate(&self) -> Result<(), KMeansError> {
        let mut gen_rng = ChaCha8Rng::seed_from_u64(self.rng.lock().gen());
        let datasets = generate_datasets(&self.config.generator, &mut gen_rng)?;
        info!(datasets = datasets.len(), "replacing working datasets");
        self.store.replace(datasets);
        Ok(())
    }

    pub fn health(&self) -> &'static str {
        "OK"
    }

    /// Route a request target such as `/aggregate?k=4`.
    ///
    /// The method is accepted for logging only; every route answers any
    /// method.
    pub fn handle(&self, method: &str, target: &str) -> Response {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        info!(method, path, "handling request");

        match path {
            "/aggregate" => {
                let k_param = query.and_then(|q| query_param(q, "k"));
                match self.aggregate(k_param.as_deref()) {
                    Ok(results) => match serde_json::to_string(&results) {
                        Ok(body) => Response::json(200, body),
                        Err(e) => self.internal_error(e.into()),
                    },
                    Err(e) => self.internal_error(e),
                }
            }
            "/generate" => match self.regenerate() {
                Ok(()) => {
                    Response::json(200, json!({ "status": "new data generated" }).to_string())
                }
                Err(e) => self.internal_error(e),
            },
            "/health" => Response::new(200, CONTENT_TYPE_TEXT, self.health().to_string()),
            _ => Response::error(404, "not found"),
        }
    }

    fn internal_error(&self, e: KMeansError) -> Response {
        error!(error = %e, "request failed");
        Response::error(500, &e.to_string())
    }
}

/// First decoded value of `name` in a `key=value&key=value` query string.
///
/// Pairs containing `;` or a malformed escape in either half are skipped.
fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.contains(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            Some((decode_component(key)?, decode_component(value)?))
        })
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Decode `+` as space and `%XX` escapes.
fn decode_component(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => decoded.push(b' '),
            b'%' => {
                let hex = raw.get(i + 1..i + 3)?;
                if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    return None;
                }
                decoded.push(u8::from_str_radix(hex, 16).ok()?);
                i += 2;
            }
            b => decoded.push(b),
        }
        i += 1;
    }
    String::from_utf8(decoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Dataset, Point};

    fn fixture_store() -> InMemoryStore {
        let mut points = Vec::new();
        for i in 0..10 {
            points.push(Point::new(i as f64 * 0.1, 0.0));
            points.push(Point::new(80.0 + i as f64 * 0.1, 80.0));
        }
        InMemoryStore::new(vec![Dataset::from_points(&points); 2])
    }

    fn service() -> ChartService {
        ChartService::with_store(ServiceConfig::default().with_seed(17), fixture_store()).unwrap()
    }

    #[test]
    fn test_resolve_k() {
        let service = service();

        assert_eq!(service.resolve_k(None), 3);
        assert_eq!(service.resolve_k(Some("4")), 4);
        assert_eq!(service.resolve_k(Some("abc")), 3);
        assert_eq!(service.resolve_k(Some("")), 3);
        assert_eq!(service.resolve_k(Some("1")), 2);
        assert_eq!(service.resolve_k(Some("-7")), 2);
        assert_eq!(service.resolve_k(Some("42")), 6);
        assert_eq!(service.resolve_k(Some("99999999999999999999")), 3);
        assert_eq!(service.resolve_k(Some("+5")), 5);
        assert_eq!(service.resolve_k(Some(" 5")), 3);
        assert_eq!(service.resolve_k(Some("5 ")), 3);
    }

    #[test]
    fn test_query_param() {
        assert_eq!(query_param("k=4", "k").as_deref(), Some("4"));
        assert_eq!(query_param("a=1&k=5&k=6", "k").as_deref(), Some("5"));
        assert_eq!(query_param("k", "k").as_deref(), Some(""));
        assert_eq!(query_param("kk=2", "k"), None);
    }

    #[test]
    fn test_query_param_decodes_escapes() {
        assert_eq!(query_param("k=%35", "k").as_deref(), Some("5"));
        assert_eq!(query_param("%6B=4", "k").as_deref(), Some("4"));
        assert_eq!(query_param("k=+5", "k").as_deref(), Some(" 5"));
        assert_eq!(query_param("k=%2B5", "k").as_deref(), Some("+5"));
    }

    #[test]
    fn test_query_param_skips_malformed_pairs() {
        assert_eq!(query_param("k=%3&k=4", "k").as_deref(), Some("4"));
        assert_eq!(query_param("k=%zz", "k"), None);
        assert_eq!(query_param("k=5;x=1", "k"), None);
        assert_eq!(query_param("k=%FF", "k"), None);
    }

    #[test]
    fn test_handle_aggregate_decodes_k() {
        let service = service();

        let escaped = service.handle("GET", "/aggregate?k=%35");
        let spaced = service.handle("GET", "/aggregate?k=%205");

        let escaped: serde_json::Value = serde_json::from_str(&escaped.body).unwrap();
        let spaced: serde_json::Value = serde_json::from_str(&spaced.body).unwrap();
        assert_eq!(escaped[0]["result"]["k"], 5);
        assert_eq!(spaced[0]["result"]["k"], 3);
    }

    #[test]
    fn test_aggregate_uses_store_snapshot() {
        let service = service();

        let results = service.aggregate(Some("2")).unwrap();

        assert_eq!(results.len(), 2);
        for job in &results {
            assert_eq!(job.source, "KMeans Clustering");
            assert_eq!(job.result.k, 2);
            assert_eq!(job.result.points.len(), 20);
        }
    }

    #[test]
    fn test_handle_health() {
        let response = service().handle("GET", "/health");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "OK");
        assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    }

    #[test]
    fn test_handle_aggregate_json() {
        let response = service().handle("GET", "/aggregate?k=2");

        assert_eq!(response.status, 200);
        assert_eq!(response.header("Content-Type"), Some(CONTENT_TYPE_JSON));

        let value: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        let charts = value.as_array().unwrap();
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0]["result"]["k"], 2);
        assert!(charts[0]["delay"].is_u64());
    }

    #[test]
    fn test_handle_generate_replaces_data() {
        let service = service();
        let before = service.store().snapshot();

        let response = service.handle("POST", "/generate");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, r#"{"status":"new data generated"}"#);
        let after = service.store().snapshot();
        assert_eq!(after.len(), 9);
        assert_ne!(before, after);
    }

    #[test]
    fn test_handle_unknown_route() {
        let response = service().handle("GET", "/nope");

        assert_eq!(response.status, 404);
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[test]
    fn test_with_store_rejects_invalid_config() {
        let config = ServiceConfig::default().with_k_bounds(4, 2, 3);
        let result = ChartService::with_store(config, fixture_store());
        assert!(matches!(result, Err(KMeansError::InvalidConfig(_))));
    }
}
