use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::Value;
use tracing::{error, instrument};

use crate::collection::repository::CollectionRepository;
use crate::collection::route::{parse_id, RoutePath};
use crate::errors::{CollectionError, StoreError};
use crate::record::Record;

/// Successful outcome of one dispatched request.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    /// `None` means an empty body.
    pub body: Option<Value>,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self { status: StatusCode::OK, body: Some(body) }
    }

    fn created(body: Value) -> Self {
        Self { status: StatusCode::CREATED, body: Some(body) }
    }

    fn empty() -> Self {
        Self { status: StatusCode::OK, body: None }
    }
}

/// Translates one request into exactly one store operation.
pub struct CollectionService {
    repo: Arc<dyn CollectionRepository>,
}

impl CollectionService {
    pub fn new(repo: Arc<dyn CollectionRepository>) -> Self {
        Self { repo }
    }

    #[instrument(skip(self, route, body), fields(collection = %route.collection))]
    pub async fn dispatch(&self, method: &Method, route: &RoutePath, body: &[u8]) -> Result<Reply, CollectionError> {
        let token = route.id_token.as_deref();
        match *method {
            Method::GET => self.get(&route.collection, token).await,
            Method::POST => self.create(&route.collection, body).await,
            Method::PUT => self.replace(&route.collection, token, body).await,
            Method::DELETE => self.delete(&route.collection, token).await,
            _ => Err(CollectionError::MethodNotAllowed),
        }
    }

    /// Whole collection without a token, a single record with one.
    pub async fn get(&self, collection: &str, token: Option<&str>) -> Result<Reply, CollectionError> {
        if !self.repo.contains(collection).await {
            return Err(CollectionError::CollectionNotFound);
        }
        let Some(token) = token else {
            let records = self.repo.list(collection).await.unwrap_or_default();
            return Ok(Reply::ok(records_value(records)));
        };
        let id = parse_id(token)?;
        self.repo
            .get(collection, id)
            .await
            .map(|record| Reply::ok(Value::Object(record)))
            .ok_or(CollectionError::ItemNotFound)
    }

    pub async fn create(&self, collection: &str, body: &[u8]) -> Result<Reply, CollectionError> {
        let record = decode_record(body)?;
        let stored = self
            .repo
            .append(collection, record)
            .await
            .map_err(|e| save_failed(collection, e))?;
        Ok(Reply::created(Value::Object(stored)))
    }

    /// Full replace: fields missing from `body` are dropped, `id` comes from the path.
    pub async fn replace(&self, collection: &str, token: Option<&str>, body: &[u8]) -> Result<Reply, CollectionError> {
        let id = parse_id(token.ok_or(CollectionError::IdRequired)?)?;
        let record = decode_record(body)?;
        match self.repo.replace(collection, id, record).await {
            Ok(Some(stored)) => Ok(Reply::ok(Value::Object(stored))),
            Ok(None) => Err(CollectionError::ItemNotFound),
            Err(e) => Err(save_failed(collection, e)),
        }
    }

    pub async fn delete(&self, collection: &str, token: Option<&str>) -> Result<Reply, CollectionError> {
        let id = parse_id(token.ok_or(CollectionError::IdRequired)?)?;
        match self.repo.remove(collection, id).await {
            Ok(Some(_)) => Ok(Reply::empty()),
            Ok(None) => Err(CollectionError::ItemNotFound),
            Err(e) => Err(save_failed(collection, e)),
        }
    }
}

fn decode_record(body: &[u8]) -> Result<Record, CollectionError> {
    serde_json::from_slice(body).map_err(|e| CollectionError::InvalidBody(e.to_string()))
}

fn records_value(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}

fn save_failed(collection: &str, e: StoreError) -> CollectionError {
    error!(%collection, error = %e, "persist failed; in-memory change kept");
    CollectionError::SaveFailed(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{self, DocumentStore};
    use serde_json::json;
    use std::path::PathBuf;

    async fn setup(contents: &str) -> (CollectionService, Arc<DocumentStore>, PathBuf) {
        let dir = std::env::temp_dir().join(format!("json_mock_service_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("db.json");
        std::fs::write(&path, contents).expect("seed db");
        let store = DocumentStore::open(&path).await.expect("store init");
        let svc = CollectionService::new(store.clone());
        (svc, store, path)
    }

    fn route(path: &str) -> RoutePath {
        RoutePath::parse(path)
    }

    #[tokio::test]
    async fn lists_known_and_rejects_unknown_collections() {
        let (svc, _, _) = setup(r#"{"posts":[{"id":1}],"tags":[]}"#).await;

        let reply = svc.dispatch(&Method::GET, &route("/tags"), b"").await.unwrap();
        assert_eq!(reply, Reply::ok(json!([])));

        let err = svc.dispatch(&Method::GET, &route("/users"), b"").await.unwrap_err();
        assert!(matches!(err, CollectionError::CollectionNotFound));
        let err = svc.dispatch(&Method::GET, &route("/"), b"").await.unwrap_err();
        assert!(matches!(err, CollectionError::CollectionNotFound));
    }

    #[tokio::test]
    async fn get_single_record() {
        let (svc, _, _) = setup(r#"{"posts":[{"id":1,"t":"a"},{"id":2,"t":"b"}]}"#).await;

        let reply = svc.dispatch(&Method::GET, &route("/posts/2"), b"").await.unwrap();
        assert_eq!(reply.body, Some(json!({"id": 2, "t": "b"})));

        let err = svc.dispatch(&Method::GET, &route("/posts/3"), b"").await.unwrap_err();
        assert!(matches!(err, CollectionError::ItemNotFound));
        let err = svc.dispatch(&Method::GET, &route("/posts/two"), b"").await.unwrap_err();
        assert!(matches!(err, CollectionError::InvalidId));
    }

    #[tokio::test]
    async fn create_assigns_count_based_ids() {
        let (svc, _, _) = setup(r#"{"posts":[]}"#).await;

        let first = svc.dispatch(&Method::POST, &route("/posts"), br#"{"title":"x"}"#).await.unwrap();
        assert_eq!(first.status, StatusCode::CREATED);
        assert_eq!(first.body, Some(json!({"id": 1, "title": "x"})));

        let second = svc.dispatch(&Method::POST, &route("/posts"), br#"{"title":"x"}"#).await.unwrap();
        assert_eq!(second.body.unwrap()["id"], json!(2));
    }

    #[tokio::test]
    async fn create_materializes_new_collection() {
        let (svc, store, _) = setup("{}").await;
        svc.dispatch(&Method::POST, &route("/notes"), br#"{"body":"hi"}"#).await.unwrap();
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot["notes"].len(), 1);
    }

    #[tokio::test]
    async fn id_reused_after_delete() {
        let (svc, _, _) = setup(r#"{"posts":[]}"#).await;

        svc.dispatch(&Method::POST, &route("/posts"), br#"{"title":"x"}"#).await.unwrap();
        svc.dispatch(&Method::DELETE, &route("/posts/1"), b"").await.unwrap();
        let again = svc.dispatch(&Method::POST, &route("/posts"), br#"{"title":"y"}"#).await.unwrap();
        assert_eq!(again.body.unwrap()["id"], json!(1));
    }

    #[tokio::test]
    async fn count_based_id_can_duplicate_a_live_id() {
        let (svc, store, _) = setup(r#"{"posts":[{"id":1},{"id":2}]}"#).await;

        svc.dispatch(&Method::DELETE, &route("/posts/1"), b"").await.unwrap();
        let dup = svc.dispatch(&Method::POST, &route("/posts"), b"{}").await.unwrap();
        assert_eq!(dup.body.unwrap()["id"], json!(2));
        assert_eq!(store.snapshot().await["posts"].len(), 2);

        // Lookups resolve to the first of the two.
        assert_eq!(storage::find_index(&store.snapshot().await, "posts", 2), Some(0));
    }

    #[tokio::test]
    async fn client_supplied_id_is_kept() {
        let (svc, _, _) = setup(r#"{"posts":[{"id":1}]}"#).await;
        let reply = svc.dispatch(&Method::POST, &route("/posts"), br#"{"id":1,"dup":true}"#).await.unwrap();
        assert_eq!(reply.body, Some(json!({"id": 1, "dup": true})));
    }

    #[tokio::test]
    async fn create_rejects_non_object_bodies() {
        let (svc, store, _) = setup(r#"{"posts":[]}"#).await;
        let bodies: [&[u8]; 4] = [b"", b"[1,2]", b"null", b"{\"title\":"];
        for body in bodies {
            let err = svc.dispatch(&Method::POST, &route("/posts"), body).await.unwrap_err();
            assert!(matches!(err, CollectionError::InvalidBody(_)));
        }
        assert!(store.snapshot().await["posts"].is_empty());
    }

    #[tokio::test]
    async fn replace_is_full_and_forces_path_id() {
        let (svc, store, _) = setup(r#"{"posts":[{"id":1,"title":"a","tags":["x"]}]}"#).await;

        let reply = svc
            .dispatch(&Method::PUT, &route("/posts/1"), br#"{"id":99,"title":"b"}"#)
            .await
            .unwrap();
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, Some(json!({"id": 1, "title": "b"})));
        assert_eq!(Value::Object(store.snapshot().await["posts"][0].clone()), json!({"id": 1, "title": "b"}));
    }

    #[tokio::test]
    async fn replace_and_delete_validation_order() {
        let (svc, _, _) = setup(r#"{"posts":[{"id":1}]}"#).await;

        let err = svc.dispatch(&Method::PUT, &route("/posts"), b"{}").await.unwrap_err();
        assert!(matches!(err, CollectionError::IdRequired));
        let err = svc.dispatch(&Method::PUT, &route("/posts/x"), b"not json").await.unwrap_err();
        assert!(matches!(err, CollectionError::InvalidId));
        let err = svc.dispatch(&Method::PUT, &route("/posts/1"), b"not json").await.unwrap_err();
        assert!(matches!(err, CollectionError::InvalidBody(_)));
        let err = svc.dispatch(&Method::PUT, &route("/posts/5"), b"{}").await.unwrap_err();
        assert!(matches!(err, CollectionError::ItemNotFound));
        let err = svc.dispatch(&Method::PUT, &route("/ghosts/1"), b"{}").await.unwrap_err();
        assert!(matches!(err, CollectionError::ItemNotFound));

        let err = svc.dispatch(&Method::DELETE, &route("/posts"), b"").await.unwrap_err();
        assert!(matches!(err, CollectionError::IdRequired));
        let err = svc.dispatch(&Method::DELETE, &route("/posts/1.5"), b"").await.unwrap_err();
        assert!(matches!(err, CollectionError::InvalidId));
        let err = svc.dispatch(&Method::DELETE, &route("/posts/7"), b"").await.unwrap_err();
        assert!(matches!(err, CollectionError::ItemNotFound));
    }

    #[tokio::test]
    async fn delete_preserves_order() {
        let (svc, store, _) = setup(r#"{"posts":[{"id":1},{"id":2},{"id":3}]}"#).await;

        let reply = svc.dispatch(&Method::DELETE, &route("/posts/2"), b"").await.unwrap();
        assert_eq!(reply, Reply::empty());
        let ids: Vec<_> = store.snapshot().await["posts"].iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(3)]);
    }

    #[tokio::test]
    async fn unsupported_method_touches_nothing() {
        let (svc, store, path) = setup(r#"{"posts":[{"id":1}]}"#).await;
        let before = std::fs::read_to_string(&path).unwrap();

        for method in [Method::PATCH, Method::HEAD, Method::OPTIONS] {
            let err = svc.dispatch(&method, &route("/posts/1"), b"{}").await.unwrap_err();
            assert!(matches!(err, CollectionError::MethodNotAllowed));
        }
        assert_eq!(store.snapshot().await["posts"].len(), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn mutations_are_persisted() {
        let (svc, store, path) = setup(r#"{"posts":[]}"#).await;

        svc.dispatch(&Method::POST, &route("/posts"), br#"{"a":1}"#).await.unwrap();
        svc.dispatch(&Method::POST, &route("/posts"), br#"{"a":2}"#).await.unwrap();
        svc.dispatch(&Method::PUT, &route("/posts/2"), br#"{"a":3}"#).await.unwrap();
        svc.dispatch(&Method::DELETE, &route("/posts/1"), b"").await.unwrap();

        assert_eq!(storage::load(&path).await.unwrap(), store.snapshot().await);
    }

    #[tokio::test]
    async fn failed_save_reports_error_but_keeps_change() {
        let (svc, store, path) = setup(r#"{"posts":[]}"#).await;
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();

        let err = svc.dispatch(&Method::POST, &route("/posts"), br#"{"a":1}"#).await.unwrap_err();
        assert!(matches!(err, CollectionError::SaveFailed(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let listed = svc.dispatch(&Method::GET, &route("/posts"), b"").await.unwrap();
        assert_eq!(listed.body, Some(json!([{"a": 1, "id": 1}])));
        assert_eq!(store.snapshot().await["posts"].len(), 1);
    }
}
