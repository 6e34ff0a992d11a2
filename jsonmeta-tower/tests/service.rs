use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use jsonmeta_core::{
    DEFAULT_NAMESPACE, DynamicMetadata, FilterConfig, KeyValuePair, MetadataValue, Outcome, Rule,
    ValueType,
};
use jsonmeta_http::BufferedBody;
use jsonmeta_tower::JsonToMetadata;
use pretty_assertions::assert_eq;
use tower::{ServiceBuilder, ServiceExt, service_fn};

type Seen = (Option<DynamicMetadata>, Bytes);

fn config() -> Arc<FilterConfig> {
    let rule = Rule::new(
        ["user", "plan"],
        Some(KeyValuePair::new("plan").value_type(ValueType::String)),
        Some(KeyValuePair::new("plan").value("free")),
        Some(KeyValuePair::new("plan").value("broken")),
    )
    .unwrap();
    Arc::new(FilterConfig::builder().rule(rule).build())
}

async fn echo(request: Request<BufferedBody<Full<Bytes>>>) -> Result<Response<Seen>, Infallible> {
    let metadata = request.extensions().get::<DynamicMetadata>().cloned();
    let body = request.into_body().collect().await?.to_bytes();
    Ok(Response::new((metadata, body)))
}

async fn call(config: Arc<FilterConfig>, request: Request<Full<Bytes>>) -> Seen {
    ServiceBuilder::new()
        .layer(JsonToMetadata::from_shared(config))
        .service(service_fn(echo))
        .oneshot(request)
        .await
        .unwrap()
        .into_body()
}

fn json_request(body: &'static str) -> Request<Full<Bytes>> {
    Request::builder()
        .method("POST")
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap()
}

fn plan(metadata: &Option<DynamicMetadata>) -> Option<&str> {
    metadata
        .as_ref()
        .and_then(|m| m.get(DEFAULT_NAMESPACE, "plan"))
        .and_then(MetadataValue::as_str)
}

#[tokio::test]
async fn test_metadata_extension_is_populated() {
    let config = config();
    let (metadata, body) = call(config.clone(), json_request(r#"{"user":{"plan":"pro"}}"#)).await;

    assert_eq!(plan(&metadata), Some("pro"));
    assert_eq!(body, Bytes::from_static(br#"{"user":{"plan":"pro"}}"#));
    assert_eq!(config.stats().get(Outcome::Success), 1);
}

#[tokio::test]
async fn test_missing_and_invalid_bodies() {
    let config = config();

    let (metadata, _) = call(config.clone(), json_request(r#"{"user":{}}"#)).await;
    assert_eq!(plan(&metadata), Some("free"));

    let (metadata, _) = call(config.clone(), json_request(r#"{"user":"#)).await;
    assert_eq!(plan(&metadata), Some("broken"));

    assert_eq!(config.stats().get(Outcome::Success), 1);
    assert_eq!(config.stats().get(Outcome::InvalidJsonBody), 1);
}

#[tokio::test]
async fn test_earlier_metadata_is_kept() {
    let mut existing = DynamicMetadata::new();
    existing.insert(DEFAULT_NAMESPACE, "region", MetadataValue::from("us"));
    let mut request = json_request(r#"{"user":{"plan":"team"}}"#);
    request.extensions_mut().insert(existing);

    let (metadata, _) = call(config(), request).await;

    assert_eq!(plan(&metadata), Some("team"));
    assert_eq!(
        metadata
            .as_ref()
            .and_then(|m| m.get(DEFAULT_NAMESPACE, "region"))
            .and_then(MetadataValue::as_str),
        Some("us")
    );
}

#[tokio::test]
async fn test_other_content_types_are_untouched() {
    let config = config();
    let request = Request::builder()
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Full::new(Bytes::from_static(b"user=1")))
        .unwrap();

    let (metadata, body) = call(config.clone(), request).await;

    assert_eq!(metadata, Some(DynamicMetadata::new()));
    assert_eq!(body, Bytes::from_static(b"user=1"));
    assert_eq!(config.stats().get(Outcome::MismatchedContentType), 1);
}
