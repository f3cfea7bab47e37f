//! Runtime for executing catalog-defined SCADA tools.
//!
//! One generic routine registers every catalog entry as an MCP tool and
//! executes calls against it. Every tool handler is a boundary: no failure
//! ever escapes as an MCP protocol error; it is converted into a tool result
//! whose text names the identifying argument and the underlying cause.

use crate::catalog::{ParamLocation, ParamSpec, ToolAction, ToolSpec};
use crate::client::{RestClient, encode_path_segment, encode_query_component};
use crate::error::{RequestError, Result};
use crate::semantics::annotations_for;
use rmcp::model::{CallToolResult, Content, JsonObject, Tool, ToolAnnotations};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

struct RegisteredTool {
    spec: ToolSpec,
    input_schema: Arc<JsonObject>,
    annotations: ToolAnnotations,
}

struct CatalogInner {
    client: RestClient,
    tools: Vec<RegisteredTool>,
}

/// The tool catalog bound to a backend client. Immutable once built and safe
/// to share across in-flight MCP calls.
#[derive(Clone)]
pub struct ToolCatalog {
    inner: Arc<CatalogInner>,
}

impl ToolCatalog {
    /// Register a tool table against a client.
    ///
    /// # Errors
    ///
    /// Returns a config error on duplicate tool names, duplicate parameter
    /// names, or a path parameter without a matching template placeholder.
    pub fn new(client: RestClient, specs: Vec<ToolSpec>) -> Result<Self> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut tools = Vec::with_capacity(specs.len());

        for spec in specs {
            if !names.insert(spec.name) {
                return Err(RequestError::Config(format!(
                    "duplicate tool name '{}'",
                    spec.name
                )));
            }

            let mut param_names: HashSet<&str> = HashSet::new();
            for param in &spec.params {
                if !param_names.insert(param.name) {
                    return Err(RequestError::Config(format!(
                        "duplicate parameter '{}' in tool '{}'",
                        param.name, spec.name
                    )));
                }

                if param.location == ParamLocation::Path {
                    let ToolAction::Http { path, .. } = &spec.action else {
                        return Err(RequestError::Config(format!(
                            "path parameter '{}' on non-HTTP tool '{}'",
                            param.name, spec.name
                        )));
                    };
                    if !path.contains(&format!("{{{}}}", param.http_name)) {
                        return Err(RequestError::Config(format!(
                            "path template '{path}' of tool '{}' has no placeholder for '{}'",
                            spec.name, param.http_name
                        )));
                    }
                }
            }

            let input_schema = Arc::new(build_input_schema(&spec.params));
            let annotations = annotations_for(&spec.action);
            tools.push(RegisteredTool {
                spec,
                input_schema,
                annotations,
            });
        }

        Ok(Self {
            inner: Arc::new(CatalogInner { client, tools }),
        })
    }

    /// List the MCP `Tool`s exposed by this catalog.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.inner
            .tools
            .iter()
            .map(|t| {
                let mut tool = Tool::new(
                    t.spec.name,
                    t.spec.description,
                    Arc::clone(&t.input_schema),
                );
                tool.annotations = Some(t.annotations.clone());
                tool
            })
            .collect()
    }

    /// Execute a tool call. Never fails at the MCP level: unknown tools,
    /// argument validation failures and backend errors all come back as a
    /// `CallToolResult` with `is_error` set and a descriptive text payload.
    pub async fn call_tool(&self, name: &str, arguments: Option<&JsonObject>) -> CallToolResult {
        let Some(tool) = self.inner.tools.iter().find(|t| t.spec.name == name) else {
            return error_result(format!("Tool not found: {name}"));
        };

        let empty = JsonObject::new();
        let args = arguments.unwrap_or(&empty);

        match self.execute(tool, args).await {
            Ok(text) => CallToolResult::success(vec![Content::text(text)]),
            Err(e) => {
                warn!(tool = name, error = %e, "tool call failed");
                let msg = match identifying_argument(&tool.spec, args) {
                    Some((arg, value)) => {
                        format!("{name} failed for {arg} '{value}': {e}")
                    }
                    None => format!("{name} failed: {e}"),
                };
                error_result(msg)
            }
        }
    }

    async fn execute(&self, tool: &RegisteredTool, args: &JsonObject) -> Result<String> {
        match &tool.spec.action {
            ToolAction::Login => {
                let username = required_string(args, "username")?;
                let password = required_string(args, "password")?;
                self.inner
                    .client
                    .session()
                    .set_basic_credentials(&username, &password)?;
                debug!(username = %username, "stored basic credentials");
                Ok(format!(
                    "Stored credentials for user '{username}'; they will be used for all \
                     subsequent backend calls."
                ))
            }
            ToolAction::Http { method, path } => {
                let parts = build_request_parts(&tool.spec, path, args)?;
                let value = self
                    .inner
                    .client
                    .dispatch(
                        &parts.path_and_query,
                        method.clone(),
                        parts.body.as_ref(),
                        &parts.headers,
                    )
                    .await?;
                Ok(serde_json::to_string(&value).unwrap_or_else(|_| value.to_string()))
            }
        }
    }
}

struct RequestParts {
    path_and_query: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

fn build_request_parts(spec: &ToolSpec, template: &str, args: &JsonObject) -> Result<RequestParts> {
    let mut path = template.to_string();
    let mut query: Vec<(String, String)> = Vec::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body_fields = serde_json::Map::new();
    let mut body_payload: Option<Value> = None;

    for param in &spec.params {
        let value = match args.get(param.name) {
            Some(Value::Null) | None => None,
            Some(v) => Some(v.clone()),
        };

        if param.required && value.is_none() {
            return Err(RequestError::Validation(format!(
                "missing required argument '{}'",
                param.name
            )));
        }

        let Some(val) = value else { continue };

        check_declared_type(param, &val)?;

        match param.location {
            ParamLocation::Path => {
                let s = value_to_string(&val);
                if s.is_empty() {
                    return Err(RequestError::Validation(format!(
                        "argument '{}' must not be empty",
                        param.name
                    )));
                }
                path = path.replace(
                    &format!("{{{}}}", param.http_name),
                    &encode_path_segment(&s),
                );
            }
            ParamLocation::Query => {
                query.push((param.http_name.to_string(), value_to_string(&val)));
            }
            ParamLocation::Header => {
                headers.push((param.http_name.to_string(), value_to_string(&val)));
            }
            ParamLocation::BodyField => {
                body_fields.insert(param.http_name.to_string(), val);
            }
            ParamLocation::Body => body_payload = Some(val),
        }
    }

    let body = body_payload.or_else(|| {
        if body_fields.is_empty() {
            None
        } else {
            Some(Value::Object(body_fields))
        }
    });

    Ok(RequestParts {
        path_and_query: append_query(path, &query),
        headers,
        body,
    })
}

/// Reject a value that contradicts the `"type"` its schema declares, so a
/// mistyped argument never reaches the backend. Schemas without a declared
/// type accept any JSON value.
fn check_declared_type(param: &ParamSpec, value: &Value) -> Result<()> {
    let Some(expected) = param.schema.get("type").and_then(Value::as_str) else {
        return Ok(());
    };

    let matches = match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        _ => true,
    };

    if matches {
        Ok(())
    } else {
        Err(RequestError::Validation(format!(
            "argument '{}' must be of type {expected}",
            param.name
        )))
    }
}

fn append_query(path: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path;
    }
    let mut out = path;
    for (i, (k, v)) in query.iter().enumerate() {
        out.push(if i == 0 { '?' } else { '&' });
        out.push_str(&encode_query_component(k));
        out.push('=');
        out.push_str(&encode_query_component(v));
    }
    out
}

/// The argument that identifies what the call was about, for failure
/// messages: the first path parameter, or the username for `login`.
fn identifying_argument(spec: &ToolSpec, args: &JsonObject) -> Option<(String, String)> {
    let pick = |p: &ParamSpec| {
        args.get(p.name)
            .map(|v| (p.name.to_string(), value_to_string(v)))
    };

    match &spec.action {
        ToolAction::Login => spec
            .params
            .iter()
            .find(|p| p.name == "username")
            .and_then(pick),
        ToolAction::Http { .. } => spec
            .params
            .iter()
            .find(|p| p.location == ParamLocation::Path)
            .and_then(pick),
    }
}

fn required_string(args: &JsonObject, name: &str) -> Result<String> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(RequestError::Validation(format!(
            "argument '{name}' must be a string"
        ))),
        None => Err(RequestError::Validation(format!(
            "missing required argument '{name}'"
        ))),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

fn error_result(message: String) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(message)],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

fn build_input_schema(parameters: &[ParamSpec]) -> JsonObject {
    let mut properties = serde_json::Map::new();
    let mut required: Vec<String> = Vec::new();

    for param in parameters {
        properties.insert(param.name.to_string(), param.schema.clone());
        if param.required {
            required.push(param.name.to_string());
        }
    }

    let mut schema = serde_json::Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert(
            "required".to_string(),
            Value::Array(required.into_iter().map(Value::String).collect()),
        );
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::scada_tools;
    use crate::client::ClientOptions;
    use crate::session::Session;
    use axum::Router;
    use axum::body::Bytes;
    use axum::http::{HeaderMap, Method as AxMethod, StatusCode, Uri};
    use axum::routing::any;
    use serde_json::json;
    use tokio::net::TcpListener;

    fn catalog_for(base_url: &str) -> ToolCatalog {
        let client = RestClient::new(
            base_url,
            Arc::new(Session::default()),
            &ClientOptions::default(),
        )
        .expect("client");
        ToolCatalog::new(client, scada_tools()).expect("valid table")
    }

    fn result_text(result: &CallToolResult) -> String {
        let v = serde_json::to_value(result).expect("result serializes");
        v["content"][0]["text"]
            .as_str()
            .expect("content[0].text")
            .to_string()
    }

    async fn spawn_echo() -> (String, tokio::sync::oneshot::Sender<()>) {
        async fn echo_handler(
            method: AxMethod,
            uri: Uri,
            headers: HeaderMap,
            body: Bytes,
        ) -> axum::Json<serde_json::Value> {
            axum::Json(json!({
                "method": method.as_str(),
                "path": uri.path(),
                "query": uri.query().unwrap_or(""),
                "authorization": headers.get("authorization").and_then(|v| v.to_str().ok()),
                "accept_language": headers.get("accept-language").and_then(|v| v.to_str().ok()),
                "body": String::from_utf8_lossy(&body),
            }))
        }

        let app = Router::new()
            .route(
                "/tagManagement/Connection/{name}",
                any(|uri: Uri, headers: HeaderMap| async move {
                    // 401 for one specific name so auth-failure reporting can
                    // be exercised; echo otherwise.
                    if uri.path().ends_with("/Locked") {
                        return Err(StatusCode::UNAUTHORIZED);
                    }
                    Ok(echo_handler(AxMethod::GET, uri, headers, Bytes::new()).await)
                }),
            )
            .route("/{*path}", any(echo_handler));
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        tokio::spawn(async move {
            let _ = server.await;
        });

        (format!("http://{addr}"), shutdown_tx)
    }

    #[test]
    fn list_tools_exposes_schemas_with_required_args() {
        let catalog = catalog_for("http://127.0.0.1:1");
        let tools = catalog.list_tools();

        let write = tools
            .iter()
            .find(|t| t.name == "write_tag_value")
            .expect("write_tag_value");
        let schema = serde_json::to_value(write.input_schema.as_ref()).expect("schema");
        let required = schema["required"].as_array().expect("required");
        assert!(required.contains(&json!("tagName")));
        assert!(required.contains(&json!("value")));

        let browse = tools
            .iter()
            .find(|t| t.name == "browse_tags")
            .expect("browse_tags");
        let schema = serde_json::to_value(browse.input_schema.as_ref()).expect("schema");
        assert!(schema.get("required").is_none());
        assert!(schema["properties"].get("itemLimit").is_some());
        assert!(schema["properties"].get("continuationPoint").is_some());
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error_result() {
        let catalog = catalog_for("http://127.0.0.1:1");
        let result = catalog.call_tool("no_such_tool", None).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("no_such_tool"));
    }

    #[tokio::test]
    async fn missing_required_argument_fails_before_any_outbound_call() {
        // Base URL points at a closed port: a validation failure must not
        // even attempt to connect.
        let catalog = catalog_for("http://127.0.0.1:1");
        let args = JsonObject::new();
        let result = catalog.call_tool("read_tag_value", Some(&args)).await;

        assert_eq!(result.is_error, Some(true));
        let text = result_text(&result);
        assert!(text.contains("tagName"), "got: {text}");
        assert!(!text.contains("connection"), "got: {text}");
    }

    #[tokio::test]
    async fn mistyped_argument_is_rejected_before_any_outbound_call() {
        let catalog = catalog_for("http://127.0.0.1:1");

        let args: JsonObject = json!({"tagName": {"nested": true}})
            .as_object()
            .cloned()
            .expect("args");
        let result = catalog.call_tool("read_tag_value", Some(&args)).await;
        assert_eq!(result.is_error, Some(true));
        let text = result_text(&result);
        assert!(text.contains("tagName"), "got: {text}");
        assert!(text.contains("string"), "got: {text}");
        assert!(!text.contains("connection"), "got: {text}");

        // A non-string locale is rejected too, never sent as a header.
        let args: JsonObject = json!({"language": 7}).as_object().cloned().expect("args");
        let result = catalog.call_tool("browse_alarm_classes", Some(&args)).await;
        assert_eq!(result.is_error, Some(true));
        let text = result_text(&result);
        assert!(text.contains("language"), "got: {text}");

        let args: JsonObject = json!({"itemLimit": "fifty"})
            .as_object()
            .cloned()
            .expect("args");
        let result = catalog.call_tool("browse_tags", Some(&args)).await;
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("itemLimit"));
    }

    #[tokio::test]
    async fn login_then_read_connection_sends_basic_auth_and_encoded_path() {
        let (base_url, shutdown) = spawn_echo().await;
        let catalog = catalog_for(&base_url);

        let login_args: JsonObject = json!({"username": "opA", "password": "pwA"})
            .as_object()
            .cloned()
            .expect("args");
        let result = catalog.call_tool("login", Some(&login_args)).await;
        assert_ne!(result.is_error, Some(true), "{}", result_text(&result));

        let args: JsonObject = json!({"name": "PLC 1"}).as_object().cloned().expect("args");
        let result = catalog.call_tool("read_connection", Some(&args)).await;
        let echoed: Value = serde_json::from_str(&result_text(&result)).expect("echo json");

        assert_eq!(echoed["path"], "/tagManagement/Connection/PLC%201");
        assert_eq!(echoed["authorization"], "Basic b3BBOnB3QQ==");
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn write_tag_value_puts_wrapped_value_body() {
        let (base_url, shutdown) = spawn_echo().await;
        let catalog = catalog_for(&base_url);

        let args: JsonObject = json!({"tagName": "Motor1.Speed", "value": 42})
            .as_object()
            .cloned()
            .expect("args");
        let result = catalog.call_tool("write_tag_value", Some(&args)).await;
        let echoed: Value = serde_json::from_str(&result_text(&result)).expect("echo json");

        assert_eq!(echoed["method"], "PUT");
        assert_eq!(echoed["path"], "/tagManagement/Value/Motor1.Speed");
        let body: Value =
            serde_json::from_str(echoed["body"].as_str().expect("body")).expect("json");
        assert_eq!(body, json!({"value": 42}));
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn read_archive_values_posts_archives_body_unchanged() {
        let (base_url, shutdown) = spawn_echo().await;
        let catalog = catalog_for(&base_url);

        let archives = json!([
            {"name": "Arch1", "variables": [{"name": "Var1", "maxValues": 100}]}
        ]);
        let args: JsonObject = json!({"archives": archives.clone()})
            .as_object()
            .cloned()
            .expect("args");
        let result = catalog.call_tool("read_archive_values", Some(&args)).await;
        let echoed: Value = serde_json::from_str(&result_text(&result)).expect("echo json");

        assert_eq!(echoed["method"], "POST");
        assert_eq!(echoed["path"], "/tagLogging/Values");
        let body: Value =
            serde_json::from_str(echoed["body"].as_str().expect("body")).expect("json");
        assert_eq!(body, json!({"archives": archives}));
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn paging_and_locale_arguments_land_in_query_and_headers() {
        let (base_url, shutdown) = spawn_echo().await;
        let catalog = catalog_for(&base_url);

        let args: JsonObject = json!({
            "itemLimit": 50,
            "continuationPoint": "abc==",
            "language": "de-DE"
        })
        .as_object()
        .cloned()
        .expect("args");
        let result = catalog.call_tool("browse_alarm_classes", Some(&args)).await;
        let echoed: Value = serde_json::from_str(&result_text(&result)).expect("echo json");

        assert_eq!(echoed["path"], "/alarmManagement/MessageClasses");
        let query = echoed["query"].as_str().expect("query");
        assert!(query.contains("itemLimit=50"), "got: {query}");
        assert!(query.contains("continuationPoint=abc%3D%3D"), "got: {query}");
        assert_eq!(echoed["accept_language"], "de-DE");
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn rest_filter_body_is_forwarded_verbatim() {
        let (base_url, shutdown) = spawn_echo().await;
        let catalog = catalog_for(&base_url);

        let filter = json!({"messageBlocks": ["Time", "State"], "messageClass": "Alarm"});
        let args: JsonObject = json!({"name": "HighPrio", "filter": filter.clone()})
            .as_object()
            .cloned()
            .expect("args");
        let result = catalog.call_tool("write_rest_filter", Some(&args)).await;
        let echoed: Value = serde_json::from_str(&result_text(&result)).expect("echo json");

        assert_eq!(echoed["method"], "PUT");
        assert_eq!(echoed["path"], "/alarmManagement/RestFilter/HighPrio");
        let body: Value =
            serde_json::from_str(echoed["body"].as_str().expect("body")).expect("json");
        assert_eq!(body, filter);
        let _ = shutdown.send(());
    }

    #[tokio::test]
    async fn backend_401_is_reported_with_argument_and_status() {
        let (base_url, shutdown) = spawn_echo().await;
        let catalog = catalog_for(&base_url);

        let args: JsonObject = json!({"name": "Locked"}).as_object().cloned().expect("args");
        let result = catalog.call_tool("read_connection", Some(&args)).await;

        assert_eq!(result.is_error, Some(true));
        let text = result_text(&result);
        assert!(text.contains("Locked"), "got: {text}");
        assert!(text.contains("401"), "got: {text}");
        let _ = shutdown.send(());
    }
}
