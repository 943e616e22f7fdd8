//! Runs the blocking HTTP transport against an in-process WPS stub.

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::NaiveDate;
use tempfile::tempdir;
use tempus_client::client::{ClientError, HttpTransport, TempusClient, TransportConfig};
use tempus_client::domain::{Constraint, CostKind, OptionValues, Point, Request, RequestStep, Step};
use tempus_client::expr::decode;
use tempus_client::history::HistoryStore;
use tempus_client::protocol::{ExecuteInput, parse_execute_envelope, parse_record};

const EXCEPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/1.1" version="1.0.0">
  <ows:Exception exceptionCode="NoApplicableCode"><ows:ExceptionText>Graph not loaded</ows:ExceptionText></ows:Exception>
</ows:ExceptionReport>"#;

const RESULTS: &str = r#"<results>
  <result>
    <road_step road="Rue de Metz" end_movement="999" transport_mode="1" wkb="0101000000000000000000f03f0000000000000040">
      <cost type="2" value="5"/>
    </road_step>
    <transfer_step type="5" road="Rue de Metz" poi="VelouToulouse 42" transport_mode="1" final_mode="3">
      <cost type="2" value="1"/>
    </transfer_step>
    <cost type="2" value="6"/>
    <starting_date_time>2013-03-14T08:30:00</starting_date_time>
  </result>
</results>"#;

fn execute_response(outputs: &[(&str, &str)]) -> String {
    let mut xml = String::from(
        r#"<wps:ExecuteResponse xmlns:wps="http://www.opengis.net/wps/1.0.0" xmlns:ows="http://www.opengis.net/ows/1.1" service="WPS" version="1.0.0"><wps:ProcessOutputs>"#,
    );
    for (name, payload) in outputs {
        xml.push_str(&format!(
            "<wps:Output><ows:Identifier>{name}</ows:Identifier><wps:Data><wps:ComplexData mimeType=\"text/xml\">{payload}</wps:ComplexData></wps:Data></wps:Output>"
        ));
    }
    xml.push_str("</wps:ProcessOutputs></wps:ExecuteResponse>");
    xml
}

async fn wps_get(Query(params): Query<HashMap<String, String>>) -> Response {
    match params.get("request").map(String::as_str) {
        Some("GetCapabilities") => (
            StatusCode::OK,
            r#"<wps:Capabilities xmlns:wps="http://www.opengis.net/wps/1.0.0" service="WPS" version="1.0.0"/>"#.to_string(),
        )
            .into_response(),
        Some("DescribeProcess") => {
            let identifier = params.get("identifier").cloned().unwrap_or_default();
            (
                StatusCode::OK,
                format!("<ProcessDescriptions><ProcessDescription><Identifier>{identifier}</Identifier></ProcessDescription></ProcessDescriptions>"),
            )
                .into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "unknown request").into_response(),
    }
}

async fn wps_post(headers: HeaderMap, body: String) -> Response {
    if headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) != Some("text/xml") {
        return (StatusCode::UNSUPPORTED_MEDIA_TYPE, "expected text/xml").into_response();
    }
    let Ok((identifier, inputs)) = decode(&body)
        .map_err(|_| ())
        .and_then(|expr| parse_execute_envelope(&expr).map_err(|_| ()))
    else {
        return (StatusCode::BAD_REQUEST, "not an Execute document").into_response();
    };

    match identifier.as_str() {
        "select" => {
            let names: Vec<&str> = inputs.iter().map(|(name, _)| name.as_str()).collect();
            if names != ["plugin", "request", "options"] {
                return (StatusCode::OK, EXCEPTION).into_response();
            }
            let metrics = r#"<metrics><metric name="iterations" value="12"/></metrics>"#;
            (
                StatusCode::OK,
                execute_response(&[("results", RESULTS), ("metrics", metrics)]),
            )
                .into_response()
        }
        "state" => (StatusCode::OK, execute_response(&[("state", "<state>3</state>")])).into_response(),
        "connect" => match inputs.first() {
            Some((name, ExecuteInput::Literal(_))) if name == "db_options" => {
                (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response()
            }
            _ => (StatusCode::BAD_REQUEST, "missing db_options").into_response(),
        },
        "build" => (StatusCode::INTERNAL_SERVER_ERROR, EXCEPTION).into_response(),
        _ => (StatusCode::NOT_FOUND, "no such process").into_response(),
    }
}

async fn secure_get(headers: HeaderMap) -> Response {
    // tempus:secret
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Basic dGVtcHVzOnNlY3JldA==") => (StatusCode::OK, "<wps:Capabilities/>").into_response(),
        _ => (StatusCode::UNAUTHORIZED, "authentication required").into_response(),
    }
}

/// Start the stub on its own runtime thread and return its base URL.
fn spawn_server() -> String {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let app = Router::new()
                .route("/wps", get(wps_get).post(wps_post))
                .route("/secure", get(secure_get));
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

fn client(base: &str) -> TempusClient<HttpTransport> {
    let transport = HttpTransport::new(TransportConfig::new(format!("{base}/wps")).with_timeout(5)).unwrap();
    TempusClient::open(transport).unwrap()
}

fn request() -> Request {
    let at = NaiveDate::from_ymd_opt(2013, 3, 14)
        .unwrap()
        .and_hms_opt(8, 30, 0)
        .unwrap();
    Request::new(
        Point::new(0.0, 0.0),
        Constraint::after(at),
        RequestStep::new(Point::new(10.0, 0.0), Constraint::none(at)),
    )
}

#[test]
fn get_requests_carry_the_query_string() {
    let base = spawn_server();
    let mut client = client(&base);

    let description = client.describe_process("select").unwrap();
    let node = description.as_node().unwrap();
    let process = node.find("ProcessDescription").unwrap();
    assert_eq!(process.find("Identifier").unwrap().text(), Some("select"));
}

#[test]
fn select_end_to_end() {
    let base = spawn_server();
    let mut client = client(&base);

    let outcome = client
        .select("sample_road_plugin", &request(), &OptionValues::new())
        .unwrap();
    assert_eq!(outcome.results.len(), 1);

    let itinerary = &outcome.results[0];
    assert_eq!(itinerary.steps.len(), 2);
    match &itinerary.steps[0] {
        Step::Road(road) => {
            assert_eq!(road.road_name, "Rue de Metz");
            assert_eq!(road.costs[&CostKind::Duration], 5.0);
            assert_eq!(road.geometry.as_ref().map(Vec::len), Some(21));
        }
        other => panic!("expected a road step, got {other:?}"),
    }
    assert!(matches!(&itinerary.steps[1], Step::Transfer(t) if t.costs[&CostKind::Duration] == 1.0));
    // result costs are the server's, not a sum of the legs
    assert_eq!(itinerary.cost(CostKind::Duration), Some(6.0));
    assert_eq!(outcome.metrics["iterations"], "12");

    let json = serde_json::to_string(&outcome.results).unwrap();
    assert!(json.contains("VelouToulouse 42"));

    // the exchange can be archived and read back
    let dir = tempdir().unwrap();
    let mut store = HistoryStore::open(dir.path().join("history.zip")).unwrap();
    let id = store.add_record(&outcome.to_record_xml(None)).unwrap();
    let loaded = parse_record(&store.get_record(id).unwrap().payload).unwrap();
    assert_eq!(loaded.plugin_name, "sample_road_plugin");
    assert_eq!(loaded.request, request());
    assert_eq!(loaded.results, outcome.results);
}

#[test]
fn literal_answers_and_failures() {
    let base = spawn_server();
    let mut client = client(&base);

    assert_eq!(client.state().unwrap(), 3);

    match client.build() {
        Err(ClientError::ServerFault { code, message }) => {
            assert_eq!(code, "NoApplicableCode");
            assert_eq!(message, "Graph not loaded");
        }
        other => panic!("expected a server fault, got {other:?}"),
    }

    match client.connect("dbname=tempus_test_db") {
        Err(ClientError::TransportFailure { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("expected a transport failure, got {other:?}"),
    }
}

#[test]
fn basic_auth_is_sent() {
    let base = spawn_server();

    let anonymous = HttpTransport::new(TransportConfig::new(format!("{base}/secure"))).unwrap();
    assert!(matches!(
        TempusClient::open(anonymous),
        Err(ClientError::TransportFailure { status: 401, .. })
    ));

    let config = TransportConfig::new(format!("{base}/secure")).with_basic_auth("tempus", "secret");
    let authenticated = HttpTransport::new(config).unwrap();
    assert!(TempusClient::open(authenticated).is_ok());
}
