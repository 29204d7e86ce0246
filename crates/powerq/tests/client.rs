use std::collections::VecDeque;
use std::sync::Arc;

use http::{Response as HttpResponse, StatusCode};
use tokio::sync::Mutex;

use powerq::{AuthError, Client, ClientError, DecodeError, HttpClient, TransportError};

#[derive(Clone, Default)]
struct MockClient {
    // Queue of HTTP responses to pop for each send_http call
    queue: Arc<Mutex<VecDeque<HttpResponse<Vec<u8>>>>>,
    // Capture requests for assertions
    log: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
}

impl MockClient {
    async fn push(&self, resp: HttpResponse<Vec<u8>>) {
        self.queue.lock().await.push_back(resp);
    }
    async fn take_log(&self) -> Vec<http::Request<Vec<u8>>> {
        let mut log = self.log.lock().await;
        let out = std::mem::take(&mut *log);
        out
    }
}

impl HttpClient for MockClient {
    type Error = std::convert::Infallible;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>,
    > + Send {
        let log = self.log.clone();
        let queue = self.queue.clone();
        async move {
            log.lock().await.push(request);
            Ok(queue.lock().await.pop_front().expect("no queued response"))
        }
    }
}

fn json_response(status: StatusCode, body: serde_json::Value) -> HttpResponse<Vec<u8>> {
    HttpResponse::builder()
        .status(status)
        .body(serde_json::to_vec(&body).unwrap())
        .unwrap()
}

fn token_response(value: &str) -> HttpResponse<Vec<u8>> {
    json_response(
        StatusCode::OK,
        serde_json::json!({
            "access_token": value,
            "token_type": "Bearer",
            "expires_in": 3600
        }),
    )
}

fn section_fixture() -> serde_json::Value {
    serde_json::json!({
        "course_number": "101",
        "course_name": "Algebra I",
        "period": "3",
        "room": "204",
        "num_students": 22,
        "id": 5001,
        "teacher_id": "T123",
        "dcid": 9001,
        "section_number": "1"
    })
}

fn client(mock: &MockClient) -> Client<MockClient> {
    Client::on(mock.clone(), "https://sis.example.org", "id", "secret").unwrap()
}

#[tokio::test]
async fn sections_for_course_number_decodes_fixture() {
    let mock = MockClient::default();
    mock.push(token_response("tok1")).await;
    mock.push(json_response(StatusCode::OK, serde_json::json!([section_fixture()]))).await;

    let sections = client(&mock).sections_for_course_number("101").await.unwrap();

    assert_eq!(sections.len(), 1);
    let s = &sections[0];
    assert_eq!(s.course_number, "101");
    assert_eq!(s.course_name, "Algebra I");
    assert_eq!(s.period, "3");
    assert_eq!(s.room.as_deref(), Some("204"));
    assert_eq!(s.num_students, 22);
    assert_eq!(s.id, 5001);
    assert_eq!(s.teacher_id, "T123");
    assert_eq!(s.dcid, 9001);
    assert_eq!(s.section_number, "1");

    let log = mock.take_log().await;
    assert_eq!(log.len(), 2);
    // Token exchange: basic auth + form body against the auth endpoint
    assert!(log[0].uri().to_string().ends_with("/oauth/access_token"));
    let basic = log[0].headers().get(http::header::AUTHORIZATION).unwrap();
    assert!(basic.to_str().unwrap().starts_with("Basic "));
    assert_eq!(log[0].body().as_slice(), b"grant_type=client_credentials");
    // Query: bearer token + JSON parameter body against the query endpoint
    assert!(
        log[1]
            .uri()
            .to_string()
            .ends_with("/ws/schema/query/org.powerq.sections.for_course_number")
    );
    assert_eq!(
        log[1].headers().get(http::header::AUTHORIZATION).unwrap(),
        "Bearer tok1"
    );
    let params: serde_json::Value = serde_json::from_slice(log[1].body()).unwrap();
    assert_eq!(params, serde_json::json!({"course_number": "101"}));
}

#[tokio::test]
async fn homeroom_roster_preserves_server_order() {
    let mock = MockClient::default();
    mock.push(token_response("tok1")).await;
    mock.push(json_response(
        StatusCode::OK,
        serde_json::json!({"record": [
            {
                "student_dcid": 301,
                "student_number": "10045",
                "last_first": "Abbott, Maria",
                "grade_level": 5,
                "gender": "F"
            },
            {
                "student_dcid": 302,
                "student_number": "10046",
                "last_first": "Baker, Owen",
                "grade_level": 5,
                "gender": "M"
            }
        ]}),
    ))
    .await;

    let roster = client(&mock).homeroom_roster_for_teacher("T100").await.unwrap();

    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].grade_level, 5);
    assert_eq!(roster[0].last_first, "Abbott, Maria");
    assert_eq!(roster[1].student_number, "10046");
    assert_eq!(roster[1].gender, "M");

    let log = mock.take_log().await;
    let params: serde_json::Value = serde_json::from_slice(log[1].body()).unwrap();
    assert_eq!(params, serde_json::json!({"teacher_dcid": "T100"}));
}

#[tokio::test]
async fn token_is_reused_across_calls() {
    let mock = MockClient::default();
    mock.push(token_response("tok1")).await;
    mock.push(json_response(StatusCode::OK, serde_json::json!([]))).await;
    mock.push(json_response(StatusCode::OK, serde_json::json!([]))).await;

    let client = client(&mock);
    client.sections_for_teacher("T123").await.unwrap();
    client.sections_for_course_number("101").await.unwrap();

    // One exchange, two queries
    let log = mock.take_log().await;
    assert_eq!(log.len(), 3);
    assert_eq!(
        log[2].headers().get(http::header::AUTHORIZATION).unwrap(),
        "Bearer tok1"
    );
}

#[tokio::test]
async fn unauthorized_query_renews_token_and_retries_once() {
    let mock = MockClient::default();
    mock.push(token_response("stale")).await;
    mock.push(json_response(StatusCode::UNAUTHORIZED, serde_json::json!({}))).await;
    mock.push(token_response("fresh")).await;
    mock.push(json_response(StatusCode::OK, serde_json::json!([section_fixture()]))).await;

    let sections = client(&mock).sections_for_course_number("101").await.unwrap();
    assert_eq!(sections.len(), 1);

    let log = mock.take_log().await;
    assert_eq!(log.len(), 4);
    assert_eq!(
        log[1].headers().get(http::header::AUTHORIZATION).unwrap(),
        "Bearer stale"
    );
    assert!(log[2].uri().to_string().ends_with("/oauth/access_token"));
    assert_eq!(
        log[3].headers().get(http::header::AUTHORIZATION).unwrap(),
        "Bearer fresh"
    );
}

#[tokio::test]
async fn second_unauthorized_is_terminal() {
    let mock = MockClient::default();
    mock.push(token_response("tok1")).await;
    mock.push(json_response(StatusCode::UNAUTHORIZED, serde_json::json!({}))).await;
    mock.push(token_response("tok2")).await;
    mock.push(json_response(StatusCode::UNAUTHORIZED, serde_json::json!({}))).await;

    let err = client(&mock).sections_for_teacher("T123").await.unwrap_err();
    match err {
        ClientError::Transport(TransportError::Unauthorized(status)) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED)
        }
        other => panic!("unexpected: {other:?}"),
    }

    // No third attempt: exchange, query, exchange, query
    assert_eq!(mock.take_log().await.len(), 4);
}

#[tokio::test]
async fn server_error_surfaces_without_retry() {
    let mock = MockClient::default();
    mock.push(token_response("tok1")).await;
    mock.push(json_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({"message": "boom"}),
    ))
    .await;

    let err = client(&mock).sections_for_course_number("101").await.unwrap_err();
    match err {
        ClientError::Transport(TransportError::Server { status, body }) => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.is_some());
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(mock.take_log().await.len(), 2);
}

#[tokio::test]
async fn rejected_token_exchange_fails_the_operation() {
    let mock = MockClient::default();
    mock.push(json_response(
        StatusCode::UNAUTHORIZED,
        serde_json::json!({"error": "invalid_client"}),
    ))
    .await;

    let err = client(&mock).homeroom_roster_for_teacher("T100").await.unwrap_err();
    match err {
        ClientError::Auth(AuthError::Unauthorized(status)) => {
            assert_eq!(status, StatusCode::UNAUTHORIZED)
        }
        other => panic!("unexpected: {other:?}"),
    }
    // The query request is never issued
    assert_eq!(mock.take_log().await.len(), 1);
}

#[tokio::test]
async fn malformed_token_response_fails_the_operation() {
    let mock = MockClient::default();
    mock.push(json_response(
        StatusCode::OK,
        serde_json::json!({"token_type": "Bearer", "expires_in": 3600}),
    ))
    .await;

    let err = client(&mock).sections_for_teacher("T123").await.unwrap_err();
    assert!(matches!(err, ClientError::Auth(AuthError::MalformedResponse(_))));
}

#[tokio::test]
async fn missing_record_field_fails_without_partial_results() {
    let mut broken = section_fixture();
    broken.as_object_mut().unwrap().remove("course_name");

    let mock = MockClient::default();
    mock.push(token_response("tok1")).await;
    mock.push(json_response(
        StatusCode::OK,
        serde_json::json!([section_fixture(), broken]),
    ))
    .await;

    let err = client(&mock).sections_for_course_number("101").await.unwrap_err();
    match err {
        ClientError::Decode(DecodeError::MissingField { index, name }) => {
            assert_eq!(index, 1);
            assert_eq!(name, "course_name");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn empty_envelope_yields_empty_sequence() {
    let mock = MockClient::default();
    mock.push(token_response("tok1")).await;
    mock.push(json_response(StatusCode::OK, serde_json::json!({}))).await;

    let sections = client(&mock).sections_for_course_number("101").await.unwrap();
    assert!(sections.is_empty());
}
