//! Integration tests for the authenticated request gateway

use async_trait::async_trait;
use mockall::{mock, predicate};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use unidash_core::models::{
    DashboardQuery, RecordFilter, RecordOrdering, RecordQuery, RecordType, UploadDataType,
    UploadStatus,
};
use unidash_core::{AuthError, AuthUser, IdentityProvider, Navigator, RefreshFailurePolicy, Session};
use unidash_http::client::{ApiClientBuilder, AuthenticatedGateway, ClientError, OutboundRequest};
use unidash_http::UploadFile;
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OLD_TOKEN: &str = "old-token";
const NEW_TOKEN: &str = "new-token";

/// Identity provider that counts refresh and sign-out calls
#[derive(Default)]
struct CountingIdentity {
    token: Mutex<Option<String>>,
    refreshed_token: Option<String>,
    refresh_delay: Option<Duration>,
    fail_token: bool,
    refresh_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl CountingIdentity {
    fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
            ..Self::default()
        }
    }

    fn refreshing_to(mut self, token: &str) -> Self {
        self.refreshed_token = Some(token.to_string());
        self
    }

    fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn sign_outs(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

fn user() -> AuthUser {
    AuthUser {
        id: "user-1".to_string(),
        email: "kim@univ.ac.kr".to_string(),
        full_name: "Kim".to_string(),
        role: unidash_core::UserRole::Admin,
    }
}

#[async_trait]
impl IdentityProvider for CountingIdentity {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Session, AuthError> {
        Err(AuthError::Provider("not used".to_string()))
    }

    async fn sign_up(
        &self,
        _email: &str,
        _password: &str,
        _display_name: Option<&str>,
    ) -> Result<Option<Session>, AuthError> {
        Ok(None)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        self.token.lock().unwrap().take();
        Err(AuthError::Network("sign-out endpoint down".to_string()))
    }

    async fn current_user(&self) -> Result<Option<AuthUser>, AuthError> {
        Ok(Some(user()))
    }

    async fn access_token(&self) -> Result<Option<String>, AuthError> {
        if self.fail_token {
            return Err(AuthError::Network("token storage unavailable".to_string()));
        }
        Ok(self.token.lock().unwrap().clone())
    }

    async fn refresh_session(&self) -> Result<Option<Session>, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        let Some(token) = self.refreshed_token.clone() else {
            return Ok(None);
        };
        *self.token.lock().unwrap() = Some(token.clone());
        Ok(Some(Session {
            access_token: token,
            refresh_token: Some("refresh".to_string()),
            expires_at: None,
            user: user(),
        }))
    }

    async fn update_password(&self, _new_password: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

mock! {
    Nav {}
    impl Navigator for Nav {
        fn navigate(&self, location: &str);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("unidash_http=debug")
        .try_init();
}

fn gateway(
    server: &MockServer,
    identity: &Arc<CountingIdentity>,
) -> AuthenticatedGateway<CountingIdentity> {
    init_tracing();
    ApiClientBuilder::new()
        .base_url(format!("{}/api/", server.uri()))
        .build_gateway(identity.clone())
        .unwrap()
}

#[tokio::test]
async fn test_builder_requires_base_url() {
    let identity = Arc::new(CountingIdentity::default());
    let result = ApiClientBuilder::new().build_gateway(identity);
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_redirect_policy_requires_navigator() {
    let identity = Arc::new(CountingIdentity::default());
    let result = ApiClientBuilder::new()
        .base_url("http://localhost:8000/api")
        .refresh_policy(RefreshFailurePolicy::Redirect {
            location: "/login".to_string(),
        })
        .build_gateway(identity);
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_successful_request_attaches_token_and_skips_recovery() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/"))
        .and(header("authorization", "Bearer old-token"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "20"))
        .and(query_param("type", "paper"))
        .and(query_param("ordering", "-date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 21,
            "next": null,
            "previous": "http://localhost/api/data/?page=1",
            "results": [{
                "id": 3,
                "type": "paper",
                "date": "2024-05-01",
                "title": "Deep learning for timetabling",
                "amount": null,
                "category": "SCIE",
                "description": null,
                "uploaded_at": "2024-05-02T09:00:00Z",
                "uploaded_by": "admin@univ.ac.kr"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN));
    let gateway = gateway(&server, &identity);

    let query = RecordQuery {
        filter: RecordFilter {
            record_type: Some(RecordType::Paper),
            ordering: Some(RecordOrdering::NewestFirst),
            ..RecordFilter::default()
        },
        page: 2,
        ..RecordQuery::default()
    };
    let page = gateway.list_records(&query).await.unwrap();
    assert_eq!(page.total_pages(20), 2);
    assert_eq!(page.results[0].category.as_deref(), Some("SCIE"));
    assert_eq!(identity.refreshes(), 0);
    assert_eq!(identity.sign_outs(), 0);
}

#[tokio::test]
async fn test_unauthorized_then_refresh_retries_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "token expired"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard/"))
        .and(header("authorization", "Bearer new-token"))
        .and(query_param("year", "2024"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kpi_summary": {"avg_employment_rate": 71.5},
            "publication_stats": {"total_papers": 12},
            "student_stats": {"total_students": 340},
            "budget_summary": {"total_budget": 1000000}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN).refreshing_to(NEW_TOKEN));
    let gateway = gateway(&server, &identity);

    let summary = gateway
        .dashboard_summary(&DashboardQuery {
            year: Some(2024),
            department: None,
        })
        .await
        .unwrap();
    assert_eq!(summary.student_stats.total_students, 340);
    assert_eq!(identity.refreshes(), 1);
    assert_eq!(identity.sign_outs(), 0);
}

#[tokio::test]
async fn test_retried_request_never_refreshes_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/account/profile/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "revoked"})))
        .expect(2)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN).refreshing_to(NEW_TOKEN));
    let gateway = gateway(&server, &identity);

    let err = gateway.profile().await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(err.to_string(), "Unauthenticated: revoked");
    assert_eq!(identity.refreshes(), 1);
}

#[tokio::test]
async fn test_failed_refresh_signs_out_and_surfaces_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN));
    let gateway = gateway(&server, &identity);

    let err = gateway
        .list_records(&RecordQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Unauthenticated(_)));
    assert_eq!(identity.refreshes(), 1);
    // sign-out fails in this fake and the failure is swallowed
    assert_eq!(identity.sign_outs(), 1);
}

#[tokio::test]
async fn test_refresh_timeout_counts_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity {
        refresh_delay: Some(Duration::from_secs(5)),
        ..CountingIdentity::with_token(OLD_TOKEN).refreshing_to(NEW_TOKEN)
    });
    let gateway = ApiClientBuilder::new()
        .base_url(format!("{}/api", server.uri()))
        .refresh_timeout(Duration::from_millis(50))
        .build_gateway(identity.clone())
        .unwrap();

    let err = gateway.execute_empty(OutboundRequest::get("/data/")).await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(identity.sign_outs(), 1);
}

#[tokio::test]
async fn test_redirect_policy_navigates_instead_of_signing_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let mut navigator = MockNav::new();
    navigator
        .expect_navigate()
        .with(predicate::eq("/login"))
        .times(1)
        .return_const(());

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN));
    let gateway = ApiClientBuilder::new()
        .base_url(format!("{}/api", server.uri()))
        .refresh_policy(RefreshFailurePolicy::Redirect {
            location: "/login".to_string(),
        })
        .navigator(Arc::new(navigator))
        .build_gateway(identity.clone())
        .unwrap();

    let err = gateway.execute_empty(OutboundRequest::get("/data/")).await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(identity.sign_outs(), 0);
}

#[tokio::test]
async fn test_other_errors_pass_through_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/budget/9/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/student/1/"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"error": "관리자만 접근 가능합니다", "code": "forbidden"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN).refreshing_to(NEW_TOKEN));
    let gateway = gateway(&server, &identity);

    let err = gateway.get_record(RecordType::Budget, 9).await.unwrap_err();
    assert!(matches!(err, ClientError::ServerError { status: 500, ref message } if message == "database offline"));

    let err = gateway.get_record(RecordType::Student, 1).await.unwrap_err();
    assert!(matches!(err, ClientError::Forbidden(ref message) if message == "관리자만 접근 가능합니다"));

    assert_eq!(identity.refreshes(), 0);
}

#[tokio::test]
async fn test_transport_failure_is_network_error() {
    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN).refreshing_to(NEW_TOKEN));
    let gateway = ApiClientBuilder::new()
        .base_url("http://127.0.0.1:9/api")
        .timeout(Duration::from_secs(2))
        .build_gateway(identity.clone())
        .unwrap();

    let err = gateway.profile().await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(identity.refreshes(), 0);
}

#[tokio::test]
async fn test_token_fetch_failure_aborts_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity {
        fail_token: true,
        ..CountingIdentity::default()
    });
    let gateway = gateway(&server, &identity);

    let err = gateway.execute_empty(OutboundRequest::get("/data/")).await.unwrap_err();
    assert!(matches!(err, ClientError::Identity(AuthError::Network(_))));
}

#[tokio::test]
async fn test_request_without_token_has_no_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/data/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::default());
    let gateway = gateway(&server, &identity);
    gateway.execute_empty(OutboundRequest::get("/data/")).await.unwrap();
}

#[tokio::test]
async fn test_upload_is_replayed_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload/upload/excel/"))
        .and(header("authorization", "Bearer old-token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload/upload/excel/"))
        .and(header("authorization", "Bearer new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 17,
            "file_name": "roster.xlsx",
            "data_type": "student_roster",
            "rows_processed": 250,
            "status": "success",
            "uploaded_at": "2024-11-01T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN).refreshing_to(NEW_TOKEN));
    let gateway = gateway(&server, &identity);

    let file = UploadFile::new("roster.xlsx", b"PK\x03\x04 spreadsheet".to_vec());
    let result = gateway
        .upload_spreadsheet(file, UploadDataType::StudentRoster)
        .await
        .unwrap();
    assert_eq!(result.rows_processed, 250);
    assert_eq!(result.data_type, Some(UploadDataType::StudentRoster));

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let body = String::from_utf8_lossy(&request.body);
        assert!(body.contains("name=\"data_type\""));
        assert!(body.contains("student_roster"));
        assert!(body.contains("filename=\"roster.xlsx\""));
        assert!(body.contains("spreadsheet"));
    }
}

#[tokio::test]
async fn test_rejected_upload_returns_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload/upload/excel/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "rows_processed": 0,
            "status": "failed",
            "error_message": "필수 컬럼 누락: 학번"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN));
    let gateway = gateway(&server, &identity);

    let result = gateway
        .upload_spreadsheet(
            UploadFile::new("students.xls", vec![0; 16]),
            UploadDataType::StudentRoster,
        )
        .await
        .unwrap();
    assert_eq!(result.status, UploadStatus::Failed);
    assert_eq!(result.error_message.as_deref(), Some("필수 컬럼 누락: 학번"));
}

#[tokio::test]
async fn test_invalid_upload_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN));
    let gateway = gateway(&server, &identity);

    let err = gateway
        .upload_spreadsheet(
            UploadFile::new("students.csv", vec![0; 16]),
            UploadDataType::StudentRoster,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_export_reads_filename_and_skips_ordering() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/export/"))
        .and(query_param("year", "2024"))
        .and(query_param_is_missing("ordering"))
        .and(query_param_is_missing("page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-disposition", "attachment; filename=\"papers_2024.csv\"")
                .set_body_bytes("id,title\n1,A\n"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN));
    let gateway = gateway(&server, &identity);

    let export = gateway
        .export_csv(&RecordFilter {
            year: Some(2024),
            ordering: Some(RecordOrdering::LargestFirst),
            ..RecordFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(export.filename, "papers_2024.csv");
    assert_eq!(&export.bytes[..], b"id,title\n1,A\n");
}

#[tokio::test]
async fn test_export_default_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/export/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes("id\n"))
        .mount(&server)
        .await;

    let identity = Arc::new(CountingIdentity::with_token(OLD_TOKEN));
    let export = gateway(&server, &identity)
        .export_csv(&RecordFilter::default())
        .await
        .unwrap();
    assert_eq!(export.filename, "export.csv");
}

#[tokio::test]
async fn test_public_health_check_sends_no_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "service": "university-dashboard-api",
            "timestamp": "2025-11-03T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClientBuilder::new()
        .base_url(format!("{}/api", server.uri()))
        .build_public()
        .unwrap();
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "healthy");

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
}
