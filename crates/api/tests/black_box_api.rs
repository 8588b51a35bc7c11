use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::json;

use guildhall_api::app::{AppState, build_app};
use guildhall_auth::{
    AccountStore, ActionPurpose, AuthConfig, CommunityRole, CredentialStore, GroupRole, PlatformRole, Scope,
    ScopeMembership, ScopeRole, StoreError, password,
};
use guildhall_core::{CommunityId, GroupId, UserId};
use guildhall_infra::InMemoryCredentialStore;

/// In-memory store that counts reads and can be switched into an outage.
#[derive(Default)]
struct CountingStore {
    inner: InMemoryCredentialStore,
    reads: AtomicUsize,
    down: AtomicBool,
}

impl CountingStore {
    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<(), StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for CountingStore {
    async fn find_membership(
        &self,
        scope: &Scope,
        user_id: &UserId,
    ) -> Result<Option<ScopeMembership>, StoreError> {
        self.read()?;
        self.inner.find_membership(scope, user_id).await
    }

    async fn find_user_platform_role(&self, user_id: &UserId) -> Result<Option<PlatformRole>, StoreError> {
        self.read()?;
        self.inner.find_user_platform_role(user_id).await
    }
}

#[async_trait]
impl AccountStore for CountingStore {
    async fn find_password_hash(&self, user_id: &UserId) -> Result<Option<String>, StoreError> {
        self.read()?;
        self.inner.find_password_hash(user_id).await
    }

    async fn set_password_hash(&self, user_id: &UserId, password_hash: String) -> Result<(), StoreError> {
        self.inner.set_password_hash(user_id, password_hash).await
    }

    async fn mark_email_verified(&self, user_id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.inner.mark_email_verified(user_id, at).await
    }
}

fn auth_config() -> AuthConfig {
    AuthConfig::new(
        "guildhall-test",
        "access-secret-for-tests-0123456789abcdef",
        "refresh-secret-for-tests-0123456789abcdef",
        "action-secret-for-tests-0123456789abcdef",
    )
}

fn user(id: &str) -> UserId {
    UserId::parse(id).unwrap()
}

struct TestServer {
    base_url: String,
    state: AppState,
    store: Arc<CountingStore>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = Arc::new(CountingStore::default());
        let state = AppState::new(&auth_config(), store.clone()).expect("valid auth config");

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            store,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn add_user(&self, id: &str, role: PlatformRole, pw: &str) {
        self.store.inner.grant_platform_role(user(id), role).unwrap();
        self.store
            .inner
            .seed_password_hash(user(id), password::hash_password(pw).unwrap())
            .unwrap();
    }

    fn grant(&self, scope: Scope, id: &str, role: ScopeRole) {
        self.store.inner.grant_membership(scope, user(id), role).unwrap();
    }

    /// Access token minted directly, bypassing password login.
    fn token(&self, id: &str, role: PlatformRole) -> String {
        self.state
            .accounts
            .sessions()
            .login(user(id), role, None, Utc::now())
            .unwrap()
            .access_token
    }

    async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client.post(self.url(path)).json(&body).send().await.unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn error_code(res: reqwest::Response) -> String {
    let body: serde_json::Value = res.json().await.unwrap();
    body["error"].as_str().unwrap().to_string()
}

fn community(id: &str) -> Scope {
    Scope::Community(CommunityId::parse(id).unwrap())
}

fn group(id: &str) -> Scope {
    Scope::Group(GroupId::parse(id).unwrap())
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    assert_eq!(srv.get("/health", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/me", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()["www-authenticate"], "Bearer");
    assert_eq!(error_code(res).await, "missing_credential");

    let res = srv
        .client
        .get(srv.url("/me"))
        .header("authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "malformed_token");
}

#[tokio::test]
async fn password_login_then_me() {
    let srv = TestServer::spawn().await;
    srv.add_user("u1", PlatformRole::Member, "hunter2hunter2");

    let res = srv
        .post("/auth/login", json!({ "user_id": "u1", "password": "hunter2hunter2" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let pair: serde_json::Value = res.json().await.unwrap();
    assert_eq!(pair["token_type"], "Bearer");
    assert_eq!(pair["expires_in"], 3600);

    let res = srv.get("/me", pair["access_token"].as_str()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let me: serde_json::Value = res.json().await.unwrap();
    assert_eq!(me["user_id"], "u1");
    assert_eq!(me["platform_role"], "member");
}

#[tokio::test]
async fn bad_password_is_unauthorized() {
    let srv = TestServer::spawn().await;
    srv.add_user("u1", PlatformRole::Member, "hunter2hunter2");

    let res = srv
        .post("/auth/login", json!({ "user_id": "u1", "password": "wrong-password-1" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_credentials");

    let res = srv
        .post("/auth/login", json!({ "user_id": "nobody", "password": "hunter2hunter2" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "invalid_credentials");
}

#[tokio::test]
async fn super_admin_passes_platform_admin_gate() {
    let srv = TestServer::spawn().await;

    let root = srv.token("root", PlatformRole::SuperAdmin);
    let admin = srv.token("admin", PlatformRole::Admin);
    let member = srv.token("member", PlatformRole::Member);

    assert_eq!(srv.get("/platform/admin", Some(&root)).await.status(), StatusCode::OK);
    assert_eq!(srv.get("/platform/admin", Some(&admin)).await.status(), StatusCode::OK);

    let res = srv.get("/platform/admin", Some(&member)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "insufficient_role");
}

#[tokio::test]
async fn community_admin_is_confined_to_its_community() {
    let srv = TestServer::spawn().await;
    srv.grant(community("A"), "u1", ScopeRole::Community(CommunityRole::Admin));
    let token = srv.token("u1", PlatformRole::Member);

    let res = srv.get("/communities/A/admin", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["scope"], "community:A");
    assert_eq!(body["role"], "admin");

    let res = srv.get("/communities/B/admin", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "scope_not_found");
}

#[tokio::test]
async fn unauthenticated_scoped_request_never_reaches_the_store() {
    let srv = TestServer::spawn().await;
    srv.grant(community("A"), "u1", ScopeRole::Community(CommunityRole::Admin));

    let res = srv.get("/communities/A/admin", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.get("/groups/g1/leader", Some("not.a.jwt")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(srv.store.reads(), 0);
}

#[tokio::test]
async fn group_leader_gate_is_exact_below_leader() {
    let srv = TestServer::spawn().await;
    srv.grant(group("g1"), "lead", ScopeRole::Group(GroupRole::Leader));
    srv.grant(group("g1"), "co", ScopeRole::Group(GroupRole::CoLeader));

    let lead = srv.token("lead", PlatformRole::Member);
    let co = srv.token("co", PlatformRole::Member);
    let root = srv.token("root", PlatformRole::SuperAdmin);

    assert_eq!(srv.get("/groups/g1/leader", Some(&lead)).await.status(), StatusCode::OK);

    let res = srv.get("/groups/g1/leader", Some(&co)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(error_code(res).await, "insufficient_role");

    // Platform roles never imply group roles.
    let res = srv.get("/groups/g1/leader", Some(&root)).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn revoked_membership_applies_on_next_request() {
    let srv = TestServer::spawn().await;
    srv.grant(community("A"), "u1", ScopeRole::Community(CommunityRole::Admin));
    let token = srv.token("u1", PlatformRole::Member);

    assert_eq!(srv.get("/communities/A/admin", Some(&token)).await.status(), StatusCode::OK);

    srv.store.inner.revoke_membership(&community("A"), &user("u1")).unwrap();
    assert_eq!(
        srv.get("/communities/A/admin", Some(&token)).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn store_outage_is_retryable_unavailable() {
    let srv = TestServer::spawn().await;
    let token = srv.token("u1", PlatformRole::Member);
    srv.store.down.store(true, Ordering::SeqCst);

    let res = srv.get("/communities/A/admin", Some(&token)).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(res.headers().contains_key("retry-after"));
    assert_eq!(error_code(res).await, "store_unavailable");
}

#[tokio::test]
async fn refresh_issues_new_pair_and_rejects_other_classes() {
    let srv = TestServer::spawn().await;
    let pair = srv
        .state
        .accounts
        .sessions()
        .login(user("u1"), PlatformRole::Admin, None, Utc::now())
        .unwrap();

    let res = srv
        .post("/auth/refresh", json!({ "refresh_token": pair.refresh_token }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let renewed: serde_json::Value = res.json().await.unwrap();
    let res = srv.get("/platform/admin", renewed["access_token"].as_str()).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv
        .post("/auth/refresh", json!({ "refresh_token": pair.access_token }))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "wrong_token_class");

    let res = srv.get("/me", Some(&pair.refresh_token)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "wrong_token_class");
}

#[tokio::test]
async fn password_reset_flow() {
    let srv = TestServer::spawn().await;
    srv.add_user("u1", PlatformRole::Member, "hunter2hunter2");
    let token = srv
        .state
        .accounts
        .actions()
        .issue(user("u1"), ActionPurpose::PasswordReset, Utc::now())
        .unwrap();

    let res = srv
        .post("/auth/password-reset", json!({ "token": token, "new_password": "short" }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(res).await, "weak_password");

    let res = srv
        .post(
            "/auth/password-reset",
            json!({ "token": token, "new_password": "a-much-better-pass-9" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv
        .post("/auth/login", json!({ "user_id": "u1", "password": "a-much-better-pass-9" }))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn action_purposes_and_classes_do_not_mix() {
    let srv = TestServer::spawn().await;
    srv.add_user("u1", PlatformRole::Member, "hunter2hunter2");
    let reset = srv
        .state
        .accounts
        .actions()
        .issue(user("u1"), ActionPurpose::PasswordReset, Utc::now())
        .unwrap();

    let res = srv.post("/auth/verify-email", json!({ "token": reset })).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "wrong_action_purpose");

    let res = srv.get("/me", Some(&reset)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(res).await, "wrong_token_class");

    let verify = srv
        .state
        .accounts
        .actions()
        .issue(user("u1"), ActionPurpose::EmailVerification, Utc::now())
        .unwrap();
    let res = srv.post("/auth/verify-email", json!({ "token": verify })).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(srv.store.inner.email_verified_at(&user("u1")).is_some());
}
