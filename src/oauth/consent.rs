//! Credential acquisition: reuse a stored token or run the consent flow.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Phase, PhaseExt, Result};
use crate::oauth::client::TokenEndpoint;
use crate::oauth::token::{CredentialStore, OAuthToken};
use crate::output::{create_spinner, print_authorization_url};

/// How long the callback server may take to drain after a code arrives.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Delivers the authorization code once the operator has granted consent.
#[async_trait]
pub trait AuthorizationCodeSource: Send + Sync {
    async fn obtain_code(&self, authorize_url: &Url, state: &str) -> Result<String>;
}

/// Where credential acquisition currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    NoToken,
    AwaitingConsent,
    TokenAcquired,
}

/// Drives a credential from the store or, failing that, from consent.
pub struct ConsentFlow<'a> {
    store: &'a CredentialStore,
    endpoint: &'a dyn TokenEndpoint,
    code_source: &'a dyn AuthorizationCodeSource,
    state: ConsentState,
}

impl<'a> ConsentFlow<'a> {
    pub fn new(
        store: &'a CredentialStore,
        endpoint: &'a dyn TokenEndpoint,
        code_source: &'a dyn AuthorizationCodeSource,
    ) -> Self {
        Self {
            store,
            endpoint,
            code_source,
            state: ConsentState::NoToken,
        }
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    /// Return a usable token, persisting it when it came from consent.
    ///
    /// A stored token is returned as-is even if expired; refreshing is the
    /// consumer's job. Any failure is reported as an auth failure.
    pub async fn run(&mut self) -> Result<OAuthToken> {
        self.acquire().await.during(Phase::Auth)
    }

    async fn acquire(&mut self) -> Result<OAuthToken> {
        match self.store.load() {
            Ok(token) => {
                tracing::debug!(path = %self.store.path().display(), "Reusing stored OAuth2 token");
                self.state = ConsentState::TokenAcquired;
                return Ok(token);
            }
            Err(e) => {
                tracing::info!(
                    path = %self.store.path().display(),
                    error = %e,
                    "No usable stored token, starting consent flow"
                );
            }
        }

        self.state = ConsentState::AwaitingConsent;
        let csrf_state = Uuid::new_v4().to_string();
        let authorize_url = self.endpoint.authorize_url(&csrf_state)?;

        let code = self
            .code_source
            .obtain_code(&authorize_url, &csrf_state)
            .await?;
        let token = self.endpoint.exchange_code(&code).await?;
        self.store.save(&token)?;

        self.state = ConsentState::TokenAcquired;
        Ok(token)
    }
}

/// Shorthand for running a [`ConsentFlow`] to completion.
pub async fn acquire_credential(
    store: &CredentialStore,
    endpoint: &dyn TokenEndpoint,
    code_source: &dyn AuthorizationCodeSource,
) -> Result<OAuthToken> {
    ConsentFlow::new(store, endpoint, code_source).run().await
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

#[derive(Clone)]
struct CallbackState {
    expected_state: String,
    sender: Arc<Mutex<Option<oneshot::Sender<Result<String>>>>>,
}

async fn handle_callback(
    State(callback): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    let sender = callback.sender.lock().ok().and_then(|mut slot| slot.take());
    let Some(sender) = sender else {
        return (StatusCode::GONE, "Authorization was already handled.");
    };

    let outcome = if let Some(error) = params.error {
        Err(Error::OAuth(format!("consent denied: {}", error)))
    } else if params.state.as_deref() != Some(callback.expected_state.as_str()) {
        Err(Error::OAuth("callback state does not match the request".to_string()))
    } else {
        params
            .code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| Error::OAuth("callback carried no authorization code".to_string()))
    };

    let reply = if outcome.is_ok() {
        (StatusCode::OK, "Authorization complete. You can close this window.")
    } else {
        (
            StatusCode::BAD_REQUEST,
            "Authorization failed. Check the terminal for details.",
        )
    };
    let _ = sender.send(outcome);
    reply
}

/// Receives the authorization code on a short-lived local HTTP server.
#[derive(Debug, Clone)]
pub struct LocalCallbackListener {
    port: u16,
    path: String,
    timeout: Option<Duration>,
}

impl LocalCallbackListener {
    /// Listen on `127.0.0.1:port`, answering on the redirect URL's path.
    pub fn new(redirect_url: &Url, port: u16) -> Self {
        let path = match redirect_url.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };
        Self {
            port,
            path,
            timeout: None,
        }
    }

    /// Give up after `timeout`. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    async fn bind(&self) -> Result<TcpListener> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        TcpListener::bind(addr)
            .await
            .map_err(|e| Error::CallbackListener(format!("cannot listen on {}: {}", addr, e)))
    }

    /// Bind, then wait for one callback request carrying `expected_state`.
    pub async fn wait_for_code(&self, expected_state: &str) -> Result<String> {
        let listener = self.bind().await?;
        self.serve(listener, expected_state).await
    }

    async fn serve(&self, listener: TcpListener, expected_state: &str) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let app = Router::new()
            .route(&self.path, get(handle_callback))
            .with_state(CallbackState {
                expected_state: expected_state.to_string(),
                sender: Arc::new(Mutex::new(Some(tx))),
            });

        let shutdown = CancellationToken::new();
        let server_shutdown = shutdown.clone();
        let mut server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await
        });

        let timeout = self.timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let spinner = create_spinner("Waiting for the authorization callback...");
        let outcome = tokio::select! {
            received = rx => received.unwrap_or_else(|_| {
                Err(Error::CallbackListener("callback handler went away".to_string()))
            }),
            served = &mut server => Err(match served {
                Ok(Ok(())) => Error::CallbackListener("server stopped before a callback arrived".to_string()),
                Ok(Err(e)) => Error::CallbackListener(e.to_string()),
                Err(e) => Error::CallbackListener(e.to_string()),
            }),
            _ = deadline => Err(Error::ConsentTimeout(timeout.map(|t| t.as_secs()).unwrap_or_default())),
        };
        spinner.finish_and_clear();

        shutdown.cancel();
        if !server.is_finished() && tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
            tracing::warn!("Callback server did not drain in time, aborting it");
            server.abort();
        }

        outcome
    }
}

#[async_trait]
impl AuthorizationCodeSource for LocalCallbackListener {
    async fn obtain_code(&self, authorize_url: &Url, state: &str) -> Result<String> {
        // Bind first so the redirect cannot race the server start.
        let listener = self.bind().await?;
        print_authorization_url(authorize_url.as_str());
        self.serve(listener, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exit_codes;
    use crate::oauth::client::{OAuthClient, OAuthConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeEndpoint {
        exchanged: AtomicUsize,
    }

    #[async_trait]
    impl TokenEndpoint for FakeEndpoint {
        fn authorize_url(&self, state: &str) -> Result<Url> {
            Ok(Url::parse(&format!("https://auth.example/authorize?state={}", state))?)
        }

        async fn exchange_code(&self, code: &str) -> Result<OAuthToken> {
            self.exchanged.fetch_add(1, Ordering::SeqCst);
            let mut token = OAuthToken::new(format!("token-for-{}", code));
            token.refresh_token = Some("refresh".to_string());
            Ok(token)
        }

        async fn refresh(&self, _token: &OAuthToken) -> Result<OAuthToken> {
            unreachable!("refresh is not part of acquisition")
        }
    }

    struct ScriptedCode(&'static str);

    #[async_trait]
    impl AuthorizationCodeSource for ScriptedCode {
        async fn obtain_code(&self, authorize_url: &Url, state: &str) -> Result<String> {
            assert!(authorize_url.as_str().contains(state));
            Ok(self.0.to_string())
        }
    }

    struct NeverConsulted;

    #[async_trait]
    impl AuthorizationCodeSource for NeverConsulted {
        async fn obtain_code(&self, _authorize_url: &Url, _state: &str) -> Result<String> {
            panic!("consent must not run when a token is stored")
        }
    }

    fn endpoint() -> FakeEndpoint {
        FakeEndpoint {
            exchanged: AtomicUsize::new(0),
        }
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn listener(port: u16) -> LocalCallbackListener {
        let redirect = Url::parse(&format!("http://localhost:{}/callback", port)).unwrap();
        LocalCallbackListener::new(&redirect, port).with_timeout(Some(Duration::from_secs(10)))
    }

    async fn hit_callback(port: u16, query: &str) -> reqwest::StatusCode {
        let url = format!("http://127.0.0.1:{}/callback?{}", port, query);
        for _ in 0..100 {
            if let Ok(response) = reqwest::get(&url).await {
                return response.status();
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("callback listener never came up");
    }

    #[tokio::test]
    async fn test_stored_token_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        store.save(&OAuthToken::new("stored")).unwrap();
        let endpoint = endpoint();

        let mut flow = ConsentFlow::new(&store, &endpoint, &NeverConsulted);
        assert_eq!(flow.state(), ConsentState::NoToken);
        let token = flow.run().await.unwrap();

        assert_eq!(token.access_token, "stored");
        assert_eq!(flow.state(), ConsentState::TokenAcquired);
        assert_eq!(endpoint.exchanged.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_consent_persists_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("token.json"));
        let endpoint = endpoint();

        let token = acquire_credential(&store, &endpoint, &ScriptedCode("4/xyz"))
            .await
            .unwrap();
        assert_eq!(token.access_token, "token-for-4/xyz");
        assert_eq!(store.load().unwrap(), token);

        // A second acquisition reads the file instead of asking again.
        let again = acquire_credential(&store, &endpoint, &NeverConsulted)
            .await
            .unwrap();
        assert_eq!(again, token);
        assert_eq!(endpoint.exchanged.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_corrupt_token_file_triggers_consent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "{").unwrap();
        let store = CredentialStore::new(&path);

        let token = acquire_credential(&store, &endpoint(), &ScriptedCode("c"))
            .await
            .unwrap();
        assert_eq!(token.access_token, "token-for-c");
    }

    #[tokio::test]
    async fn test_listener_receives_code() {
        let port = free_port();
        let waiter = tokio::spawn(async move { listener(port).wait_for_code("s1").await });

        let status = hit_callback(port, "state=s1&code=4%2Fabc").await;
        assert_eq!(status, reqwest::StatusCode::OK);
        assert_eq!(waiter.await.unwrap().unwrap(), "4/abc");
    }

    #[tokio::test]
    async fn test_listener_rejects_state_mismatch() {
        let port = free_port();
        let waiter = tokio::spawn(async move { listener(port).wait_for_code("expected").await });

        let status = hit_callback(port, "state=forged&code=abc").await;
        assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
        assert!(matches!(waiter.await.unwrap(), Err(Error::OAuth(_))));
    }

    #[tokio::test]
    async fn test_listener_surfaces_denied_consent() {
        let port = free_port();
        let waiter = tokio::spawn(async move { listener(port).wait_for_code("s").await });

        hit_callback(port, "state=s&error=access_denied").await;
        match waiter.await.unwrap() {
            Err(Error::OAuth(message)) => assert!(message.contains("access_denied")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_listener_bind_failure() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let result = listener(port).wait_for_code("s").await;
        assert!(matches!(result, Err(Error::CallbackListener(_))));
    }

    #[tokio::test]
    async fn test_listener_times_out() {
        let port = free_port();
        let redirect = Url::parse(&format!("http://localhost:{}/callback", port)).unwrap();
        let listener = LocalCallbackListener::new(&redirect, port)
            .with_timeout(Some(Duration::from_millis(50)));

        let result = listener.wait_for_code("s").await;
        assert!(matches!(result, Err(Error::ConsentTimeout(_))));

        // The port is released once the wait is over.
        assert!(std::net::TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[tokio::test]
    async fn test_denied_consent_is_an_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let port = free_port();

        let store_path = path.clone();
        let flow = tokio::spawn(async move {
            let store = CredentialStore::new(store_path);
            acquire_credential(&store, &endpoint(), &listener(port)).await
        });

        // The denial is reported before the state is looked at.
        hit_callback(port, "state=unknown&error=access_denied").await;
        let err = flow.await.unwrap().unwrap_err();

        assert_eq!(err.phase(), Phase::Auth);
        assert_eq!(err.phase().exit_code(), exit_codes::AUTH_ERROR);
        assert!(matches!(err.underlying(), Error::OAuth(m) if m.contains("access_denied")));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreachable_token_endpoint_is_an_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("token.json"));
        let mut config = OAuthConfig::google_photos(
            "client-id",
            "client-secret",
            Url::parse("http://localhost:8080/callback").unwrap(),
        );
        config.token_url = format!("http://127.0.0.1:{}/token", free_port());
        let endpoint = OAuthClient::new(config).unwrap();

        let err = acquire_credential(&store, &endpoint, &ScriptedCode("c"))
            .await
            .unwrap_err();
        assert!(matches!(err.underlying(), Error::Http(_)));
        assert_eq!(err.phase(), Phase::Auth);
        assert_eq!(err.phase().exit_code(), exit_codes::AUTH_ERROR);
    }

    #[tokio::test]
    async fn test_unwritable_store_is_an_auth_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();
        let store = CredentialStore::new(blocker.join("token.json"));

        let endpoint = endpoint();
        let mut flow = ConsentFlow::new(&store, &endpoint, &ScriptedCode("c"));
        let err = flow.run().await.unwrap_err();

        assert!(matches!(err.underlying(), Error::Io(_)));
        assert_eq!(err.phase(), Phase::Auth);
        assert_eq!(flow.state(), ConsentState::AwaitingConsent);
    }
}
