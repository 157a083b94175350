use std::sync::Arc;
use std::time::Duration;

use ai_analysis::provider::ProviderBackend;
use ai_analysis::ProviderGateway;
use reqwest::Client;
use serde_json::Value;

/// A server bound to an ephemeral local port for one test.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
}

impl TestServer {
    /// Build a URL for an API endpoint.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET")
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send POST")
    }

    pub async fn put(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Failed to send PUT")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE")
    }

    /// Create a game with `settings` and return its JSON view.
    pub async fn create_game(&self, settings: Value) -> Value {
        let resp = self.post("/api/games", settings).await;
        assert_eq!(resp.status(), 201);
        resp.json().await.expect("Invalid game JSON")
    }

    /// Poll a game until no AI turn is running.
    pub async fn wait_idle(&self, game_id: &str) -> Value {
        for _ in 0..200 {
            let game: Value = self
                .get(&format!("/api/games/{game_id}"))
                .await
                .json()
                .await
                .expect("Invalid game JSON");
            if game["isThinking"] == false {
                return game;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("AI turn for game {game_id} never finished");
    }
}

/// Start the full router over the given backends.
pub async fn spawn(backends: Vec<Arc<dyn ProviderBackend>>) -> TestServer {
    let gateway = Arc::new(ProviderGateway::with_backends(backends));
    let app = server::app(gateway, Duration::from_secs(3600));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server error");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        client: Client::new(),
    }
}
