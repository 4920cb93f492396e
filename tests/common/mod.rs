//! Shared utilities for integration tests.

use action_pipeline::action::{ActionLocator, HandlerFn, Resolvable, TextAction};
use action_pipeline::http::{Request, Response};
use action_pipeline::{AppConfig, HttpServer, Middleware, Next, PipelineError, Shutdown};
use axum::body::Body;
use axum::http::StatusCode;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A registry object without the handler capability.
#[derive(Debug)]
#[allow(dead_code)]
pub struct Mailer;

impl Resolvable for Mailer {}

/// Registry with `home` answering 200 "OK".
#[allow(dead_code)]
pub fn home_registry() -> ActionLocator {
    ActionLocator::builder()
        .instance("home", TextAction::new(StatusCode::OK, "OK"))
        .instance(
            "explode",
            HandlerFn::new("explode", |_req| -> Result<Response, PipelineError> {
                panic!("action exploded")
            }),
        )
        .instance("mailer", Mailer)
        .build()
}

/// Request for `path` with no attributes.
#[allow(dead_code)]
pub fn request(path: &str) -> Request {
    axum::http::Request::builder().uri(path).body(Body::empty()).unwrap()
}

/// Read a response body as UTF-8.
#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Records the order in which stages ran.
#[allow(dead_code)]
pub struct Trace {
    pub label: &'static str,
    pub log: Arc<Mutex<Vec<&'static str>>>,
}

impl Middleware for Trace {
    fn process(&self, request: Request, next: Next<'_>) -> Result<Response, PipelineError> {
        self.log.lock().unwrap().push(self.label);
        next.handle(request)
    }
}

/// A server bound to an ephemeral port.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub reload: mpsc::UnboundedSender<AppConfig>,
    pub shutdown: Shutdown,
}

/// Start the server on 127.0.0.1:0 and wait until it accepts connections.
#[allow(dead_code)]
pub async fn start_server(mut config: AppConfig) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".into();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let (reload, updates) = mpsc::unbounded_channel();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, updates, server_shutdown).await;
    });

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestServer {
        addr,
        reload,
        shutdown,
    }
}
