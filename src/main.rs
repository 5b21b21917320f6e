use dotenvy::dotenv;
use tracing::info;

use classbook::logging::init_tracing;
use classbook::router::init_router;
use classbook::state::init_app_state;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    let state = init_app_state()
        .await
        .expect("Failed to initialize application state");
    let app = init_router(state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind address");

    info!(%bind_addr, "Server listening");
    println!("🚀 Server running on http://{}", bind_addr);
    println!("📚 Swagger UI available at http://{}/swagger-ui", bind_addr);
    axum::serve(listener, app).await.expect("Server error");
}
