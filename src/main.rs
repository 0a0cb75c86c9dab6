// tabrest server
//
// Binds the REST-to-SQL gateway to an HTTP listener. Configuration comes
// from the environment:
//
//   DATABASE_URL  - PostgreSQL connection string
//   BIND_ADDR     - listen address (default 127.0.0.1:3000)
//   RPC_ROUTINES  - comma-separated allow-list of callable routines
//   RUST_LOG      - log filter (default "info")

use actix_web::{App, HttpServer, middleware, web};
use log::info;
use tabrest::{Gateway, GatewayConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/school".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

    let mut builder = GatewayConfig::builder(&database_url).max_limit(1000);
    if let Ok(routines) = std::env::var("RPC_ROUTINES") {
        for routine in routines.split(',') {
            let routine = routine.trim();
            if !routine.is_empty() {
                builder = builder.register_rpc(routine);
            }
        }
    }

    let gateway = Gateway::new(builder.build())
        .await
        .map_err(std::io::Error::other)?;

    info!("Starting tabrest v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}", bind_addr);

    let data = web::Data::new(gateway);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .configure(tabrest::http::configure_routes)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
