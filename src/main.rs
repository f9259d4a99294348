use actix_web::{App, HttpServer, web};
use anyhow::Context;
use log::info;
use std::sync::Arc;

use collabtex_backend::{
    config::database::{connect_to_database, create_unique_indexes},
    repositories::{entity_repository::EntityRepository, user_repository::UserRepository},
    routes::membership_routes::configure_membership_routes,
    services::membership_service::MembershipService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let client = connect_to_database()
        .await
        .context("Failed to connect to MongoDB")?;
    create_unique_indexes(&client)
        .await
        .context("Failed to create indexes")?;

    let entity_repository = Arc::new(EntityRepository::new(client.clone()));
    let user_repository = Arc::new(
        UserRepository::new(&client)
            .await
            .context("Failed to open users collection")?,
    );
    let membership_service = Arc::new(MembershipService::new(entity_repository, user_repository));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    info!("starting membership backend on {bind_addr}");

    let service_data = web::Data::new(membership_service);
    HttpServer::new(move || {
        App::new().configure(|cfg| configure_membership_routes(cfg, service_data.clone()))
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
