use actix_web::web;
use std::sync::Arc;

use crate::{
    config::cors::configure_cors,
    handlers::membership_handler::{
        add_group_manager_handler, add_institution_manager_handler, add_publisher_manager_handler,
        create_entity_handler, export_group_members_csv_handler, manage_group_managers_handler,
        manage_group_members_handler, manage_institution_managers_handler,
        manage_publisher_managers_handler, new_entity_handler, remove_group_manager_handler,
        remove_institution_manager_handler, remove_publisher_manager_handler,
    },
    services::membership_service::MembershipService,
};

pub fn configure_membership_routes(
    cfg: &mut web::ServiceConfig,
    membership_service_data: web::Data<Arc<MembershipService>>,
) {
    cfg.service(
        web::scope("/manage")
            .wrap(configure_cors())
            .app_data(membership_service_data.clone())
            .route(
                "/groups/{id}/members",
                web::get().to(manage_group_members_handler),
            )
            .route(
                "/groups/{id}/members/export",
                web::get().to(export_group_members_csv_handler),
            )
            .route(
                "/groups/{id}/managers",
                web::get().to(manage_group_managers_handler),
            )
            .route(
                "/groups/{id}/managers",
                web::post().to(add_group_manager_handler),
            )
            .route(
                "/groups/{id}/managers/{userId}",
                web::delete().to(remove_group_manager_handler),
            )
            .route(
                "/institutions/{id}/managers",
                web::get().to(manage_institution_managers_handler),
            )
            .route(
                "/institutions/{id}/managers",
                web::post().to(add_institution_manager_handler),
            )
            .route(
                "/institutions/{id}/managers/{userId}",
                web::delete().to(remove_institution_manager_handler),
            )
            .route(
                "/publishers/{id}/managers",
                web::get().to(manage_publisher_managers_handler),
            )
            .route(
                "/publishers/{id}/managers",
                web::post().to(add_publisher_manager_handler),
            )
            .route(
                "/publishers/{id}/managers/{userId}",
                web::delete().to(remove_publisher_manager_handler),
            ),
    );

    cfg.service(
        web::scope("/entities")
            .wrap(configure_cors())
            .app_data(membership_service_data)
            .route("/{name}/create/{id}", web::get().to(new_entity_handler))
            .route("/{name}/create/{id}", web::post().to(create_entity_handler)),
    );
}
