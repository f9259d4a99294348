use actix_web::{HttpRequest, HttpResponse, web};
use bson::oid::ObjectId;
use log::error;
use serde_json::json;
use std::sync::Arc;

use crate::{
    membership::{
        authorization::{AuthContext, Predicate, allow_access_if_any},
        csv_export::build_members_csv,
        entity_configs::{EntityConfig, EntityKind, build_paths},
        errors::MembershipError,
        middleware::{RequestContext, Step, fetch_entity_config, run_pipeline},
    },
    services::membership_service::MembershipService,
    types::{requests::add_member_request::AddMemberRequest, responses::error_response::ErrorResponse},
    utils::{
        auth_utils::{SessionUser, session_from_request},
        locale_utils::{Messages, Namespace, get_lang},
    },
    validations::email::validate_email,
};

/// Management routes admit entity managers, staff holding the kind's
/// capability, and admins with the modify capability.
fn manage_predicates(config: &EntityConfig) -> [Predicate; 3] {
    [
        Predicate::EntityAccess,
        Predicate::StaffAccess(config.staff_capability),
        Predicate::AdminCapability("modify-entity", false),
    ]
}

/// Creation is scoped to the kind being created; staff with one kind's
/// capability cannot create entities of another kind.
fn creation_predicates(config: &EntityConfig) -> [Predicate; 2] {
    [
        Predicate::StaffAccess(config.staff_capability),
        Predicate::AdminCapability("create-entity", false),
    ]
}

fn error_body(messages: &Messages, code: &str, fallback: &str) -> ErrorResponse {
    ErrorResponse::new(code, messages.get_str(Namespace::Membership, code, fallback))
}

/// Maps pipeline and service errors onto the HTTP surface. Unexpected errors
/// are logged here and answered with a generic 500, standing in for the
/// app-wide error handler.
fn translate_error(err: MembershipError, messages: &Messages) -> HttpResponse {
    match err {
        MembershipError::UserNotFound => HttpResponse::NotFound().json(error_body(
            messages,
            "user_not_found",
            "No user found with this email address",
        )),
        MembershipError::UserAlreadyAdded => HttpResponse::BadRequest().json(error_body(
            messages,
            "user_already_added",
            "This user has already been added",
        )),
        MembershipError::UserIsManager => HttpResponse::BadRequest().json(error_body(
            messages,
            "managers_cannot_remove_admin",
            "The group admin cannot be removed",
        )),
        MembershipError::NotFound => HttpResponse::NotFound().json(error_body(
            messages,
            "not_found",
            "Not found",
        )),
        MembershipError::Forbidden => HttpResponse::Forbidden().finish(),
        MembershipError::InvalidEntityId(_) => HttpResponse::BadRequest().json(error_body(
            messages,
            "invalid_entity_id",
            "Invalid entity id",
        )),
        MembershipError::Database(err) => {
            error!("store error in membership pipeline: {err}");
            HttpResponse::InternalServerError().json(error_body(
                messages,
                "internal",
                "Something went wrong",
            ))
        }
        MembershipError::Decode(err) => {
            error!("malformed entity document: {err}");
            HttpResponse::InternalServerError().json(error_body(
                messages,
                "internal",
                "Something went wrong",
            ))
        }
    }
}

enum Resolved {
    Proceed(RequestContext),
    Response(HttpResponse),
}

/// Runs the per-route pipeline and turns early outcomes (redirect, failure)
/// into responses.
async fn resolve(
    req: &HttpRequest,
    service: &MembershipService,
    kind: EntityKind,
    raw_id: String,
    steps: &[Step<'_>],
    messages: &Messages,
) -> Resolved {
    let config = kind.config();
    let session = session_from_request(req);
    let mut ctx = RequestContext::new(config, raw_id, session);

    match run_pipeline(steps, &mut ctx, &service.entity_repository).await {
        Ok(None) => Resolved::Proceed(ctx),
        Ok(Some(url)) => Resolved::Response(
            HttpResponse::Found()
                .append_header(("Location", url))
                .finish(),
        ),
        Err(err) => Resolved::Response(translate_error(err, messages)),
    }
}

async fn members_page(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    kind: EntityKind,
    raw_id: String,
    steps: &[Step<'_>],
) -> HttpResponse {
    let messages = Messages::new(get_lang(&req));
    let ctx = match resolve(&req, &service, kind, raw_id, steps, &messages).await {
        Resolved::Proceed(ctx) => ctx,
        Resolved::Response(response) => return response,
    };
    let Some(entity) = ctx.entity.as_ref() else {
        return translate_error(MembershipError::NotFound, &messages);
    };

    match service.get_users(entity, ctx.config).await {
        Ok(users) => {
            let mut payload = json!({ "users": users });
            if ctx.config.has_members_limit {
                payload["groupSize"] = json!(entity.members_limit());
                payload["managedUsersActive"] = json!(entity.managed_users_enabled());
            }
            if let Some(name) = entity.display_name() {
                payload["name"] = json!(name);
            }
            HttpResponse::Ok().json(payload)
        }
        Err(err) => translate_error(err, &messages),
    }
}

pub async fn manage_group_members_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
) -> HttpResponse {
    let access = manage_predicates(EntityKind::Group.config());
    let steps = [
        Step::FetchEntity,
        Step::RequireEntity,
        Step::Authorize(&access),
    ];
    members_page(req, service, EntityKind::Group, id.into_inner(), &steps).await
}

pub async fn manage_group_managers_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
) -> HttpResponse {
    let access = manage_predicates(EntityKind::GroupManagers.config());
    let steps = [
        Step::FetchEntity,
        Step::RequireEntity,
        Step::Authorize(&access),
    ];
    members_page(req, service, EntityKind::GroupManagers, id.into_inner(), &steps).await
}

pub async fn manage_institution_managers_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
) -> HttpResponse {
    let config = EntityKind::Institution.config();
    let access = manage_predicates(config);
    let steps = [
        Step::FetchEntity,
        Step::RequireEntityOrCreate(config.staff_capability),
        Step::Authorize(&access),
    ];
    members_page(req, service, EntityKind::Institution, id.into_inner(), &steps).await
}

pub async fn manage_publisher_managers_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
) -> HttpResponse {
    let config = EntityKind::Publisher.config();
    let access = manage_predicates(config);
    let steps = [
        Step::FetchEntity,
        Step::RequireEntityOrCreate(config.staff_capability),
        Step::Authorize(&access),
    ];
    members_page(req, service, EntityKind::Publisher, id.into_inner(), &steps).await
}

/// The pipeline gates everything: id syntax, entity presence, authorization.
/// Only then do the read-only and email checks run, so unauthenticated
/// callers learn nothing about the payload's validity.
async fn add_member(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    kind: EntityKind,
    raw_id: String,
    body: AddMemberRequest,
) -> HttpResponse {
    let messages = Messages::new(get_lang(&req));
    let access = manage_predicates(kind.config());
    let steps = [
        Step::FetchEntity,
        Step::RequireEntity,
        Step::Authorize(&access),
    ];
    let ctx = match resolve(&req, &service, kind, raw_id, &steps, &messages).await {
        Resolved::Proceed(ctx) => ctx,
        Resolved::Response(response) => return response,
    };

    // Mutations on read-only kinds look like unknown routes on purpose.
    if ctx.config.read_only {
        return translate_error(MembershipError::NotFound, &messages);
    }

    if validate_email(&body.email, &messages).is_err() {
        return HttpResponse::BadRequest().json(error_body(
            &messages,
            "invalid_email",
            "Please enter a valid email address",
        ));
    }

    let Some(entity) = ctx.entity.as_ref() else {
        return translate_error(MembershipError::NotFound, &messages);
    };

    match service.add_user(entity, ctx.config, &body.email).await {
        Ok(user) => HttpResponse::Ok().json(json!({ "user": user })),
        Err(err) => translate_error(err, &messages),
    }
}

/// Managers cannot remove their own membership. Answered before the service
/// is ever invoked, so no store write can occur.
fn self_removal_response(
    session: Option<&SessionUser>,
    user_id: ObjectId,
    messages: &Messages,
) -> Option<HttpResponse> {
    let session = session?;
    if session.user_id != user_id {
        return None;
    }
    Some(HttpResponse::BadRequest().json(error_body(
        messages,
        "managers_cannot_remove_self",
        "Managers cannot remove themselves",
    )))
}

async fn remove_member(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    kind: EntityKind,
    raw_id: String,
    raw_user_id: String,
) -> HttpResponse {
    let messages = Messages::new(get_lang(&req));
    let access = manage_predicates(kind.config());
    let steps = [
        Step::FetchEntity,
        Step::RequireEntity,
        Step::Authorize(&access),
    ];
    let ctx = match resolve(&req, &service, kind, raw_id, &steps, &messages).await {
        Resolved::Proceed(ctx) => ctx,
        Resolved::Response(response) => return response,
    };

    if ctx.config.read_only {
        return translate_error(MembershipError::NotFound, &messages);
    }

    let Ok(user_id) = ObjectId::parse_str(&raw_user_id) else {
        return HttpResponse::BadRequest().json(error_body(
            &messages,
            "invalid_user_id",
            "Invalid user id",
        ));
    };

    if let Some(response) = self_removal_response(ctx.session.as_ref(), user_id, &messages) {
        return response;
    }

    let Some(entity) = ctx.entity.as_ref() else {
        return translate_error(MembershipError::NotFound, &messages);
    };
    match service.remove_user(entity, ctx.config, user_id).await {
        Ok(()) => HttpResponse::Ok().finish(),
        Err(err) => translate_error(err, &messages),
    }
}

pub async fn add_group_manager_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
    body: web::Json<AddMemberRequest>,
) -> HttpResponse {
    add_member(req, service, EntityKind::GroupManagers, id.into_inner(), body.into_inner()).await
}

pub async fn remove_group_manager_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (id, user_id) = path.into_inner();
    remove_member(req, service, EntityKind::GroupManagers, id, user_id).await
}

pub async fn add_institution_manager_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
    body: web::Json<AddMemberRequest>,
) -> HttpResponse {
    add_member(req, service, EntityKind::Institution, id.into_inner(), body.into_inner()).await
}

pub async fn remove_institution_manager_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (id, user_id) = path.into_inner();
    remove_member(req, service, EntityKind::Institution, id, user_id).await
}

pub async fn add_publisher_manager_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
    body: web::Json<AddMemberRequest>,
) -> HttpResponse {
    add_member(req, service, EntityKind::Publisher, id.into_inner(), body.into_inner()).await
}

pub async fn remove_publisher_manager_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (id, user_id) = path.into_inner();
    remove_member(req, service, EntityKind::Publisher, id, user_id).await
}

pub async fn export_group_members_csv_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    id: web::Path<String>,
) -> HttpResponse {
    let messages = Messages::new(get_lang(&req));
    let access = manage_predicates(EntityKind::Group.config());
    let steps = [
        Step::FetchEntity,
        Step::RequireEntity,
        Step::Authorize(&access),
    ];
    let ctx = match resolve(
        &req,
        &service,
        EntityKind::Group,
        id.into_inner(),
        &steps,
        &messages,
    )
    .await
    {
        Resolved::Proceed(ctx) => ctx,
        Resolved::Response(response) => return response,
    };
    let Some(entity) = ctx.entity.as_ref() else {
        return translate_error(MembershipError::NotFound, &messages);
    };

    let users = match service.get_users(entity, ctx.config).await {
        Ok(users) => users,
        Err(err) => return translate_error(err, &messages),
    };

    let csv = build_members_csv(
        &users,
        entity.group_id(),
        entity.managed_users_enabled(),
        entity.sso_config_id().is_some(),
    );
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .append_header(("Content-Disposition", "attachment; filename=\"Group.csv\""))
        .body(csv)
}

fn creation_context(
    req: &HttpRequest,
    name: &str,
    messages: &Messages,
) -> Result<&'static EntityConfig, HttpResponse> {
    let config = match fetch_entity_config(name) {
        Ok(config) => config,
        Err(err) => return Err(translate_error(err, messages)),
    };
    let session = session_from_request(req);
    let auth_ctx = AuthContext {
        session: session.as_ref(),
        entity: None,
        kind: config.kind,
    };
    if let Err(err) = allow_access_if_any(&creation_predicates(config), &auth_ctx) {
        return Err(translate_error(err, messages));
    }
    Ok(config)
}

/// Data for the staff-only creation page.
pub async fn new_entity_handler(
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (name, id) = path.into_inner();
    let messages = Messages::new(get_lang(&req));
    if let Err(response) = creation_context(&req, &name, &messages) {
        return response;
    }
    HttpResponse::Ok().json(json!({ "entityName": name, "entityId": id }))
}

pub async fn create_entity_handler(
    req: HttpRequest,
    service: web::Data<Arc<MembershipService>>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (name, raw_id) = path.into_inner();
    let messages = Messages::new(get_lang(&req));
    let config = match creation_context(&req, &name, &messages) {
        Ok(config) => config,
        Err(response) => return response,
    };

    let id = match config.parse_id(&raw_id) {
        Ok(id) => id,
        Err(err) => return translate_error(err, &messages),
    };

    match service.create_entity(&id, config).await {
        Ok(_) => {
            let paths = build_paths(config.kind, &id);
            HttpResponse::Found()
                .append_header(("Location", paths.index))
                .finish()
        }
        Err(err) => translate_error(err, &messages),
    }
}
