//! Route definitions for the admin collections.

use atelier_db::models::admin::Admin;
use atelier_db::models::certificate::Certificate;
use atelier_db::models::company::Company;
use atelier_db::models::course_video::CourseVideo;
use atelier_db::models::faq::Faq;
use atelier_db::models::feature::Feature;
use atelier_db::models::journey::Journey;
use atelier_db::models::login_request::LoginRequest;
use atelier_db::models::pricing_plan::PricingPlan;
use atelier_db::models::quiz::Quiz;
use atelier_db::models::registration::Registration;
use atelier_db::models::scholarship::Scholarship;
use atelier_db::models::student_project::StudentProject;
use atelier_db::models::trainer::Trainer;
use atelier_db::models::workshop::Workshop;
use atelier_db::models::Entity;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{admins, crud, login_requests};
use crate::state::AppState;

/// The generic resource routes for `E`.
///
/// ```text
/// GET    /          -> list
/// POST   /          -> create
/// GET    /stats     -> stats
/// GET    /export    -> export
/// GET    /{id}      -> get
/// PUT    /{id}      -> update
/// DELETE /{id}      -> delete
/// ```
pub fn entity_router<E: Entity>() -> Router<AppState> {
    Router::new()
        .route("/", get(crud::list::<E>).post(crud::create::<E>))
        .route("/stats", get(crud::stats::<E>))
        .route("/export", get(crud::export::<E>))
        .route(
            "/{id}",
            get(crud::get::<E>)
                .put(crud::update::<E>)
                .delete(crud::delete::<E>),
        )
}

/// `admins` swaps in its own create, update and delete.
fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(crud::list::<Admin>).post(admins::create_admin))
        .route("/stats", get(crud::stats::<Admin>))
        .route("/export", get(crud::export::<Admin>))
        .route(
            "/{id}",
            get(crud::get::<Admin>)
                .put(admins::update_admin)
                .delete(admins::delete_admin),
        )
}

/// `login-requests` adds the review actions.
fn login_request_router() -> Router<AppState> {
    entity_router::<LoginRequest>()
        .route("/{id}/approve", post(login_requests::approve))
        .route("/{id}/reject", post(login_requests::reject))
}

/// Every collection, mounted under `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/workshops", entity_router::<Workshop>())
        .nest("/certificates", entity_router::<Certificate>())
        .nest("/registrations", entity_router::<Registration>())
        .nest("/trainers", entity_router::<Trainer>())
        .nest("/pricing-plans", entity_router::<PricingPlan>())
        .nest("/faqs", entity_router::<Faq>())
        .nest("/features", entity_router::<Feature>())
        .nest("/scholarships", entity_router::<Scholarship>())
        .nest("/companies", entity_router::<Company>())
        .nest("/journeys", entity_router::<Journey>())
        .nest("/student-projects", entity_router::<StudentProject>())
        .nest("/quizzes", entity_router::<Quiz>())
        .nest("/course-videos", entity_router::<CourseVideo>())
        .nest("/login-requests", login_request_router())
        .nest("/admins", admin_router())
}
