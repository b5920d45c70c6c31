//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorResponse};
use crate::web::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use enrollment_core::{Course, Enrollment, RequestContext};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_courses_handler,
        enroll_handler,
        report_progress_handler,
        list_enrollments_handler,
        health_handler,
    ),
    components(
        schemas(
            CourseResponse,
            EnrollRequest,
            EnrollResponse,
            ProgressRequest,
            EnrollmentResponse,
            ErrorResponse
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Course Enrollment API", description = "Course catalog, enrollment and playback progress.")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` security scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A course as exposed by the catalog endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            video_url: course.video_url,
            created_at: course.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    #[serde(default)]
    pub course_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EnrollResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    #[serde(default)]
    pub course_id: String,
    /// Fraction of the video played, 0.0 to 1.0. Out-of-range values are clamped.
    pub played_fraction: f64,
}

/// One of the caller's enrollments with its progress percentage.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub course_id: Uuid,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            course_id: enrollment.course_id,
            progress: enrollment.progress.percent(),
            created_at: enrollment.created_at,
        }
    }
}

fn bad_json(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every course in the catalog.
#[utoipa::path(
    get,
    path = "/courses",
    responses(
        (status = 200, description = "All known courses", body = [CourseResponse]),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_courses_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = app_state.service.list_courses().await?;
    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// Enroll the authenticated caller into a course.
#[utoipa::path(
    post,
    path = "/enroll",
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Enrolled successfully", body = EnrollResponse),
        (status = 400, description = "Missing or malformed courseId", body = ErrorResponse),
        (status = 401, description = "No valid bearer credential", body = ErrorResponse),
        (status = 404, description = "Unknown course", body = ErrorResponse),
        (status = 409, description = "Already enrolled", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn enroll_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<EnrollRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload.map_err(bad_json)?;
    app_state.service.enroll(&ctx, &req.course_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(EnrollResponse {
            message: "Enrolled successfully".to_string(),
        }),
    ))
}

/// Record the latest playback position for one of the caller's courses.
#[utoipa::path(
    post,
    path = "/progress",
    request_body = ProgressRequest,
    responses(
        (status = 204, description = "Progress recorded"),
        (status = 400, description = "Missing or malformed input", body = ErrorResponse),
        (status = 401, description = "No valid bearer credential", body = ErrorResponse),
        (status = 404, description = "Caller is not enrolled in the course", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn report_progress_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(bad_json)?;
    app_state
        .service
        .report_progress(&ctx, &req.course_id, req.played_fraction)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List the caller's enrollments and their progress.
#[utoipa::path(
    get,
    path = "/enrollments",
    responses(
        (status = 200, description = "The caller's enrollments", body = [EnrollmentResponse]),
        (status = 401, description = "No valid bearer credential", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn list_enrollments_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let enrollments = app_state.service.my_enrollments(&ctx).await?;
    Ok(Json(
        enrollments.into_iter().map(EnrollmentResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Store reachable"),
        (status = 500, description = "Store unreachable", body = ErrorResponse)
    )
)]
pub async fn health_handler(State(app_state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    app_state.service.health().await?;
    Ok(StatusCode::OK)
}
