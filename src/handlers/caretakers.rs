use crate::helpers::converters::caretaker_dto;
use crate::helpers::errors::{database_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CaretakerDto, CreateCaretakerRequest, UpdateCaretakerRequest};
use model::entities::caretaker;
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use tracing::{debug, info, instrument, trace, warn};

/// Create a new caretaker
#[utoipa::path(
    post,
    path = "/api/v1/caretakers",
    tag = "caretakers",
    request_body = CreateCaretakerRequest,
    responses(
        (status = 201, description = "Caretaker created successfully", body = ApiResponse<CaretakerDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_caretaker(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateCaretakerRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<CaretakerDto>>), ApiError> {
    trace!("Entering create_caretaker function");

    let new_caretaker = caretaker::ActiveModel {
        name: Set(request.name),
        phone: Set(request.phone),
        ..Default::default()
    };

    let caretaker_model = new_caretaker
        .insert(&state.db)
        .await
        .map_err(|e| database_error("Failed to create caretaker", e))?;

    info!("Caretaker created successfully with ID: {}", caretaker_model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: caretaker_dto(caretaker_model),
            message: "Caretaker created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get all caretakers
#[utoipa::path(
    get,
    path = "/api/v1/caretakers",
    tag = "caretakers",
    responses(
        (status = 200, description = "Caretakers retrieved successfully", body = ApiResponse<Vec<CaretakerDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_caretakers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CaretakerDto>>>, ApiError> {
    trace!("Entering get_caretakers function");

    let caretakers = caretaker::Entity::find()
        .order_by_asc(caretaker::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve caretakers", e))?;

    debug!("Retrieved {} caretakers", caretakers.len());
    Ok(Json(ApiResponse {
        data: caretakers.into_iter().map(caretaker_dto).collect(),
        message: "Caretakers retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a specific caretaker by ID
#[utoipa::path(
    get,
    path = "/api/v1/caretakers/{caretaker_id}",
    tag = "caretakers",
    params(
        ("caretaker_id" = i32, Path, description = "Caretaker ID"),
    ),
    responses(
        (status = 200, description = "Caretaker retrieved successfully", body = ApiResponse<CaretakerDto>),
        (status = 404, description = "Caretaker not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_caretaker(
    Path(caretaker_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CaretakerDto>>, ApiError> {
    trace!("Entering get_caretaker function for caretaker_id: {}", caretaker_id);

    let caretaker_model = caretaker::Entity::find_by_id(caretaker_id)
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve caretaker", e))?
        .ok_or_else(|| {
            warn!("Caretaker with ID {} not found", caretaker_id);
            not_found("Caretaker", caretaker_id)
        })?;

    Ok(Json(ApiResponse {
        data: caretaker_dto(caretaker_model),
        message: "Caretaker retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a caretaker
#[utoipa::path(
    put,
    path = "/api/v1/caretakers/{caretaker_id}",
    tag = "caretakers",
    params(
        ("caretaker_id" = i32, Path, description = "Caretaker ID"),
    ),
    request_body = UpdateCaretakerRequest,
    responses(
        (status = 200, description = "Caretaker updated successfully", body = ApiResponse<CaretakerDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Caretaker not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_caretaker(
    Path(caretaker_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateCaretakerRequest>>,
) -> Result<Json<ApiResponse<CaretakerDto>>, ApiError> {
    trace!("Entering update_caretaker function for caretaker_id: {}", caretaker_id);

    let existing = caretaker::Entity::find_by_id(caretaker_id)
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to look up caretaker", e))?
        .ok_or_else(|| not_found("Caretaker", caretaker_id))?;

    let mut caretaker_active: caretaker::ActiveModel = existing.into();
    if let Some(name) = request.name {
        caretaker_active.name = Set(name);
    }
    if let Some(phone) = request.phone {
        caretaker_active.phone = Set(Some(phone));
    }

    let updated = caretaker_active
        .update(&state.db)
        .await
        .map_err(|e| database_error("Failed to update caretaker", e))?;

    info!("Caretaker with ID {} updated successfully", caretaker_id);
    Ok(Json(ApiResponse {
        data: caretaker_dto(updated),
        message: "Caretaker updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a caretaker; their houses are left without one
#[utoipa::path(
    delete,
    path = "/api/v1/caretakers/{caretaker_id}",
    tag = "caretakers",
    params(
        ("caretaker_id" = i32, Path, description = "Caretaker ID"),
    ),
    responses(
        (status = 200, description = "Caretaker deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Caretaker not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_caretaker(
    Path(caretaker_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_caretaker function for caretaker_id: {}", caretaker_id);

    let delete_result = caretaker::Entity::delete_by_id(caretaker_id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete caretaker", e))?;

    if delete_result.rows_affected == 0 {
        warn!("Caretaker with ID {} not found for deletion", caretaker_id);
        return Err(not_found("Caretaker", caretaker_id));
    }

    info!("Caretaker with ID {} deleted successfully", caretaker_id);
    Ok(Json(ApiResponse {
        data: format!("Caretaker {} deleted", caretaker_id),
        message: "Caretaker deleted successfully".to_string(),
        success: true,
    }))
}
