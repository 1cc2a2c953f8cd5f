use crate::helpers::converters::renter_dto;
use crate::helpers::errors::{conflict, database_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CreateRenterRequest, RenterDto, UpdateRenterRequest};
use model::entities::{advance_payment, flat, renter};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument, trace, warn};

/// Create a new renter
#[utoipa::path(
    post,
    path = "/api/v1/renters",
    tag = "renters",
    request_body = CreateRenterRequest,
    responses(
        (status = 201, description = "Renter created successfully", body = ApiResponse<RenterDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_renter(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateRenterRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<RenterDto>>), ApiError> {
    trace!("Entering create_renter function");
    debug!("Creating renter with name: {}", request.name);

    let new_renter = renter::ActiveModel {
        name: Set(request.name),
        phone: Set(request.phone),
        email: Set(request.email),
        national_id: Set(request.national_id),
        ..Default::default()
    };

    let renter_model = new_renter
        .insert(&state.db)
        .await
        .map_err(|e| database_error("Failed to create renter", e))?;

    info!("Renter created successfully with ID: {}", renter_model.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: renter_dto(renter_model),
            message: "Renter created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get all renters
#[utoipa::path(
    get,
    path = "/api/v1/renters",
    tag = "renters",
    responses(
        (status = 200, description = "Renters retrieved successfully", body = ApiResponse<Vec<RenterDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_renters(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RenterDto>>>, ApiError> {
    trace!("Entering get_renters function");

    let renters = renter::Entity::find()
        .order_by_asc(renter::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve renters", e))?;

    info!("Successfully retrieved {} renters", renters.len());
    Ok(Json(ApiResponse {
        data: renters.into_iter().map(renter_dto).collect(),
        message: "Renters retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a specific renter by ID
#[utoipa::path(
    get,
    path = "/api/v1/renters/{renter_id}",
    tag = "renters",
    params(
        ("renter_id" = i32, Path, description = "Renter ID"),
    ),
    responses(
        (status = 200, description = "Renter retrieved successfully", body = ApiResponse<RenterDto>),
        (status = 404, description = "Renter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_renter(
    Path(renter_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RenterDto>>, ApiError> {
    trace!("Entering get_renter function for renter_id: {}", renter_id);

    match renter::Entity::find_by_id(renter_id).one(&state.db).await {
        Ok(Some(renter_model)) => Ok(Json(ApiResponse {
            data: renter_dto(renter_model),
            message: "Renter retrieved successfully".to_string(),
            success: true,
        })),
        Ok(None) => {
            warn!("Renter with ID {} not found", renter_id);
            Err(not_found("Renter", renter_id))
        }
        Err(db_error) => Err(database_error("Failed to retrieve renter", db_error)),
    }
}

/// Update a renter
#[utoipa::path(
    put,
    path = "/api/v1/renters/{renter_id}",
    tag = "renters",
    params(
        ("renter_id" = i32, Path, description = "Renter ID"),
    ),
    request_body = UpdateRenterRequest,
    responses(
        (status = 200, description = "Renter updated successfully", body = ApiResponse<RenterDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Renter not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_renter(
    Path(renter_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateRenterRequest>>,
) -> Result<Json<ApiResponse<RenterDto>>, ApiError> {
    trace!("Entering update_renter function for renter_id: {}", renter_id);

    let existing = renter::Entity::find_by_id(renter_id)
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to look up renter", e))?
        .ok_or_else(|| not_found("Renter", renter_id))?;

    let mut renter_active: renter::ActiveModel = existing.into();
    let mut updated_fields = Vec::new();

    if let Some(name) = request.name {
        renter_active.name = Set(name);
        updated_fields.push("name");
    }
    if let Some(phone) = request.phone {
        renter_active.phone = Set(Some(phone));
        updated_fields.push("phone");
    }
    if let Some(email) = request.email {
        renter_active.email = Set(Some(email));
        updated_fields.push("email");
    }
    if let Some(national_id) = request.national_id {
        renter_active.national_id = Set(Some(national_id));
        updated_fields.push("national_id");
    }
    debug!("Updating renter fields: {:?}", updated_fields);

    let updated = renter_active
        .update(&state.db)
        .await
        .map_err(|e| database_error("Failed to update renter", e))?;

    info!("Renter with ID {} updated successfully", renter_id);
    Ok(Json(ApiResponse {
        data: renter_dto(updated),
        message: "Renter updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a renter who no longer occupies a flat and holds no advances
#[utoipa::path(
    delete,
    path = "/api/v1/renters/{renter_id}",
    tag = "renters",
    params(
        ("renter_id" = i32, Path, description = "Renter ID"),
    ),
    responses(
        (status = 200, description = "Renter deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Renter not found", body = ErrorResponse),
        (status = 409, description = "Renter still occupies a flat or holds advances", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_renter(
    Path(renter_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_renter function for renter_id: {}", renter_id);

    let occupied = flat::Entity::find()
        .filter(flat::Column::RenterId.eq(renter_id))
        .count(&state.db)
        .await
        .map_err(|e| database_error("Failed to check renter occupancy", e))?;
    if occupied > 0 {
        warn!("Renter {} still occupies {} flat(s)", renter_id, occupied);
        return Err(conflict(format!(
            "Renter {} still occupies a flat; vacate it first",
            renter_id
        )));
    }

    let advances = advance_payment::Entity::find()
        .filter(advance_payment::Column::RenterId.eq(renter_id))
        .count(&state.db)
        .await
        .map_err(|e| database_error("Failed to check renter advances", e))?;
    if advances > 0 {
        warn!("Renter {} still holds {} advance payment(s)", renter_id, advances);
        return Err(conflict(format!(
            "Renter {} has advance payments on record",
            renter_id
        )));
    }

    let delete_result = renter::Entity::delete_by_id(renter_id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete renter", e))?;

    if delete_result.rows_affected == 0 {
        warn!("Renter with ID {} not found for deletion", renter_id);
        return Err(not_found("Renter", renter_id));
    }

    info!("Renter with ID {} deleted successfully", renter_id);
    Ok(Json(ApiResponse {
        data: format!("Renter {} deleted", renter_id),
        message: "Renter deleted successfully".to_string(),
        success: true,
    }))
}
