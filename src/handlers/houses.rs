use crate::helpers::converters::house_dto;
use crate::helpers::errors::{database_error, not_found, validation_error, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{CreateHouseRequest, HouseDto, UpdateHouseRequest};
use model::entities::{caretaker, house};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::{debug, info, instrument, trace, warn};

/// Rejects references to caretakers that do not exist.
async fn ensure_caretaker_exists(db: &DatabaseConnection, caretaker_id: i32) -> Result<(), ApiError> {
    trace!("Validating caretaker_id: {}", caretaker_id);
    match caretaker::Entity::find_by_id(caretaker_id).one(db).await {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            warn!("Caretaker {} does not exist", caretaker_id);
            Err(validation_error(format!(
                "Caretaker with id {} does not exist",
                caretaker_id
            )))
        }
        Err(db_error) => Err(database_error("Failed to validate caretaker", db_error)),
    }
}

/// Create a new house
#[utoipa::path(
    post,
    path = "/api/v1/houses",
    tag = "houses",
    request_body = CreateHouseRequest,
    responses(
        (status = 201, description = "House created successfully", body = ApiResponse<HouseDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_house(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateHouseRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<HouseDto>>), ApiError> {
    trace!("Entering create_house function");
    debug!("Creating house with name: {}", request.name);

    if let Some(caretaker_id) = request.caretaker_id {
        ensure_caretaker_exists(&state.db, caretaker_id).await?;
    }

    let new_house = house::ActiveModel {
        name: Set(request.name),
        address: Set(request.address),
        caretaker_id: Set(request.caretaker_id),
        ..Default::default()
    };

    let house_model = new_house
        .insert(&state.db)
        .await
        .map_err(|e| database_error("Failed to create house", e))?;

    info!("House created successfully with ID: {}, name: {}", house_model.id, house_model.name);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: house_dto(house_model),
            message: "House created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get all houses
#[utoipa::path(
    get,
    path = "/api/v1/houses",
    tag = "houses",
    responses(
        (status = 200, description = "Houses retrieved successfully", body = ApiResponse<Vec<HouseDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_houses(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<HouseDto>>>, ApiError> {
    trace!("Entering get_houses function");

    let houses = house::Entity::find()
        .order_by_asc(house::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve houses", e))?;

    info!("Successfully retrieved {} houses", houses.len());
    Ok(Json(ApiResponse {
        data: houses.into_iter().map(house_dto).collect(),
        message: "Houses retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a specific house by ID
#[utoipa::path(
    get,
    path = "/api/v1/houses/{house_id}",
    tag = "houses",
    params(
        ("house_id" = i32, Path, description = "House ID"),
    ),
    responses(
        (status = 200, description = "House retrieved successfully", body = ApiResponse<HouseDto>),
        (status = 404, description = "House not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_house(
    Path(house_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HouseDto>>, ApiError> {
    trace!("Entering get_house function for house_id: {}", house_id);

    match house::Entity::find_by_id(house_id).one(&state.db).await {
        Ok(Some(house_model)) => {
            debug!("Retrieved house {}: {}", house_model.id, house_model.name);
            Ok(Json(ApiResponse {
                data: house_dto(house_model),
                message: "House retrieved successfully".to_string(),
                success: true,
            }))
        }
        Ok(None) => {
            warn!("House with ID {} not found", house_id);
            Err(not_found("House", house_id))
        }
        Err(db_error) => Err(database_error("Failed to retrieve house", db_error)),
    }
}

/// Update a house
#[utoipa::path(
    put,
    path = "/api/v1/houses/{house_id}",
    tag = "houses",
    params(
        ("house_id" = i32, Path, description = "House ID"),
    ),
    request_body = UpdateHouseRequest,
    responses(
        (status = 200, description = "House updated successfully", body = ApiResponse<HouseDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "House not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_house(
    Path(house_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateHouseRequest>>,
) -> Result<Json<ApiResponse<HouseDto>>, ApiError> {
    trace!("Entering update_house function for house_id: {}", house_id);

    let existing = house::Entity::find_by_id(house_id)
        .one(&state.db)
        .await
        .map_err(|e| database_error("Failed to look up house", e))?
        .ok_or_else(|| {
            warn!("House with ID {} not found for update", house_id);
            not_found("House", house_id)
        })?;

    let mut house_active: house::ActiveModel = existing.into();
    if let Some(name) = request.name {
        debug!("Updating house name to: {}", name);
        house_active.name = Set(name);
    }
    if let Some(address) = request.address {
        house_active.address = Set(Some(address));
    }
    if let Some(caretaker_id) = request.caretaker_id {
        ensure_caretaker_exists(&state.db, caretaker_id).await?;
        debug!("Assigning caretaker {} to house {}", caretaker_id, house_id);
        house_active.caretaker_id = Set(Some(caretaker_id));
    }

    let updated = house_active
        .update(&state.db)
        .await
        .map_err(|e| database_error("Failed to update house", e))?;

    info!("House with ID {} updated successfully", house_id);
    Ok(Json(ApiResponse {
        data: house_dto(updated),
        message: "House updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a house together with its flats
#[utoipa::path(
    delete,
    path = "/api/v1/houses/{house_id}",
    tag = "houses",
    params(
        ("house_id" = i32, Path, description = "House ID"),
    ),
    responses(
        (status = 200, description = "House deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "House not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_house(
    Path(house_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_house function for house_id: {}", house_id);

    let delete_result = house::Entity::delete_by_id(house_id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete house", e))?;

    debug!("Delete operation completed. Rows affected: {}", delete_result.rows_affected);
    if delete_result.rows_affected == 0 {
        warn!("House with ID {} not found for deletion", house_id);
        return Err(not_found("House", house_id));
    }

    // Flats went with the house
    state.cache.invalidate_all();

    info!("House with ID {} deleted successfully", house_id);
    Ok(Json(ApiResponse {
        data: format!("House {} deleted", house_id),
        message: "House deleted successfully".to_string(),
        success: true,
    }))
}
