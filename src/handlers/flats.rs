use crate::helpers::converters::flat_dto;
use crate::helpers::errors::{conflict, database_error, not_found, validation_error, ApiError};
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse, FlatQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{AmenityInput, AssignRenterRequest, CreateFlatRequest, FlatDto, UpdateFlatRequest};
use compute::amenities::{parse_charge, retained};
use compute::AmenityFilter;
use model::entities::{advance_payment, flat, flat_amenity, house, renter};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, error, info, instrument, trace, warn};

pub(crate) fn flat_cache_key(flat_id: i32) -> String {
    format!("flat:{}", flat_id)
}

/// Loads a flat or rejects with 404.
pub(crate) async fn find_flat<C: ConnectionTrait>(db: &C, flat_id: i32) -> Result<flat::Model, ApiError> {
    match flat::Entity::find_by_id(flat_id).one(db).await {
        Ok(Some(flat_model)) => Ok(flat_model),
        Ok(None) => {
            warn!("Flat with ID {} not found", flat_id);
            Err(not_found("Flat", flat_id))
        }
        Err(db_error) => Err(database_error("Failed to retrieve flat", db_error)),
    }
}

async fn load_flat_dto<C: ConnectionTrait>(db: &C, flat_model: flat::Model) -> Result<FlatDto, DbErr> {
    let amenities = flat_model
        .find_related(flat_amenity::Entity)
        .order_by_asc(flat_amenity::Column::Id)
        .all(db)
        .await?;
    Ok(flat_dto(flat_model, amenities))
}

/// Stores the named amenities of a flat, replacing nothing.
async fn insert_amenities<C: ConnectionTrait>(
    db: &C,
    flat_id: i32,
    amenities: &[AmenityInput],
) -> Result<(), DbErr> {
    for amenity in retained(amenities, AmenityFilter::NamedOnly) {
        let charge = parse_charge(amenity.charge.as_deref());
        trace!("Storing amenity '{}' ({}) for flat {}", amenity.name, charge, flat_id);
        flat_amenity::ActiveModel {
            flat_id: Set(flat_id),
            name: Set(amenity.name.trim().to_string()),
            charge: Set(charge),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

fn check_rent_terms(base_rent: Option<Decimal>, late_fee_percentage: Option<Decimal>) -> Result<(), ApiError> {
    if base_rent.is_some_and(|rent| rent < Decimal::ZERO) {
        return Err(validation_error("Base rent cannot be negative"));
    }
    if late_fee_percentage.is_some_and(|pct| pct < Decimal::ZERO) {
        return Err(validation_error("Late fee percentage cannot be negative"));
    }
    Ok(())
}

/// Create a new flat with its amenities
#[utoipa::path(
    post,
    path = "/api/v1/flats",
    tag = "flats",
    request_body = CreateFlatRequest,
    responses(
        (status = 201, description = "Flat created successfully", body = ApiResponse<FlatDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_flat(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<CreateFlatRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<FlatDto>>), ApiError> {
    trace!("Entering create_flat function");
    debug!("Creating flat {} in house {}", request.number, request.house_id);

    check_rent_terms(Some(request.base_rent), request.late_fee_percentage)?;

    match house::Entity::find_by_id(request.house_id).one(&state.db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Attempted to create flat in non-existent house {}", request.house_id);
            return Err(validation_error(format!(
                "House with id {} does not exist",
                request.house_id
            )));
        }
        Err(db_error) => return Err(database_error("Failed to validate house", db_error)),
    }

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| database_error("Failed to start transaction", e))?;

    let flat_model = flat::ActiveModel {
        house_id: Set(request.house_id),
        number: Set(request.number),
        floor: Set(request.floor),
        base_rent: Set(request.base_rent),
        late_fee_percentage: Set(request.late_fee_percentage.unwrap_or(Decimal::ZERO)),
        renter_id: Set(None),
        rent_start_date: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| database_error("Failed to create flat", e))?;

    insert_amenities(&txn, flat_model.id, &request.amenities)
        .await
        .map_err(|e| database_error("Failed to store flat amenities", e))?;

    let dto = load_flat_dto(&txn, flat_model)
        .await
        .map_err(|e| database_error("Failed to load flat", e))?;

    txn.commit()
        .await
        .map_err(|e| database_error("Failed to commit flat", e))?;

    info!("Flat created successfully with ID: {}, total rent: {}", dto.id, dto.total_rent);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: dto,
            message: "Flat created successfully".to_string(),
            success: true,
        }),
    ))
}

/// Get all flats, optionally of one house
#[utoipa::path(
    get,
    path = "/api/v1/flats",
    tag = "flats",
    params(FlatQuery),
    responses(
        (status = 200, description = "Flats retrieved successfully", body = ApiResponse<Vec<FlatDto>>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_flats(
    Valid(Query(query)): Valid<Query<FlatQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<FlatDto>>>, ApiError> {
    trace!("Entering get_flats function");

    let mut select = flat::Entity::find();
    if let Some(house_id) = query.house_id {
        debug!("Filtering flats by house_id: {}", house_id);
        select = select.filter(flat::Column::HouseId.eq(house_id));
    }

    let flats = select
        .order_by_asc(flat::Column::Id)
        .find_with_related(flat_amenity::Entity)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve flats", e))?;

    info!("Successfully retrieved {} flats", flats.len());
    Ok(Json(ApiResponse {
        data: flats
            .into_iter()
            .map(|(flat_model, amenities)| flat_dto(flat_model, amenities))
            .collect(),
        message: "Flats retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a specific flat by ID
#[utoipa::path(
    get,
    path = "/api/v1/flats/{flat_id}",
    tag = "flats",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    responses(
        (status = 200, description = "Flat retrieved successfully", body = ApiResponse<FlatDto>),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_flat(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FlatDto>>, ApiError> {
    trace!("Entering get_flat function for flat_id: {}", flat_id);

    let cache_key = flat_cache_key(flat_id);
    if let Some(CachedData::Flat(dto)) = state.cache.get(&cache_key).await {
        debug!("Returning cached flat {}", flat_id);
        return Ok(Json(ApiResponse {
            data: dto,
            message: "Flat retrieved successfully".to_string(),
            success: true,
        }));
    }

    let flat_model = find_flat(&state.db, flat_id).await?;
    let dto = load_flat_dto(&state.db, flat_model)
        .await
        .map_err(|e| database_error("Failed to load flat amenities", e))?;

    state.cache.insert(cache_key, CachedData::Flat(dto.clone())).await;

    Ok(Json(ApiResponse {
        data: dto,
        message: "Flat retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update a flat; provided amenities replace the stored ones
#[utoipa::path(
    put,
    path = "/api/v1/flats/{flat_id}",
    tag = "flats",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    request_body = UpdateFlatRequest,
    responses(
        (status = 200, description = "Flat updated successfully", body = ApiResponse<FlatDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_flat(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateFlatRequest>>,
) -> Result<Json<ApiResponse<FlatDto>>, ApiError> {
    trace!("Entering update_flat function for flat_id: {}", flat_id);

    check_rent_terms(request.base_rent, request.late_fee_percentage)?;

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| database_error("Failed to start transaction", e))?;

    let existing = find_flat(&txn, flat_id).await?;
    let mut flat_active: flat::ActiveModel = existing.into();

    if let Some(number) = request.number {
        flat_active.number = Set(number);
    }
    if let Some(floor) = request.floor {
        flat_active.floor = Set(Some(floor));
    }
    if let Some(base_rent) = request.base_rent {
        debug!("Updating base rent of flat {} to {}", flat_id, base_rent);
        flat_active.base_rent = Set(base_rent);
    }
    if let Some(late_fee_percentage) = request.late_fee_percentage {
        flat_active.late_fee_percentage = Set(late_fee_percentage);
    }

    let updated = flat_active
        .update(&txn)
        .await
        .map_err(|e| database_error("Failed to update flat", e))?;

    if let Some(amenities) = request.amenities {
        debug!("Replacing amenities of flat {} with {} entries", flat_id, amenities.len());
        flat_amenity::Entity::delete_many()
            .filter(flat_amenity::Column::FlatId.eq(flat_id))
            .exec(&txn)
            .await
            .map_err(|e| database_error("Failed to clear flat amenities", e))?;
        insert_amenities(&txn, flat_id, &amenities)
            .await
            .map_err(|e| database_error("Failed to store flat amenities", e))?;
    }

    let dto = load_flat_dto(&txn, updated)
        .await
        .map_err(|e| database_error("Failed to load flat", e))?;

    txn.commit()
        .await
        .map_err(|e| database_error("Failed to commit flat update", e))?;
    state.cache.invalidate(&flat_cache_key(flat_id)).await;

    info!("Flat with ID {} updated successfully", flat_id);
    Ok(Json(ApiResponse {
        data: dto,
        message: "Flat updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a flat with its amenities and ledgers
#[utoipa::path(
    delete,
    path = "/api/v1/flats/{flat_id}",
    tag = "flats",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    responses(
        (status = 200, description = "Flat deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_flat(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_flat function for flat_id: {}", flat_id);

    let delete_result = flat::Entity::delete_by_id(flat_id)
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete flat", e))?;

    if delete_result.rows_affected == 0 {
        warn!("Flat with ID {} not found for deletion", flat_id);
        return Err(not_found("Flat", flat_id));
    }
    state.cache.invalidate(&flat_cache_key(flat_id)).await;

    info!("Flat with ID {} deleted successfully", flat_id);
    Ok(Json(ApiResponse {
        data: format!("Flat {} deleted", flat_id),
        message: "Flat deleted successfully".to_string(),
        success: true,
    }))
}

/// Assign a renter to a vacant flat, optionally recording advance payments
#[utoipa::path(
    post,
    path = "/api/v1/flats/{flat_id}/renter",
    tag = "flats",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    request_body = AssignRenterRequest,
    responses(
        (status = 200, description = "Renter assigned successfully", body = ApiResponse<FlatDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 409, description = "Flat is already occupied", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn assign_renter(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<AssignRenterRequest>>,
) -> Result<Json<ApiResponse<FlatDto>>, ApiError> {
    trace!("Entering assign_renter function for flat_id: {}", flat_id);
    debug!(
        "Assigning renter {} to flat {} from {} with {} advance payment(s)",
        request.renter_id,
        flat_id,
        request.rent_start_date,
        request.advance_payments.len()
    );

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| database_error("Failed to start transaction", e))?;

    find_flat(&txn, flat_id).await?;

    match renter::Entity::find_by_id(request.renter_id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!("Attempted to assign non-existent renter {}", request.renter_id);
            return Err(validation_error(format!(
                "Renter with id {} does not exist",
                request.renter_id
            )));
        }
        Err(db_error) => return Err(database_error("Failed to validate renter", db_error)),
    }

    // Only a vacant flat can be taken
    let update_result = flat::Entity::update_many()
        .col_expr(flat::Column::RenterId, Expr::value(request.renter_id))
        .col_expr(flat::Column::RentStartDate, Expr::value(request.rent_start_date))
        .filter(flat::Column::Id.eq(flat_id))
        .filter(flat::Column::RenterId.is_null())
        .exec(&txn)
        .await
        .map_err(|e| database_error("Failed to assign renter", e))?;

    if update_result.rows_affected != 1 {
        warn!("Flat {} is already occupied", flat_id);
        return Err(conflict(format!("Flat {} is already occupied", flat_id)));
    }

    for advance in request.advance_payments {
        advance_payment::ActiveModel {
            flat_id: Set(flat_id),
            renter_id: Set(request.renter_id),
            amount: Set(advance.amount),
            paid_amount: Set(advance.paid_amount.unwrap_or(advance.amount)),
            remaining_amount: Set(advance.amount),
            payment_date: Set(advance.payment_date),
            payment_method: Set(advance.payment_method),
            transaction_id: Set(advance.transaction_id),
            notes: Set(advance.notes),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| database_error("Failed to record advance payment", e))?;
    }

    let assigned = find_flat(&txn, flat_id).await?;
    let dto = load_flat_dto(&txn, assigned)
        .await
        .map_err(|e| database_error("Failed to load flat", e))?;

    if let Err(db_error) = txn.commit().await {
        error!("Failed to commit renter assignment for flat {}: {}", flat_id, db_error);
        return Err(database_error("Failed to assign renter", db_error));
    }
    state.cache.invalidate(&flat_cache_key(flat_id)).await;

    info!("Renter {} assigned to flat {}", request.renter_id, flat_id);
    Ok(Json(ApiResponse {
        data: dto,
        message: "Renter assigned successfully".to_string(),
        success: true,
    }))
}

/// Vacate a flat
#[utoipa::path(
    delete,
    path = "/api/v1/flats/{flat_id}/renter",
    tag = "flats",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    responses(
        (status = 200, description = "Flat vacated successfully", body = ApiResponse<FlatDto>),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 409, description = "Flat is not occupied", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn vacate_flat(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<FlatDto>>, ApiError> {
    trace!("Entering vacate_flat function for flat_id: {}", flat_id);

    let existing = find_flat(&state.db, flat_id).await?;
    let Some(renter_id) = existing.renter_id else {
        warn!("Flat {} has no renter to vacate", flat_id);
        return Err(conflict(format!("Flat {} is not occupied", flat_id)));
    };

    let mut flat_active: flat::ActiveModel = existing.into();
    flat_active.renter_id = Set(None);
    flat_active.rent_start_date = Set(None);
    let vacated = flat_active
        .update(&state.db)
        .await
        .map_err(|e| database_error("Failed to vacate flat", e))?;

    let dto = load_flat_dto(&state.db, vacated)
        .await
        .map_err(|e| database_error("Failed to load flat", e))?;
    state.cache.invalidate(&flat_cache_key(flat_id)).await;

    info!("Renter {} moved out of flat {}", renter_id, flat_id);
    Ok(Json(ApiResponse {
        data: dto,
        message: "Flat vacated successfully".to_string(),
        success: true,
    }))
}
