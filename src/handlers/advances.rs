use crate::handlers::flats::find_flat;
use crate::handlers::payments::{credit_rent_payment, find_rent_payment};
use crate::helpers::converters::{advance_payment_dto, rent_payment_dto, rent_status_to_model};
use crate::helpers::errors::{compute_error, conflict, database_error, not_found, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::Utc;
use common::{
    AdvancePaymentDto, AllocationPreviewDto, AllocationPreviewRequest, ApplyAdvanceRequest,
    ApplyAdvanceResponse, NewAdvancePayment,
};
use compute::status;
use model::entities::{advance_payment, rent_payment, rent_payment::RentPaymentStatus};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, error, info, instrument, trace, warn};

/// Loads an advance that belongs to `flat_id` or rejects with 404.
async fn find_advance<C: ConnectionTrait>(
    db: &C,
    flat_id: i32,
    advance_payment_id: i32,
) -> Result<advance_payment::Model, ApiError> {
    match advance_payment::Entity::find_by_id(advance_payment_id)
        .filter(advance_payment::Column::FlatId.eq(flat_id))
        .one(db)
        .await
    {
        Ok(Some(advance)) => Ok(advance),
        Ok(None) => {
            warn!("Advance payment {} not found for flat {}", advance_payment_id, flat_id);
            Err(not_found("Advance payment", advance_payment_id))
        }
        Err(db_error) => Err(database_error("Failed to retrieve advance payment", db_error)),
    }
}

/// Advance credit only pays obligations of the renter who deposited it.
fn ensure_same_renter(
    advance: &advance_payment::Model,
    rent: &rent_payment::Model,
) -> Result<(), ApiError> {
    if rent.renter_id != Some(advance.renter_id) {
        warn!(
            "Advance payment {} of renter {} cannot pay rent payment {} of renter {:?}",
            advance.id, advance.renter_id, rent.id, rent.renter_id
        );
        return Err(conflict(format!(
            "Advance payment {} belongs to a different renter than rent payment {}",
            advance.id, rent.id
        )));
    }
    Ok(())
}

/// Takes `amount` off an advance's balance, provided the balance still covers
/// it. A concurrent draw that got there first turns this into a 409.
pub(crate) async fn draw_from_advance<C: ConnectionTrait>(
    db: &C,
    advance_payment_id: i32,
    amount: Decimal,
) -> Result<(), ApiError> {
    trace!("Drawing {} from advance payment {}", amount, advance_payment_id);

    let update_result = advance_payment::Entity::update_many()
        .col_expr(
            advance_payment::Column::RemainingAmount,
            Expr::col(advance_payment::Column::RemainingAmount).sub(amount),
        )
        .filter(advance_payment::Column::Id.eq(advance_payment_id))
        .filter(advance_payment::Column::RemainingAmount.gte(amount))
        .exec(db)
        .await
        .map_err(|e| database_error("Failed to update advance payment", e))?;

    if update_result.rows_affected != 1 {
        warn!(
            "Advance payment {} no longer covers {} (rows affected: {})",
            advance_payment_id, amount, update_result.rows_affected
        );
        return Err(conflict(format!(
            "Advance payment {} no longer has {} available",
            advance_payment_id, amount
        )));
    }
    Ok(())
}

/// Get the advance ledger of a flat, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/flats/{flat_id}/advance-payments",
    tag = "advances",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    responses(
        (status = 200, description = "Advance payments retrieved successfully", body = ApiResponse<Vec<AdvancePaymentDto>>),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_advance_payments(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AdvancePaymentDto>>>, ApiError> {
    trace!("Entering get_advance_payments function for flat_id: {}", flat_id);

    find_flat(&state.db, flat_id).await?;

    let advances = advance_payment::Entity::find()
        .filter(advance_payment::Column::FlatId.eq(flat_id))
        .order_by_asc(advance_payment::Column::PaymentDate)
        .order_by_asc(advance_payment::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve advance payments", e))?;

    debug!("Retrieved {} advance payments for flat {}", advances.len(), flat_id);
    Ok(Json(ApiResponse {
        data: advances.into_iter().map(advance_payment_dto).collect(),
        message: "Advance payments retrieved successfully".to_string(),
        success: true,
    }))
}

/// Record an advance payment from the flat's current renter
#[utoipa::path(
    post,
    path = "/api/v1/flats/{flat_id}/advance-payments",
    tag = "advances",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    request_body = NewAdvancePayment,
    responses(
        (status = 201, description = "Advance payment recorded successfully", body = ApiResponse<AdvancePaymentDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 409, description = "Flat has no renter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_advance_payment(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<NewAdvancePayment>>,
) -> Result<(StatusCode, Json<ApiResponse<AdvancePaymentDto>>), ApiError> {
    trace!("Entering create_advance_payment function for flat_id: {}", flat_id);

    let flat_model = find_flat(&state.db, flat_id).await?;
    let Some(renter_id) = flat_model.renter_id else {
        warn!("Attempted to record an advance for vacant flat {}", flat_id);
        return Err(conflict(format!("Flat {} has no renter", flat_id)));
    };

    let advance = advance_payment::ActiveModel {
        flat_id: Set(flat_id),
        renter_id: Set(renter_id),
        amount: Set(request.amount),
        paid_amount: Set(request.paid_amount.unwrap_or(request.amount)),
        remaining_amount: Set(request.amount),
        payment_date: Set(request.payment_date),
        payment_method: Set(request.payment_method),
        transaction_id: Set(request.transaction_id),
        notes: Set(request.notes),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("Failed to record advance payment", e))?;

    info!("Advance payment {} of {} recorded for flat {}", advance.id, advance.amount, flat_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: advance_payment_dto(advance),
            message: "Advance payment recorded successfully".to_string(),
            success: true,
        }),
    ))
}

/// Delete an advance payment record
#[utoipa::path(
    delete,
    path = "/api/v1/flats/{flat_id}/advance-payments/{advance_payment_id}",
    tag = "advances",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
        ("advance_payment_id" = i32, Path, description = "Advance payment ID"),
    ),
    responses(
        (status = 200, description = "Advance payment deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Advance payment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_advance_payment(
    Path((flat_id, advance_payment_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_advance_payment function for advance_payment_id: {}", advance_payment_id);

    let delete_result = advance_payment::Entity::delete_many()
        .filter(advance_payment::Column::Id.eq(advance_payment_id))
        .filter(advance_payment::Column::FlatId.eq(flat_id))
        .exec(&state.db)
        .await
        .map_err(|e| database_error("Failed to delete advance payment", e))?;

    if delete_result.rows_affected == 0 {
        warn!("Advance payment {} not found for deletion", advance_payment_id);
        return Err(not_found("Advance payment", advance_payment_id));
    }

    info!("Advance payment {} of flat {} deleted", advance_payment_id, flat_id);
    Ok(Json(ApiResponse {
        data: format!("Advance payment {} deleted", advance_payment_id),
        message: "Advance payment deleted successfully".to_string(),
        success: true,
    }))
}

/// Apply part of an advance payment to a rent obligation
#[utoipa::path(
    post,
    path = "/api/v1/flats/{flat_id}/apply-advance",
    tag = "advances",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    request_body = ApplyAdvanceRequest,
    responses(
        (status = 200, description = "Advance applied successfully", body = ApiResponse<ApplyAdvanceResponse>),
        (status = 400, description = "Amount out of range", body = ErrorResponse),
        (status = 404, description = "Advance or rent payment not found", body = ErrorResponse),
        (status = 409, description = "Balances changed concurrently, rent cancelled or advance held by another renter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn apply_advance(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<ApplyAdvanceRequest>>,
) -> Result<Json<ApiResponse<ApplyAdvanceResponse>>, ApiError> {
    trace!("Entering apply_advance function for flat_id: {}", flat_id);
    debug!(
        "Applying {} from advance {} to rent payment {}",
        request.amount, request.advance_payment_id, request.rent_payment_id
    );

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| database_error("Failed to start transaction", e))?;

    let rent = find_rent_payment(&txn, flat_id, request.rent_payment_id).await?;
    if rent.status == RentPaymentStatus::Cancelled {
        return Err(conflict(format!(
            "Rent payment {} is cancelled",
            request.rent_payment_id
        )));
    }
    let advance = find_advance(&txn, flat_id, request.advance_payment_id).await?;
    ensure_same_renter(&advance, &rent)?;

    let rent_due = compute::rent_due(rent.amount, Some(rent.paid_amount));
    let amount = compute::validate(rent_due, advance.remaining_amount, request.amount)
        .map_err(|e| {
            warn!("Rejected allocation: {}", e);
            compute_error(e)
        })?;

    draw_from_advance(&txn, advance.id, amount).await?;
    credit_rent_payment(&txn, rent.id, amount).await?;

    let today = Utc::now().date_naive();
    let credited = find_rent_payment(&txn, flat_id, rent.id).await?;
    let rent_status = status::rent_status(
        credited.amount,
        credited.paid_amount,
        credited.due_date,
        today,
        false,
    );

    let mut rent_active: rent_payment::ActiveModel = credited.into();
    rent_active.status = Set(rent_status_to_model(rent_status));
    let updated_rent = rent_active
        .update(&txn)
        .await
        .map_err(|e| database_error("Failed to update rent payment", e))?;

    let updated_advance = find_advance(&txn, flat_id, advance.id).await?;

    if let Err(db_error) = txn.commit().await {
        error!("Failed to commit advance application: {}", db_error);
        return Err(database_error("Failed to apply advance", db_error));
    }

    info!(
        "Applied {} from advance {} to rent payment {} (remaining advance {})",
        amount, updated_advance.id, updated_rent.id, updated_advance.remaining_amount
    );
    Ok(Json(ApiResponse {
        data: ApplyAdvanceResponse {
            rent_payment: rent_payment_dto(updated_rent, today),
            advance_payment: advance_payment_dto(updated_advance),
        },
        message: "Advance applied successfully".to_string(),
        success: true,
    }))
}

/// Preview applying an advance to a rent obligation without changing anything
#[utoipa::path(
    post,
    path = "/api/v1/flats/{flat_id}/allocation-preview",
    tag = "advances",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    request_body = AllocationPreviewRequest,
    responses(
        (status = 200, description = "Allocation previewed", body = ApiResponse<AllocationPreviewDto>),
        (status = 404, description = "Advance or rent payment not found", body = ErrorResponse),
        (status = 409, description = "Advance belongs to another renter", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn allocation_preview(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<AllocationPreviewRequest>,
) -> Result<Json<ApiResponse<AllocationPreviewDto>>, ApiError> {
    trace!("Entering allocation_preview function for flat_id: {}", flat_id);

    let rent = find_rent_payment(&state.db, flat_id, request.rent_payment_id).await?;
    let advance = find_advance(&state.db, flat_id, request.advance_payment_id).await?;
    ensure_same_renter(&advance, &rent)?;

    let rent_due = compute::rent_due(rent.amount, Some(rent.paid_amount));
    let available = advance.remaining_amount;
    let amount = request
        .amount
        .unwrap_or_else(|| compute::suggest(rent_due, available));

    let preview = compute::preview(rent_due, available, amount);
    debug!("Allocation preview for flat {}: {:?}", flat_id, preview);

    Ok(Json(ApiResponse {
        data: preview.into_dto(),
        message: "Allocation previewed".to_string(),
        success: true,
    }))
}
