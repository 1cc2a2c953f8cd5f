use crate::handlers::advances::draw_from_advance;
use crate::handlers::flats::find_flat;
use crate::helpers::converters::{advance_credit, rent_payment_dto, rent_status_to_model};
use crate::helpers::errors::{conflict, database_error, not_found, validation_error, ApiError};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDate, Utc};
use common::{AdvanceSliceDto, RecordPaymentRequest, RecordPaymentResponse, RentPaymentDto};
use compute::{amenities, consumption, late_fee, schedule, status, AmenityFilter};
use model::entities::{
    advance_payment, flat, flat_amenity, rent_payment, rent_payment::RentPaymentStatus,
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, trace, warn};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Loads an obligation that belongs to `flat_id` or rejects with 404.
pub(crate) async fn find_rent_payment<C: ConnectionTrait>(
    db: &C,
    flat_id: i32,
    rent_payment_id: i32,
) -> Result<rent_payment::Model, ApiError> {
    match rent_payment::Entity::find_by_id(rent_payment_id)
        .filter(rent_payment::Column::FlatId.eq(flat_id))
        .one(db)
        .await
    {
        Ok(Some(payment)) => Ok(payment),
        Ok(None) => {
            warn!("Rent payment {} not found for flat {}", rent_payment_id, flat_id);
            Err(not_found("Rent payment", rent_payment_id))
        }
        Err(db_error) => Err(database_error("Failed to retrieve rent payment", db_error)),
    }
}

/// Open obligation of a flat for one due date. Cancelled obligations do not
/// count.
async fn open_obligation<C: ConnectionTrait>(
    db: &C,
    flat_id: i32,
    due_date: NaiveDate,
) -> Result<Option<rent_payment::Model>, ApiError> {
    rent_payment::Entity::find()
        .filter(rent_payment::Column::FlatId.eq(flat_id))
        .filter(rent_payment::Column::DueDate.eq(due_date))
        .filter(rent_payment::Column::Status.ne(RentPaymentStatus::Cancelled))
        .order_by_asc(rent_payment::Column::Id)
        .one(db)
        .await
        .map_err(|e| database_error("Failed to look up rent payment", e))
}

/// Adds a late fee to an obligation that has none yet.
async fn add_late_fee<C: ConnectionTrait>(
    db: &C,
    rent_payment_id: i32,
    fee: Decimal,
) -> Result<(), ApiError> {
    let update_result = rent_payment::Entity::update_many()
        .col_expr(
            rent_payment::Column::Amount,
            Expr::col(rent_payment::Column::Amount).add(fee),
        )
        .col_expr(rent_payment::Column::LateFee, Expr::value(fee))
        .filter(rent_payment::Column::Id.eq(rent_payment_id))
        .filter(rent_payment::Column::LateFee.eq(Decimal::ZERO))
        .exec(db)
        .await
        .map_err(|e| database_error("Failed to add late fee", e))?;

    if update_result.rows_affected == 1 {
        debug!("Added late fee {} to rent payment {}", fee, rent_payment_id);
    } else {
        debug!("Rent payment {} already carries a late fee", rent_payment_id);
    }
    Ok(())
}

/// Adds `amount` to an obligation's paid amount, provided it is still open
/// and owes at least that much. A concurrent settlement that got there first
/// turns this into a 409.
pub(crate) async fn credit_rent_payment<C: ConnectionTrait>(
    db: &C,
    rent_payment_id: i32,
    amount: Decimal,
) -> Result<(), ApiError> {
    trace!("Crediting {} to rent payment {}", amount, rent_payment_id);

    let update_result = rent_payment::Entity::update_many()
        .col_expr(
            rent_payment::Column::PaidAmount,
            Expr::col(rent_payment::Column::PaidAmount).add(amount),
        )
        .filter(rent_payment::Column::Id.eq(rent_payment_id))
        .filter(rent_payment::Column::Status.ne(RentPaymentStatus::Cancelled))
        .filter(
            Expr::expr(Expr::col(rent_payment::Column::PaidAmount).add(amount))
                .lte(Expr::col(rent_payment::Column::Amount)),
        )
        .exec(db)
        .await
        .map_err(|e| database_error("Failed to update rent payment", e))?;

    if update_result.rows_affected != 1 {
        warn!(
            "Rent payment {} no longer owes {} (rows affected: {})",
            rent_payment_id, amount, update_result.rows_affected
        );
        return Err(conflict(format!(
            "Rent payment {} no longer has {} due",
            rent_payment_id, amount
        )));
    }
    Ok(())
}

/// Get the rent ledger of a flat, newest first
#[utoipa::path(
    get,
    path = "/api/v1/flats/{flat_id}/payments",
    tag = "payments",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    responses(
        (status = 200, description = "Rent payments retrieved successfully", body = ApiResponse<Vec<RentPaymentDto>>),
        (status = 404, description = "Flat not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_rent_payments(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RentPaymentDto>>>, ApiError> {
    trace!("Entering get_rent_payments function for flat_id: {}", flat_id);

    find_flat(&state.db, flat_id).await?;

    let payments = rent_payment::Entity::find()
        .filter(rent_payment::Column::FlatId.eq(flat_id))
        .order_by_desc(rent_payment::Column::DueDate)
        .order_by_desc(rent_payment::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("Failed to retrieve rent payments", e))?;

    let today = today();
    debug!("Retrieved {} rent payments for flat {}", payments.len(), flat_id);
    Ok(Json(ApiResponse {
        data: payments
            .into_iter()
            .map(|payment| rent_payment_dto(payment, today))
            .collect(),
        message: "Rent payments retrieved successfully".to_string(),
        success: true,
    }))
}

/// Record a rent payment for a flat
///
/// Without `rent_payment_id` a new obligation is raised from the flat's rent,
/// the given amenities and the late fee. Advance credit is drawn first (oldest
/// advance first) when `use_advance_payment` is set, then the cash amount.
#[utoipa::path(
    post,
    path = "/api/v1/flats/{flat_id}/payments",
    tag = "payments",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
    ),
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<RecordPaymentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Flat or rent payment not found", body = ErrorResponse),
        (status = 409, description = "Obligation cannot take this payment", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn record_payment(
    Path(flat_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<RecordPaymentRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<RecordPaymentResponse>>), ApiError> {
    trace!("Entering record_payment function for flat_id: {}", flat_id);
    debug!(
        "Recording payment of {} for flat {} due {} paid {} (use advance: {}, schedule next: {})",
        request.amount_paid,
        flat_id,
        request.due_date,
        request.payment_date,
        request.use_advance_payment,
        request.schedule_next_payment
    );

    let today = today();
    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| database_error("Failed to start transaction", e))?;

    let flat_model = find_flat(&txn, flat_id).await?;
    let late_percentage = request
        .late_fee_percentage
        .unwrap_or(flat_model.late_fee_percentage);

    // An obligation already raised for this due date is settled, not duplicated
    let existing = match request.rent_payment_id {
        Some(rent_payment_id) => Some(find_rent_payment(&txn, flat_id, rent_payment_id).await?),
        None => open_obligation(&txn, flat_id, request.due_date).await?,
    };

    let obligation = match existing {
        Some(existing) => {
            if existing.status == RentPaymentStatus::Cancelled {
                return Err(conflict(format!("Rent payment {} is cancelled", existing.id)));
            }
            if existing.paid_amount >= existing.amount {
                return Err(conflict(format!(
                    "Rent payment {} is already settled",
                    existing.id
                )));
            }

            if existing.late_fee.is_zero() {
                let fee = late_fee::late_fee(
                    existing.due_date,
                    request.payment_date,
                    existing.base_rent,
                    late_percentage,
                    state.proration,
                );
                if fee > Decimal::ZERO {
                    add_late_fee(&txn, existing.id, fee).await?;
                }
            }
            find_rent_payment(&txn, flat_id, existing.id).await?
        }
        None => {
            let Some(renter_id) = flat_model.renter_id else {
                warn!("Attempted to record rent for vacant flat {}", flat_id);
                return Err(conflict(format!("Flat {} has no renter", flat_id)));
            };

            let amenities_total: Decimal = if request.amenities.is_empty() {
                let stored = flat_amenity::Entity::find()
                    .filter(flat_amenity::Column::FlatId.eq(flat_id))
                    .all(&txn)
                    .await
                    .map_err(|e| database_error("Failed to load flat amenities", e))?;
                stored.iter().map(|amenity| amenity.charge).sum()
            } else {
                amenities::total(&request.amenities, AmenityFilter::NamedOnly)
            };
            let fee = late_fee::late_fee(
                request.due_date,
                request.payment_date,
                flat_model.base_rent,
                late_percentage,
                state.proration,
            );
            let amount = flat_model.base_rent + amenities_total + fee;
            debug!(
                "New obligation for flat {}: rent {} + amenities {} + late fee {} = {}",
                flat_id, flat_model.base_rent, amenities_total, fee, amount
            );

            rent_payment::ActiveModel {
                flat_id: Set(flat_id),
                renter_id: Set(Some(renter_id)),
                due_date: Set(request.due_date),
                base_rent: Set(flat_model.base_rent),
                amenities_total: Set(amenities_total),
                late_fee: Set(fee),
                amount: Set(amount),
                paid_amount: Set(Decimal::ZERO),
                status: Set(RentPaymentStatus::Pending),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| database_error("Failed to create rent payment", e))?
        }
    };

    let mut outstanding = compute::rent_due(obligation.amount, Some(obligation.paid_amount));

    let mut advance_applied = Vec::new();
    if request.use_advance_payment {
        // Credit belongs to the renter the obligation was raised against
        let advances = match obligation.renter_id.or(flat_model.renter_id) {
            Some(renter_id) => advance_payment::Entity::find()
                .filter(advance_payment::Column::FlatId.eq(flat_id))
                .filter(advance_payment::Column::RenterId.eq(renter_id))
                .filter(advance_payment::Column::RemainingAmount.gt(Decimal::ZERO))
                .all(&txn)
                .await
                .map_err(|e| database_error("Failed to load advance payments", e))?,
            None => Vec::new(),
        };
        let credits: Vec<_> = advances.iter().map(advance_credit).collect();
        let plan = consumption::plan(&credits, outstanding);

        for slice in &plan.slices {
            draw_from_advance(&txn, slice.advance_id, slice.amount).await?;
            advance_applied.push(AdvanceSliceDto::from(slice));
        }
        outstanding = plan.outstanding;
        info!("Applied {} of advance credit to flat {}", plan.total_applied, flat_id);
    }

    if request.amount_paid > outstanding {
        warn!("Payment of {} exceeds outstanding {}", request.amount_paid, outstanding);
        return Err(validation_error(format!(
            "Amount paid {} exceeds the amount due of {}",
            request.amount_paid, outstanding
        )));
    }

    let applied: Decimal = advance_applied.iter().map(|slice| slice.amount).sum();
    let credited = applied + request.amount_paid;
    if credited > Decimal::ZERO {
        credit_rent_payment(&txn, obligation.id, credited).await?;
    }

    let credited_obligation = find_rent_payment(&txn, flat_id, obligation.id).await?;
    let rent_status = status::rent_status(
        credited_obligation.amount,
        credited_obligation.paid_amount,
        credited_obligation.due_date,
        today,
        false,
    );

    let mut active: rent_payment::ActiveModel = credited_obligation.into();
    active.status = Set(rent_status_to_model(rent_status));
    active.payment_date = Set(Some(request.payment_date));
    if request.payment_method.is_some() {
        active.payment_method = Set(request.payment_method);
    }
    if request.transaction_id.is_some() {
        active.transaction_id = Set(request.transaction_id);
    }
    if request.notes.is_some() {
        active.notes = Set(request.notes);
    }

    let saved = active
        .update(&txn)
        .await
        .map_err(|e| database_error("Failed to save rent payment", e))?;

    let next_payment = if request.schedule_next_payment {
        schedule_next(&txn, &flat_model, &saved).await?
    } else {
        None
    };

    txn.commit()
        .await
        .map_err(|e| database_error("Failed to commit payment", e))?;

    info!(
        "Recorded payment on rent payment {} for flat {}: paid {} of {}",
        saved.id, flat_id, saved.paid_amount, saved.amount
    );
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: RecordPaymentResponse {
                payment: rent_payment_dto(saved, today),
                advance_applied,
                next_payment: next_payment.map(|payment| rent_payment_dto(payment, today)),
            },
            message: "Payment recorded successfully".to_string(),
            success: true,
        }),
    ))
}

/// Raises the following month's pending obligation unless one exists.
async fn schedule_next<C: ConnectionTrait>(
    db: &C,
    flat_model: &flat::Model,
    current: &rent_payment::Model,
) -> Result<Option<rent_payment::Model>, ApiError> {
    let next_due = schedule::next_due_date(current.due_date);

    let existing = rent_payment::Entity::find()
        .filter(rent_payment::Column::FlatId.eq(flat_model.id))
        .filter(rent_payment::Column::DueDate.eq(next_due))
        .count(db)
        .await
        .map_err(|e| database_error("Failed to check scheduled rent", e))?;
    if existing > 0 {
        debug!("Rent due {} already scheduled for flat {}", next_due, flat_model.id);
        return Ok(None);
    }

    let amount = flat_model.base_rent + current.amenities_total;
    let next = rent_payment::ActiveModel {
        flat_id: Set(flat_model.id),
        renter_id: Set(current.renter_id),
        due_date: Set(next_due),
        base_rent: Set(flat_model.base_rent),
        amenities_total: Set(current.amenities_total),
        late_fee: Set(Decimal::ZERO),
        amount: Set(amount),
        paid_amount: Set(Decimal::ZERO),
        status: Set(RentPaymentStatus::Pending),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| database_error("Failed to schedule next rent payment", e))?;

    info!("Scheduled rent of {} due {} for flat {}", amount, next_due, flat_model.id);
    Ok(Some(next))
}

/// Cancel an obligation nothing has been paid against
#[utoipa::path(
    post,
    path = "/api/v1/flats/{flat_id}/payments/{rent_payment_id}/cancel",
    tag = "payments",
    params(
        ("flat_id" = i32, Path, description = "Flat ID"),
        ("rent_payment_id" = i32, Path, description = "Rent payment ID"),
    ),
    responses(
        (status = 200, description = "Rent payment cancelled successfully", body = ApiResponse<RentPaymentDto>),
        (status = 404, description = "Rent payment not found", body = ErrorResponse),
        (status = 409, description = "Rent payment already has payments or is cancelled", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn cancel_rent_payment(
    Path((flat_id, rent_payment_id)): Path<(i32, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<RentPaymentDto>>, ApiError> {
    trace!("Entering cancel_rent_payment function for rent_payment_id: {}", rent_payment_id);

    let existing = find_rent_payment(&state.db, flat_id, rent_payment_id).await?;
    if existing.status == RentPaymentStatus::Cancelled {
        return Err(conflict(format!("Rent payment {} is already cancelled", rent_payment_id)));
    }
    if existing.paid_amount > Decimal::ZERO {
        warn!("Refusing to cancel rent payment {} with payments recorded", rent_payment_id);
        return Err(conflict(format!(
            "Rent payment {} has payments recorded and cannot be cancelled",
            rent_payment_id
        )));
    }

    let mut active: rent_payment::ActiveModel = existing.into();
    active.status = Set(RentPaymentStatus::Cancelled);
    let cancelled = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("Failed to cancel rent payment", e))?;

    info!("Rent payment {} of flat {} cancelled", rent_payment_id, flat_id);
    Ok(Json(ApiResponse {
        data: rent_payment_dto(cancelled, today()),
        message: "Rent payment cancelled successfully".to_string(),
        success: true,
    }))
}
