use common::{
    AdvancePaymentDto, AdvanceSliceDto, AdvanceStatus, AllocationPreviewDto,
    AllocationPreviewRequest, AmenityDto, AmenityInput, ApplyAdvanceRequest, ApplyAdvanceResponse,
    AssignRenterRequest, CaretakerDto, CreateCaretakerRequest, CreateFlatRequest,
    CreateHouseRequest, CreateRenterRequest, FlatDto, HouseDto, NewAdvancePayment,
    RecordPaymentRequest, RecordPaymentResponse, RentPaymentDto, RentStatus, RenterDto,
    UpdateCaretakerRequest, UpdateFlatRequest, UpdateHouseRequest, UpdateRenterRequest,
};
use compute::ProrationBase;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::Validate;

pub use common::{ApiResponse, ErrorResponse};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache of assembled read models
    pub cache: Cache<String, CachedData>,
    /// Day count used to prorate late fees
    pub proration: ProrationBase,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Flat(FlatDto),
}

/// Query parameters for listing flats
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct FlatQuery {
    /// Only flats of this house
    #[validate(range(min = 1))]
    pub house_id: Option<i32>,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::houses::create_house,
        crate::handlers::houses::get_houses,
        crate::handlers::houses::get_house,
        crate::handlers::houses::update_house,
        crate::handlers::houses::delete_house,
        crate::handlers::caretakers::create_caretaker,
        crate::handlers::caretakers::get_caretakers,
        crate::handlers::caretakers::get_caretaker,
        crate::handlers::caretakers::update_caretaker,
        crate::handlers::caretakers::delete_caretaker,
        crate::handlers::renters::create_renter,
        crate::handlers::renters::get_renters,
        crate::handlers::renters::get_renter,
        crate::handlers::renters::update_renter,
        crate::handlers::renters::delete_renter,
        crate::handlers::flats::create_flat,
        crate::handlers::flats::get_flats,
        crate::handlers::flats::get_flat,
        crate::handlers::flats::update_flat,
        crate::handlers::flats::delete_flat,
        crate::handlers::flats::assign_renter,
        crate::handlers::flats::vacate_flat,
        crate::handlers::payments::get_rent_payments,
        crate::handlers::payments::record_payment,
        crate::handlers::payments::cancel_rent_payment,
        crate::handlers::advances::get_advance_payments,
        crate::handlers::advances::create_advance_payment,
        crate::handlers::advances::delete_advance_payment,
        crate::handlers::advances::apply_advance,
        crate::handlers::advances::allocation_preview,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            FlatQuery,
            CreateHouseRequest,
            UpdateHouseRequest,
            HouseDto,
            CreateCaretakerRequest,
            UpdateCaretakerRequest,
            CaretakerDto,
            CreateRenterRequest,
            UpdateRenterRequest,
            RenterDto,
            AmenityInput,
            AmenityDto,
            CreateFlatRequest,
            UpdateFlatRequest,
            FlatDto,
            AssignRenterRequest,
            NewAdvancePayment,
            AdvancePaymentDto,
            AdvanceStatus,
            RentPaymentDto,
            RentStatus,
            RecordPaymentRequest,
            RecordPaymentResponse,
            AdvanceSliceDto,
            ApplyAdvanceRequest,
            ApplyAdvanceResponse,
            AllocationPreviewRequest,
            AllocationPreviewDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "houses", description = "Houses and their caretakers"),
        (name = "caretakers", description = "Caretaker directory"),
        (name = "renters", description = "Renter directory"),
        (name = "flats", description = "Flats, amenities and occupancy"),
        (name = "payments", description = "Rent obligations and payments"),
        (name = "advances", description = "Advance payments and their allocation to rent"),
    ),
    info(
        title = "RentDesk API",
        description = "Back office for rental properties: flats, renters, rent and advance payments",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
