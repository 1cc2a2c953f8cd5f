//! Common transport-layer types shared between the server and the client.
//! These structs are the request/response payloads of the REST API so the
//! client can deserialize responses without duplicating shapes.

mod ledger;
mod property;

pub use ledger::{
    AdvanceSliceDto, AdvanceStatus, AdvancePaymentDto, AllocationPreviewDto,
    AllocationPreviewRequest, ApplyAdvanceRequest, ApplyAdvanceResponse, NewAdvancePayment,
    RecordPaymentRequest, RecordPaymentResponse, RentPaymentDto, RentStatus,
};
pub use property::{
    AmenityDto, AmenityInput, AssignRenterRequest, CaretakerDto, CreateCaretakerRequest,
    CreateFlatRequest, CreateHouseRequest, CreateRenterRequest, FlatDto, HouseDto, RenterDto,
    UpdateCaretakerRequest, UpdateFlatRequest, UpdateHouseRequest, UpdateRenterRequest,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}

/// Error body returned by every failing endpoint.
///
/// Clients read `error` for the user-facing message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}
