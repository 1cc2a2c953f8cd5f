use common::{
    AdvancePaymentDto, AllocationPreviewDto, AllocationPreviewRequest, ApiResponse,
    ApplyAdvanceRequest, ApplyAdvanceResponse, AssignRenterRequest, CaretakerDto,
    CreateCaretakerRequest, CreateFlatRequest, CreateHouseRequest, CreateRenterRequest, FlatDto,
    HouseDto, NewAdvancePayment, RecordPaymentRequest, RecordPaymentResponse, RentPaymentDto,
    RenterDto, UpdateCaretakerRequest, UpdateFlatRequest, UpdateHouseRequest, UpdateRenterRequest,
};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache::{CacheTag, QueryCache};
use crate::error::{ClientError, Result};

/// HTTP client for the `/api/v1` surface.
///
/// There are no retries and no optimistic updates: a failed mutation leaves
/// the cache untouched, a successful one invalidates what it changed.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    cache: QueryCache,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_cache(base_url, QueryCache::default())
    }

    pub fn with_cache(base_url: impl Into<String>, cache: QueryCache) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ClientError::from_response(status, &body);
            warn!("Request failed with {}: {}", status, err);
            return Err(err);
        }

        let envelope: ApiResponse<T> =
            serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        Ok(envelope.data)
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("{} {}", method, path);
        let mut request = self.http.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::read(response).await
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send::<(), T>(Method::GET, path, None).await
    }

    async fn cached<T>(&self, path: &str, tags: &[CacheTag]) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        self.cache
            .get_or_load(path, tags, || self.fetch::<T>(path))
            .await
    }

    // Property reads

    pub async fn houses(&self) -> Result<Vec<HouseDto>> {
        self.cached("/houses", &[CacheTag::Houses]).await
    }

    pub async fn house(&self, house_id: i32) -> Result<HouseDto> {
        self.cached(&format!("/houses/{}", house_id), &[CacheTag::Houses])
            .await
    }

    pub async fn caretakers(&self) -> Result<Vec<CaretakerDto>> {
        self.cached("/caretakers", &[CacheTag::Caretakers]).await
    }

    pub async fn caretaker(&self, caretaker_id: i32) -> Result<CaretakerDto> {
        self.cached(&format!("/caretakers/{}", caretaker_id), &[CacheTag::Caretakers])
            .await
    }

    pub async fn renters(&self) -> Result<Vec<RenterDto>> {
        self.cached("/renters", &[CacheTag::Renters]).await
    }

    pub async fn renter(&self, renter_id: i32) -> Result<RenterDto> {
        self.cached(&format!("/renters/{}", renter_id), &[CacheTag::Renters])
            .await
    }

    pub async fn flats(&self, house_id: Option<i32>) -> Result<Vec<FlatDto>> {
        let path = match house_id {
            Some(house_id) => format!("/flats?house_id={}", house_id),
            None => "/flats".to_string(),
        };
        self.cached(&path, &[CacheTag::Flats]).await
    }

    pub async fn flat(&self, flat_id: i32) -> Result<FlatDto> {
        self.cached(&format!("/flats/{}", flat_id), &[CacheTag::Flat(flat_id)])
            .await
    }

    // Ledger reads

    pub async fn rent_payments(&self, flat_id: i32) -> Result<Vec<RentPaymentDto>> {
        self.cached(
            &format!("/flats/{}/payments", flat_id),
            &[CacheTag::RentPayments(flat_id)],
        )
        .await
    }

    pub async fn advance_payments(&self, flat_id: i32) -> Result<Vec<AdvancePaymentDto>> {
        self.cached(
            &format!("/flats/{}/advance-payments", flat_id),
            &[CacheTag::AdvancePayments(flat_id)],
        )
        .await
    }

    /// Server-side preview; never cached since it reflects live balances.
    pub async fn allocation_preview(
        &self,
        flat_id: i32,
        request: &AllocationPreviewRequest,
    ) -> Result<AllocationPreviewDto> {
        self.send(
            Method::POST,
            &format!("/flats/{}/allocation-preview", flat_id),
            Some(request),
        )
        .await
    }

    // Property mutations

    pub async fn create_house(&self, request: &CreateHouseRequest) -> Result<HouseDto> {
        let house = self.send(Method::POST, "/houses", Some(request)).await?;
        self.cache.invalidate(CacheTag::Houses).await;
        Ok(house)
    }

    pub async fn update_house(&self, house_id: i32, request: &UpdateHouseRequest) -> Result<HouseDto> {
        let house = self
            .send(Method::PUT, &format!("/houses/{}", house_id), Some(request))
            .await?;
        self.cache.invalidate(CacheTag::Houses).await;
        Ok(house)
    }

    /// Deleting a house takes its flats with it.
    pub async fn delete_house(&self, house_id: i32) -> Result<String> {
        let message = self
            .send::<(), String>(Method::DELETE, &format!("/houses/{}", house_id), None)
            .await?;
        self.cache
            .invalidate_many(&[CacheTag::Houses, CacheTag::Flats])
            .await;
        Ok(message)
    }

    pub async fn create_caretaker(&self, request: &CreateCaretakerRequest) -> Result<CaretakerDto> {
        let caretaker = self.send(Method::POST, "/caretakers", Some(request)).await?;
        self.cache.invalidate(CacheTag::Caretakers).await;
        Ok(caretaker)
    }

    pub async fn update_caretaker(
        &self,
        caretaker_id: i32,
        request: &UpdateCaretakerRequest,
    ) -> Result<CaretakerDto> {
        let caretaker = self
            .send(Method::PUT, &format!("/caretakers/{}", caretaker_id), Some(request))
            .await?;
        self.cache.invalidate(CacheTag::Caretakers).await;
        Ok(caretaker)
    }

    pub async fn delete_caretaker(&self, caretaker_id: i32) -> Result<String> {
        let message = self
            .send::<(), String>(Method::DELETE, &format!("/caretakers/{}", caretaker_id), None)
            .await?;
        // Houses drop the reference
        self.cache
            .invalidate_many(&[CacheTag::Caretakers, CacheTag::Houses])
            .await;
        Ok(message)
    }

    pub async fn create_renter(&self, request: &CreateRenterRequest) -> Result<RenterDto> {
        let renter = self.send(Method::POST, "/renters", Some(request)).await?;
        self.cache.invalidate(CacheTag::Renters).await;
        Ok(renter)
    }

    pub async fn update_renter(&self, renter_id: i32, request: &UpdateRenterRequest) -> Result<RenterDto> {
        let renter = self
            .send(Method::PUT, &format!("/renters/{}", renter_id), Some(request))
            .await?;
        self.cache.invalidate(CacheTag::Renters).await;
        Ok(renter)
    }

    pub async fn delete_renter(&self, renter_id: i32) -> Result<String> {
        let message = self
            .send::<(), String>(Method::DELETE, &format!("/renters/{}", renter_id), None)
            .await?;
        self.cache.invalidate(CacheTag::Renters).await;
        Ok(message)
    }

    pub async fn create_flat(&self, request: &CreateFlatRequest) -> Result<FlatDto> {
        let flat: FlatDto = self.send(Method::POST, "/flats", Some(request)).await?;
        self.cache
            .invalidate_many(&[CacheTag::Flats, CacheTag::Flat(flat.id)])
            .await;
        Ok(flat)
    }

    pub async fn update_flat(&self, flat_id: i32, request: &UpdateFlatRequest) -> Result<FlatDto> {
        let flat = self
            .send(Method::PUT, &format!("/flats/{}", flat_id), Some(request))
            .await?;
        self.cache
            .invalidate_many(&[CacheTag::Flats, CacheTag::Flat(flat_id)])
            .await;
        Ok(flat)
    }

    pub async fn delete_flat(&self, flat_id: i32) -> Result<String> {
        let message = self
            .send::<(), String>(Method::DELETE, &format!("/flats/{}", flat_id), None)
            .await?;
        self.cache
            .invalidate_many(&[
                CacheTag::Flats,
                CacheTag::Flat(flat_id),
                CacheTag::RentPayments(flat_id),
                CacheTag::AdvancePayments(flat_id),
            ])
            .await;
        Ok(message)
    }

    // Occupancy

    #[instrument(skip(self, request))]
    pub async fn assign_renter(&self, flat_id: i32, request: &AssignRenterRequest) -> Result<FlatDto> {
        let flat = self
            .send(Method::POST, &format!("/flats/{}/renter", flat_id), Some(request))
            .await?;
        self.invalidate_occupancy(flat_id).await;
        Ok(flat)
    }

    #[instrument(skip(self))]
    pub async fn vacate_flat(&self, flat_id: i32) -> Result<FlatDto> {
        let flat = self
            .send::<(), FlatDto>(Method::DELETE, &format!("/flats/{}/renter", flat_id), None)
            .await?;
        self.invalidate_occupancy(flat_id).await;
        Ok(flat)
    }

    async fn invalidate_occupancy(&self, flat_id: i32) {
        self.cache
            .invalidate_many(&[
                CacheTag::Flats,
                CacheTag::Flat(flat_id),
                CacheTag::Renters,
                CacheTag::AdvancePayments(flat_id),
            ])
            .await;
    }

    // Ledger mutations

    #[instrument(skip(self, request))]
    pub async fn record_payment(
        &self,
        flat_id: i32,
        request: &RecordPaymentRequest,
    ) -> Result<RecordPaymentResponse> {
        let response = self
            .send(Method::POST, &format!("/flats/{}/payments", flat_id), Some(request))
            .await?;
        self.cache
            .invalidate_many(&[
                CacheTag::RentPayments(flat_id),
                CacheTag::AdvancePayments(flat_id),
                CacheTag::Flat(flat_id),
            ])
            .await;
        Ok(response)
    }

    pub async fn cancel_rent_payment(&self, flat_id: i32, rent_payment_id: i32) -> Result<RentPaymentDto> {
        let payment = self
            .send::<(), RentPaymentDto>(
                Method::POST,
                &format!("/flats/{}/payments/{}/cancel", flat_id, rent_payment_id),
                None,
            )
            .await?;
        self.cache.invalidate(CacheTag::RentPayments(flat_id)).await;
        Ok(payment)
    }

    pub async fn create_advance_payment(
        &self,
        flat_id: i32,
        request: &NewAdvancePayment,
    ) -> Result<AdvancePaymentDto> {
        let advance = self
            .send(
                Method::POST,
                &format!("/flats/{}/advance-payments", flat_id),
                Some(request),
            )
            .await?;
        self.cache.invalidate(CacheTag::AdvancePayments(flat_id)).await;
        Ok(advance)
    }

    pub async fn delete_advance_payment(&self, flat_id: i32, advance_payment_id: i32) -> Result<String> {
        let message = self
            .send::<(), String>(
                Method::DELETE,
                &format!("/flats/{}/advance-payments/{}", flat_id, advance_payment_id),
                None,
            )
            .await?;
        self.cache.invalidate(CacheTag::AdvancePayments(flat_id)).await;
        Ok(message)
    }

    /// Applies advance credit to one obligation.
    ///
    /// On success both ledgers of the flat are invalidated so the next read
    /// shows the balances the server committed.
    #[instrument(skip(self, request))]
    pub async fn apply_advance(
        &self,
        flat_id: i32,
        request: &ApplyAdvanceRequest,
    ) -> Result<ApplyAdvanceResponse> {
        let response = self
            .send(
                Method::POST,
                &format!("/flats/{}/apply-advance", flat_id),
                Some(request),
            )
            .await?;
        self.cache
            .invalidate_many(&[
                CacheTag::RentPayments(flat_id),
                CacheTag::AdvancePayments(flat_id),
            ])
            .await;
        Ok(response)
    }
}
