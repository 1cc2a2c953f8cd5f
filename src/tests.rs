#[cfg(test)]
mod integration_tests {
    use crate::schemas::{ApiResponse, ErrorResponse};
    use crate::test_utils::test_utils::setup_test_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::NaiveDate;
    use common::{
        AdvancePaymentDto, AdvanceStatus, AllocationPreviewDto, AllocationPreviewRequest,
        AmenityInput, ApplyAdvanceRequest, ApplyAdvanceResponse, AssignRenterRequest,
        CreateCaretakerRequest, CreateFlatRequest, CreateHouseRequest, CreateRenterRequest,
        FlatDto, HouseDto, NewAdvancePayment, RecordPaymentRequest, RecordPaymentResponse,
        RentPaymentDto, RentStatus, UpdateFlatRequest,
    };
    use rust_decimal::Decimal;

    async fn test_server() -> TestServer {
        let app = setup_test_app().await;
        TestServer::new(app).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    async fn create_house(server: &TestServer) -> i32 {
        let response = server
            .post("/api/v1/houses")
            .json(&CreateHouseRequest {
                name: "Maple Court".to_string(),
                address: Some("12 Maple Street".to_string()),
                caretaker_id: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<ApiResponse<HouseDto>>().data.id
    }

    async fn create_flat(
        server: &TestServer,
        house_id: i32,
        base_rent: i64,
        late_fee_percentage: i64,
        amenities: Vec<AmenityInput>,
    ) -> FlatDto {
        let response = server
            .post("/api/v1/flats")
            .json(&CreateFlatRequest {
                house_id,
                number: "1A".to_string(),
                floor: Some(1),
                base_rent: dec(base_rent),
                late_fee_percentage: Some(dec(late_fee_percentage)),
                amenities,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<ApiResponse<FlatDto>>().data
    }

    async fn create_renter(server: &TestServer, name: &str) -> i32 {
        let response = server
            .post("/api/v1/renters")
            .json(&CreateRenterRequest {
                name: name.to_string(),
                phone: Some("555-0100".to_string()),
                email: Some("renter@example.com".to_string()),
                national_id: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<ApiResponse<serde_json::Value>>().data["id"]
            .as_i64()
            .unwrap() as i32
    }

    fn advance(amount: i64, paid_on: NaiveDate) -> NewAdvancePayment {
        NewAdvancePayment {
            amount: dec(amount),
            paid_amount: None,
            payment_date: paid_on,
            payment_method: Some("bank_transfer".to_string()),
            transaction_id: None,
            notes: None,
        }
    }

    async fn assign(
        server: &TestServer,
        flat_id: i32,
        renter_id: i32,
        advances: Vec<NewAdvancePayment>,
    ) {
        let response = server
            .post(&format!("/api/v1/flats/{}/renter", flat_id))
            .json(&AssignRenterRequest {
                renter_id,
                rent_start_date: date(2024, 1, 1),
                advance_payments: advances,
            })
            .await;
        response.assert_status(StatusCode::OK);
    }

    fn payment(due: NaiveDate, paid_on: NaiveDate, amount_paid: i64) -> RecordPaymentRequest {
        RecordPaymentRequest {
            rent_payment_id: None,
            due_date: due,
            payment_date: paid_on,
            amount_paid: dec(amount_paid),
            amenities: Vec::new(),
            late_fee_percentage: None,
            use_advance_payment: false,
            schedule_next_payment: false,
            payment_method: Some("cash".to_string()),
            transaction_id: None,
            notes: None,
        }
    }

    async fn get_advances(server: &TestServer, flat_id: i32) -> Vec<AdvancePaymentDto> {
        let response = server
            .get(&format!("/api/v1/flats/{}/advance-payments", flat_id))
            .await;
        response.assert_status(StatusCode::OK);
        response.json::<ApiResponse<Vec<AdvancePaymentDto>>>().data
    }

    /// Occupied flat with one unpaid obligation of 1000 and an advance of 600.
    async fn flat_with_obligation_and_advance(server: &TestServer) -> (i32, RentPaymentDto, AdvancePaymentDto) {
        let house_id = create_house(server).await;
        let flat = create_flat(server, house_id, 1000, 0, Vec::new()).await;
        let renter_id = create_renter(server, "Alice").await;
        assign(server, flat.id, renter_id, vec![advance(600, date(2024, 1, 1))]).await;

        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&payment(date(2024, 3, 1), date(2024, 3, 1), 0))
            .await;
        response.assert_status(StatusCode::CREATED);
        let rent = response.json::<ApiResponse<RecordPaymentResponse>>().data.payment;

        let advance = get_advances(server, flat.id).await.remove(0);
        (flat.id, rent, advance)
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = test_server().await;

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_house_with_caretaker() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/caretakers")
            .json(&CreateCaretakerRequest {
                name: "Bob".to_string(),
                phone: None,
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let caretaker_id = response.json::<ApiResponse<serde_json::Value>>().data["id"]
            .as_i64()
            .unwrap() as i32;

        let response = server
            .post("/api/v1/houses")
            .json(&CreateHouseRequest {
                name: "Oak House".to_string(),
                address: None,
                caretaker_id: Some(caretaker_id),
            })
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<HouseDto> = response.json();
        assert!(body.success);
        assert_eq!(body.message, "House created successfully");
        assert_eq!(body.data.caretaker_id, Some(caretaker_id));

        // Unknown caretaker is rejected
        let response = server
            .post("/api/v1/houses")
            .json(&CreateHouseRequest {
                name: "Elm House".to_string(),
                address: None,
                caretaker_id: Some(999),
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "VALIDATION_ERROR");
        assert!(!error.success);
    }

    #[tokio::test]
    async fn test_empty_house_name_is_rejected() {
        let server = test_server().await;

        let response = server
            .post("/api/v1/houses")
            .json(&CreateHouseRequest {
                name: String::new(),
                address: None,
                caretaker_id: None,
            })
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_flat_is_not_found() {
        let server = test_server().await;

        let response = server.get("/api/v1/flats/999").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let error: ErrorResponse = response.json();
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.error, "Flat with id 999 not found");
    }

    #[tokio::test]
    async fn test_flat_amenities_skip_unnamed_entries() {
        let server = test_server().await;
        let house_id = create_house(&server).await;

        let flat = create_flat(
            &server,
            house_id,
            5000,
            5,
            vec![AmenityInput::new("wifi", "200"), AmenityInput::new("", "999")],
        )
        .await;

        assert_eq!(flat.amenities.len(), 1);
        assert_eq!(flat.amenities[0].name, "wifi");
        assert_eq!(flat.amenities_total, dec(200));
        assert_eq!(flat.total_rent, dec(5200));
        assert_eq!(flat.renter_id, None);
    }

    #[tokio::test]
    async fn test_update_flat_replaces_amenities() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 5000, 5, vec![AmenityInput::new("wifi", "200")]).await;

        // Warm the cache
        server
            .get(&format!("/api/v1/flats/{}", flat.id))
            .await
            .assert_status(StatusCode::OK);

        let response = server
            .put(&format!("/api/v1/flats/{}", flat.id))
            .json(&UpdateFlatRequest {
                base_rent: Some(dec(5500)),
                amenities: Some(vec![
                    AmenityInput::new("parking", "300"),
                    AmenityInput::new("water", "100"),
                ]),
                ..Default::default()
            })
            .await;
        response.assert_status(StatusCode::OK);

        let response = server.get(&format!("/api/v1/flats/{}", flat.id)).await;
        response.assert_status(StatusCode::OK);
        let updated = response.json::<ApiResponse<FlatDto>>().data;
        assert_eq!(updated.base_rent, dec(5500));
        assert_eq!(updated.amenities.len(), 2);
        assert_eq!(updated.amenities_total, dec(400));
        assert_eq!(updated.total_rent, dec(5900));
    }

    #[tokio::test]
    async fn test_flats_filtered_by_house() {
        let server = test_server().await;
        let first_house = create_house(&server).await;
        let second_house = create_house(&server).await;
        create_flat(&server, first_house, 1000, 0, Vec::new()).await;
        create_flat(&server, first_house, 1100, 0, Vec::new()).await;
        create_flat(&server, second_house, 1200, 0, Vec::new()).await;

        let response = server
            .get(&format!("/api/v1/flats?house_id={}", first_house))
            .await;
        response.assert_status(StatusCode::OK);
        let flats = response.json::<ApiResponse<Vec<FlatDto>>>().data;
        assert_eq!(flats.len(), 2);
        assert!(flats.iter().all(|flat| flat.house_id == first_house));

        let response = server.get("/api/v1/flats").await;
        assert_eq!(response.json::<ApiResponse<Vec<FlatDto>>>().data.len(), 3);
    }

    #[tokio::test]
    async fn test_assign_and_vacate_renter() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;
        let alice = create_renter(&server, "Alice").await;
        let bob = create_renter(&server, "Bob").await;

        assign(&server, flat.id, alice, vec![advance(2000, date(2024, 1, 1))]).await;

        let advances = get_advances(&server, flat.id).await;
        assert_eq!(advances.len(), 1);
        assert_eq!(advances[0].remaining_amount, dec(2000));
        assert_eq!(advances[0].status, AdvanceStatus::Paid);

        // Occupied flats cannot be taken
        let response = server
            .post(&format!("/api/v1/flats/{}/renter", flat.id))
            .json(&AssignRenterRequest {
                renter_id: bob,
                rent_start_date: date(2024, 2, 1),
                advance_payments: Vec::new(),
            })
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<ErrorResponse>().code, "CONFLICT");

        // Renters in a flat cannot be deleted
        server
            .delete(&format!("/api/v1/renters/{}", bob))
            .await
            .assert_status(StatusCode::OK);
        let response = server.delete(&format!("/api/v1/renters/{}", alice)).await;
        response.assert_status(StatusCode::CONFLICT);

        let response = server.delete(&format!("/api/v1/flats/{}/renter", flat.id)).await;
        response.assert_status(StatusCode::OK);
        let vacated = response.json::<ApiResponse<FlatDto>>().data;
        assert_eq!(vacated.renter_id, None);
        assert_eq!(vacated.rent_start_date, None);

        server
            .delete(&format!("/api/v1/flats/{}/renter", flat.id))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_record_late_payment_adds_prorated_fee() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 3000, 5, Vec::new()).await;
        let renter_id = create_renter(&server, "Alice").await;
        assign(&server, flat.id, renter_id, Vec::new()).await;

        // 3000 * 5% / 30 * 10 days = 50
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&payment(date(2024, 1, 1), date(2024, 1, 11), 3050))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: ApiResponse<RecordPaymentResponse> = response.json();
        assert_eq!(body.message, "Payment recorded successfully");
        let recorded = body.data.payment;
        assert_eq!(recorded.late_fee, dec(50));
        assert_eq!(recorded.amount, dec(3050));
        assert_eq!(recorded.amount_due, Decimal::ZERO);
        assert_eq!(recorded.status, RentStatus::Paid);
        assert_eq!(recorded.renter_id, Some(renter_id));
        assert!(body.data.advance_applied.is_empty());
        assert!(body.data.next_payment.is_none());
    }

    #[tokio::test]
    async fn test_on_time_payment_has_no_fee() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 3000, 5, vec![AmenityInput::new("wifi", "200")]).await;
        let renter_id = create_renter(&server, "Alice").await;
        assign(&server, flat.id, renter_id, Vec::new()).await;

        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&payment(date(2024, 1, 10), date(2024, 1, 10), 1000))
            .await;
        response.assert_status(StatusCode::CREATED);

        let recorded = response.json::<ApiResponse<RecordPaymentResponse>>().data.payment;
        assert_eq!(recorded.late_fee, Decimal::ZERO);
        assert_eq!(recorded.amenities_total, dec(200));
        assert_eq!(recorded.amount, dec(3200));
        assert_eq!(recorded.amount_due, dec(2200));
        assert_eq!(recorded.status, RentStatus::Partial);
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;
        let renter_id = create_renter(&server, "Alice").await;
        assign(&server, flat.id, renter_id, Vec::new()).await;

        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&payment(date(2024, 1, 1), date(2024, 1, 1), 1500))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<ErrorResponse>().code, "VALIDATION_ERROR");

        let response = server.get(&format!("/api/v1/flats/{}/payments", flat.id)).await;
        assert!(response.json::<ApiResponse<Vec<RentPaymentDto>>>().data.is_empty());
    }

    #[tokio::test]
    async fn test_vacant_flat_cannot_take_rent() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;

        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&payment(date(2024, 1, 1), date(2024, 1, 1), 1000))
            .await;

        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_payment_consumes_oldest_advance_first() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1200, 0, Vec::new()).await;
        let renter_id = create_renter(&server, "Alice").await;
        assign(
            &server,
            flat.id,
            renter_id,
            vec![advance(500, date(2024, 1, 5)), advance(1000, date(2024, 1, 1))],
        )
        .await;

        let mut request = payment(date(2024, 2, 1), date(2024, 2, 1), 0);
        request.use_advance_payment = true;
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&request)
            .await;
        response.assert_status(StatusCode::CREATED);

        let recorded = response.json::<ApiResponse<RecordPaymentResponse>>().data;
        assert_eq!(recorded.advance_applied.len(), 2);
        assert_eq!(recorded.advance_applied[0].amount, dec(1000));
        assert_eq!(recorded.advance_applied[1].amount, dec(200));
        assert_eq!(recorded.payment.paid_amount, dec(1200));
        assert_eq!(recorded.payment.status, RentStatus::Paid);

        let advances = get_advances(&server, flat.id).await;
        let oldest = advances
            .iter()
            .find(|advance| advance.payment_date == date(2024, 1, 1))
            .unwrap();
        let newest = advances
            .iter()
            .find(|advance| advance.payment_date == date(2024, 1, 5))
            .unwrap();
        assert_eq!(oldest.remaining_amount, Decimal::ZERO);
        assert_eq!(oldest.status, AdvanceStatus::FullyUsed);
        assert_eq!(newest.remaining_amount, dec(300));
        assert_eq!(newest.status, AdvanceStatus::PartiallyUsed);
    }

    #[tokio::test]
    async fn test_schedule_next_payment_clamps_to_month_end() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, vec![AmenityInput::new("gas", "50")]).await;
        let renter_id = create_renter(&server, "Alice").await;
        assign(&server, flat.id, renter_id, Vec::new()).await;

        let mut request = payment(date(2024, 1, 31), date(2024, 1, 31), 1050);
        request.schedule_next_payment = true;
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&request)
            .await;
        response.assert_status(StatusCode::CREATED);

        let next = response
            .json::<ApiResponse<RecordPaymentResponse>>()
            .data
            .next_payment
            .unwrap();
        assert_eq!(next.due_date, date(2024, 2, 29));
        assert_eq!(next.amount, dec(1050));
        assert_eq!(next.paid_amount, Decimal::ZERO);

        let response = server.get(&format!("/api/v1/flats/{}/payments", flat.id)).await;
        let ledger = response.json::<ApiResponse<Vec<RentPaymentDto>>>().data;
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].due_date, date(2024, 2, 29));
    }

    #[tokio::test]
    async fn test_payment_settles_scheduled_obligation() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;
        let renter_id = create_renter(&server, "Alice").await;
        assign(&server, flat.id, renter_id, Vec::new()).await;

        let mut march = payment(date(2024, 3, 1), date(2024, 3, 1), 1000);
        march.schedule_next_payment = true;
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&march)
            .await;
        response.assert_status(StatusCode::CREATED);
        let scheduled = response
            .json::<ApiResponse<RecordPaymentResponse>>()
            .data
            .next_payment
            .unwrap();
        assert_eq!(scheduled.due_date, date(2024, 4, 1));

        // No id given: the scheduled April obligation is the one settled
        let april = payment(date(2024, 4, 1), date(2024, 4, 1), 1000);
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&april)
            .await;
        response.assert_status(StatusCode::CREATED);
        let settled = response.json::<ApiResponse<RecordPaymentResponse>>().data.payment;
        assert_eq!(settled.id, scheduled.id);
        assert_eq!(settled.status, RentStatus::Paid);

        let response = server.get(&format!("/api/v1/flats/{}/payments", flat.id)).await;
        let ledger = response.json::<ApiResponse<Vec<RentPaymentDto>>>().data;
        let aprils: Vec<_> = ledger
            .iter()
            .filter(|rent| rent.due_date == date(2024, 4, 1))
            .collect();
        assert_eq!(aprils.len(), 1);
        assert_eq!(aprils[0].status, RentStatus::Paid);

        server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&april)
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_negative_payment_is_rejected() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;
        let renter_id = create_renter(&server, "Alice").await;
        assign(&server, flat.id, renter_id, Vec::new()).await;

        server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&payment(date(2024, 1, 1), date(2024, 1, 1), -100))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        // Nested advances are validated too
        let bob = create_renter(&server, "Bob").await;
        let second_flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;
        server
            .post(&format!("/api/v1/flats/{}/renter", second_flat.id))
            .json(&AssignRenterRequest {
                renter_id: bob,
                rent_start_date: date(2024, 1, 1),
                advance_payments: vec![advance(-50, date(2024, 1, 1))],
            })
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let response = server.get(&format!("/api/v1/flats/{}/payments", flat.id)).await;
        assert!(response.json::<ApiResponse<Vec<RentPaymentDto>>>().data.is_empty());
    }

    #[tokio::test]
    async fn test_settle_existing_obligation() {
        let server = test_server().await;
        let (flat_id, rent, _) = flat_with_obligation_and_advance(&server).await;

        let mut request = payment(rent.due_date, date(2024, 3, 1), 1000);
        request.rent_payment_id = Some(rent.id);
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat_id))
            .json(&request)
            .await;
        response.assert_status(StatusCode::CREATED);
        let settled = response.json::<ApiResponse<RecordPaymentResponse>>().data.payment;
        assert_eq!(settled.id, rent.id);
        assert_eq!(settled.status, RentStatus::Paid);

        // Nothing left to pay
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat_id))
            .json(&request)
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_apply_advance_partially_pays_rent() {
        let server = test_server().await;
        let (flat_id, rent, advance) = flat_with_obligation_and_advance(&server).await;
        assert_eq!(rent.amount_due, dec(1000));
        assert_eq!(advance.remaining_amount, dec(600));

        let response = server
            .post(&format!("/api/v1/flats/{}/apply-advance", flat_id))
            .json(&ApplyAdvanceRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: dec(600),
            })
            .await;
        response.assert_status(StatusCode::OK);

        let applied = response.json::<ApiResponse<ApplyAdvanceResponse>>().data;
        assert_eq!(applied.rent_payment.paid_amount, dec(600));
        assert_eq!(applied.rent_payment.amount_due, dec(400));
        assert_eq!(applied.rent_payment.status, RentStatus::Partial);
        assert_eq!(applied.advance_payment.remaining_amount, Decimal::ZERO);
        assert_eq!(applied.advance_payment.status, AdvanceStatus::FullyUsed);

        // The exhausted advance cannot be drawn again
        let response = server
            .post(&format!("/api/v1/flats/{}/apply-advance", flat_id))
            .json(&ApplyAdvanceRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: dec(1),
            })
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_apply_advance_rejects_out_of_range_amounts() {
        let server = test_server().await;
        let (flat_id, rent, advance) = flat_with_obligation_and_advance(&server).await;

        for amount in [dec(0), dec(-5), dec(700)] {
            let response = server
                .post(&format!("/api/v1/flats/{}/apply-advance", flat_id))
                .json(&ApplyAdvanceRequest {
                    advance_payment_id: advance.id,
                    rent_payment_id: rent.id,
                    amount,
                })
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
        }

        // Over the advance balance is caught by the allocation rules
        let response = server
            .post(&format!("/api/v1/flats/{}/apply-advance", flat_id))
            .json(&ApplyAdvanceRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: dec(700),
            })
            .await;
        assert_eq!(response.json::<ErrorResponse>().code, "VALIDATION_ERROR");

        // Balances are untouched
        let advances = get_advances(&server, flat_id).await;
        assert_eq!(advances[0].remaining_amount, dec(600));
    }

    #[tokio::test]
    async fn test_apply_advance_fully_pays_rent() {
        let server = test_server().await;
        let (flat_id, rent, advance) = flat_with_obligation_and_advance(&server).await;

        // 400 in cash leaves exactly the advance balance due
        let mut request = payment(rent.due_date, date(2024, 3, 1), 400);
        request.rent_payment_id = Some(rent.id);
        server
            .post(&format!("/api/v1/flats/{}/payments", flat_id))
            .json(&request)
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(&format!("/api/v1/flats/{}/allocation-preview", flat_id))
            .json(&AllocationPreviewRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: None,
            })
            .await;
        let preview = response.json::<ApiResponse<AllocationPreviewDto>>().data;
        assert_eq!(preview.rent_due, dec(600));
        assert_eq!(preview.amount_to_apply, dec(600));
        assert!(preview.fully_pays);
        assert!(!preview.partially_pays);
        assert!(preview.exhausts_advance);

        let response = server
            .post(&format!("/api/v1/flats/{}/apply-advance", flat_id))
            .json(&ApplyAdvanceRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: preview.amount_to_apply,
            })
            .await;
        response.assert_status(StatusCode::OK);
        let applied = response.json::<ApiResponse<ApplyAdvanceResponse>>().data;
        assert_eq!(applied.rent_payment.paid_amount, dec(1000));
        assert_eq!(applied.rent_payment.amount_due, Decimal::ZERO);
        assert_eq!(applied.rent_payment.status, RentStatus::Paid);
        assert_eq!(applied.advance_payment.remaining_amount, Decimal::ZERO);
        assert_eq!(applied.advance_payment.status, AdvanceStatus::FullyUsed);
    }

    #[tokio::test]
    async fn test_advance_stays_with_its_renter() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;
        let alice = create_renter(&server, "Alice").await;
        let bob = create_renter(&server, "Bob").await;

        assign(&server, flat.id, alice, vec![advance(500, date(2024, 1, 1))]).await;
        server
            .delete(&format!("/api/v1/flats/{}/renter", flat.id))
            .await
            .assert_status(StatusCode::OK);
        assign(&server, flat.id, bob, Vec::new()).await;

        let mut request = payment(date(2024, 2, 1), date(2024, 2, 1), 0);
        request.use_advance_payment = true;
        let response = server
            .post(&format!("/api/v1/flats/{}/payments", flat.id))
            .json(&request)
            .await;
        response.assert_status(StatusCode::CREATED);
        let recorded = response.json::<ApiResponse<RecordPaymentResponse>>().data;
        assert!(recorded.advance_applied.is_empty());
        assert_eq!(recorded.payment.renter_id, Some(bob));
        assert_eq!(recorded.payment.paid_amount, Decimal::ZERO);

        let alice_advance = get_advances(&server, flat.id).await.remove(0);
        assert_eq!(alice_advance.renter_id, alice);
        assert_eq!(alice_advance.remaining_amount, dec(500));

        let response = server
            .post(&format!("/api/v1/flats/{}/apply-advance", flat.id))
            .json(&ApplyAdvanceRequest {
                advance_payment_id: alice_advance.id,
                rent_payment_id: recorded.payment.id,
                amount: dec(100),
            })
            .await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(get_advances(&server, flat.id).await[0].remaining_amount, dec(500));
    }

    #[tokio::test]
    async fn test_allocation_preview() {
        let server = test_server().await;
        let (flat_id, rent, advance) = flat_with_obligation_and_advance(&server).await;

        let response = server
            .post(&format!("/api/v1/flats/{}/allocation-preview", flat_id))
            .json(&AllocationPreviewRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: None,
            })
            .await;
        response.assert_status(StatusCode::OK);
        let preview = response.json::<ApiResponse<AllocationPreviewDto>>().data;
        assert_eq!(preview.rent_due, dec(1000));
        assert_eq!(preview.advance_available, dec(600));
        assert_eq!(preview.suggested_amount, dec(600));
        assert_eq!(preview.amount_to_apply, dec(600));
        assert_eq!(preview.new_rent_due, dec(400));
        assert_eq!(preview.remaining_advance, Decimal::ZERO);
        assert!(!preview.fully_pays);
        assert!(preview.partially_pays);
        assert!(preview.exhausts_advance);

        let response = server
            .post(&format!("/api/v1/flats/{}/allocation-preview", flat_id))
            .json(&AllocationPreviewRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: Some(dec(100)),
            })
            .await;
        let preview = response.json::<ApiResponse<AllocationPreviewDto>>().data;
        assert_eq!(preview.new_rent_due, dec(900));
        assert_eq!(preview.remaining_advance, dec(500));
        assert!(!preview.exhausts_advance);

        // Previewing changes nothing
        assert_eq!(get_advances(&server, flat_id).await[0].remaining_amount, dec(600));
    }

    #[tokio::test]
    async fn test_cancel_rent_payment() {
        let server = test_server().await;
        let (flat_id, rent, advance) = flat_with_obligation_and_advance(&server).await;

        let response = server
            .post(&format!("/api/v1/flats/{}/payments/{}/cancel", flat_id, rent.id))
            .await;
        response.assert_status(StatusCode::OK);
        assert_eq!(
            response.json::<ApiResponse<RentPaymentDto>>().data.status,
            RentStatus::Cancelled
        );

        server
            .post(&format!("/api/v1/flats/{}/payments/{}/cancel", flat_id, rent.id))
            .await
            .assert_status(StatusCode::CONFLICT);

        // Cancelled rent takes no advance
        let response = server
            .post(&format!("/api/v1/flats/{}/apply-advance", flat_id))
            .json(&ApplyAdvanceRequest {
                advance_payment_id: advance.id,
                rent_payment_id: rent.id,
                amount: dec(100),
            })
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_advance_payment_admin() {
        let server = test_server().await;
        let house_id = create_house(&server).await;
        let flat = create_flat(&server, house_id, 1000, 0, Vec::new()).await;

        // Vacant flats take no advances
        server
            .post(&format!("/api/v1/flats/{}/advance-payments", flat.id))
            .json(&advance(500, date(2024, 1, 1)))
            .await
            .assert_status(StatusCode::CONFLICT);

        let renter_id = create_renter(&server, "Alice").await;
        assign(&server, flat.id, renter_id, Vec::new()).await;

        let response = server
            .post(&format!("/api/v1/flats/{}/advance-payments", flat.id))
            .json(&advance(500, date(2024, 1, 1)))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created = response.json::<ApiResponse<AdvancePaymentDto>>().data;
        assert_eq!(created.renter_id, renter_id);
        assert_eq!(created.paid_amount, dec(500));

        server
            .post(&format!("/api/v1/flats/{}/advance-payments", flat.id))
            .json(&advance(0, date(2024, 1, 1)))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .delete(&format!("/api/v1/flats/{}/advance-payments/{}", flat.id, created.id))
            .await
            .assert_status(StatusCode::OK);
        assert!(get_advances(&server, flat.id).await.is_empty());

        server
            .delete(&format!("/api/v1/flats/{}/advance-payments/{}", flat.id, created.id))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
