#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        match components.schemas.get(name).unwrap() {
            utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(obj)) => {
                obj.properties.keys().cloned().collect()
            }
            _ => panic!("{} should be an object schema", name),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        assert!(openapi.components.is_some());
        let components = openapi.components.as_ref().unwrap();
        for schema in [
            "ErrorResponse",
            "HealthResponse",
            "FlatDto",
            "RentPaymentDto",
            "AdvancePaymentDto",
            "ApplyAdvanceRequest",
            "AllocationPreviewDto",
        ] {
            assert!(components.schemas.contains_key(schema), "missing schema {}", schema);
        }

        let json_result = serde_json::to_string(&openapi);
        assert!(json_result.is_ok());
    }

    #[test]
    fn test_ledger_paths_are_documented() {
        let openapi = ApiDoc::openapi();
        for path in [
            "/api/v1/flats/{flat_id}/payments",
            "/api/v1/flats/{flat_id}/apply-advance",
            "/api/v1/flats/{flat_id}/allocation-preview",
            "/api/v1/flats/{flat_id}/advance-payments/{advance_payment_id}",
        ] {
            assert!(openapi.paths.paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        assert!(properties.contains(&"error".to_string()));
        assert!(properties.contains(&"code".to_string()));
        assert!(properties.contains(&"success".to_string()));
    }

    #[test]
    fn test_allocation_preview_schema_structure() {
        let properties = object_properties("AllocationPreviewDto");
        for field in ["suggested_amount", "fully_pays", "partially_pays", "exhausts_advance"] {
            assert!(properties.contains(&field.to_string()), "missing field {}", field);
        }
    }
}
