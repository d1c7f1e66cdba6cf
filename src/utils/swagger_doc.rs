use crate::utils::error::AppError;
use rocket_okapi::okapi::openapi3::{Response, Responses, MediaType};
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::RefOr;
use okapi::openapi3::SchemaObject;
use serde_json::json;

impl OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();

        // One documented example per booking error class
        let error_responses = [
            ("Malformed seat number, missing bus or negative amount", AppError::ValidationError("Seat number must be between 1 and 42".to_string())),
            ("Missing or invalid bearer token", AppError::AuthError("Unauthorized".to_string())),
            ("Booking, passenger, bus or payment does not exist", AppError::NotFound("Booking 42 not found".to_string())),
            ("Seat held by another active booking, or a concurrent update won", AppError::Conflict("Seat 12 is already assigned on bus KA-01 for the ONWARD journey".to_string())),
            ("Booking is not in a state that allows the operation", AppError::Unprocessable("Booking 42 is Cancelled".to_string())),
            ("Storage failure", AppError::DatabaseError("Internal Server Error".to_string())),
        ];

        for (description, error) in error_responses {
            responses.responses.insert(
                error.status().code.to_string(),
                RefOr::Object(Response {
                    description: description.to_string(),
                    content: [(
                        "application/json".to_string(),
                        MediaType {
                            schema: Some(SchemaObject::default()),
                            example: Some(json!({
                                "error": error.to_string()
                            })),
                            ..Default::default()
                        },
                    )]
                    .into_iter()
                    .collect(),
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}
