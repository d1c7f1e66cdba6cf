use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};
use sqlx::MySqlPool;

use crate::config::AppConfig;
use crate::routes;
use crate::services::booking_service::BookingService;
use crate::services::cancellation_service::CancellationService;
use crate::services::journey_service::JourneyService;
use crate::services::passenger_service::PassengerService;
use crate::services::payment_service::PaymentService;
use crate::services::pricing_service::PricingService;
use crate::services::seat_service::SeatService;

fn swagger_ui() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/openapi.json".to_string(),
        ..Default::default()
    }
}

/// Wires every service onto one pool and mounts the API.
pub fn build(config: &AppConfig, pool: MySqlPool) -> Rocket<Build> {
    let pricing_service = PricingService::new(pool.clone(), config.pricing.clone());
    let booking_service = BookingService::new(pool.clone(), pricing_service.clone());
    let cancellation_service = CancellationService::new(pool.clone(), booking_service.clone());
    let payment_service = PaymentService::new(pool.clone());
    let passenger_service = PassengerService::new(pool.clone());
    let journey_service = JourneyService::new(pool.clone());
    let seat_service = SeatService::new(pool);

    rocket::build()
        .manage(config.auth.clone())
        .manage(pricing_service)
        .manage(booking_service)
        .manage(cancellation_service)
        .manage(payment_service)
        .manage(passenger_service)
        .manage(journey_service)
        .manage(seat_service)
        .mount(
            "/api",
            openapi_get_routes![
                routes::passenger_route::register_passenger,
                routes::passenger_route::get_passenger,
                routes::passenger_route::verify_passenger,
                routes::journey_route::list_journeys,
                routes::journey_route::list_buses,
                routes::journey_route::get_pricing_table,
                routes::booking_route::create_booking,
                routes::booking_route::register_walk_in,
                routes::booking_route::get_booking,
                routes::booking_route::list_bookings,
                routes::booking_route::assign_seat,
                routes::booking_route::set_custom_amount,
                routes::booking_route::complete_booking,
                routes::booking_route::get_seat_map,
                routes::booking_route::get_passenger_list,
                routes::payment_route::record_payment,
                routes::payment_route::list_payments,
                routes::payment_route::correct_receipt_date,
                routes::cancellation_route::cancel_leg,
                routes::cancellation_route::cancel_booking,
                routes::cancellation_route::process_refund,
                routes::cancellation_route::list_cancellations,
            ],
        )
        .mount("/swagger", make_swagger_ui(&swagger_ui()))
        .attach(AdHoc::on_response("CORS", |_, res| {
            Box::pin(async move {
                res.set_header(rocket::http::Header::new(
                    "Access-Control-Allow-Origin",
                    "*",
                ));
            })
        }))
}
