pub mod booking_service;
pub mod cancellation_service;
pub mod journey_service;
pub mod passenger_service;
pub mod payment_service;
pub mod pricing_service;
pub mod seat_service;
