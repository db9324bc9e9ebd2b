//! Business metrics for the bed booking service.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `pocketcare_bed_bookings_total{outcome}` - Booking attempts by outcome
//!   (confirmed, capacity_exhausted, rejected)
//! - `pocketcare_beds_released_total` - Beds returned to a ward's available pool
//! - `pocketcare_capacity_exhausted_total{ward_type}` - Bookings refused for lack of beds
//! - `pocketcare_booking_transitions_total{to}` - Booking status changes by target status
//!
//! ## Gauges
//! - `pocketcare_reserved_beds` - Beds currently held by bookings made through this process

use crate::types::{BookingStatus, WardType};
use metrics::{describe_counter, describe_gauge};

/// Register metric descriptions. Call once at startup, before recording.
pub fn register_bed_metrics() {
    describe_counter!(
        "pocketcare_bed_bookings_total",
        "Bed booking attempts by outcome (confirmed, capacity_exhausted, rejected)"
    );
    describe_counter!(
        "pocketcare_beds_released_total",
        "Beds returned to the available pool by cancellations and status changes"
    );
    describe_counter!(
        "pocketcare_capacity_exhausted_total",
        "Bookings refused because the ward had no available bed"
    );
    describe_counter!(
        "pocketcare_booking_transitions_total",
        "Booking status changes by target status"
    );
    describe_gauge!(
        "pocketcare_reserved_beds",
        "Net beds reserved by bookings since process start"
    );

    tracing::info!("Bed metrics registered");
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a confirmed booking.
pub fn record_booking_confirmed(ward_type: WardType) {
    metrics::counter!("pocketcare_bed_bookings_total", "outcome" => "confirmed").increment(1);
    metrics::gauge!("pocketcare_reserved_beds").increment(1.0);
    tracing::debug!(%ward_type, "Recorded booking_confirmed metric");
}

/// Record a booking refused because no bed was available.
pub fn record_capacity_exhausted(ward_type: WardType) {
    metrics::counter!("pocketcare_bed_bookings_total", "outcome" => "capacity_exhausted")
        .increment(1);
    metrics::counter!("pocketcare_capacity_exhausted_total", "ward_type" => ward_type.as_str())
        .increment(1);
    tracing::debug!(%ward_type, "Recorded capacity_exhausted metric");
}

/// Record a booking request rejected by validation.
pub fn record_booking_rejected() {
    metrics::counter!("pocketcare_bed_bookings_total", "outcome" => "rejected").increment(1);
}

/// Record one bed returned to a ward.
pub fn record_bed_released() {
    metrics::counter!("pocketcare_beds_released_total").increment(1);
    metrics::gauge!("pocketcare_reserved_beds").decrement(1.0);
}

/// Record a booking status change.
pub fn record_booking_transition(to: BookingStatus) {
    metrics::counter!("pocketcare_booking_transitions_total", "to" => to.as_str()).increment(1);
}
