//! Private room inventory requests.
//!
//! Rooms are tracked individually, alongside the ward-level private room
//! pools that bookings draw from.

use crate::error::{BedError, Result};
use crate::input::{self, non_empty, parse_date};
use crate::providers::{FieldUpdate, NewPrivateRoom, RoomPatch};
use crate::types::{AcType, HospitalId, RoomStatus};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Room creation request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRoomRequest {
    /// Hospital.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub hospital_id: Option<i64>,
    /// Room number.
    pub room_number: Option<String>,
    /// Beds in the room (1 or 2).
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub bed_count: Option<i64>,
    /// `ac` or `non_ac`.
    pub ac_type: Option<String>,
    /// Attached bathroom, default false.
    #[serde(default)]
    pub has_attached_bathroom: Option<bool>,
    /// Initial status, default `available`.
    pub status: Option<String>,
    /// Daily rate, default 0.
    pub daily_rate: Option<f64>,
    /// Notes.
    pub notes: Option<String>,
}

impl CreateRoomRequest {
    /// Validate into a [`NewPrivateRoom`].
    ///
    /// # Errors
    ///
    /// Returns [`BedError::Validation`] naming the first missing or invalid
    /// field.
    pub fn validate(self) -> Result<NewPrivateRoom> {
        let hospital_id = self.hospital_id.ok_or_else(|| required("hospital_id"))?;
        let room_number = non_empty(self.room_number).ok_or_else(|| required("room_number"))?;
        let bed_count = self.bed_count.ok_or_else(|| required("bed_count"))?;
        let ac_type = non_empty(self.ac_type).ok_or_else(|| required("ac_type"))?;

        Ok(NewPrivateRoom {
            hospital_id: HospitalId(hospital_id),
            room_number,
            bed_count: bed_count_value(bed_count)?,
            has_attached_bathroom: self.has_attached_bathroom.unwrap_or(false),
            ac_type: room_ac_type(&ac_type)?,
            status: non_empty(self.status)
                .map(|s| s.parse::<RoomStatus>())
                .transpose()?
                .unwrap_or_default(),
            daily_rate: daily_rate_value(self.daily_rate.unwrap_or(0.0))?,
            notes: non_empty(self.notes),
        })
    }
}

/// Build a [`RoomPatch`] from a raw JSON object.
///
/// A key that is absent is left alone. For nullable fields, `null` or an
/// empty string clears the stored value. Unknown keys are ignored.
///
/// # Errors
///
/// Returns [`BedError::Validation`] when a value has the wrong type or is out
/// of range, or when no updatable field is present.
pub fn room_patch_from_json(body: &Map<String, Value>) -> Result<RoomPatch> {
    let mut patch = RoomPatch::default();

    if let Some(value) = body.get("room_number") {
        patch.room_number = Some(
            text(value, "room_number")?.ok_or_else(|| required("room_number"))?,
        );
    }
    if let Some(value) = body.get("bed_count") {
        let count = integer(value, "bed_count")?.ok_or_else(|| required("bed_count"))?;
        patch.bed_count = Some(bed_count_value(count)?);
    }
    if let Some(value) = body.get("has_attached_bathroom") {
        patch.has_attached_bathroom = Some(
            value
                .as_bool()
                .ok_or_else(|| invalid("has_attached_bathroom"))?,
        );
    }
    if let Some(value) = body.get("ac_type") {
        let ac_type = text(value, "ac_type")?.ok_or_else(|| required("ac_type"))?;
        patch.ac_type = Some(room_ac_type(&ac_type)?);
    }
    if let Some(value) = body.get("status") {
        let status = text(value, "status")?.ok_or_else(|| required("status"))?;
        patch.status = Some(status.parse()?);
    }
    if let Some(value) = body.get("daily_rate") {
        let rate = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .ok_or_else(|| invalid("daily_rate"))?;
        patch.daily_rate = Some(daily_rate_value(rate)?);
    }

    patch.patient_name = nullable_text(body, "patient_name")?;
    patch.patient_contact = nullable_text(body, "patient_contact")?;
    patch.notes = nullable_text(body, "notes")?;
    patch.admission_date = nullable_date(body, "admission_date")?;
    patch.expected_discharge_date = nullable_date(body, "expected_discharge_date")?;

    if patch.is_empty() {
        return Err(BedError::Validation("No fields to update".to_string()));
    }
    Ok(patch)
}

fn required(field: &str) -> BedError {
    BedError::Validation(format!("{field} is required"))
}

fn invalid(field: &str) -> BedError {
    BedError::Validation(format!("Invalid {field}"))
}

fn bed_count_value(count: i64) -> Result<i16> {
    match count {
        1 => Ok(1),
        2 => Ok(2),
        _ => Err(BedError::Validation("bed_count must be 1 or 2".to_string())),
    }
}

fn room_ac_type(value: &str) -> Result<AcType> {
    match value.parse()? {
        AcType::NotApplicable => Err(BedError::Validation(
            "ac_type must be ac or non_ac".to_string(),
        )),
        ac_type => Ok(ac_type),
    }
}

fn daily_rate_value(rate: f64) -> Result<f64> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(rate)
    } else {
        Err(invalid("daily_rate"))
    }
}

/// `null` and blank strings are `None`.
fn text(value: &Value, field: &str) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(non_empty(Some(s.clone()))),
        Value::Number(n) => Ok(Some(n.to_string())),
        _ => Err(invalid(field)),
    }
}

fn integer(value: &Value, field: &str) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| invalid(field)),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse().map(Some).map_err(|_| invalid(field)),
        _ => Err(invalid(field)),
    }
}

fn nullable_text(body: &Map<String, Value>, field: &str) -> Result<FieldUpdate<String>> {
    Ok(match body.get(field) {
        None => FieldUpdate::Keep,
        Some(value) => text(value, field)?.map_or(FieldUpdate::Clear, FieldUpdate::Set),
    })
}

fn nullable_date(
    body: &Map<String, Value>,
    field: &str,
) -> Result<FieldUpdate<chrono::NaiveDate>> {
    let Some(value) = body.get(field) else {
        return Ok(FieldUpdate::Keep);
    };
    match text(value, field)? {
        None => Ok(FieldUpdate::Clear),
        Some(date) => parse_date(field, &date)
            .map(FieldUpdate::Set)
            .map_err(BedError::Validation),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_create_defaults() {
        let room: CreateRoomRequest = serde_json::from_value(json!({
            "hospital_id": 4, "room_number": "101", "bed_count": "2", "ac_type": "ac"
        }))
        .unwrap();
        let room = room.validate().unwrap();
        assert_eq!(room.bed_count, 2);
        assert_eq!(room.status, RoomStatus::Available);
        assert!(!room.has_attached_bathroom);
        assert!(room.daily_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn test_create_reports_first_missing_field() {
        let err = CreateRoomRequest {
            hospital_id: Some(1),
            room_number: Some("101".into()),
            ..CreateRoomRequest::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "bed_count is required");
    }

    #[test]
    fn test_create_rejects_bad_bed_count_and_ac_type() {
        let base = CreateRoomRequest {
            hospital_id: Some(1),
            room_number: Some("101".into()),
            bed_count: Some(3),
            ac_type: Some("ac".into()),
            ..CreateRoomRequest::default()
        };
        assert_eq!(base.clone().validate().unwrap_err().to_string(), "bed_count must be 1 or 2");

        let err = CreateRoomRequest {
            bed_count: Some(1),
            ac_type: Some("not_applicable".into()),
            ..base
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "ac_type must be ac or non_ac");
    }

    #[test]
    fn test_patch_distinguishes_absent_null_and_empty() {
        let patch = room_patch_from_json(&object(json!({
            "status": "occupied",
            "patient_name": "Ana",
            "patient_contact": "",
            "notes": null,
            "admission_date": "2025-04-01"
        })))
        .unwrap();
        assert_eq!(patch.status, Some(RoomStatus::Occupied));
        assert_eq!(patch.patient_name, FieldUpdate::Set("Ana".to_string()));
        assert_eq!(patch.patient_contact, FieldUpdate::Clear);
        assert_eq!(patch.notes, FieldUpdate::Clear);
        assert!(patch.expected_discharge_date.is_keep());
        assert!(matches!(patch.admission_date, FieldUpdate::Set(_)));
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let err = room_patch_from_json(&object(json!({"unknown": 1}))).unwrap_err();
        assert_eq!(err.to_string(), "No fields to update");
    }

    #[test]
    fn test_patch_rejects_invalid_values() {
        assert!(room_patch_from_json(&object(json!({"bed_count": 5}))).is_err());
        assert!(room_patch_from_json(&object(json!({"daily_rate": -1}))).is_err());
        assert!(room_patch_from_json(&object(json!({"status": "gone"}))).is_err());
        assert!(room_patch_from_json(&object(json!({"room_number": ""}))).is_err());
    }
}
