//! JSON wire format for capture-client ↔ collector communication.
//!
//! Self-contained: the shapes here are exactly what crosses the HTTP
//! boundary, camelCase field names included.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::pose::{Landmark, PoseFrame};

// --- Client → collector ---

/// POST /pose-landmarks body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkPayload {
    pub landmarks: Vec<Landmark>,
    pub timestamp: String,
    pub session_id: String,
}

impl LandmarkPayload {
    /// Build the wire payload from a frame, defaulting missing visibility
    /// to 1.0 so the collector always sees a concrete value.
    pub fn from_frame(frame: &PoseFrame) -> Self {
        let landmarks = frame
            .landmarks
            .iter()
            .map(|lm| Landmark {
                visibility: Some(lm.visibility_or_default()),
                ..*lm
            })
            .collect();

        Self {
            landmarks,
            timestamp: format_timestamp(frame.captured_at),
            session_id: frame.session_id.clone(),
        }
    }
}

// --- Collector responses ---

/// 200 response for an accepted frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestAck {
    pub success: bool,
    pub message: String,
    pub id: u64,
}

/// 400/500 error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// One stored entry, as returned by GET /pose-data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseEntry {
    pub id: u64,
    pub landmarks: Vec<Landmark>,
    /// Client-supplied capture time.
    pub timestamp: String,
    pub session_id: String,
    /// Server-assigned arrival time.
    pub received_at: String,
}

/// GET /pose-data response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseDataResponse {
    pub total: usize,
    pub data: Vec<PoseEntry>,
}

/// GET /health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub stored_entries: usize,
}

/// RFC 3339 with millisecond precision, UTC "Z" suffix.
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::LandmarkIndex;

    #[test]
    fn test_payload_defaults_visibility() {
        let landmarks = [Landmark::new(0.5, 0.5, 0.0); LandmarkIndex::COUNT];
        let frame = PoseFrame::new(landmarks, "s1".to_string(), Utc::now());

        let payload = LandmarkPayload::from_frame(&frame);
        assert_eq!(payload.landmarks.len(), 33);
        assert!(payload.landmarks.iter().all(|lm| lm.visibility == Some(1.0)));
        assert_eq!(payload.session_id, "s1");
    }

    #[test]
    fn test_payload_wire_field_names() {
        let landmarks = [Landmark::new(0.0, 0.0, 0.0); LandmarkIndex::COUNT];
        let frame = PoseFrame::new(landmarks, "s1".to_string(), Utc::now());

        let json = serde_json::to_value(LandmarkPayload::from_frame(&frame)).unwrap();
        assert!(json.get("sessionId").is_some());
        assert!(json.get("timestamp").is_some());
        assert_eq!(json["landmarks"].as_array().unwrap().len(), 33);
    }

    #[test]
    fn test_timestamp_format() {
        let t = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.500Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(t), "2024-05-01T12:00:00.500Z");
    }
}
