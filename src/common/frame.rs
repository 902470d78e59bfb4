use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// An already-encoded video frame (base64 JPEG), opaque to this crate.
#[derive(Clone, Debug)]
pub struct EncodedFrame {
    frame_id: Uuid,
    payload: Arc<str>,
    captured_at: DateTime<Utc>,
}

impl EncodedFrame {
    pub fn new(payload: impl Into<Arc<str>>, captured_at: DateTime<Utc>) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            payload: payload.into(),
            captured_at,
        }
    }

    pub fn now(payload: impl Into<Arc<str>>) -> Self {
        Self::new(payload, Utc::now())
    }

    pub fn frame_id(&self) -> Uuid {
        self.frame_id
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Payload with any `data:image/...;base64,` prefix removed.
    pub fn base64(&self) -> &str {
        match self.payload.split_once(',') {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => &self.payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloning_frame_shares_payload() {
        let f1 = EncodedFrame::now("aGVsbG8=");
        let f2 = f1.clone();
        assert!(Arc::ptr_eq(&f1.payload, &f2.payload));
        assert_eq!(f1.frame_id(), f2.frame_id());
    }

    #[test]
    fn data_url_prefix_is_stripped() {
        let frame = EncodedFrame::now("data:image/jpeg;base64,/9j/4AAQ");
        assert_eq!(frame.base64(), "/9j/4AAQ");

        let bare = EncodedFrame::now("/9j/4AAQ");
        assert_eq!(bare.base64(), "/9j/4AAQ");
    }
}
