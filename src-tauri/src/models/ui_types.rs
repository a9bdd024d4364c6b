use crate::models::classify_types::ResultView;
use serde::Serialize;

/// Display-sized copy of the acquired image, ready for an `<img>` tag.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ImagePreview {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

/// Serializable view of the session, sent with every `signature-state` event.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
pub struct UiSnapshot {
    pub image: Option<ImagePreview>,
    pub result: Option<ResultView>,
    pub is_loading: bool,
    pub error: Option<String>,
}
