use crate::error::{ClassifyError, SessionError};
use crate::models::classify_types::{ClassificationResult, ResultView};
use crate::models::ui_types::UiSnapshot;
use crate::services::acquisition::AcquiredImage;
use crate::services::classifier::client::ClassifierClient;
use crate::services::classifier::encoding;
use image::DynamicImage;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::{AbortHandle, JoinHandle};

/// Inputs to the screen's state machine.
#[derive(Debug)]
pub enum SessionEvent {
    Acquired(AcquiredImage),
    AcquisitionFailed(String),
    Cleared,
    AttemptStarted,
    AttemptSucceeded {
        generation: u64,
        result: ClassificationResult,
    },
    AttemptFailed {
        generation: u64,
        error: ClassifyError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// Completion of an attempt whose image has since been replaced or cleared.
    Stale,
    Rejected(SessionError),
}

/// Screen state. `error` and `result` are never both set.
#[derive(Debug, Default)]
pub struct UiState {
    pub image: Option<AcquiredImage>,
    pub result: Option<ClassificationResult>,
    pub is_loading: bool,
    pub error: Option<String>,
    generation: u64,
}

impl UiState {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn apply(&mut self, event: SessionEvent) -> Transition {
        match event {
            SessionEvent::Acquired(image) => {
                self.generation += 1;
                self.image = Some(image);
                self.result = None;
                self.error = None;
                self.is_loading = false;
                Transition::Applied
            }
            SessionEvent::AcquisitionFailed(message) => {
                self.error = Some(message);
                self.result = None;
                Transition::Applied
            }
            SessionEvent::Cleared => {
                self.generation += 1;
                self.image = None;
                self.result = None;
                self.error = None;
                self.is_loading = false;
                Transition::Applied
            }
            SessionEvent::AttemptStarted => {
                if self.is_loading {
                    return Transition::Rejected(SessionError::AlreadyLoading);
                }
                if self.image.is_none() {
                    return Transition::Rejected(SessionError::NoImage);
                }
                self.is_loading = true;
                self.result = None;
                self.error = None;
                Transition::Applied
            }
            SessionEvent::AttemptSucceeded { generation, result } => {
                if generation != self.generation || !self.is_loading {
                    return Transition::Stale;
                }
                self.is_loading = false;
                self.error = None;
                self.result = Some(result);
                Transition::Applied
            }
            SessionEvent::AttemptFailed { generation, error } => {
                if generation != self.generation || !self.is_loading {
                    return Transition::Stale;
                }
                self.is_loading = false;
                self.result = None;
                self.error = Some(error.to_string());
                Transition::Applied
            }
        }
    }

    pub fn snapshot(&self) -> UiSnapshot {
        UiSnapshot {
            image: self.image.as_ref().map(|i| i.preview.clone()),
            result: self.result.as_ref().map(ResultView::from),
            is_loading: self.is_loading,
            error: self.error.clone(),
        }
    }
}

struct SessionInner {
    state: UiState,
    in_flight: Option<AbortHandle>,
}

/// Shared handle to the screen state and its in-flight attempt.
#[derive(Clone)]
pub struct SignatureSession {
    inner: Arc<Mutex<SessionInner>>,
}

impl Default for SignatureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureSession {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                state: UiState::default(),
                in_flight: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        // Events are applied whole, so a poisoned lock still guards valid state.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Apply an event. Acquisitions and clears abort any in-flight attempt.
    pub fn apply(&self, event: SessionEvent) -> Transition {
        let mut inner = self.lock();
        if matches!(event, SessionEvent::Acquired(_) | SessionEvent::Cleared) {
            if let Some(handle) = inner.in_flight.take() {
                log::info!("Aborting in-flight classification");
                handle.abort();
            }
        }
        inner.state.apply(event)
    }

    pub fn snapshot(&self) -> UiSnapshot {
        self.lock().state.snapshot()
    }

    #[cfg(test)]
    pub fn is_loading(&self) -> bool {
        self.lock().state.is_loading
    }

    #[cfg(test)]
    fn has_in_flight(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    /// Abort the in-flight attempt without touching the image.
    pub fn abort_in_flight(&self) {
        let mut inner = self.lock();
        if let Some(handle) = inner.in_flight.take() {
            handle.abort();
            inner.state.is_loading = false;
        }
    }

    /// Apply the outcome of a gallery or camera acquisition.
    pub fn record_acquisition<E: std::fmt::Display>(
        &self,
        source: &str,
        outcome: Result<AcquiredImage, E>,
    ) -> UiSnapshot {
        let event = match outcome {
            Ok(image) => {
                log::info!(
                    "Acquired image from {} ({}x{})",
                    source,
                    image.bitmap.width(),
                    image.bitmap.height()
                );
                SessionEvent::Acquired(image)
            }
            Err(e) => {
                log::warn!("Failed to load image from {}: {}", source, e);
                SessionEvent::AcquisitionFailed(format!("Failed to load image: {}", e))
            }
        };
        self.apply(event);
        self.snapshot()
    }

    fn finish(&self, generation: u64, outcome: Result<ClassificationResult, ClassifyError>) -> Transition {
        let mut inner = self.lock();
        let event = match outcome {
            Ok(result) => SessionEvent::AttemptSucceeded { generation, result },
            Err(error) => SessionEvent::AttemptFailed { generation, error },
        };
        let transition = inner.state.apply(event);
        if transition == Transition::Applied {
            inner.in_flight = None;
        }
        transition
    }

    /// Start a classification attempt for the current image on a background task.
    ///
    /// `publish` receives a snapshot after the attempt starts and after it resolves.
    pub fn spawn_attempt<F>(
        &self,
        client: ClassifierClient,
        publish: F,
    ) -> Result<JoinHandle<()>, SessionError>
    where
        F: Fn(UiSnapshot) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        if let Transition::Rejected(e) = inner.state.apply(SessionEvent::AttemptStarted) {
            return Err(e);
        }
        let generation = inner.state.generation();
        let image = inner
            .state
            .image
            .as_ref()
            .map(|i| i.bitmap.clone())
            .ok_or(SessionError::NoImage)?;
        log::info!("Classification attempt started (generation {})", generation);

        // Published under the lock so it cannot overtake the completion snapshot
        publish(inner.state.snapshot());

        let session = self.clone();
        let handle = tokio::spawn(async move {
            let outcome = classify_image(&client, image).await;
            match &outcome {
                Ok(r) => log::info!(
                    "Classification finished: {} ({:.2})",
                    r.predicted_class.class_name,
                    r.predicted_class.probability
                ),
                Err(e) => log::warn!("Classification failed: {}", e),
            }
            if session.finish(generation, outcome) == Transition::Applied {
                publish(session.snapshot());
            } else {
                log::debug!("Dropping stale result for generation {}", generation);
            }
        });

        // Tracked under the same lock, so a clear or acquisition can always abort it
        inner.in_flight = Some(handle.abort_handle());
        Ok(handle)
    }
}

/// Encode off the async executor, then upload.
pub async fn classify_image(
    client: &ClassifierClient,
    image: Arc<DynamicImage>,
) -> Result<ClassificationResult, ClassifyError> {
    let jpeg = tokio::task::spawn_blocking(move || encoding::encode_jpeg(&image))
        .await
        .map_err(|e| ClassifyError::Encoding(format!("Task join failed: {}", e)))??;
    client.classify(jpeg).await
}
