//! UI-agnostic request state
//!
//! The kiosk's whole lifecycle: Idle until a submission, Loading while the
//! single request is in flight, then Success or Failed. Both outcomes leave
//! the kiosk interactive again.

use crate::error::GenerateError;
use crate::media::MediaAttachment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Failed,
}

/// Everything a request needs, captured at submit time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub prompt: String,
    pub attachment: Option<MediaAttachment>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestState {
    pub prompt: String,
    pub attachment: Option<MediaAttachment>,
    pub phase: Phase,
    pub error: Option<String>,
    pub response: String,
    api_key_missing: bool,
}

impl RequestState {
    pub fn new(api_key_missing: bool) -> Self {
        Self {
            api_key_missing,
            ..Self::default()
        }
    }

    pub fn api_key_missing(&self) -> bool {
        self.api_key_missing
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Non-blank prompt or a staged attachment.
    pub fn has_input(&self) -> bool {
        !self.prompt.trim().is_empty() || self.attachment.is_some()
    }

    pub fn can_submit(&self) -> bool {
        self.has_input() && !self.is_loading() && !self.api_key_missing
    }

    /// Prompt box accepts typing.
    pub fn input_enabled(&self) -> bool {
        !self.is_loading() && !self.api_key_missing
    }

    /// Image and video controls are live.
    pub fn uploads_enabled(&self) -> bool {
        self.input_enabled() && self.attachment.is_none()
    }

    /// Move to Loading and hand back what to send, or `None` if the
    /// submission is not allowed right now.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if !self.can_submit() {
            return None;
        }

        self.phase = Phase::Loading;
        self.error = None;
        self.response.clear();

        Some(Submission {
            prompt: self.prompt.clone(),
            attachment: self.attachment.clone(),
        })
    }

    /// Record the outcome of the in-flight request. Returns false if nothing
    /// was in flight.
    pub fn finish(&mut self, result: Result<String, GenerateError>) -> bool {
        if !self.is_loading() {
            return false;
        }

        match result {
            Ok(text) => {
                self.response = text;
                self.phase = Phase::Success;
            }
            Err(err) => {
                self.error = Some(err.user_message());
                self.phase = Phase::Failed;
            }
        }
        true
    }

    /// Stage an attachment. Refused while uploads are disabled, which
    /// includes when one is already staged.
    pub fn attach(&mut self, media: MediaAttachment) -> bool {
        if !self.uploads_enabled() {
            return false;
        }
        self.attachment = Some(media);
        true
    }

    pub fn remove_attachment(&mut self) -> Option<MediaAttachment> {
        self.attachment.take()
    }

    /// Show an error that did not come from a request, such as a file that
    /// could not be read.
    pub fn report_error(&mut self, message: String) {
        self.error = Some(message);
    }
}
