//! Upload command listener.
//!
//! The cloud side requests an image by publishing the destination URL on the
//! device's command topic. The listener only records the request; capturing
//! and uploading happen later on an application task through an
//! [`ImageUploader`], away from the event loop.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::String;

use crate::runtime::SubscribeListener;

/// Longest URL accepted in an upload command.
pub const MAX_URL_LEN: usize = 256;

/// A pending request to capture an image and upload it to `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    url: String<MAX_URL_LEN>,
}

impl UploadRequest {
    pub fn new(url: &str) -> Option<Self> {
        if url.is_empty() {
            return None;
        }
        let mut owned = String::new();
        owned.push_str(url).ok()?;
        Some(Self { url: owned })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// Captures a frame and stores it at the requested location.
#[allow(async_fn_in_trait)]
pub trait ImageUploader {
    type Error: core::fmt::Debug;

    async fn upload(&mut self, request: &UploadRequest) -> Result<(), Self::Error>;
}

/// Keeps the most recent upload command received on the command topic.
pub struct UrlCommandListener<M: RawMutex> {
    pending: Mutex<M, RefCell<Option<UploadRequest>>>,
}

impl<M: RawMutex> UrlCommandListener<M> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(RefCell::new(None)),
        }
    }

    /// Take the pending request, if any.
    pub fn take_pending(&self) -> Option<UploadRequest> {
        self.pending.lock(|pending| pending.borrow_mut().take())
    }

    /// Run the pending request through `uploader`.
    ///
    /// Returns `None` when nothing was pending.
    pub async fn service<U: ImageUploader>(&self, uploader: &mut U) -> Option<Result<(), U::Error>> {
        let request = self.take_pending()?;
        info!("uploading image to {}", request.url());

        let result = uploader.upload(&request).await;
        match &result {
            Ok(()) => info!("upload to {} complete", request.url()),
            Err(err) => error!("upload to {} failed: {:?}", request.url(), err),
        }
        Some(result)
    }
}

impl<M: RawMutex> Default for UrlCommandListener<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex + Sync> SubscribeListener for UrlCommandListener<M> {
    fn on_message(&self, topic: &str, payload: &[u8]) {
        let Ok(url) = core::str::from_utf8(payload) else {
            warn!("ignoring non UTF-8 command on {}", topic);
            return;
        };
        let Some(request) = UploadRequest::new(url) else {
            warn!("ignoring command on {}: empty or longer than {} bytes", topic, MAX_URL_LEN);
            return;
        };

        info!("upload requested on {}: {}", topic, url);
        let replaced = self
            .pending
            .lock(|pending| pending.borrow_mut().replace(request));
        if replaced.is_some() {
            debug!("previous upload request superseded");
        }
    }
}
