pub mod smtp;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::Void;

// Traits.

/// Generic mail trait that clients must implement.
///
/// Takes a fully formatted message (headers and body) and delivers it to one
/// recipient. Callers decide whether to await the result or detach it.
#[async_trait]
pub trait GenericMailClient: Send + Sync + 'static {
    /// The address mail is sent from; used in the `From:` header.
    fn from_address(&self) -> &str;

    /// Delivers a plain text message to `recipient`.
    async fn send_plaintext(&self, message: &str, recipient: &str) -> Void;
}

// Structs.

/// Mail client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct MailClient {
    inner: Arc<dyn GenericMailClient>,
}

impl Deref for MailClient {
    type Target = dyn GenericMailClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl MailClient {
    pub fn new(inner: Arc<dyn GenericMailClient>) -> Self {
        Self { inner }
    }
}

// Mocks.
