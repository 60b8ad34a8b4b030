use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::checkout::request::PaymentRequest;
use crate::errors::{BookingError, Result};
use crate::types::SessionId;

/// acknowledgement that the payment sheet was opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayHandle {
    pub session_id: SessionId,
    /// where to send the user, for redirect-style gateways
    pub redirect_url: Option<String>,
}

/// payment redirect service
///
/// `open` only hands the request over. The outcome arrives later through
/// the gateway's callback and is fed to `CheckoutService::handle_outcome`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn open(&self, request: &PaymentRequest) -> Result<GatewayHandle>;
}

/// gateway double that records requests, for tests and demos
#[derive(Debug)]
pub struct MockPaymentGateway {
    requests: Mutex<Vec<PaymentRequest>>,
    available: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// simulate the gateway script failing to load
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Result<Vec<PaymentRequest>> {
        let requests = self.requests.lock().map_err(|e| BookingError::Gateway {
            message: format!("gateway request log poisoned: {}", e),
        })?;
        Ok(requests.clone())
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn open(&self, request: &PaymentRequest) -> Result<GatewayHandle> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(BookingError::Gateway {
                message: "payment gateway failed to load".to_string(),
            });
        }

        self.requests
            .lock()
            .map_err(|e| BookingError::Gateway {
                message: format!("gateway request log poisoned: {}", e),
            })?
            .push(request.clone());

        Ok(GatewayHandle {
            session_id: request.session_id,
            redirect_url: Some(format!("https://pay.example/checkout/{}", request.session_id)),
        })
    }
}
