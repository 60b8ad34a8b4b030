pub mod gateway;
pub mod request;
pub mod service;
pub mod session;

pub use gateway::{GatewayHandle, MockPaymentGateway, PaymentGateway};
pub use request::{
    PayerPrefill, PaymentMetadata, PaymentOutcome, PaymentRequest, GATEWAY_UNAVAILABLE_REASON,
    TIMEOUT_REASON,
};
pub use service::CheckoutService;
pub use session::CheckoutSession;
