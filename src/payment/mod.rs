pub mod client;

pub use client::{
    CheckoutRequest, CheckoutResponse, GatewayError, PaymentClient, VerificationRecord,
};
