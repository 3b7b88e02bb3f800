//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations for every marketplace crate:
//! - Cryptographic utilities (SHA-256, HMAC, random tokens)
//! - Password hashing (Argon2id with configurable cost)
//! - Client identification (IP, User-Agent)
//! - Sliding-window rate limiting behind a pluggable store
//! - Outbound integrations: transactional email, object storage, payment gateway

pub mod client;
pub mod crypto;
pub mod mailer;
pub mod password;
pub mod paystack;
pub mod rate_limit;
pub mod storage;
