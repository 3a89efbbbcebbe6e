//! Clients for third-party meeting services.

pub mod zoom;
