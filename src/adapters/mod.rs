// Adapters layer: concrete implementations for external systems (http, storage, logging).

pub mod http;
pub mod observer;
pub mod storage;
