//! Source composition for `AppConfig`.

pub mod merge_policy;
pub mod service;
