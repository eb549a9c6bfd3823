//! Request middleware and extractors.

pub mod device;
