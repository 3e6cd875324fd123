//! Request / response types of the HTTP API.

pub mod builds;
pub mod latest;
