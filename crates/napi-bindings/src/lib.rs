use napi::bindgen_prelude::*;

#[macro_use]
extern crate napi_derive;

pub mod metrics_api;
pub mod normalize_api;
pub mod poll_api;

pub(crate) fn parse_json(json: &str) -> Result<serde_json::Value> {
    minewatch_core::parse_payload(json).map_err(|e| Error::from_reason(e.to_string()))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(minewatch_core::MinewatchError::from)
        .map_err(|e| Error::from_reason(e.to_string()))
}

#[napi]
pub fn version() -> String {
    minewatch_core::MINEWATCH_VERSION.to_string()
}
