//! HTTP handlers

pub mod model;
pub mod predict;
pub mod status;
pub mod train;
mod upload;
