pub mod api;
pub mod config;
pub mod db;
pub mod device;
pub mod model;
pub mod storage;
pub mod trust;
