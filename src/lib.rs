// src/lib.rs

//! Houses: property listing acquisition and storage library

pub mod error;
pub mod models;
pub mod services;
pub mod sites;
pub mod storage;
pub mod utils;
