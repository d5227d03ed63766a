#![forbid(unsafe_code)]

pub mod cases;
pub mod cli;
pub mod download;
pub mod embedded;
pub mod formats;
pub mod http;
pub mod logging;
pub mod redirect;
pub mod report;
pub mod series;
