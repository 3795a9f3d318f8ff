pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod insight;
pub mod pricing;
pub mod responses;
pub mod router;
pub mod scan;

#[cfg(test)]
mod tests;
