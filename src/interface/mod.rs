//! Interface layer
//! CLI 입출력과 조립 루트.

pub mod cli;
pub mod composition;
