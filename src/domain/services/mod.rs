//! # Domain Services
//!
//! 特定のエンティティに属さないビジネスルール

pub mod lineage_flattening;
