#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod dialect;
mod error;
mod extractor;
mod generator;
mod id;
#[cfg(feature = "memory")]
mod memory;
mod name;
mod pool;
mod session;
mod value;

pub use crate::config::*;
pub use crate::dialect::*;
pub use crate::error::*;
pub use crate::extractor::*;
pub use crate::generator::*;
pub use crate::id::*;
#[cfg_attr(docsrs, doc(cfg(feature = "memory")))]
#[cfg(feature = "memory")]
pub use crate::memory::*;
pub use crate::name::*;
pub use crate::pool::*;
pub use crate::session::*;
pub use crate::value::*;
pub use rust_decimal::Decimal;
