#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod error;
pub mod quotation;
pub mod ws;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Realtime quotation endpoint
pub const WSS_HOST: &str = "wss://api.upbit.com/websocket/v1";

/// Market used when none is given
pub const DEFAULT_MARKET: &str = "KRW-BTC";
