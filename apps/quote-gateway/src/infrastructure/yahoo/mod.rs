//! Yahoo Finance adapter.
//!
//! Implements the market data port against Yahoo's public quote, chart and
//! search endpoints, adding the network discipline the upstream does not
//! guarantee itself: hard request timeouts, minimum request spacing and a
//! bounded chart retry loop.

mod client;
mod messages;
mod retry;
mod throttle;

pub use client::YahooFinanceClient;
