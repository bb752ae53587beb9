//! AgroAI backend: a Web3 rewards service for plant disease detection.
//!
//! Farmers upload crop photos; the backend classifies the disease, pins the
//! image to IPFS, computes token rewards and community alerts, and settles
//! rewards and marketplace purchases through the AgroAI contracts on an EVM
//! chain. Every external dependency (chain, IPFS, weather, the trained
//! model) degrades gracefully so the HTTP surface stays up.

pub mod ai_engine;
pub mod api;
pub mod config;
pub mod ipfs;
pub mod rewards;
pub mod weather;
pub mod web3;
