#![doc = "folder-context-core: core logic library for folder-context."]

//! This crate contains the folder-to-text pipeline: walking a dropped folder,
//! keeping its text files, cleaning them and concatenating them into a single
//! document for an AI prompt, plus the session history of past runs.
//! Terminal, clipboard and config-file handling live in the `folder-context` binary.
//!
//! # Usage
//! Build entries with [`local::local_entry`] (or any other [`contract::Entry`]
//! implementation), then drive a [`pipeline::Session`].

pub mod assemble;
pub mod classify;
pub mod config;
pub mod contract;
pub mod local;
#[cfg(any(test, feature = "test-export-mocks"))]
pub mod memory;
pub mod normalize;
pub mod pipeline;
pub mod store;
pub mod walker;
