// THEORY:
// This file is the main entry point for the `lumizone` library crate. It
// exposes the high-level pieces a host process needs (the `ZonePipeline`,
// its `Settings`, the geometry and state stores, and the frame-source seam)
// while the analysis internals stay grouped under `core_modules`.
//
// One invocation of the engine is stateless end to end: load state, capture
// one frame, analyze, emit commands for the zones that changed, persist
// state. The hosting loop decides cadence and transport; this crate only
// turns a frame into commands.

pub mod capture;
pub mod config;
pub mod core_modules;
pub mod dispatch;
pub mod error;
pub mod pipeline;
