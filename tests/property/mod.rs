// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! This module contains property-based tests using proptest to verify the
//! network rules and the determinism of the topology compiler.

mod compile_properties;
mod network_properties;
