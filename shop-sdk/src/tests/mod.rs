//! Unit tests for the shop SDK
//!
//! This module contains tests for various components of the SDK.
