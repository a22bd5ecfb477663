//! Cross-module tests for upgrader-core.
