//! Read-only lookups exposed as data sources

pub mod dms_maintain_window;
