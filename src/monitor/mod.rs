//! Link-quality monitoring: RSSI sampling via the kernel link-query tool.

pub mod link;
