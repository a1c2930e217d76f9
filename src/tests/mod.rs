// Tests module
// Integration tests for the node coordination layer: dispatch ordering,
// DNS resolution, and randomness collection

pub mod dns;
pub mod support;
