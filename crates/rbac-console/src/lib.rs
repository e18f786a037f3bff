//! JSON line console for the authorization state store.

pub mod console;
