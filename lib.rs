#![doc = include_str!("README.md")]

pub use case_accessors_macro::case_accessors;
