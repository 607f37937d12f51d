#![allow(dead_code)]

pub mod fake_release;
pub mod packages;
