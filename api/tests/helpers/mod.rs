#![allow(dead_code)]

pub mod app;
pub mod gemini_mock;
