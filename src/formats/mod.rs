//! Grid format readers and writers

pub mod ascii;
