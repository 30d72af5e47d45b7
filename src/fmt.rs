//! # Logging Backends
//!
//! The crate never installs a logger. Output is routed at compile time by the
//! `log`, `defmt` and `esp32-log` features; with none of them enabled every
//! macro below expands to nothing but a borrow of its arguments.
#![allow(unused_macros)]

macro_rules! log_at {
    ($level:ident, $tag:literal, $s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::$level!($s $(, $x)*);
        #[cfg(feature = "defmt")]
        ::defmt::$level!($s $(, ::defmt::Debug2Format(&$x))*);
        #[cfg(feature = "esp32-log")]
        ::esp_println::println!(concat!($tag, " (uplink) ", $s) $(, $x)*);
        #[cfg(not(any(feature = "log", feature = "defmt", feature = "esp32-log")))]
        let _ = ($(&$x),*);
    }};
}

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        log_at!(trace, "T", $s $(, $x)*)
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        log_at!(debug, "D", $s $(, $x)*)
    };
}

macro_rules! info {
    ($s:literal $(, $x:expr)* $(,)?) => {
        log_at!(info, "I", $s $(, $x)*)
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        log_at!(warn, "W", $s $(, $x)*)
    };
}

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {
        log_at!(error, "E", $s $(, $x)*)
    };
}
