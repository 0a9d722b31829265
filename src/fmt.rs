//! Logging shim
//!
//! Forwards to `defmt` on the firmware build. On the host the macros expand
//! to a borrow of every argument so call sites stay type-checked.

#![allow(unused_macros)]

macro_rules! log_impl {
    ($level:ident, $s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "embedded")]
        ::defmt::$level!($s $(, $x)*);
        #[cfg(not(feature = "embedded"))]
        let _ = ($( &$x ),*);
    }};
}

macro_rules! trace {
    ($($t:tt)*) => { log_impl!(trace, $($t)*) };
}

macro_rules! debug {
    ($($t:tt)*) => { log_impl!(debug, $($t)*) };
}

macro_rules! info {
    ($($t:tt)*) => { log_impl!(info, $($t)*) };
}

macro_rules! warn {
    ($($t:tt)*) => { log_impl!(warn, $($t)*) };
}

macro_rules! error {
    ($($t:tt)*) => { log_impl!(error, $($t)*) };
}
