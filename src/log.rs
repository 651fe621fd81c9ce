//! Console logging shim
//!
//! Browser builds log through `web_sys::console`; native builds (unit
//! tests) fall back to stderr so the core stays testable without a DOM.

/// Master switch for verbose highlight/selection tracing.
pub const HL_DEBUG: bool = false;

pub(crate) fn warn(msg: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{msg}");
}

/// Trace-level logging, compiled in but gated on [`HL_DEBUG`].
#[allow(dead_code)]
pub(crate) fn debug(msg: &str) {
    if !HL_DEBUG {
        return;
    }
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&msg.into());
    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("{msg}");
}
