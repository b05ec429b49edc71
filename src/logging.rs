// =============================================================================
// VOP LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Macros de log do driver VOP com custo ZERO em release.
//
// Os cinco macros compartilham um único despacho (`__vop_log!`) para a
// fachada `log`. O backend (serial, ring buffer) é do kernel hospedeiro.
// Níveis desligados por feature expandem para um bloco vazio.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Falhas de hardware, timeouts
// - WARN:  Situações suspeitas mas recuperáveis
// - INFO:  Fluxo normal (enable/disable do pipeline)
// - DEBUG: Informações de debugging
// - TRACE: Cada commit, cada IRQ
//
// FEATURES:
// - no_logs:   Remove 100% dos logs (custo zero no binário)
// - log_info:  ERROR, WARN, INFO, DEBUG
// - log_trace: Todos os níveis (padrão)
//
// COMO USAR:
//   kinfo!("(VOP) Pipeline habilitado");     // Apenas string
//   ktrace!("(VOP) yrgb_mst=", 0x1000);      // String + hex
//
// =============================================================================

/// Target usado em todos os registros emitidos por este crate.
pub const TARGET: &str = "forge_vop";

// =============================================================================
// DESPACHO PARA A FACHADA `log`
// =============================================================================

/// Emite um registro no nível pedido. Uso interno dos macros `k*!`.
#[doc(hidden)]
#[macro_export]
macro_rules! __vop_log {
    ($lvl:ident, $msg:expr) => {{
        ::log::$lvl!(target: $crate::logging::TARGET, "{}", $msg);
    }};
    ($lvl:ident, $msg:expr, $val:expr) => {{
        ::log::$lvl!(target: $crate::logging::TARGET, "{}{:#x}", $msg, ($val) as u64);
    }};
}

// =============================================================================
// ERROR / WARN / INFO (somem só com no_logs)
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($($arg:expr),+ $(,)?) => { $crate::__vop_log!(error, $($arg),+) };
}

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($($arg:expr),+ $(,)?) => { $crate::__vop_log!(warn, $($arg),+) };
}

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kinfo {
    ($($arg:expr),+ $(,)?) => { $crate::__vop_log!(info, $($arg),+) };
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// DEBUG (log_info ou log_trace) / TRACE (só log_trace)
// =============================================================================

#[cfg(all(
    not(feature = "no_logs"),
    any(feature = "log_trace", feature = "log_info")
))]
#[macro_export]
macro_rules! kdebug {
    ($($arg:expr),+ $(,)?) => { $crate::__vop_log!(debug, $($arg),+) };
}

#[cfg(not(all(
    not(feature = "no_logs"),
    any(feature = "log_trace", feature = "log_info")
)))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

#[cfg(all(not(feature = "no_logs"), feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($($arg:expr),+ $(,)?) => { $crate::__vop_log!(trace, $($arg),+) };
}

#[cfg(not(all(not(feature = "no_logs"), feature = "log_trace")))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}
