//! # 错误处理宏

/// 快速创建前置条件错误的宏
#[macro_export]
macro_rules! precondition_error {
    ($kind:expr, $msg:expr) => {
        $crate::error::SslError::precondition($kind, $msg)
    };
    ($kind:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::SslError::precondition($kind, format!($fmt, $($arg)*))
    };
}

/// 快速创建存储错误的宏
#[macro_export]
macro_rules! storage_error {
    ($kind:expr, $msg:expr) => {
        $crate::error::SslError::storage($kind, $msg)
    };
    ($kind:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::SslError::storage($kind, format!($fmt, $($arg)*))
    };
}

/// 确保条件成立，否则返回前置条件错误
#[macro_export]
macro_rules! ensure_precondition {
    ($cond:expr, $kind:expr, $msg:expr) => {
        if !($cond) {
            return Err($crate::precondition_error!($kind, $msg));
        }
    };
    ($cond:expr, $kind:expr, $fmt:expr, $($arg:tt)*) => {
        if !($cond) {
            return Err($crate::precondition_error!($kind, $fmt, $($arg)*));
        }
    };
}
