//! Utility macros shared by the decoders of this crate.

/// Returns early with an error if a condition is not met.
///
/// Like `assert!`, but returns `Err($error.into())` instead of panicking.
///
/// # Example
///
/// ```ignore
/// ensure!(method == CM_DEFLATE, FormatError::UnsupportedMethod { expected: CM_DEFLATE, found: method });
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error.into());
        }
    };
}

pub(crate) use ensure;
