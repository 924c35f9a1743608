//! Test utility macros for Auth Manager.
//!
//! These macros replace `unwrap()`/`expect()` in tests with panics that carry
//! the file and line of the failing expression.
//!
//! # Usage
//!
//! ```rust,ignore
//! use authmgr_web::{unwrap_ok, unwrap_some};
//!
//! fn test_example() {
//!     let result: Result<i32, &str> = Ok(42);
//!     assert_eq!(unwrap_ok!(result), 42);
//!
//!     let option: Option<i32> = Some(42);
//!     assert_eq!(unwrap_some!(option), 42);
//! }
//! ```

/// Unwrap a `Result`, failing the test with a descriptive message if `Err`.
///
/// ```rust
/// use authmgr_web::unwrap_ok;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(unwrap_ok!(result, "Failed to get value"), 42);
/// ```
#[macro_export]
macro_rules! unwrap_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}:{} - Expected Ok, got Err: {:?}", file!(), line!(), e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}:{} - {}: {:?}", file!(), line!(), $msg, e),
        }
    };
}

/// Unwrap an `Option`, failing the test with a descriptive message if `None`.
///
/// ```rust
/// use authmgr_web::unwrap_some;
///
/// let option: Option<i32> = Some(42);
/// assert_eq!(unwrap_some!(option), 42);
/// ```
#[macro_export]
macro_rules! unwrap_some {
    ($expr:expr) => {
        match $expr {
            Some(val) => val,
            None => panic!("{}:{} - Expected Some, got None", file!(), line!()),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Some(val) => val,
            None => panic!("{}:{} - {}: got None", file!(), line!(), $msg),
        }
    };
}

/// Assert that a `Result` is `Err`.
///
/// ```rust
/// use authmgr_web::assert_err;
///
/// let result: Result<i32, &str> = Err("error");
/// assert_err!(result);
/// ```
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {{
        let result = $expr;
        if result.is_ok() {
            panic!(
                "{}:{} - Expected Err, got Ok: {:?}",
                file!(),
                line!(),
                result.ok()
            );
        }
    }};
}
