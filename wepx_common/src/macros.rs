/// small helper macros shared across wepx crates, in the spirit of odin_common's macro module:
/// keep each macro a one-liner and re-export it at the crate root rather than hiding it in a
/// submodule namespace.

#[macro_export]
macro_rules! io_error {
    ( $kind:expr, $fmt:literal, $($arg:expr)* ) =>
    {
        std::io::Error::new( $kind, format!($fmt,$($arg),*).as_str())
    }
}
pub use io_error;

#[macro_export]
macro_rules! map_err {
    ($e:expr => $t:ident ) =>
    { $e.map_err(|err| $t{ src:Some(Box::new(err)), msg:None}) };

    ($e:expr => $t:ident { $f:literal $(, $p:expr)* } ) =>
    { $e.map_err(|err| $t{ src:Some(Box::new(err)), msg:Some(format!($f $(,$p)* ))}) };
}
pub use map_err;
