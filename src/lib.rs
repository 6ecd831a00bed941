pub mod core;
pub mod ffi;
pub mod config;
pub mod shell;
pub mod report;
pub mod bench;

#[no_mangle]
pub extern "C" fn libmbcursor_version() -> *const std::ffi::c_char {
    c"0.1.0".as_ptr()
}
