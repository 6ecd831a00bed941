mod backend;
mod compare;
mod context;
mod scan;
mod surface;
mod utf8;
mod width;

pub use backend::{BackendKind, ByteOriented, EncodingBackend, HostUtf8, Utf8Codec};
pub use compare::{char_len, char_value, chars_equal, mbchar_matches};
pub use context::MbContext;
pub use scan::{adjust_point, boundaries, c_strlen, find_next, find_prev, ScanFlags};
pub use surface::{parse_cursor_report, split_cursor_report, DisplaySurface, SurfaceProbe, TerminalSurface};
pub use utf8::{decode, encode, sequence_len, DecodeState, Decoded, EncodeError, MAX_CHAR_LEN, MAX_CODEPOINT};
pub use width::{next_capacity, ProbeError, ProbeKind, UnicodeTableProbe, WidthCache, WidthProbe};
