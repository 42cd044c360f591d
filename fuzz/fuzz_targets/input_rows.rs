//! Fuzz target for parsing input rows of all input types
use afl::*;
use pmcore::format::ProteoformFormat;
use pmsearch::input::InputType;

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(s) = std::str::from_utf8(data) {
            for input_type in InputType::ALL {
                // Rows are either accepted or rejected with a warning, never a panic
                let _ = input_type.parse_row(s, 0, ProteoformFormat::Simple);
            }
        }
    });
}
