//! Fuzz target for parsing proteoforms in the SIMPLE notation
use afl::*;
use pmcore::format::ProteoformFormat;

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(s) = std::str::from_utf8(data)
            && let Ok(proteoform) = ProteoformFormat::Simple.parse(s)
        {
            // Everything that is displayed has to parse back to the same proteoform
            let shown = ProteoformFormat::Simple.display(&proteoform).to_string();
            assert_eq!(ProteoformFormat::Simple.parse(&shown).unwrap(), proteoform);
        }
    });
}
