//! Fuzz target for parsing proteoforms in the PRO_FORMA notation
use afl::*;
use pmcore::format::ProteoformFormat;

fn main() {
    fuzz!(|data: &[u8]| {
        if let Ok(s) = std::str::from_utf8(data)
            && let Ok(proteoform) = ProteoformFormat::ProForma.parse(s)
        {
            let shown = ProteoformFormat::ProForma.display(&proteoform).to_string();
            assert_eq!(ProteoformFormat::ProForma.parse(&shown).unwrap(), proteoform);
        }
    });
}
