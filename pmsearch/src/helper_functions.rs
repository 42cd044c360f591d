use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use context_error::{BoxedError, Context, CreateError};
use flate2::bufread::GzDecoder;
use pmcore::PathwayError;

/// Helper function to check extensions in filenames
pub(crate) fn check_extension(filename: impl AsRef<Path>, extension: impl AsRef<Path>) -> bool {
    filename
        .as_ref()
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension.as_ref()))
}

/// Open a file for reading, transparently decompressing it if it has a `.gz` extension.
/// # Errors
/// If the file could not be opened, the error has the given kind.
pub(crate) fn open_file(
    path: &Path,
    kind: PathwayError,
) -> Result<Box<dyn BufRead>, BoxedError<'static, PathwayError>> {
    let file = File::open(path).map_err(|e| {
        BoxedError::new(
            kind,
            "Could not open file",
            e.to_string(),
            Context::default().source(path.to_string_lossy()).to_owned(),
        )
    })?;
    if check_extension(path, "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(BufReader::new(
            file,
        )))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Remove a leading byte order mark
pub(crate) fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Write the text gzip compressed to the given file
#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
pub(crate) fn write_gz(path: &Path, text: &str) {
    use std::io::Write;

    let mut encoder = flate2::write::GzEncoder::new(
        File::create(path).unwrap(),
        flate2::Compression::default(),
    );
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
}
