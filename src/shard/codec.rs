//! Gzip framing for shard files at rest.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

/// Write `body` to `dst`, gunzipping it first when `compressed` is set.
pub(crate) fn write_shard(body: &[u8], compressed: bool, dst: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(dst)?);
    if compressed {
        io::copy(&mut GzDecoder::new(body), &mut out)?;
    } else {
        out.write_all(body)?;
    }
    out.into_inner().map_err(io::IntoInnerError::into_error)?.sync_all()
}

/// Gzip the file at `src` into `dst`.
pub(crate) fn compress_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut input = BufReader::new(File::open(src)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(dst)?), Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder
        .finish()?
        .into_inner()
        .map_err(io::IntoInnerError::into_error)?
        .sync_all()
}
