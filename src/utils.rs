use std::{
    fs::File,
    io::{self, BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use crate::{
    error::{Error, Result},
    record::DescribedRecord,
};

const CHUNK_SIZE: usize = 8 * 1024;

/// open `path` for reading. directories open fine on some platforms and only
/// fail on the first read, so they are turned away here
pub(crate) fn open_input(path: &Path) -> Result<File> {
    let f = File::open(path).map_err(|e| Error::file_access(path, e))?;
    let meta = f.metadata().map_err(|e| Error::file_access(path, e))?;
    if meta.is_dir() {
        return Err(Error::file_access(
            path,
            io::Error::other("is a directory"),
        ));
    }
    Ok(f)
}

/// count the newline bytes in the file at `path`, reading it in fixed-size
/// chunks. a final line without a trailing newline is not counted
pub fn count_lines(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut f = open_input(path)?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut count = 0;
    loop {
        let n = match f.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        count += buf[..n].iter().filter(|&&b| b == b'\n').count();
    }
    debug!("counted {count} lines in {}", path.display());
    Ok(count)
}

/// a progress bar for `len` input lines, drawn to stderr
pub fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template(
        "{elapsed_precise} [{wide_bar}] {pos}/{len} ({per_sec}, eta {eta})",
    ) {
        bar.set_style(style);
    }
    bar
}

fn write_all<W: Write>(
    records: impl IntoIterator<Item = Result<DescribedRecord>>,
    out: &mut W,
    written: &mut usize,
) -> Result<()> {
    for record in records {
        writeln!(out, "{}", record?)?;
        *written += 1;
    }
    Ok(())
}

/// write each record to `out`, one per line, stopping at the first error.
/// `out` is flushed whether or not writing succeeded, so everything before
/// the failure ends up in the sink. returns the number of records written
pub fn to_writer<W: Write>(
    records: impl IntoIterator<Item = Result<DescribedRecord>>,
    mut out: W,
) -> Result<usize> {
    let mut written = 0;
    let result = write_all(records, &mut out, &mut written);
    let flushed = out.flush();
    result?;
    flushed?;
    Ok(written)
}

/// create or truncate the file at `path` and write `records` to it. partial
/// output from a failed run is left in place
pub fn to_file(
    records: impl IntoIterator<Item = Result<DescribedRecord>>,
    path: impl AsRef<Path>,
) -> Result<usize> {
    let path = path.as_ref();
    let f = File::create(path).map_err(|e| Error::file_access(path, e))?;
    let written = to_writer(records, BufWriter::new(f))?;
    info!("wrote {written} records to {}", path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use std::io;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::record::Record;

    fn temp_with(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn described(line: &str, values: &[f64]) -> Result<DescribedRecord> {
        Ok(Record::parse(line)?.attach_descriptors(values.to_vec()))
    }

    #[test]
    fn count_terminated() {
        let f = temp_with("a\tCCO\nb\tCC\nc\tC\n");
        assert_eq!(count_lines(f.path()).unwrap(), 3);
    }

    #[test]
    fn count_unterminated() {
        // the last line has no newline, so it isn't counted
        let f = temp_with("a\tCCO\nb\tCC\nc\tC");
        assert_eq!(count_lines(f.path()).unwrap(), 2);
    }

    #[test]
    fn count_empty() {
        let f = temp_with("");
        assert_eq!(count_lines(f.path()).unwrap(), 0);
    }

    #[test]
    fn count_across_chunks() {
        let line = "some-identifier\tCC(C)Cc1ccc(cc1)C(C)C(=O)O\n";
        let n = 3 * CHUNK_SIZE / line.len() + 7;
        let f = temp_with(&line.repeat(n));
        assert_eq!(count_lines(f.path()).unwrap(), n);
    }

    #[test]
    fn count_missing() {
        let got = count_lines("testfiles/does-not-exist.tsv");
        assert!(matches!(got, Err(Error::FileAccess { .. })));
    }

    #[test]
    fn count_directory() {
        let dir = tempfile::tempdir().unwrap();
        let got = count_lines(dir.path());
        assert!(matches!(got, Err(Error::FileAccess { .. })), "{got:?}");
    }

    #[test]
    fn writer() {
        let records =
            vec![described("a\tCCO", &[1.0, 2.0]), described("CC", &[3.5])];
        let mut out = Vec::new();
        let n = to_writer(records, &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "a\tCCO\t1.0\t2.0\nCC\t3.5\n");
    }

    #[test]
    fn writer_keeps_partial_output() {
        let records = vec![
            described("a\tCCO", &[1.0]),
            described("b\t ", &[2.0]),
            described("c\tCC", &[3.0]),
        ];
        let mut out = Vec::new();
        let got = to_writer(records, &mut out);
        assert!(matches!(got, Err(Error::InvalidRecord { .. })));
        assert_eq!(String::from_utf8(out).unwrap(), "a\tCCO\t1.0\n");
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_io_error() {
        let got = to_writer(vec![described("CCO", &[1.0])], Broken);
        assert!(matches!(got, Err(Error::Io(_))));
    }

    #[test]
    fn file_truncates() {
        let f = temp_with("old contents that should disappear\n");
        let n = to_file(vec![described("x\tC", &[0.5])], f.path()).unwrap();
        assert_eq!(n, 1);
        let got = std::fs::read_to_string(f.path()).unwrap();
        assert_eq!(got, "x\tC\t0.5\n");
    }

    #[test]
    fn file_unwritable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.tsv");
        let got = to_file(vec![described("C", &[1.0])], &path);
        assert!(matches!(got, Err(Error::FileAccess { .. })));
    }
}
