use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use tracing::{info, trace};

use crate::{
    error::{Result, SimError},
    hardware::mmu::{Mmu, Operation},
    paging::Vpn,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Reference {
    pub vpn: Vpn,
    pub operation: Operation,
}
impl Reference {
    pub fn new(vpn: Vpn, operation: Operation) -> Self {
        Self { vpn, operation }
    }

    pub fn from_address(address: u64, operation: Operation) -> Self {
        Self::new(Mmu::page_number(address), operation)
    }
}

pub fn parse_address(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).ok()
}

pub fn parse_line(line: &str) -> Option<Reference> {
    let mut tokens = line.split_whitespace();
    let (Some(address), Some(code), None) = (tokens.next(), tokens.next(), tokens.next()) else {
        return None;
    };
    let address = parse_address(address)?;
    let operation = Operation::from_code(code)?;
    Some(Reference::from_address(address, operation))
}

pub struct TraceFile {
    pub path: PathBuf,
    /// Raw line count, including lines that were skipped.
    pub lines: usize,
    pub references: Vec<Reference>,
}
impl TraceFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SimError::TraceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let trace = Self::read_from(path, BufReader::new(file))?;
        info!(
            trace = %path.display(),
            lines = trace.lines,
            references = trace.references.len(),
            "loaded trace"
        );
        Ok(trace)
    }

    fn read_from<R: BufRead>(path: &Path, reader: R) -> Result<Self> {
        let mut trace = Self::from_reader(reader).map_err(|source| SimError::TraceRead {
            path: path.to_path_buf(),
            source,
        })?;
        trace.path = path.to_path_buf();
        Ok(trace)
    }

    /// Lines that are not UTF-8 count as malformed and are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut lines = 0;
        let mut references = Vec::new();
        for (line_num, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            lines += 1;
            match std::str::from_utf8(&line).ok().and_then(parse_line) {
                Some(reference) => references.push(reference),
                None => trace!(line = line_num + 1, "skipping malformed trace line"),
            }
        }
        Ok(Self {
            path: PathBuf::new(),
            lines,
            references,
        })
    }

    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}

/// Writes accesses in the format `parse_line` reads back.
pub fn write_trace<W: Write>(
    writer: &mut W,
    accesses: impl IntoIterator<Item = (u64, Operation)>,
) -> Result<usize> {
    let mut count = 0;
    for (address, operation) in accesses {
        writeln!(writer, "{:08x} {}", address, operation.code())?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lines() {
        assert_eq!(
            parse_line("0x1000 R"),
            Some(Reference::new(Vpn(1), Operation::Read))
        );
        assert_eq!(
            parse_line("  7fff2abc\tW  "),
            Some(Reference::new(Vpn(0x7fff2), Operation::Write))
        );
        assert_eq!(
            parse_line("fff R"),
            Some(Reference::new(Vpn(0), Operation::Read))
        );
    }

    #[test]
    fn skips_malformed_lines() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("1000"), None);
        assert_eq!(parse_line("1000 R extra"), None);
        assert_eq!(parse_line("zzzz R"), None);
        assert_eq!(parse_line("0x R"), None);
        assert_eq!(parse_line("1000 X"), None);
    }

    #[test]
    fn reader_counts_every_line_but_keeps_valid_ones() {
        let text = "1000 R\nnot a line\n2000 W\n\n3fff R\n";
        let trace = TraceFile::from_reader(text.as_bytes()).unwrap();
        assert_eq!(trace.lines, 5);
        assert_eq!(
            trace.references,
            vec![
                Reference::new(Vpn(1), Operation::Read),
                Reference::new(Vpn(2), Operation::Write),
                Reference::new(Vpn(3), Operation::Read),
            ]
        );
    }

    #[test]
    fn non_utf8_line_is_skipped() {
        let trace = TraceFile::from_reader(&b"1000 R\n\xff\xfe R\n2000 W\r\n"[..]).unwrap();
        assert_eq!(trace.lines, 3);
        assert_eq!(
            trace.references,
            vec![
                Reference::new(Vpn(1), Operation::Read),
                Reference::new(Vpn(2), Operation::Write),
            ]
        );
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device gone"))
        }
    }

    #[test]
    fn read_failure_names_the_trace() {
        let path = Path::new("traces/broken.trace");
        let err = TraceFile::read_from(path, BufReader::new(FailingReader))
            .err()
            .unwrap();
        assert!(matches!(&err, SimError::TraceRead { path: p, .. } if p == path));
        assert!(err.to_string().contains("traces/broken.trace"));
    }

    #[test]
    fn missing_file_is_trace_unavailable() {
        let err = TraceFile::load(Path::new("/nonexistent/pagesim.trace"))
            .err()
            .unwrap();
        assert!(matches!(err, SimError::TraceUnavailable { .. }));
    }

    #[test]
    fn written_trace_reads_back() {
        let mut buf = Vec::new();
        let written = write_trace(
            &mut buf,
            [(0x1234, Operation::Read), (0xabcde, Operation::Write)],
        )
        .unwrap();
        assert_eq!(written, 2);
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "00001234 R\n000abcde W\n");

        let trace = TraceFile::from_reader(buf.as_slice()).unwrap();
        assert_eq!(trace.references[1], Reference::new(Vpn(0xab), Operation::Write));
    }
}
