use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// longest line delivered downstream; anything beyond is cut here and the
/// parser warns about it
pub const LINE_CAP_BYTES: usize = 65536;

/// How many dry reads a pipe tolerates before declaring completion.
/// Non-blocking stdin can report end-of-stream while DAMSON is still
/// running, so a handful of retries papers over transient underruns.
pub const PIPE_EOF_RETRIES: u32 = 5;

/// one delivered line; the trailing newline is already stripped
#[derive(Debug, PartialEq, Eq)]
pub struct RawLine {
    pub text: String,
    pub truncated: bool,
}

/// A finite, non-restartable sequence of text lines. The parser drains one
/// of these end-to-end on the worker thread.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<RawLine>, io::Error>;
}

/// Seekable input, slurped whole when opened. An open failure is fatal
/// before any parsing starts.
pub struct FileSource {
    lines: std::vec::IntoIter<RawLine>,
}

impl FileSource {
    pub fn open(path: &Path) -> Result<Self, io::Error> {
        let content = fs::read(path)?;
        Ok(FileSource {
            lines: split_lines(&content).into_iter(),
        })
    }
}

impl LineSource for FileSource {
    fn next_line(&mut self) -> Result<Option<RawLine>, io::Error> {
        Ok(self.lines.next())
    }
}

fn split_lines(content: &[u8]) -> Vec<RawLine> {
    let mut lines: Vec<RawLine> = content.split(|&b| b == b'\n').map(finish_line).collect();
    // a trailing newline does not make an extra empty line
    if let Some(last) = lines.last() {
        if last.text.is_empty() && !last.truncated {
            lines.pop();
        }
    }
    lines
}

fn finish_line(bytes: &[u8]) -> RawLine {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    let truncated = bytes.len() > LINE_CAP_BYTES;
    let kept = if truncated {
        &bytes[..LINE_CAP_BYTES]
    } else {
        bytes
    };
    RawLine {
        text: String::from_utf8_lossy(kept).into_owned(),
        truncated,
    }
}

/// Non-seekable input, read a byte at a time until `\n`, `\0` or
/// end-of-stream. A `\0` ends the current line and exhausts the source;
/// plain end-of-stream is retried up to [`PIPE_EOF_RETRIES`] times first.
pub struct PipeSource<R: Read> {
    inner: R,
    done: bool,
}

impl<R: Read> PipeSource<R> {
    pub fn new(inner: R) -> Self {
        PipeSource { inner, done: false }
    }

    /// One byte, or None once the stream has been dry for
    /// [`PIPE_EOF_RETRIES`] consecutive reads. The retry budget resets on
    /// every delivered byte; it only guards the end of the stream.
    fn next_byte(&mut self, retries_left: &mut u32) -> Result<Option<u8>, io::Error> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => {
                    if *retries_left == 0 {
                        return Ok(None);
                    }
                    *retries_left -= 1;
                }
                Ok(_) => {
                    *retries_left = PIPE_EOF_RETRIES;
                    return Ok(Some(byte[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                // non-blocking stdin underrun, same treatment as a dry read
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if *retries_left == 0 {
                        return Ok(None);
                    }
                    *retries_left -= 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> LineSource for PipeSource<R> {
    fn next_line(&mut self) -> Result<Option<RawLine>, io::Error> {
        if self.done {
            return Ok(None);
        }
        let mut buf: Vec<u8> = Vec::new();
        let mut truncated = false;
        let mut retries = PIPE_EOF_RETRIES;
        loop {
            match self.next_byte(&mut retries)? {
                None => {
                    self.done = true;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
                Some(b'\n') => break,
                Some(b'\0') => {
                    self.done = true;
                    if buf.is_empty() {
                        return Ok(None);
                    }
                    break;
                }
                Some(byte) => {
                    if buf.len() < LINE_CAP_BYTES {
                        buf.push(byte);
                    } else {
                        truncated = true;
                    }
                }
            }
        }
        let bytes = buf.strip_suffix(b"\r").unwrap_or(&buf);
        Ok(Some(RawLine {
            text: String::from_utf8_lossy(bytes).into_owned(),
            truncated,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(source: &mut impl LineSource) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = source.next_line().unwrap() {
            out.push(line.text);
        }
        out
    }

    #[test]
    fn test_pipe_splits_lines() {
        let mut src = PipeSource::new(&b"one\ntwo\nthree\n"[..]);
        assert_eq!(drain(&mut src), ["one", "two", "three"]);
    }

    #[test]
    fn test_pipe_delivers_unterminated_tail() {
        let mut src = PipeSource::new(&b"one\ntail"[..]);
        assert_eq!(drain(&mut src), ["one", "tail"]);
    }

    #[test]
    fn test_pipe_keeps_empty_lines() {
        let mut src = PipeSource::new(&b"a\n\nb\n"[..]);
        assert_eq!(drain(&mut src), ["a", "", "b"]);
    }

    #[test]
    fn test_pipe_nul_ends_stream() {
        let mut src = PipeSource::new(&b"one\0two"[..]);
        assert_eq!(drain(&mut src), ["one"]);
        assert_eq!(src.next_line().unwrap(), None);
    }

    #[test]
    fn test_pipe_strips_carriage_return() {
        let mut src = PipeSource::new(&b"dos line\r\n"[..]);
        assert_eq!(drain(&mut src), ["dos line"]);
    }

    #[test]
    fn test_pipe_truncates_at_cap() {
        let mut bytes = vec![b'x'; LINE_CAP_BYTES + 10];
        bytes.push(b'\n');
        bytes.extend_from_slice(b"next\n");
        let mut src = PipeSource::new(&bytes[..]);
        let first = src.next_line().unwrap().unwrap();
        assert!(first.truncated);
        assert_eq!(first.text.len(), LINE_CAP_BYTES);
        assert_eq!(src.next_line().unwrap().unwrap().text, "next");
    }

    /// a reader that reports dry twice before each byte, as a sputtering
    /// pipe would
    struct Sputter<'a> {
        data: &'a [u8],
        dry: u32,
    }

    impl Read for Sputter<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.dry > 0 {
                self.dry -= 1;
                return Ok(0);
            }
            if self.data.is_empty() {
                return Ok(0);
            }
            self.dry = 2;
            buf[0] = self.data[0];
            self.data = &self.data[1..];
            Ok(1)
        }
    }

    #[test]
    fn test_pipe_retries_transient_underruns() {
        let mut src = PipeSource::new(Sputter {
            data: b"ab\ncd",
            dry: 2,
        });
        assert_eq!(drain(&mut src), ["ab", "cd"]);
    }

    #[test]
    fn test_file_source_reads_all_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, "alpha\nbeta\n").unwrap();
        let mut src = FileSource::open(&path).unwrap();
        assert_eq!(drain(&mut src), ["alpha", "beta"]);
    }

    #[test]
    fn test_file_open_failure_surfaces() {
        assert!(FileSource::open(Path::new("/no/such/file.log")).is_err());
    }
}
