use {
    super::{line_to_message, StreamError, StreamSource},
    async_trait::async_trait,
    tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split},
};

/// Newline-delimited messages from stdin (or any buffered reader).
///
/// Blank lines are skipped; EOF ends the stream. A line that is not
/// valid UTF-8 is reported as `InvalidPayload` and reading continues after it.
pub struct StdinSource<R = BufReader<tokio::io::Stdin>> {
    lines: Option<Split<R>>,
}

impl StdinSource {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: AsyncBufRead + Unpin + Send> StdinSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: Some(reader.split(b'\n')),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> StreamSource for StdinSource<R> {
    async fn next_message(&mut self) -> Result<Option<String>, StreamError> {
        let Some(lines) = self.lines.as_mut() else {
            return Ok(None);
        };

        while let Some(bytes) = lines.next_segment().await? {
            if let Some(line) = line_to_message(bytes)? {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }

    async fn close(&mut self) {
        self.lines = None;
    }

    fn source_type(&self) -> &'static str {
        "stdin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_lines_and_skips_blanks() {
        let input: &[u8] = b"{\"category\":\"Fog\"}\n\n   \n{\"category\":\"Rain\"}\n";
        let mut source = StdinSource::from_reader(BufReader::new(input));

        assert_eq!(
            source.next_message().await.unwrap().as_deref(),
            Some("{\"category\":\"Fog\"}")
        );
        assert_eq!(
            source.next_message().await.unwrap().as_deref(),
            Some("{\"category\":\"Rain\"}")
        );
        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skippable() {
        let input: &[u8] = b"\xff\xfe\n{\"category\":\"Rain\"}\n";
        let mut source = StdinSource::from_reader(BufReader::new(input));

        let err = source.next_message().await.unwrap_err();
        assert!(matches!(err, StreamError::InvalidPayload(_)));
        assert!(!err.is_fatal());

        // The bad line was consumed; the next one still arrives
        assert_eq!(
            source.next_message().await.unwrap().as_deref(),
            Some("{\"category\":\"Rain\"}")
        );
        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_closed_source_is_exhausted() {
        let input: &[u8] = b"line\n";
        let mut source = StdinSource::from_reader(BufReader::new(input));
        source.close().await;
        assert!(source.next_message().await.unwrap().is_none());
    }
}
