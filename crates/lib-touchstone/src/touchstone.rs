//! Touchstone document: a parse-once, replay-many sequence of samples.
//!
//! Supports:
//! - Touchstone 1.0 one-port (`.s1p`) and two-port (`.s2p`) S-parameter files
//! - Data formats: RI, MA, DB
//! - Frequency units: Hz, kHz, MHz, GHz
//!
//! The document owns its line source until the first access. That access
//! reads the source to the end, closes it and caches the result; every later
//! access replays the cache.

use crate::error::ParseError;
use crate::header::FormatHeader;
use crate::point::MeasurementPoint;
use crate::source::{decode_latin1, LineSource, ReaderSource};
use nom::{
    character::complete::char,
    combinator::all_consuming,
    multi::separated_list1,
    number::complete::double,
    IResult, Parser,
};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;

/// Parse state of a document.
enum DocumentState<S> {
    /// Source not read yet.
    Unparsed(S),
    /// Source consumed and closed.
    Parsed {
        header: Option<FormatHeader>,
        points: Vec<MeasurementPoint>,
    },
    /// A parse failed; the source is gone and nothing was cached.
    Released,
}

/// Lazily parsed Touchstone file.
pub struct TouchstoneDocument<S = Box<dyn LineSource + Send>> {
    name: String,
    state: DocumentState<S>,
}

impl TouchstoneDocument<ReaderSource<BufReader<File>>> {
    /// Open a file on disk. Nothing is read until the first access.
    pub fn open(path: &Path) -> Result<Self, ParseError> {
        Ok(Self::new(ReaderSource::open(path)?))
    }
}

impl TouchstoneDocument<ReaderSource<Cursor<Vec<u8>>>> {
    /// Document over in-memory content.
    pub fn from_string(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(ReaderSource::from_string(name, content))
    }
}

impl<S: LineSource> TouchstoneDocument<S> {
    pub fn new(source: S) -> Self {
        Self {
            name: source.name().to_string(),
            state: DocumentState::Unparsed(source),
        }
    }

    /// Name of the source the document was created from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self.state, DocumentState::Parsed { .. })
    }

    /// All samples, parsing the source on the first call.
    pub fn points(&mut self) -> Result<&[MeasurementPoint], ParseError> {
        self.ensure_parsed()?;
        match &self.state {
            DocumentState::Parsed { points, .. } => Ok(points),
            _ => Err(self.released()),
        }
    }

    /// Option line of the document, parsing the source on the first call.
    pub fn header(&mut self) -> Result<Option<&FormatHeader>, ParseError> {
        self.ensure_parsed()?;
        match &self.state {
            DocumentState::Parsed { header, .. } => Ok(header.as_ref()),
            _ => Err(self.released()),
        }
    }

    /// Iterate over the samples; restartable, the source is read only once.
    pub fn iter(&mut self) -> Result<std::slice::Iter<'_, MeasurementPoint>, ParseError> {
        Ok(self.points()?.iter())
    }

    /// Consume the document and take ownership of its samples.
    pub fn into_points(mut self) -> Result<Vec<MeasurementPoint>, ParseError> {
        self.ensure_parsed()?;
        match self.state {
            DocumentState::Parsed { points, .. } => Ok(points),
            _ => Err(ParseError::SourceReleased { name: self.name }),
        }
    }

    fn ensure_parsed(&mut self) -> Result<(), ParseError> {
        if !matches!(self.state, DocumentState::Unparsed(_)) {
            return Ok(());
        }
        if let DocumentState::Unparsed(source) =
            std::mem::replace(&mut self.state, DocumentState::Released)
        {
            let (header, points) = parse_source(source)?;
            tracing::debug!("Parsed '{}': {} points", self.name, points.len());
            self.state = DocumentState::Parsed { header, points };
        }
        Ok(())
    }

    fn released(&self) -> ParseError {
        ParseError::SourceReleased {
            name: self.name.clone(),
        }
    }
}

/// Read a source to the end. The source is dropped on return, on both paths.
fn parse_source<S: LineSource>(
    mut source: S,
) -> Result<(Option<FormatHeader>, Vec<MeasurementPoint>), ParseError> {
    let mut header: Option<FormatHeader> = None;
    let mut points = Vec::new();
    let mut line_no = 0;

    while let Some(raw) = source.read_line().map_err(|e| ParseError::from(e).at_line(line_no + 1))? {
        line_no += 1;
        let text = decode_latin1(&raw);
        let line = text.trim();

        if line.is_empty() || line.starts_with('!') {
            continue;
        }

        if line.starts_with('#') {
            if header.is_none() {
                header = Some(FormatHeader::from_option_line(line).map_err(|e| e.at_line(line_no))?);
            } else {
                tracing::debug!(
                    "Ignoring additional option line {} in '{}'",
                    line_no,
                    source.name()
                );
            }
            continue;
        }

        let Some(active) = header.as_ref() else {
            return Err(ParseError::MissingOptionLine.at_line(line_no));
        };

        let raw_values = parse_data_line(line).map_err(|e| e.at_line(line_no))?;
        let point = MeasurementPoint::decode(active, &raw_values).map_err(|e| e.at_line(line_no))?;
        points.push(point);
    }

    Ok((header, points))
}

/// Split a data line into floats. Whitespace runs count as one separator and
/// a trailing `!` comment is dropped.
fn parse_data_line(line: &str) -> Result<Vec<f64>, ParseError> {
    let data = match line.find('!') {
        Some(idx) => &line[..idx],
        None => line,
    };
    let collapsed = data.split_whitespace().collect::<Vec<_>>().join(" ");
    let (_, values) = data_values(&collapsed)?;
    Ok(values)
}

fn data_values(input: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(separated_list1(char(' '), double)).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::{Complex64, Hertz, Ohms};
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    const SAMPLE_S2P: &str = r#"! Sample 2-port S-parameter file
# MHz S RI R 50
! freq  S11_re S11_im S21_re S21_im S12_re S12_im S22_re S22_im
0.0     0.0 0.0   1.0 0.0   1.0 0.0   0.0 0.0
1.0  0.5 0.0  0.5 0.0  0.5 0.0  0.5 0.0
10.0	0.6   0.1  0.4 0.0  0.4 0.0  0.6 0.1
"#;

    /// Source that counts reads and records when it is dropped.
    struct CountingSource {
        lines: Vec<String>,
        next: usize,
        reads: Rc<Cell<usize>>,
        dropped: Rc<Cell<bool>>,
    }

    impl CountingSource {
        fn new(content: &str) -> (Self, Rc<Cell<usize>>, Rc<Cell<bool>>) {
            let reads = Rc::new(Cell::new(0));
            let dropped = Rc::new(Cell::new(false));
            let src = Self {
                lines: content.lines().map(str::to_string).collect(),
                next: 0,
                reads: Rc::clone(&reads),
                dropped: Rc::clone(&dropped),
            };
            (src, reads, dropped)
        }
    }

    impl LineSource for CountingSource {
        fn name(&self) -> &str {
            "counting.s2p"
        }

        fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
            self.reads.set(self.reads.get() + 1);
            let line = self.lines.get(self.next).map(|l| l.clone().into_bytes());
            self.next += 1;
            Ok(line)
        }
    }

    impl Drop for CountingSource {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[test]
    fn test_parse_sample_s2p() {
        let mut doc = TouchstoneDocument::from_string("BLM18AG331SN1.s2p", SAMPLE_S2P);
        assert!(!doc.is_parsed());

        let points = doc.points().unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].frequency, Hertz(0.0));
        assert_eq!(points[1].frequency, Hertz(1e6));
        assert_eq!(points[2].frequency, Hertz(10e6));
        assert!(points.iter().all(|p| p.port_count() == 2));

        // s11 = 0.5 -> Zin = 150, minus the 50 ohm termination
        assert!((points[1].series_impedance - Complex64::new(100.0, 0.0)).norm() < 1e-9);

        let header = doc.header().unwrap().unwrap();
        assert_eq!(header.reference_impedance, Ohms(50.0));
        assert!(doc.is_parsed());
    }

    #[test]
    fn test_matched_load_gives_z0_everywhere() {
        let content = "# GHZ S RI R 50\n0.001 0 0\n0.01 0 0\n0.1 0 0\n1 0 0\n";
        let mut doc = TouchstoneDocument::from_string("load.s1p", content);
        for p in doc.iter().unwrap() {
            assert_eq!(p.series_impedance, Complex64::new(50.0, 0.0));
        }
    }

    #[test]
    fn test_source_read_once_and_replayed() {
        let (src, reads, dropped) = CountingSource::new(SAMPLE_S2P);
        let mut doc = TouchstoneDocument::new(src);
        assert_eq!(reads.get(), 0);

        let first: Vec<MeasurementPoint> = doc.iter().unwrap().cloned().collect();
        let reads_after_first = reads.get();
        assert!(dropped.get());

        let second: Vec<MeasurementPoint> = doc.iter().unwrap().cloned().collect();
        assert_eq!(first, second);
        assert_eq!(reads.get(), reads_after_first);
        // 6 lines plus the end-of-input read
        assert_eq!(reads_after_first, 7);
    }

    #[test]
    fn test_data_before_option_line() {
        let (src, _reads, dropped) = CountingSource::new("! comment\n1.0 0.0 0.0\n# GHZ S RI R 50\n");
        let mut doc = TouchstoneDocument::new(src);

        let err = doc.points().unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(err.line(), Some(2));
        assert!(matches!(err.root(), ParseError::MissingOptionLine));
        assert!(dropped.get());

        // Nothing was cached; the source is gone
        assert!(!doc.is_parsed());
        assert!(matches!(doc.points().unwrap_err(), ParseError::SourceReleased { .. }));
    }

    #[test]
    fn test_first_option_line_wins() {
        let content = "# MHZ S RI R 50\n1 0 0\n# GHZ S RI R 75\n2 0 0\n";
        let mut doc = TouchstoneDocument::from_string("twice.s1p", content);
        let points = doc.points().unwrap();
        assert_eq!(points[1].frequency, Hertz(2e6));
        assert_eq!(points[1].series_impedance, Complex64::new(50.0, 0.0));
    }

    #[test]
    fn test_malformed_data_lines() {
        let mut doc = TouchstoneDocument::from_string("bad.s1p", "# MHZ S RI R 50\n1 0 zero\n");
        let err = doc.points().unwrap_err();
        assert!(err.is_format_error());
        assert_eq!(err.line(), Some(2));

        let mut doc = TouchstoneDocument::from_string("short.s1p", "# MHZ S RI R 50\n1 0 0 0\n");
        let err = doc.points().unwrap_err();
        assert!(matches!(err.root(), ParseError::DataValueCount(4)));
    }

    #[test]
    fn test_unit_reflection_fails_whole_document() {
        let content = "# MHZ S RI R 50\n1 0 0\n2 1 0\n3 0 0\n";
        let mut doc = TouchstoneDocument::from_string("open.s1p", content);
        let err = doc.points().unwrap_err();
        assert!(err.is_domain_error());
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_comments_blank_lines_and_latin1() {
        let mut bytes = b"! W\xfcrth Elektronik\r\n\r\n   # khz s ma r 50\r\n".to_vec();
        bytes.extend_from_slice(b"  1000   0.0  0.0 ! trailing note\r\n");
        let src = ReaderSource::new("742792651.s1p", Cursor::new(bytes));
        let mut doc = TouchstoneDocument::new(src);

        let points = doc.points().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].frequency, Hertz(1e6));
    }

    #[test]
    fn test_comment_only_document_is_empty() {
        let mut doc = TouchstoneDocument::from_string("empty.s1p", "! nothing\n\n");
        assert!(doc.points().unwrap().is_empty());
        assert!(doc.header().unwrap().is_none());
    }
}
