//! Splits OCR text into schedule segments and finds the filer name.

use tracing::debug;

use super::dictionary::{FieldDictionary, SegmentLabel};
use super::rules::FILER_ANCHOR;

/// A contiguous run of lines between two schedule markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position in document order.
    pub index: usize,
    pub label: SegmentLabel,
    /// Lines of the segment, marker line excluded. Always empty for
    /// [`SegmentLabel::None`] segments.
    pub lines: Vec<String>,
}

impl Segment {
    fn new(index: usize, label: SegmentLabel) -> Self {
        Self {
            index,
            label,
            lines: Vec::new(),
        }
    }
}

/// Result of segmenting one document's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedText {
    /// Filer name from the first anchor, if any.
    pub filer_name: Option<String>,
    pub segments: Vec<Segment>,
}

/// Line-oriented segmenter. Pure function of its input.
pub struct TextSegmenter<'d> {
    dictionary: &'d FieldDictionary,
}

impl<'d> TextSegmenter<'d> {
    pub fn new(dictionary: &'d FieldDictionary) -> Self {
        Self { dictionary }
    }

    /// Segment the text of a whole document.
    pub fn run(&self, text: &str) -> SegmentedText {
        let lines: Vec<&str> = text.lines().collect();
        SegmentedText {
            filer_name: find_filer_name(&lines),
            segments: self.segment(&lines),
        }
    }

    /// Partition lines into labeled segments.
    ///
    /// The first segment starts unlabeled. Every marker line closes the
    /// current segment, even an empty one, and opens a new one.
    pub fn segment(&self, lines: &[&str]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut current = Segment::new(0, SegmentLabel::None);

        for line in lines {
            if let Some(label) = self.dictionary.classify_marker(line) {
                let next = Segment::new(current.index + 1, label);
                segments.push(std::mem::replace(&mut current, next));
                continue;
            }

            if current.label != SegmentLabel::None {
                current.lines.push((*line).to_string());
            }
        }
        segments.push(current);

        debug!(
            "Segmented {} lines into {} segments",
            lines.len(),
            segments.len()
        );
        segments
    }
}

/// The first non-blank line after the first "NAME OF FILER" anchor.
///
/// Only the first anchor is considered; if nothing follows it the
/// document has no filer name.
pub fn find_filer_name(lines: &[&str]) -> Option<String> {
    let anchor = lines.iter().position(|line| FILER_ANCHOR.is_match(line))?;
    lines[anchor + 1..]
        .iter()
        .map(|line| line.trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(segments: &[Segment]) -> Vec<SegmentLabel> {
        segments.iter().map(|s| s.label).collect()
    }

    #[test]
    fn test_filer_name_after_blank_line() {
        let lines = ["COVER PAGE", "Name of Filer", "", "  Acme PAC  ", "NAME OF FILER", "Other"];
        assert_eq!(find_filer_name(&lines), Some("Acme PAC".to_string()));
    }

    #[test]
    fn test_filer_anchor_without_follower() {
        assert_eq!(find_filer_name(&["NAME OF FILER", "   "]), None);
        assert_eq!(find_filer_name(&["no anchor here"]), None);
    }

    #[test]
    fn test_segments_follow_markers() {
        let dictionary = FieldDictionary::new();
        let segmenter = TextSegmenter::new(&dictionary);
        let text = "cover\nSCHEDULE A\nJane Doe\n$10.00\nSchedule E\nPrint Shop\n$5.00\nSUMMARY PAGE\ntotals 15.00\n";

        let result = segmenter.run(text);

        assert_eq!(
            labels(&result.segments),
            vec![
                SegmentLabel::None,
                SegmentLabel::Contribution,
                SegmentLabel::Expenditure,
                SegmentLabel::None,
            ]
        );
        assert!(result.segments[0].lines.is_empty());
        assert_eq!(result.segments[1].lines, vec!["Jane Doe", "$10.00"]);
        assert_eq!(result.segments[2].lines, vec!["Print Shop", "$5.00"]);
        assert!(result.segments[3].lines.is_empty());
        assert_eq!(result.filer_name, None);
    }

    #[test]
    fn test_adjacent_markers_produce_empty_segments() {
        let dictionary = FieldDictionary::new();
        let segmenter = TextSegmenter::new(&dictionary);

        let segments = segmenter.segment(&["SCHEDULE A", "SCHEDULE C", "Jane", "$1.00"]);

        assert_eq!(segments.len(), 3);
        assert!(segments[1].lines.is_empty());
        assert_eq!(segments[2].label, SegmentLabel::Contribution);
        assert_eq!(segments.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_segmenting_is_idempotent() {
        let dictionary = FieldDictionary::new();
        let segmenter = TextSegmenter::new(&dictionary);
        let text = "NAME OF FILER\nAcme PAC\nSCHEDULE A\nJane\n$1.00\nSCHEDULE E\nBob\n";

        assert_eq!(segmenter.run(text), segmenter.run(text));
    }
}
