//! Statement parsing: format detection, segmentation and field extraction.

mod classifier;
mod extractor;
pub mod normalize;
mod parser;
pub mod rules;
mod segmenter;

pub use classifier::{detect_format, StatementFormat};
pub use extractor::{BlockExtraction, FieldOutcome, RunningBalance, TransactionExtractor};
pub use normalize::{normalize_amount, normalize_date, round_amount};
pub use parser::{DocumentParser, ExtractionMetadata, ExtractionResult, StatementParser};
pub use segmenter::{is_summary_text, split_transactions, LineSegmenter, RawBlock};
