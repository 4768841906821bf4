//! Text understanding for appointment requests: department inference,
//! date/time extraction, OCR and timezone rendering.

pub mod department;
pub mod ocr;
pub mod time_expr;
pub mod timezone;

pub use department::{DepartmentResolver, Vocabulary, VocabularyEntry, SEED_VOCABULARY, STOP_WORDS};
pub use ocr::TesseractCli;
pub use time_expr::RuleBasedTimeExtractor;
pub use timezone::{format_in_zone, parse_timezone};
