/// Filing histories, per filer; see [submissions API].
///
/// [submissions API]: https://www.sec.gov/search-filings/edgar-application-programming-interfaces
pub mod submissions;

/// The ticker to CIK map behind `company_tickers.json`.
pub mod tickers;
