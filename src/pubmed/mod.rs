// file: src/pubmed/mod.rs
// description: PubMed E-utilities access, search window and publication-type filtering
// reference: https://www.ncbi.nlm.nih.gov/books/NBK25501/

pub mod abstract_text;
pub mod client;
pub mod filter;
pub mod window;

pub use abstract_text::extract_abstract;
pub use client::{LiteratureSource, PubMedClient};
pub use filter::PublicationTypeFilter;
pub use window::SearchWindow;
