// file: src/pubmed/abstract_text.rs
// description: extracts abstract text from efetch PubmedArticleSet xml
// reference: https://www.nlm.nih.gov/bsd/licensee/elements_descriptions.html#abstracttext

use crate::error::{PipelineError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

const ABSTRACT_PATH: [&[u8]; 5] = [
    b"PubmedArticleSet",
    b"PubmedArticle",
    b"MedlineCitation",
    b"Article",
    b"Abstract",
];

/// Returns the abstract of the first article in the document, or an empty
/// string when the article has no `Abstract/AbstractText`.
///
/// Structured abstracts are joined one section per line, each prefixed with
/// its `Label` attribute when present.
pub fn extract_abstract(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut sections: Vec<String> = Vec::new();
    // depth of the AbstractText element currently being collected
    let mut section_depth: Option<usize> = None;
    let mut current = String::new();
    let mut seen_article = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();

                if name.as_slice() == b"PubmedArticle" && path.len() == 1 {
                    if seen_article {
                        break;
                    }
                    seen_article = true;
                }

                if section_depth.is_none()
                    && name.as_slice() == b"AbstractText"
                    && is_abstract_path(&path)
                {
                    current = section_label(&e)?
                        .map(|label| format!("{label}: "))
                        .unwrap_or_default();
                    section_depth = Some(path.len());
                }

                path.push(name);
            }
            Event::End(_) => {
                path.pop();

                if section_depth == Some(path.len()) {
                    section_depth = None;
                    let section = current.trim().to_string();
                    if !section.is_empty() {
                        sections.push(section);
                    }
                    current.clear();
                }
            }
            Event::Text(e) if section_depth.is_some() => {
                current.push_str(&e.unescape()?);
            }
            Event::CData(e) if section_depth.is_some() => {
                current.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if section_depth.is_some() {
        return Err(PipelineError::Xml(
            "document ended inside AbstractText".to_string(),
        ));
    }

    Ok(sections.join("\n"))
}

fn is_abstract_path(path: &[Vec<u8>]) -> bool {
    path.len() == ABSTRACT_PATH.len()
        && path
            .iter()
            .zip(ABSTRACT_PATH.iter())
            .all(|(seen, expected)| seen.as_slice() == *expected)
}

fn section_label(element: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| PipelineError::Xml(e.to_string()))?;
        if attr.key.as_ref() == b"Label" {
            let value = attr.unescape_value()?;
            let value = value.trim();
            if !value.is_empty() {
                return Ok(Some(value.to_string()));
            }
        }
    }
    Ok(None)
}
