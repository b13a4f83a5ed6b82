//! Loader utilities for reading a playable [`Document`] from disk.
//!
//! Scripts (`.ska`) are parsed directly. Compiled documents (`.json`, `.ron`)
//! are deserialized and then validated, since nothing guarantees they came
//! from a successful parse.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use skald_data::{Document, ValidationError, validate_document};
use skald_script::{ParseFailure, parse_script};
use thiserror::Error;

/// Formats `load_document` understands, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Script,
    Json,
    Ron,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match ext.as_str() {
            "ska" => Ok(DocumentFormat::Script),
            "json" => Ok(DocumentFormat::Json),
            "ron" => Ok(DocumentFormat::Ron),
            _ => Err(LoadError::UnsupportedFormat(ext)),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported document extension '{0}' (expected .ska, .json or .ron)")]
    UnsupportedFormat(String),
    #[error("script has {count} error(s):\n{failure}", count = .0.errors.len(), failure = .0)]
    Script(ParseFailure),
    #[error("document failed validation:\n{}", bullet_list(.0))]
    Invalid(Vec<ValidationError>),
}

fn bullet_list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|err| format!("- {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load a document from a script or a compiled JSON/RON file.
///
/// # Errors
/// Errors bubble up from file IO, parsing, deserialization, or validation.
pub fn load_document(path: &Path) -> Result<Document> {
    let format = DocumentFormat::from_path(path)?;
    let text = fs::read_to_string(path).with_context(|| format!("reading document from '{}'", path.display()))?;
    let doc = parse_document(&text, format).with_context(|| format!("loading '{}'", path.display()))?;
    info!(
        "loaded '{}': {} sections, {} inputs, {} testbeds",
        path.display(),
        doc.sections.len(),
        doc.inputs.len(),
        doc.testbeds.len()
    );
    Ok(doc)
}

/// Build a document from already-read text in the given format.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Document> {
    let doc: Document = match format {
        DocumentFormat::Script => return parse_script(text).map_err(|failure| LoadError::Script(failure).into()),
        DocumentFormat::Json => serde_json::from_str(text).context("parsing document JSON")?,
        DocumentFormat::Ron => ron::from_str(text).context("parsing document RON")?,
    };
    let errors = validate_document(&doc);
    if errors.is_empty() {
        Ok(doc)
    } else {
        Err(LoadError::Invalid(errors).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    const SCRIPT: &str = "#start\nnpc: Hello\n>Go\n->end\n#end\nEND\n";

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().expect("tempfile");
        file.write_all(contents.as_bytes()).expect("write");
        file
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a/b.ska")).ok(), Some(DocumentFormat::Script));
        assert_eq!(DocumentFormat::from_path(Path::new("b.JSON")).ok(), Some(DocumentFormat::Json));
        assert!(matches!(
            DocumentFormat::from_path(Path::new("b.txt")),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "txt"
        ));
    }

    #[test]
    fn loads_script_file() {
        let file = write_temp(".ska", SCRIPT);
        let doc = load_document(file.path()).expect("load ok");
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.characters, vec!["npc".to_string()]);
    }

    #[test]
    fn compiled_json_round_trips_through_loader() {
        let doc = parse_script(SCRIPT).expect("parse ok");
        let json = serde_json::to_string(&doc).expect("serialize");
        let file = write_temp(".json", &json);
        assert_eq!(load_document(file.path()).expect("load ok"), doc);
    }

    const EVERY_OPERATOR: &str = "\
@testbed seeded
hp = 10
name = Bob
lamp = false
luck = nil
@end
#intro
npc: Hello
?hp>=1
?hp<=100
~lamp=!
~gold+=5
*check
?hp>0
?hp<20
?name!=Alice
?luck==nil
~gold-=1.5
~mood=null
:door-creak
>Leave
?lamp
->outro
>Stay
?!lamp
#outro
END
";

    #[test]
    fn compiled_ron_round_trips_through_loader() {
        let doc = parse_script(EVERY_OPERATOR).expect("parse ok");
        let ron_text = ron::ser::to_string_pretty(&doc, ron::ser::PrettyConfig::default()).expect("serialize");
        assert!(ron_text.contains("operator: \">=\""), "{ron_text}");

        let back = parse_document(&ron_text, DocumentFormat::Ron).expect("ron back");
        assert_eq!(back, doc);

        let file = write_temp(".ron", &ron_text);
        assert_eq!(load_document(file.path()).expect("load ok"), doc);
    }

    #[test]
    fn script_failure_message_counts_errors() {
        let err = parse_document("#a\n?x<\n", DocumentFormat::Script).expect_err("should fail");
        let LoadError::Script(failure) = err.downcast_ref::<LoadError>().expect("load error") else {
            panic!("expected script failure");
        };
        let text = err.to_string();
        assert!(
            text.starts_with(&format!("script has {} error(s):\n", failure.errors.len())),
            "{text}"
        );
        assert!(text.contains(&failure.to_string()), "{text}");
    }

    #[test]
    fn script_errors_are_all_reported() {
        let err = parse_document("#a\n?x<\n->nowhere\n", DocumentFormat::Script).expect_err("should fail");
        let failure = err.downcast_ref::<LoadError>().expect("load error");
        let LoadError::Script(failure) = failure else {
            panic!("expected script failure, got {failure:?}");
        };
        assert!(failure.errors.len() >= 3);
    }

    #[test]
    fn compiled_documents_are_validated() {
        let json = r#"{"sections":[{"tag":"a","blocks":[],"choices":[{"body":"Go","meta":{"transition":"b"}}]}]}"#;
        let err = parse_document(json, DocumentFormat::Json).expect_err("should fail");
        let text = err.to_string();
        assert!(text.contains("missing section 'b'"), "{text}");
        assert!(text.contains("no endings found"), "{text}");
    }

    #[test]
    fn missing_file_has_context() {
        let err = load_document(Path::new("/definitely/not/here.ska")).expect_err("should fail");
        assert!(format!("{err:#}").contains("reading document from"));
    }
}
