//! Extraction Integration Tests
//!
//! A corpus table on disk, searched through a corpus source, down to the
//! candidates the operator would see.

use lexuse::corpus::CorpusTable;
use lexuse::domain::{CorpusRecord, Form, LanguageCode};
use lexuse::extract::{ExtractionSettings, Extractor, Rejection};
use lexuse::sources::{CorpusSource, ExampleSource};
use tempfile::TempDir;

fn swedish_form(id: &str, representation: &str) -> Form {
    Form::new(id, representation, LanguageCode::new("sv")).unwrap()
}

fn table_with(temp: &TempDir, rows: &[(&str, &str)]) -> CorpusTable {
    let path = temp.path().join("corpus.db");
    let table = CorpusTable::create(&path).unwrap();
    for (id, text) in rows {
        table.insert(&CorpusRecord::new(*id, *text)).unwrap();
    }
    CorpusTable::open(&path).unwrap()
}

#[tokio::test]
async fn test_single_matching_sentence_end_to_end() {
    let temp = TempDir::new().unwrap();
    let table = table_with(
        &temp,
        &[
            ("r1", "Hon skrev en lång rapport om klimatet idag."),
            ("r2", "Kort."),
        ],
    );
    let source = CorpusSource::new(
        "riksdagen",
        LanguageCode::new("sv"),
        table,
        &ExtractionSettings::default(),
    );

    let candidates = tokio_test::assert_ok!(source.find(&swedish_form("L1-F1", "rapport"), 500).await);

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].text, "Hon skrev en lång rapport om klimatet idag.");
    assert_eq!(candidates[0].word_count, 8);
    assert_eq!(candidates[0].form_id, "L1-F1");
    assert_eq!(candidates[0].provenance.source, "riksdagen");
    assert_eq!(candidates[0].provenance.record_id, "r1");
}

#[test]
fn test_short_unmatched_record_is_dropped() {
    let extractor = Extractor::for_language(&ExtractionSettings::default(), &LanguageCode::new("sv"));
    let record = CorpusRecord::new("r2", "Kort.");

    let extraction = extractor.extract(&record, &swedish_form("L1-F1", "rapport"), "riksdagen");

    assert!(extraction.candidates.is_empty());
    assert_eq!(extraction.unmatched, 1);
    assert_eq!(extraction.stats.total_rejected(), 0);
}

#[tokio::test]
async fn test_document_yields_only_clean_matching_sentences() {
    let temp = TempDir::new().unwrap();
    let text = "ARBETSUPPGIFTER • Du kommer att skriva en rapport varje vecka till ledningen. \
                Se rapport 12 från förra året för mer information om detta. \
                Rapporten skickas sedan vidare till alla berörda avdelningar i huset. \
                Rapport.";
    let table = table_with(&temp, &[("ad-1", text)]);
    let source = CorpusSource::new(
        "historical_job_ads",
        LanguageCode::new("sv"),
        table,
        &ExtractionSettings::default(),
    );

    let candidates = source.find(&swedish_form("L2-F1", "rapport"), 500).await.unwrap();
    let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();

    // Heading and bullet stripped, digits rejected, inflected form not matched
    assert_eq!(
        texts,
        vec!["Du kommer att skriva en rapport varje vecka till ledningen."]
    );
}

#[test]
fn test_filter_rejections_are_counted() {
    let extractor = Extractor::for_language(&ExtractionSettings::default(), &LanguageCode::new("sv"));
    let record = CorpusRecord::new(
        "r3",
        "En rapport. Läs mer om vår rapport på www.example.se idag. \
         Den här rapporten är lång men denna rapport är kort och tydlig.",
    );

    let extraction = extractor.extract(&record, &swedish_form("L1-F1", "rapport"), "test");

    assert_eq!(extraction.candidates.len(), 1);
    assert_eq!(extraction.stats.rejected.get(&Rejection::TooShort), Some(&1));
    assert_eq!(extraction.stats.rejected.get(&Rejection::Url), Some(&1));
}

#[tokio::test]
async fn test_other_language_form_finds_nothing() {
    let temp = TempDir::new().unwrap();
    let table = table_with(&temp, &[("r1", "Hon skrev en lång rapport om klimatet idag.")]);
    let source = CorpusSource::new(
        "riksdagen",
        LanguageCode::new("sv"),
        table,
        &ExtractionSettings::default(),
    );

    let form = Form::new("L9-F1", "rapport", LanguageCode::new("da")).unwrap();
    assert!(source.find(&form, 500).await.unwrap().is_empty());
}
