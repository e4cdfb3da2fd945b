use std::fs;

use msastat::analysis::{summarize_paths, AnalysisError, ErrorPolicy, SummaryConfig};
use msastat::formats::clustal::{read_clustal_file, write_clustal_file};
use msastat::formats::fasta::{read_fasta_file, write_fasta_file};
use msastat::formats::{read_alignment, write_alignment, FileFormat, ParseError};
use msastat::model::{Alignment, Alphabet, Sequence};

fn protein_alignment() -> Alignment {
    let alphabet = Alphabet::protein();
    let rows = [
        ("aspni-hyl1", format!("{}{}", "MKT-AYIAKQ".repeat(7), "RQ-S")),
        ("sp|P1|short", format!("{}{}", "MKTLAYIA-Q".repeat(7), "RQIS")),
        ("x", format!("{}{}", "-KTLAY--KQ".repeat(7), "R--S")),
    ];
    Alignment::new(
        rows.iter()
            .map(|(name, data)| {
                Sequence::new(*name, data.as_str()).unwrap().with_alphabet(Some(alphabet.clone()))
            })
            .collect(),
    )
    .unwrap()
}

#[test]
fn fasta_round_trip_keeps_names_and_symbols() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seqs.fasta");
    let alignment = protein_alignment();

    write_fasta_file(&path, &alignment).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(">aspni-hyl1 \n"));
    assert!(text.lines().all(|l| l.len() <= 60 || l.starts_with('>')));

    let sequences = read_fasta_file(&path, Some(&Alphabet::protein())).unwrap();
    assert_eq!(sequences.len(), alignment.sequence_count());
    for (read, original) in sequences.iter().zip(alignment.iter()) {
        assert_eq!(read.name(), original.name());
        assert_eq!(read.as_str(), original.as_str());
    }
}

#[test]
fn clustal_round_trip_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aln.aln");
    let alignment = protein_alignment();

    write_clustal_file(&path, &alignment).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("CLUSTAL O(1.2.0) multiple sequence alignment\n\n\n"));

    let read = read_clustal_file(&path, Some(&Alphabet::protein())).unwrap();
    assert_eq!(read.alignment_length(), 74);
    let names: Vec<&str> = read.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["aspni-hyl1", "sp|P1|short", "x"]);
    for (read, original) in read.iter().zip(alignment.iter()) {
        assert_eq!(read.as_str(), original.as_str());
    }
}

#[test]
fn read_alignment_detects_formats() {
    let dir = tempfile::tempdir().unwrap();
    let alignment = protein_alignment();

    let clustal = dir.path().join("no_extension");
    write_alignment(&clustal, &alignment, FileFormat::Clustal).unwrap();
    let read = read_alignment(&clustal, None, None).unwrap();
    assert_eq!(read.sequence_count(), 3);

    let fasta = dir.path().join("aln.fa");
    write_alignment(&fasta, &alignment, FileFormat::Fasta).unwrap();
    let read = read_alignment(&fasta, None, None).unwrap();
    assert_eq!(read.alignment_length(), alignment.alignment_length());
}

#[test]
fn read_alignment_reports_errors() {
    let dir = tempfile::tempdir().unwrap();

    let empty = dir.path().join("empty.aln");
    fs::write(&empty, "").unwrap();
    assert!(matches!(read_alignment(&empty, None, None), Err(ParseError::EmptyFile)));

    let unknown = dir.path().join("notes.txt");
    fs::write(&unknown, "hello\n").unwrap();
    assert!(matches!(read_alignment(&unknown, None, None), Err(ParseError::UnknownFormat)));

    let missing = dir.path().join("missing.aln");
    assert!(matches!(read_alignment(&missing, None, None), Err(ParseError::IoError(_))));
}

#[test]
fn batch_summary_error_policy() {
    let dir = tempfile::tempdir().unwrap();
    write_alignment(dir.path().join("a.aln"), &protein_alignment(), FileFormat::Clustal).unwrap();
    fs::write(dir.path().join("b.aln"), "CLUSTAL\n\nseq1 ACGT\nseq2 AC\n").unwrap();
    fs::write(dir.path().join(".hidden"), "garbage").unwrap();
    let inputs = vec![dir.path().to_path_buf()];

    let strict = SummaryConfig {
        reference: Some("aspni-hyl1".to_string()),
        ..Default::default()
    };
    let result = summarize_paths(&inputs, &Alphabet::protein(), None, &strict);
    assert!(matches!(result, Err(AnalysisError::Parse { .. })));

    let lenient = SummaryConfig {
        error_policy: ErrorPolicy::CollectErrors,
        ..strict
    };
    let report = summarize_paths(&inputs, &Alphabet::protein(), None, &lenient).unwrap();
    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.failures.len(), 1);
    let summary = &report.summaries[0];
    assert_eq!(summary.sequence_count, 3);
    assert_eq!(summary.alignment_length, 74);
    // The reference has one gap per repeat plus one in the tail.
    assert_eq!(summary.analysed_length, 66);
}
