use super::*;

const CSV: &str = "\
name,country,web_page
University of Bath,United Kingdom,https://www.bath.ac.uk

\"University of London, Birkbeck\",United Kingdom,https://www.bbk.ac.uk
Bath Spa University,United Kingdom,https://www.bathspa.ac.uk

Imperial College London,United Kingdom,https://www.imperial.ac.uk
";

#[test]
fn csv_skips_header_and_blank_lines() {
    let directory = UniversityDirectory::from_csv(CSV);
    assert_eq!(directory.status(), &LookupStatus::Loaded);
    assert_eq!(directory.len(), 4);
    assert!(directory.contains("university of london, birkbeck"));
    assert!(!directory.contains("name"));
}

#[test]
fn search_is_case_insensitive_and_limited() {
    let directory = UniversityDirectory::from_csv(CSV);

    let names: Vec<_> = directory
        .search("BATH", 10)
        .into_iter()
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(names, ["University of Bath", "Bath Spa University"]);

    assert_eq!(directory.search("bath", 1).len(), 1);
    assert_eq!(directory.search("", 3).len(), 3);
    assert!(directory.search("cambridge", 10).is_empty());
}

#[test]
fn unloaded_directories_report_their_status() {
    assert_eq!(UniversityDirectory::loading().status(), &LookupStatus::Loading);

    let failed = UniversityDirectory::failed("404 Not Found");
    assert_eq!(
        failed.status(),
        &LookupStatus::Failed("404 Not Found".to_string())
    );
    assert!(failed.is_empty());
    assert!(failed.search("bath", 5).is_empty());
}

#[test]
fn quoted_names_keep_commas_and_escaped_quotes() {
    let directory = UniversityDirectory::from_csv(
        "name,country\n\"King's College, London\",UK\n\"The \"\"Open\"\" University\",UK\n",
    );

    let names: Vec<_> = directory
        .search("", 10)
        .into_iter()
        .map(|u| u.name.as_str())
        .collect();
    assert_eq!(names, ["King's College, London", "The \"Open\" University"]);
    assert!(directory.contains("the \"open\" university"));
    assert_eq!(directory.search("open", 5).len(), 1);
}
