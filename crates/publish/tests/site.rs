//! Full runs writing the real artifacts with the bundled template.

use std::fs;
use std::path::Path;

use vote_core::config::{PipelineConfig, SiteConfig};
use vote_core::db::SqliteVoteStore;
use vote_core::feed::FeedSource;
use vote_core::pipeline::IngestionPipeline;

const TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates");

const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Votes>
  <Vote number="102" parliament="41" session="1" sitting="110" date="2012-03-28">
    <Description>2nd reading of Bill C-31 2e lecture du projet de loi C-31</Description>
    <Decision>Agreed to</Decision>
    <RelatedBill number="C-31" />
    <TotalYeas>155</TotalYeas>
    <TotalNays>130</TotalNays>
    <TotalPaired>0</TotalPaired>
  </Vote>
  <Vote number="101" parliament="41" session="1" sitting="110" date="2012-03-27">
    <Description>Opposition Motion Motion de l'opposition</Description>
    <Decision>Negatived</Decision>
    <TotalYeas>120</TotalYeas>
    <TotalNays>160</TotalNays>
    <TotalPaired>2</TotalPaired>
  </Vote>
</Votes>"#;

struct StaticFeed;

impl FeedSource for StaticFeed {
    fn fetch(&self) -> vote_core::Result<Vec<u8>> {
        Ok(FEED.as_bytes().to_vec())
    }
}

fn run_into(output: &Path) -> vote_core::pipeline::RunReport {
    let site = SiteConfig::default();
    let mut pipeline = IngestionPipeline::new(
        PipelineConfig::default(),
        Box::new(StaticFeed),
        Box::new(SqliteVoteStore::in_memory().unwrap()),
    )
    .unwrap();
    for renderer in publish::renderers(&site, output, Path::new(TEMPLATE_DIR)).unwrap() {
        pipeline = pipeline.with_renderer(renderer);
    }
    pipeline.run().unwrap()
}

#[test]
fn writes_all_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("public");
    let report = run_into(&output);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.render_failures, 0);

    let json = fs::read_to_string(output.join("feed.json")).unwrap();
    assert!(json.starts_with("jsonVoteFeed("));
    let newest = json.find("\"Number\": 102").unwrap();
    let oldest = json.find("\"Number\": 101").unwrap();
    assert!(newest < oldest);

    let rss = fs::read_to_string(output.join("feed.xml")).unwrap();
    assert!(rss.contains("<title>C-31</title>"));
    assert!(rss.contains("<title>Vote</title>"));
    assert!(rss.contains("<pubDate>Wed, 28 Mar 2012 00:00:00 +0000</pubDate>"));

    let html = fs::read_to_string(output.join("index.html")).unwrap();
    assert!(html.contains("Wednesday, March 28, 2012"));
    assert!(html.contains("Tuesday, March 27, 2012"));
    assert!(html.contains(r#"class="vote yea""#));
    assert!(html.contains(r#"class="vote nay""#));
    assert!(html.contains("Vote 101"));
}

#[test]
fn untranslated_run_keeps_full_description() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("public");
    let report = run_into(&output);
    assert_eq!(report.split_misses, 2);

    let json = fs::read_to_string(output.join("feed.json")).unwrap();
    assert!(json.contains("\"DescriptionEnglish\": \"2nd reading of Bill C-31 2e lecture du projet de loi C-31\""));
    assert!(json.contains("\"DescriptionFrench\": \"\""));
}
