//! CLI integration tests for seedxml
//!
//! Tests the binary as a user would interact with it.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn seedxml() -> Command {
    Command::cargo_bin("seedxml").unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("seedxml-cli-{}-{}", name, std::process::id()));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

const STATION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<FDSNStationXML xmlns="http://www.fdsn.org/xml/station/1" schemaVersion="1.1">
  <Source>TEST</Source>
  <Network code="XX">
    <Description>Test Network</Description>
    <Station code="AAAA" startDate="2007-06-27T00:00:00">
      <Latitude>9.166539</Latitude>
      <Longitude>-79.8366</Longitude>
      <Elevation>61</Elevation>
      <Site>
        <Name>Somewhere</Name>
      </Site>
      <Channel code="BHZ" locationCode="00" startDate="2007-06-27T00:00:00">
        <Latitude>9.166539</Latitude>
        <Longitude>-79.8366</Longitude>
        <Elevation>61</Elevation>
        <Depth>0</Depth>
        <Azimuth>0</Azimuth>
        <Dip>-90</Dip>
        <Type>CONTINUOUS</Type>
        <SampleRate>20</SampleRate>
        <ClockDrift>0</ClockDrift>
      </Channel>
    </Station>
  </Network>
</FDSNStationXML>"#;

#[test]
fn test_help() {
    seedxml()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Convert between dataless SEED volumes and FDSN StationXML",
        ));
}

#[test]
fn test_version() {
    seedxml()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("seedxml"));
}

#[test]
fn test_no_sources_fails() {
    seedxml()
        .assert()
        .failure()
        .stderr(predicate::str::contains("SOURCE"));
}

#[test]
fn test_missing_file_fails() {
    seedxml()
        .arg("/no/such/file.xml")
        .assert()
        .failure();
}

#[test]
fn test_xml_to_dataless_and_back() {
    let dir = scratch_dir("roundtrip");
    let xml_path = dir.join("station.xml");
    fs::write(&xml_path, STATION_XML).unwrap();

    seedxml().arg(&xml_path).assert().success();

    let dataless = dir.join("station.xml.converted.dataless");
    let volume = fs::read_to_string(&dataless).unwrap();
    assert!(volume.starts_with("010"));
    assert!(volume.contains("AAAA"));
    assert!(volume.contains("BHZ"));

    seedxml().arg(&dataless).assert().success();
    let back = dir.join("station.xml.converted.dataless.converted.xml");
    let text = fs::read_to_string(&back).unwrap();
    assert!(text.contains("<FDSNStationXML"));
    assert!(text.contains("Test Network"));
    assert!(text.contains("2007-06-27T00:00:00"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_explicit_output_path() {
    let dir = scratch_dir("output");
    let xml_path = dir.join("station.xml");
    let out_path = dir.join("volume.dataless");
    fs::write(&xml_path, STATION_XML).unwrap();

    seedxml()
        .arg(&xml_path)
        .arg("--output")
        .arg(&out_path)
        .assert()
        .success();
    assert!(out_path.exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_malformed_input_reports_error() {
    let dir = scratch_dir("malformed");
    let bad = dir.join("broken.dataless");
    fs::write(&bad, "999xxxx").unwrap();

    seedxml()
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("broken.dataless"));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_continue_on_error_converts_the_rest() {
    let dir = scratch_dir("continue");
    let bad = dir.join("a-broken.dataless");
    let good = dir.join("b-station.xml");
    fs::write(&bad, "999xxxx").unwrap();
    fs::write(&good, STATION_XML).unwrap();

    seedxml()
        .arg(&dir)
        .arg("--continue-on-error")
        .assert()
        .failure();
    assert!(dir.join("b-station.xml.converted.dataless").exists());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_organization_override() {
    let dir = scratch_dir("org");
    let xml_path = dir.join("station.xml");
    fs::write(&xml_path, STATION_XML).unwrap();

    seedxml().arg(&xml_path).assert().success();
    let dataless = dir.join("station.xml.converted.dataless");

    seedxml()
        .arg(&dataless)
        .arg("--organization")
        .arg("EXAMPLE ORG")
        .arg("--label")
        .arg("nightly")
        .assert()
        .success();
    let text = fs::read_to_string(dir.join("station.xml.converted.dataless.converted.xml")).unwrap();
    assert!(text.contains("<Source>EXAMPLE ORG - nightly</Source>"));

    fs::remove_dir_all(&dir).unwrap();
}
