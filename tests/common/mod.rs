//! Shared label fixtures for integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const DOCUMENT_ID: &str = "a8f5e2c1-3b4d-4e6f-9a7b-1c2d3e4f5a6b";
pub const SET_ID: &str = "0b6c5d4e-3f2a-4b1c-8d9e-0f1a2b3c4d5e";

/// A complete label document around the given structured body content
pub fn label(body: &str) -> String {
    label_version(body, 1)
}

pub fn label_version(body: &str, version: u32) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<document xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <id root="{DOCUMENT_ID}"/>
  <code code="34390-5" codeSystem="2.16.840.1.113883.6.1" displayName="HUMAN OTC DRUG LABEL"/>
  <title>Aspirin Tablets</title>
  <effectiveTime value="20240901"/>
  <setId root="{SET_ID}"/>
  <versionNumber value="{version}"/>
  <component><structuredBody>
{body}
  </structuredBody></component>
</document>"#
    )
}

/// A section with a LOINC code, an identifier and optional nested content
pub fn section(id: &str, loinc: &str, inner: &str) -> String {
    format!(
        r#"<component><section ID="{id}">
  <id root="{id}"/>
  <code code="{loinc}" codeSystem="2.16.840.1.113883.6.1"/>
  <title>{id}</title>
  {inner}
</section></component>"#
    )
}

/// Warnings section with a paragraph of narrative
pub fn warnings_section(id: &str) -> String {
    section(
        id,
        "34071-1",
        "<text><paragraph>Keep out of reach of children.</paragraph></text>",
    )
}

/// Product listing for a 325 mg aspirin tablet with one inactive ingredient
pub fn aspirin_product_section(id: &str) -> String {
    section(
        id,
        "48780-1",
        r#"<subject><manufacturedProduct><manufacturedProduct>
    <code code="0363-0160" codeSystem="2.16.840.1.113883.6.69"/>
    <name>Aspirin</name>
    <formCode code="C42998" codeSystem="2.16.840.1.113883.3.26.1.1" displayName="TABLET"/>
    <ingredient classCode="ACTIB">
      <quantity><numerator value="325" unit="mg"/></quantity>
      <ingredientSubstance><code code="R16CO5Y76E" codeSystem="2.16.840.1.113883.4.9"/><name>ASPIRIN</name></ingredientSubstance>
    </ingredient>
    <ingredient classCode="IACT">
      <ingredientSubstance><name>Starch, Corn</name></ingredientSubstance>
    </ingredient>
  </manufacturedProduct></manufacturedProduct></subject>"#,
    )
}

/// The aspirin label: product listing followed by warnings
pub fn aspirin_label() -> String {
    label(&[aspirin_product_section("sec-products"), warnings_section("sec-warnings")].concat())
}

pub const MALFORMED: &str = r#"<document xmlns="urn:hl7-org:v3"><component><section></document>"#;

/// Writes a file into `dir` and returns its path
pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
