//! A bibliographic reference attached to a record, per GenBank's
//! `REFERENCE`/`AUTHORS`/`TITLE`/`JOURNAL`/`MEDLINE`/`PUBMED`/`REMARK` block.

use serde::{Deserialize, Serialize};

use crate::location::SimpleLocation;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reference {
    pub number: u32,
    #[serde(default)]
    pub bases_ref: Vec<SimpleLocation>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub consortium: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub medline_id: Option<String>,
    #[serde(default)]
    pub pubmed_id: Option<String>,
    #[serde(default)]
    pub remark: Option<String>,
}

impl Reference {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }
}
