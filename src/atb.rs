//! client for the structure-search web service. the service takes an SDF
//! blob and returns the database ids of the matching molecules; its
//! authentication, rate limits, and retry behavior are its own concern

use log::debug;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{sdf::MoleculeRecord, Error};

pub const DEFAULT_BASE_URL: &str = "https://atb.uq.edu.au";

const SEARCH_ENDPOINT: &str = "/api/current/molecules/structure_search.py";

const USER_AGENT: &str = concat!("qmscan/", env!("CARGO_PKG_VERSION"));

#[derive(Serialize)]
struct SearchRequest<'a> {
    structure_format: &'a str,
    structure: &'a str,
    netcharge: &'a str,
}

#[derive(Deserialize)]
struct SearchMatch {
    molid: u64,
}

#[derive(Deserialize)]
struct SearchResponse {
    matches: Vec<SearchMatch>,
}

/// the seam between the pipeline and the network. the production
/// implementation is [AtbClient]; tests substitute a double
pub trait StructureSearch {
    /// submit one structure blob, returning the ids of the matching
    /// database entries
    fn structure_search(&self, structure: &str) -> Result<Vec<u64>, Error>;
}

pub struct AtbClient {
    agent: ureq::Agent,
    base_url: String,
}

impl AtbClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into(),
        }
    }
}

impl StructureSearch for AtbClient {
    fn structure_search(&self, structure: &str) -> Result<Vec<u64>, Error> {
        let url = format!("{}{SEARCH_ENDPOINT}", self.base_url);
        let request = SearchRequest {
            structure_format: "sdf",
            structure,
            // any net charge
            netcharge: "*",
        };
        let mut response = self
            .agent
            .post(&url)
            .header("User-Agent", USER_AGENT)
            .send_json(&request)?;
        let body: SearchResponse = response.body_mut().read_json()?;
        Ok(body.matches.into_iter().map(|m| m.molid).collect())
    }
}

/// look up one representative structure per group: the first record in each
/// group's member list. the output keeps group order, and the first failed
/// lookup aborts the whole pass. runs on the current rayon pool, so the
/// pool's thread count bounds the in-flight requests
pub fn lookup_groups<C: StructureSearch + Sync>(
    client: &C,
    groups: &[(String, Vec<&MoleculeRecord>)],
) -> Result<Vec<(String, Vec<u64>)>, Error> {
    groups
        .par_iter()
        .map(|(smiles, members)| {
            let molids = client.structure_search(&members[0].to_sdf())?;
            debug!("{} matches for {smiles}", molids.len());
            Ok((smiles.clone(), molids))
        })
        .collect()
}
