use std::{collections::HashSet, fs, path::Path};

use crate::{config::Config, domain::Channel, errors::Error, Result};

/// Allow-list and restrict-list, loaded once per run.
///
/// The allow-list names channels that are never archived. The restrict-list, when
/// non-empty, narrows the scan to the channels it names; it never excludes anything
/// on its own.
#[derive(Clone, Debug, Default)]
pub struct PolicySets {
    allowlist: HashSet<String>,
    restrictlist: HashSet<String>,
}

impl PolicySets {
    pub fn new<A, R>(allowlist: A, restrictlist: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            allowlist: allowlist.into_iter().map(Into::into).collect(),
            restrictlist: restrictlist.into_iter().map(Into::into).collect(),
        }
    }

    /// Read both list files named by the config. A missing file aborts the run.
    pub fn load(cfg: &Config) -> Result<Self> {
        let allowlist = read_name_list(&cfg.allowlist_path)?;
        let restrictlist = read_name_list(&cfg.archivelist_path)?;
        tracing::info!(
            allowlist = allowlist.len(),
            restrictlist = restrictlist.len(),
            "policy lists loaded"
        );
        Ok(Self {
            allowlist,
            restrictlist,
        })
    }

    pub fn in_allowlist(&self, channel: &Channel) -> bool {
        self.allowlist.contains(&channel.name)
    }

    pub fn in_restrictlist(&self, channel: &Channel) -> bool {
        self.restrictlist.contains(&channel.name)
    }

    /// Whether the scan should look at this channel at all.
    pub fn in_scope(&self, channel: &Channel) -> bool {
        self.restrictlist.is_empty() || self.in_restrictlist(channel)
    }
}

fn read_name_list(path: &Path) -> Result<HashSet<String>> {
    let contents = fs::read_to_string(path).map_err(|source| Error::PolicyFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_name_list(&contents))
}

fn parse_name_list(contents: &str) -> HashSet<String> {
    contents
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
