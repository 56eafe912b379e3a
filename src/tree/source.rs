// source.rs - Tree samples from NEXUS or Newick files with burn-in

use log::{debug, info};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{RankedTree, TaxonSet};
use crate::error::{Error, Result};

/// A restartable source of sample trees.
pub trait TreeSource {
    fn trees(&self) -> Result<Vec<RankedTree>>;
}

impl TreeSource for Vec<RankedTree> {
    fn trees(&self) -> Result<Vec<RankedTree>> {
        Ok(self.clone())
    }
}

/// Tree log on disk; every call to `trees` re-reads the file.
#[derive(Debug, Clone)]
pub struct TreeFile {
    path: PathBuf,
    burnin: usize,
    taxa: Option<Arc<TaxonSet>>,
}

impl TreeFile {
    /// `burnin` is the percentage of leading trees to skip (0-100).
    pub fn new(path: impl Into<PathBuf>, burnin: usize) -> Result<Self> {
        if burnin > 100 {
            return Err(Error::config(format!(
                "burn-in must be a percentage between 0 and 100, got {}",
                burnin
            )));
        }
        Ok(Self {
            path: path.into(),
            burnin,
            taxa: None,
        })
    }

    /// Require the trees to be over an existing taxon set.
    pub fn with_taxa(mut self, taxa: Arc<TaxonSet>) -> Self {
        self.taxa = Some(taxa);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TreeSource for TreeFile {
    fn trees(&self) -> Result<Vec<RankedTree>> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let mut trees = parse_trees(&content, self.taxa.as_ref()).map_err(|e| match e {
            Error::InputFormat(msg) => {
                Error::input(format!("{}: {}", self.path.display(), msg))
            }
            other => other,
        })?;

        let total = trees.len();
        let skip = total * self.burnin / 100;
        trees.drain(..skip);
        info!(
            "📖 Read {} trees from {} ({} discarded as burn-in)",
            total,
            self.path.display(),
            skip
        );

        if trees.is_empty() {
            return Err(Error::input(format!(
                "no trees left in '{}' after {}% burn-in",
                self.path.display(),
                self.burnin
            )));
        }
        Ok(trees)
    }
}

/// Parse every tree in a NEXUS trees block, or one Newick tree per line.
pub fn parse_trees(content: &str, taxa: Option<&Arc<TaxonSet>>) -> Result<Vec<RankedTree>> {
    let is_nexus = content
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("#NEXUS"));

    let (statements, translate) = if is_nexus {
        nexus_trees(content)?
    } else {
        let lines = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(String::from)
            .collect();
        (lines, HashMap::new())
    };
    let translate = (!translate.is_empty()).then_some(&translate);

    let Some(first) = statements.first() else {
        return Ok(Vec::new());
    };
    let taxa = match (taxa, translate) {
        (Some(taxa), _) => Arc::clone(taxa),
        (None, Some(table)) => Arc::new(TaxonSet::new(table.values().cloned().collect())?),
        (None, None) => Arc::clone(RankedTree::from_newick(first)?.taxa()),
    };
    debug!("tree sample over {} taxa", taxa.len());

    statements
        .iter()
        .enumerate()
        .map(|(i, s)| {
            RankedTree::from_newick_in(s, &taxa, translate)
                .map_err(|e| Error::input(format!("tree {}: {}", i + 1, e)))
        })
        .collect()
}

/// Tree strings and translate table of a NEXUS file.
fn nexus_trees(content: &str) -> Result<(Vec<String>, HashMap<String, String>)> {
    let tree_re = Regex::new(r"(?i)^\s*tree\s+\S+?(?:\s*\[[^\]]*\])?\s*=\s*(.+)$")
        .map_err(|e| Error::input(format!("invalid tree pattern: {}", e)))?;

    let mut in_trees = false;
    let mut in_translate = false;
    let mut statements = Vec::new();
    let mut translate = HashMap::new();

    for line in content.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();

        if !in_trees {
            in_trees = lower.starts_with("begin trees");
            continue;
        }
        if lower.starts_with("end;") || lower.starts_with("endblock;") {
            in_trees = false;
            continue;
        }

        let body = if lower.starts_with("translate") {
            in_translate = true;
            &trimmed["translate".len()..]
        } else {
            trimmed
        };

        if in_translate {
            let done = body.contains(';');
            for pair in body.split([',', ';']) {
                if let Some((key, value)) = pair.trim().split_once(char::is_whitespace) {
                    translate.insert(key.to_string(), value.trim().trim_matches('\'').to_string());
                }
            }
            in_translate = !done;
            continue;
        }

        if let Some(caps) = tree_re.captures(trimmed) {
            statements.push(caps[1].trim().to_string());
        }
    }

    Ok((statements, translate))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXUS: &str = "#NEXUS\n\
        Begin taxa;\n\tDimensions ntax=3;\nEnd;\n\
        Begin trees;\n\
        \tTranslate\n\t\t1 English,\n\t\t2 German,\n\t\t3 Dutch\n\t\t;\n\
        tree STATE_0 = ((1:1.0,2:1.0):1.0,3:2.0);\n\
        tree STATE_1 [&lnP=-12.5] = [&R] ((2:1.0,3:1.0):1.0,1:2.0);\n\
        tree STATE_2 = ((1[&rate=1]:1.0,3:1.0):1.0,2:2.0);\n\
        tree STATE_3 = ((1:1.0,2:1.0):1.0,3:2.0);\n\
        End;\n";

    #[test]
    fn test_parse_nexus_with_translate() {
        let trees = parse_trees(NEXUS, None).unwrap();
        assert_eq!(trees.len(), 4);
        let taxa = trees[0].taxa();
        assert_eq!(taxa.names(), &["Dutch", "English", "German"]);
        // English + German
        assert_eq!(trees[0].clusters()[0], vec![1, 2]);
        // German + Dutch
        assert_eq!(trees[1].clusters()[0], vec![0, 2]);
        assert!(Arc::ptr_eq(trees[0].taxa(), trees[3].taxa()));
    }

    #[test]
    fn test_parse_newick_lines() {
        let trees = parse_trees("((A:1,B:1):1,C:2);\n\n((A:1,C:1):1,B:2);\n", None).unwrap();
        assert_eq!(trees.len(), 2);
        assert!(!trees[0].same_topology(&trees[1]));
    }

    #[test]
    fn test_burnin_applied() {
        let path = std::env::temp_dir().join("babelkit_burnin.trees");
        std::fs::write(&path, NEXUS).unwrap();

        let all = TreeFile::new(&path, 0).unwrap().trees().unwrap();
        assert_eq!(all.len(), 4);
        let kept = TreeFile::new(&path, 50).unwrap().trees().unwrap();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], all[2]);
        // floor(4 * 10 / 100) = 0
        assert_eq!(TreeFile::new(&path, 10).unwrap().trees().unwrap().len(), 4);
        // restartable
        let source = TreeFile::new(&path, 25).unwrap();
        assert_eq!(source.trees().unwrap().len(), source.trees().unwrap().len());

        assert!(matches!(
            TreeFile::new(&path, 100).unwrap().trees(),
            Err(Error::InputFormat(_))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_burnin() {
        assert!(TreeFile::new("x.trees", 101).unwrap_err().is_configuration());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = TreeFile::new("/no/such/sample.trees", 10)
            .unwrap()
            .trees()
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(err.to_string().contains("/no/such/sample.trees"));
    }

    #[test]
    fn test_malformed_tree_aborts() {
        let err = parse_trees("((A,B),C);\n((A,B),C;\n", None).unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)));
    }

    #[test]
    fn test_with_taxa_rejects_foreign_trees() {
        let path = std::env::temp_dir().join("babelkit_focal.trees");
        std::fs::write(&path, "((X,Y),Z);\n").unwrap();
        let taxa = Arc::new(TaxonSet::new(vec!["A".into(), "B".into(), "C".into()]).unwrap());
        assert!(TreeFile::new(&path, 0).unwrap().with_taxa(taxa).trees().is_err());
        std::fs::remove_file(&path).ok();
    }
}
